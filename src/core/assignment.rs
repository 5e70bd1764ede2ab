use std::collections::HashMap;
use crate::models::{Confidence, Match, MatchScores, Participant, SimilarityScore};

/// Cost of a cell that has no real participant on one side
pub const PADDING_COST: f64 = 1.0e6;

/// Cost of a real pair that has no computed score
pub const MISSING_PAIR_COST: f64 = 1.0;

/// Square cost matrix fed to an assignment strategy
///
/// Rows are left participants, columns are right participants. The matrix
/// is padded to `max(rows, cols)` with [`PADDING_COST`].
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    size: usize,
    real_rows: usize,
    real_cols: usize,
    cells: Vec<f64>,
}

impl CostMatrix {
    /// Build the matrix from pairwise scores, using `1 - final_score` as cost
    pub fn build(left: &[Participant], right: &[Participant], scores: &[SimilarityScore]) -> Self {
        let lookup = index_scores(scores);
        let rows = left.len();
        let cols = right.len();
        let size = rows.max(cols);
        let mut cells = vec![PADDING_COST; size * size];

        for (i, seeker) in left.iter().enumerate() {
            for (j, provider) in right.iter().enumerate() {
                let cost = match lookup.get(&(seeker.id.as_str(), provider.id.as_str())) {
                    Some(score) if score.final_score.is_finite() => 1.0 - score.final_score,
                    _ => MISSING_PAIR_COST,
                };
                cells[i * size + j] = cost;
            }
        }

        Self {
            size,
            real_rows: rows,
            real_cols: cols,
            cells,
        }
    }

    /// Build a matrix directly from rows of costs, padding to square
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let real_rows = rows.len();
        let real_cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let size = real_rows.max(real_cols);
        let mut cells = vec![PADDING_COST; size * size];

        for (i, row) in rows.iter().enumerate() {
            for (j, cost) in row.iter().enumerate() {
                cells[i * size + j] = *cost;
            }
        }

        Self {
            size,
            real_rows,
            real_cols,
            cells,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.cells[row * self.size + col]
    }

    /// Whether a cell corresponds to a real (left, right) pair
    #[inline]
    pub fn is_real(&self, row: usize, col: usize) -> bool {
        row < self.real_rows && col < self.real_cols
    }

    /// Total cost of a row-to-column assignment
    pub fn total_cost(&self, assignment: &[usize]) -> f64 {
        assignment
            .iter()
            .enumerate()
            .map(|(row, &col)| self.get(row, col))
            .sum()
    }
}

/// Exact solver for the square minimum-cost assignment problem
pub trait AssignmentStrategy {
    /// Returns `assignment[row] = col`, a permutation of `0..size`
    /// minimizing total cost. Must be deterministic for identical input.
    fn solve(&self, cost: &CostMatrix) -> Vec<usize>;
}

/// Hungarian algorithm with row potentials and shortest augmenting paths
///
/// Runs in O(n³). Rows are inserted in index order and columns are scanned
/// in index order, which fixes tie-breaking between equal-cost optima.
#[derive(Debug, Clone, Copy, Default)]
pub struct HungarianSolver;

impl AssignmentStrategy for HungarianSolver {
    fn solve(&self, cost: &CostMatrix) -> Vec<usize> {
        let n = cost.size();
        if n == 0 {
            return Vec::new();
        }

        // 1-based indexing; column 0 is the virtual start of each augmenting path
        let mut u = vec![0.0_f64; n + 1];
        let mut v = vec![0.0_f64; n + 1];
        let mut owner = vec![0usize; n + 1];
        let mut way = vec![0usize; n + 1];

        for row in 1..=n {
            owner[0] = row;
            let mut col0 = 0;
            let mut min_slack = vec![f64::INFINITY; n + 1];
            let mut used = vec![false; n + 1];

            loop {
                used[col0] = true;
                let row0 = owner[col0];
                let mut delta = f64::INFINITY;
                let mut col1 = 0;

                for col in 1..=n {
                    if used[col] {
                        continue;
                    }
                    let slack = cost.get(row0 - 1, col - 1) - u[row0] - v[col];
                    if slack < min_slack[col] {
                        min_slack[col] = slack;
                        way[col] = col0;
                    }
                    if min_slack[col] < delta {
                        delta = min_slack[col];
                        col1 = col;
                    }
                }

                for col in 0..=n {
                    if used[col] {
                        u[owner[col]] += delta;
                        v[col] -= delta;
                    } else {
                        min_slack[col] -= delta;
                    }
                }

                col0 = col1;
                if owner[col0] == 0 {
                    break;
                }
            }

            // Flip the augmenting path
            loop {
                let prev = way[col0];
                owner[col0] = owner[prev];
                col0 = prev;
                if col0 == 0 {
                    break;
                }
            }
        }

        let mut assignment = vec![0usize; n];
        for col in 1..=n {
            if owner[col] != 0 {
                assignment[owner[col] - 1] = col - 1;
            }
        }
        assignment
    }
}

/// Selects the one-to-one pairing that maximizes total final score
#[derive(Debug, Clone, Default)]
pub struct AssignmentSolver<S = HungarianSolver> {
    strategy: S,
}

impl AssignmentSolver<HungarianSolver> {
    pub fn new() -> Self {
        Self {
            strategy: HungarianSolver,
        }
    }
}

impl<S: AssignmentStrategy> AssignmentSolver<S> {
    pub fn with_strategy(strategy: S) -> Self {
        Self { strategy }
    }

    /// Assign left participants to right participants
    ///
    /// Padding assignments and assignments whose pair was never scored are
    /// dropped. Matches come back in left-cohort order with provisional
    /// confidence and no rank.
    pub fn assign(
        &self,
        left: &[Participant],
        right: &[Participant],
        scores: &[SimilarityScore],
    ) -> Vec<Match> {
        let cost = CostMatrix::build(left, right, scores);
        let assignment = self.strategy.solve(&cost);
        let lookup = index_scores(scores);

        let mut dropped = 0usize;
        let matches: Vec<Match> = assignment
            .iter()
            .enumerate()
            .filter(|(row, col)| cost.is_real(*row, **col))
            .filter_map(|(row, &col)| {
                let seeker = &left[row];
                let provider = &right[col];
                let Some(score) = lookup.get(&(seeker.id.as_str(), provider.id.as_str())) else {
                    dropped += 1;
                    return None;
                };

                Some(Match {
                    left_id: seeker.id.clone(),
                    right_id: provider.id.clone(),
                    left_name: seeker.name.clone(),
                    right_name: provider.name.clone(),
                    scores: MatchScores {
                        frq: score.frq_score,
                        quant: score.quant_score,
                        final_score: score.final_score,
                    },
                    confidence: Confidence::Low,
                    rank: None,
                })
            })
            .collect();

        if dropped > 0 {
            tracing::warn!("Dropped {} assignments with no computed score", dropped);
        }
        tracing::debug!(
            "Assigned {} matches from a {}x{} cost matrix",
            matches.len(),
            cost.size(),
            cost.size()
        );

        matches
    }
}

fn index_scores(scores: &[SimilarityScore]) -> HashMap<(&str, &str), &SimilarityScore> {
    scores
        .iter()
        .map(|s| ((s.left_id.as_str(), s.right_id.as_str()), s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cohort;

    /// Exhaustive search over all permutations; only usable for tiny matrices
    struct BruteForce;

    impl AssignmentStrategy for BruteForce {
        fn solve(&self, cost: &CostMatrix) -> Vec<usize> {
            fn search(
                cost: &CostMatrix,
                row: usize,
                taken: &mut Vec<bool>,
                current: &mut Vec<usize>,
                best: &mut (f64, Vec<usize>),
            ) {
                let n = cost.size();
                if row == n {
                    let total = cost.total_cost(current);
                    if total < best.0 {
                        *best = (total, current.clone());
                    }
                    return;
                }
                for col in 0..n {
                    if !taken[col] {
                        taken[col] = true;
                        current.push(col);
                        search(cost, row + 1, taken, current, best);
                        current.pop();
                        taken[col] = false;
                    }
                }
            }

            let mut best = (f64::INFINITY, Vec::new());
            search(cost, 0, &mut vec![false; cost.size()], &mut Vec::new(), &mut best);
            best.1
        }
    }

    fn participant(id: &str, category: Cohort) -> Participant {
        Participant {
            id: id.to_string(),
            name: id.to_uppercase(),
            category,
            embedding: vec![1.0],
            q1: None,
            q2: None,
            q3: None,
            metadata: Default::default(),
        }
    }

    fn score(left: &str, right: &str, final_score: f64) -> SimilarityScore {
        SimilarityScore {
            left_id: left.to_string(),
            right_id: right.to_string(),
            frq_score: final_score,
            quant_score: final_score,
            final_score,
        }
    }

    fn is_permutation(assignment: &[usize]) -> bool {
        let mut seen = vec![false; assignment.len()];
        assignment.iter().all(|&c| c < seen.len() && !std::mem::replace(&mut seen[c], true))
    }

    #[test]
    fn test_hungarian_simple() {
        let cost = CostMatrix::from_rows(&[
            vec![4.0, 1.0, 3.0],
            vec![2.0, 0.0, 5.0],
            vec![3.0, 2.0, 2.0],
        ]);
        let assignment = HungarianSolver.solve(&cost);
        assert!(is_permutation(&assignment));
        assert_eq!(cost.total_cost(&assignment), 5.0);
    }

    #[test]
    fn test_hungarian_matches_brute_force() {
        // Deterministic pseudo-random matrices
        let mut seed: u64 = 42;
        let mut next = || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((seed >> 33) % 1000) as f64 / 1000.0
        };

        for n in 1..=6 {
            let rows: Vec<Vec<f64>> = (0..n).map(|_| (0..n).map(|_| next()).collect()).collect();
            let cost = CostMatrix::from_rows(&rows);
            let fast = HungarianSolver.solve(&cost);
            let exact = BruteForce.solve(&cost);
            assert!(is_permutation(&fast));
            assert!((cost.total_cost(&fast) - cost.total_cost(&exact)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_hungarian_empty() {
        assert!(HungarianSolver.solve(&CostMatrix::from_rows(&[])).is_empty());
    }

    #[test]
    fn test_cost_matrix_padding() {
        let left = vec![participant("a", Cohort::Seeker), participant("b", Cohort::Seeker)];
        let right = vec![participant("x", Cohort::Provider)];
        let scores = vec![score("a", "x", 0.25)];

        let cost = CostMatrix::build(&left, &right, &scores);

        assert_eq!(cost.size(), 2);
        assert_eq!(cost.get(0, 0), 0.75);
        assert_eq!(cost.get(1, 0), MISSING_PAIR_COST);
        assert_eq!(cost.get(0, 1), PADDING_COST);
        assert!(cost.is_real(1, 0));
        assert!(!cost.is_real(0, 1));
    }

    #[test]
    fn test_assign_prefers_global_optimum() {
        let left = vec![participant("a", Cohort::Seeker), participant("b", Cohort::Seeker)];
        let right = vec![participant("x", Cohort::Provider), participant("y", Cohort::Provider)];
        let scores = vec![
            score("a", "x", 0.9),
            score("a", "y", 0.1),
            score("b", "x", 0.2),
            score("b", "y", 0.8),
        ];

        let matches = AssignmentSolver::new().assign(&left, &right, &scores);

        let pairs: Vec<_> = matches.iter().map(|m| (m.left_id.as_str(), m.right_id.as_str())).collect();
        assert_eq!(pairs, vec![("a", "x"), ("b", "y")]);
        assert!(matches.iter().all(|m| m.rank.is_none()));
    }

    #[test]
    fn test_assign_beats_greedy() {
        // Greedy picks a-x (0.9) then b-y (0.1) = 1.0; optimum is a-y + b-x = 1.6
        let left = vec![participant("a", Cohort::Seeker), participant("b", Cohort::Seeker)];
        let right = vec![participant("x", Cohort::Provider), participant("y", Cohort::Provider)];
        let scores = vec![
            score("a", "x", 0.9),
            score("a", "y", 0.8),
            score("b", "x", 0.8),
            score("b", "y", 0.1),
        ];

        let matches = AssignmentSolver::new().assign(&left, &right, &scores);
        let total: f64 = matches.iter().map(|m| m.scores.final_score).sum();
        assert!((total - 1.6).abs() < 1e-9);
    }

    #[test]
    fn test_assign_unequal_cohorts() {
        let left = vec![
            participant("a", Cohort::Seeker),
            participant("b", Cohort::Seeker),
            participant("c", Cohort::Seeker),
        ];
        let right = vec![participant("x", Cohort::Provider), participant("y", Cohort::Provider)];
        let scores = vec![
            score("a", "x", 0.5),
            score("a", "y", 0.4),
            score("b", "x", 0.9),
            score("b", "y", 0.3),
            score("c", "x", 0.2),
            score("c", "y", 0.7),
        ];

        let matches = AssignmentSolver::new().assign(&left, &right, &scores);

        assert_eq!(matches.len(), 2);
        let pairs: Vec<_> = matches.iter().map(|m| (m.left_id.as_str(), m.right_id.as_str())).collect();
        assert_eq!(pairs, vec![("b", "x"), ("c", "y")]);
    }

    #[test]
    fn test_assign_drops_unscored_pairs() {
        let left = vec![participant("a", Cohort::Seeker), participant("b", Cohort::Seeker)];
        let right = vec![participant("x", Cohort::Provider), participant("y", Cohort::Provider)];
        // b has no scores at all, so whatever it is assigned gets dropped
        let scores = vec![score("a", "x", 0.6), score("a", "y", 0.4)];

        let matches = AssignmentSolver::new().assign(&left, &right, &scores);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].left_id, "a");
        assert_eq!(matches[0].right_id, "x");
    }

    #[test]
    fn test_assign_bijection_with_brute_force_strategy() {
        let left: Vec<_> = ["a", "b", "c"].iter().map(|id| participant(id, Cohort::Seeker)).collect();
        let right: Vec<_> = ["x", "y", "z", "w"].iter().map(|id| participant(id, Cohort::Provider)).collect();
        let values = [0.1, 0.7, 0.3, 0.9, 0.6, 0.2, 0.8, 0.4, 0.5, 0.5, 0.1, 0.3];
        let mut scores = Vec::new();
        for (i, l) in left.iter().enumerate() {
            for (j, r) in right.iter().enumerate() {
                scores.push(score(&l.id, &r.id, values[i * right.len() + j]));
            }
        }

        let fast = AssignmentSolver::new().assign(&left, &right, &scores);
        let exact = AssignmentSolver::with_strategy(BruteForce).assign(&left, &right, &scores);

        let total = |ms: &[Match]| ms.iter().map(|m| m.scores.final_score).sum::<f64>();
        assert_eq!(fast.len(), 3);
        assert!((total(&fast) - total(&exact)).abs() < 1e-9);

        let mut rights: Vec<_> = fast.iter().map(|m| m.right_id.clone()).collect();
        rights.sort();
        rights.dedup();
        assert_eq!(rights.len(), 3);
    }

    #[test]
    fn test_assign_is_deterministic() {
        let left = vec![participant("a", Cohort::Seeker), participant("b", Cohort::Seeker)];
        let right = vec![participant("x", Cohort::Provider), participant("y", Cohort::Provider)];
        let scores = vec![
            score("a", "x", 0.5),
            score("a", "y", 0.5),
            score("b", "x", 0.5),
            score("b", "y", 0.5),
        ];

        let solver = AssignmentSolver::new();
        let first = solver.assign(&left, &right, &scores);
        for _ in 0..5 {
            assert_eq!(solver.assign(&left, &right, &scores), first);
        }
    }
}
