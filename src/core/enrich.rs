use std::cmp::Ordering;
use std::collections::HashSet;
use crate::core::similarity::confidence_level;
use crate::models::{
    Confidence, ConfidenceDistribution, Match, MatchingConfig, MatchingStatistics, Participant,
};

/// Sort matches by final score, best first
///
/// The sort is stable, so equal scores keep their input order.
pub fn sort_matches(matches: &mut [Match]) {
    matches.sort_by(|a, b| {
        b.scores
            .final_score
            .partial_cmp(&a.scores.final_score)
            .unwrap_or(Ordering::Equal)
    });
}

/// Rank matches and assign their final confidence tier
pub fn enrich(mut matches: Vec<Match>, config: &MatchingConfig) -> Vec<Match> {
    sort_matches(&mut matches);

    for (position, m) in matches.iter_mut().enumerate() {
        m.rank = Some(position + 1);
        m.confidence = confidence_level(m.scores.final_score, config);
    }

    matches
}

/// Aggregate statistics over enriched matches
///
/// An empty list yields all-zero statistics.
pub fn statistics(matches: &[Match]) -> MatchingStatistics {
    if matches.is_empty() {
        return MatchingStatistics::default();
    }

    let count = matches.len() as f64;
    let finals: Vec<f64> = matches.iter().map(|m| m.scores.final_score).collect();
    let frqs: Vec<f64> = matches.iter().map(|m| m.scores.frq).collect();
    let quants: Vec<f64> = matches.iter().map(|m| m.scores.quant).collect();

    let avg_final = mean(&finals);
    let variance = finals.iter().map(|s| (s - avg_final).powi(2)).sum::<f64>() / count;

    let mut distribution = ConfidenceDistribution::default();
    for m in matches {
        match m.confidence {
            Confidence::High => distribution.high += 1,
            Confidence::Medium => distribution.medium += 1,
            Confidence::Low => distribution.low += 1,
        }
    }

    MatchingStatistics {
        total_matches: matches.len(),
        avg_final_score: avg_final,
        min_final_score: min(&finals),
        max_final_score: max(&finals),
        std_dev_final_score: variance.sqrt(),
        avg_frq_score: mean(&frqs),
        min_frq_score: min(&frqs),
        max_frq_score: max(&frqs),
        avg_quant_score: mean(&quants),
        min_quant_score: min(&quants),
        max_quant_score: max(&quants),
        confidence_distribution: distribution,
    }
}

/// Ids of participants in each cohort that appear in no match
pub fn unmatched_participants(
    left: &[Participant],
    right: &[Participant],
    matches: &[Match],
) -> (Vec<String>, Vec<String>) {
    let matched_left: HashSet<&str> = matches.iter().map(|m| m.left_id.as_str()).collect();
    let matched_right: HashSet<&str> = matches.iter().map(|m| m.right_id.as_str()).collect();

    let unmatched_left = left
        .iter()
        .filter(|p| !matched_left.contains(p.id.as_str()))
        .map(|p| p.id.clone())
        .collect();
    let unmatched_right = right
        .iter()
        .filter(|p| !matched_right.contains(p.id.as_str()))
        .map(|p| p.id.clone())
        .collect();

    (unmatched_left, unmatched_right)
}

#[inline]
fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[inline]
fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

#[inline]
fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}
