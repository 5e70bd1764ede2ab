use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use validator::{Validate, ValidationError};

/// Tolerance allowed when checking that the weights sum to 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.001;

/// One of the two disjoint groups being paired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cohort {
    /// Left side of the assignment
    Seeker,
    /// Right side of the assignment
    Provider,
}

impl Cohort {
    /// Normalize a raw category tag from the store
    ///
    /// Returns `None` for tags that belong to neither cohort.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "seeker" | "mentee" | "student" => Some(Cohort::Seeker),
            "provider" | "mentor" => Some(Cohort::Provider),
            _ => None,
        }
    }
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cohort::Seeker => write!(f, "seeker"),
            Cohort::Provider => write!(f, "provider"),
        }
    }
}

/// Participant record with a pre-computed profile embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub category: Cohort,
    pub embedding: Vec<f64>,
    #[serde(default)]
    pub q1: Option<f64>,
    #[serde(default)]
    pub q2: Option<f64>,
    #[serde(default)]
    pub q3: Option<f64>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Participant {
    /// Structured preference answers of this participant
    pub fn structured_scores(&self) -> StructuredScores {
        StructuredScores {
            q1: self.q1,
            q2: self.q2,
            q3: self.q3,
        }
    }
}

/// Answers to the three structured preference questions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredScores {
    pub q1: Option<f64>,
    pub q2: Option<f64>,
    pub q3: Option<f64>,
}

impl StructuredScores {
    pub fn as_array(&self) -> [Option<f64>; 3] {
        [self.q1, self.q2, self.q3]
    }
}

/// Inclusive range of valid answers for one question
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl ScoreRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Bounds ordered low to high, even if the range was given inverted
    pub fn bounds(&self) -> (f64, f64) {
        if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        }
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn span(&self) -> f64 {
        let (lo, hi) = self.bounds();
        hi - lo
    }
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self { min: 1.0, max: 10.0 }
    }
}

/// Per-question score ranges
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreRanges {
    #[serde(default)]
    pub q1: ScoreRange,
    #[serde(default)]
    pub q2: ScoreRange,
    #[serde(default)]
    pub q3: ScoreRange,
}

impl ScoreRanges {
    pub fn as_array(&self) -> [ScoreRange; 3] {
        [self.q1, self.q2, self.q3]
    }
}

/// Lower bounds (exclusive) of the high and medium confidence tiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct ConfidenceThresholds {
    #[validate(range(min = 0.0, max = 1.0))]
    pub high: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub medium: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high: 0.8,
            medium: 0.6,
        }
    }
}

/// Matching configuration
///
/// Weights must each lie in [0, 1] and sum to 1.0 within
/// [`WEIGHT_SUM_TOLERANCE`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
#[validate(schema(function = "validate_matching_config"))]
pub struct MatchingConfig {
    #[validate(range(min = 0.0, max = 1.0))]
    pub frq_weight: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub quant_weight: f64,
    pub score_ranges: ScoreRanges,
    #[validate(nested)]
    pub confidence_thresholds: ConfidenceThresholds,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            frq_weight: 0.7,
            quant_weight: 0.3,
            score_ranges: ScoreRanges::default(),
            confidence_thresholds: ConfidenceThresholds::default(),
        }
    }
}

impl MatchingConfig {
    pub fn with_weights(frq_weight: f64, quant_weight: f64) -> Self {
        Self {
            frq_weight,
            quant_weight,
            ..Self::default()
        }
    }
}

fn config_error(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(message));
    error
}

fn validate_matching_config(config: &MatchingConfig) -> Result<(), ValidationError> {
    if !config.frq_weight.is_finite() || !config.quant_weight.is_finite() {
        return Err(config_error(
            "weights_not_finite",
            "weights must be finite numbers".to_string(),
        ));
    }

    let sum = config.frq_weight + config.quant_weight;
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(config_error(
            "weight_sum",
            format!("frqWeight + quantWeight must equal 1.0, got {:.4}", sum),
        ));
    }

    for (name, range) in ["q1", "q2", "q3"].iter().zip(config.score_ranges.as_array()) {
        if !range.min.is_finite() || !range.max.is_finite() || range.min > range.max {
            return Err(config_error(
                "score_range",
                format!("{} range must satisfy min <= max, got {}..{}", name, range.min, range.max),
            ));
        }
    }

    let thresholds = config.confidence_thresholds;
    if thresholds.medium > thresholds.high {
        return Err(config_error(
            "thresholds",
            format!(
                "medium threshold {} must not exceed high threshold {}",
                thresholds.medium, thresholds.high
            ),
        ));
    }

    Ok(())
}

/// Compatibility of one (left, right) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityScore {
    pub left_id: String,
    pub right_id: String,
    pub frq_score: f64,
    pub quant_score: f64,
    pub final_score: f64,
}

/// Coarse confidence bucket derived from the final score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchScores {
    pub frq: f64,
    pub quant: f64,
    #[serde(rename = "final")]
    pub final_score: f64,
}

/// A selected one-to-one pairing
///
/// `rank` stays `None` and `confidence` is provisional until the match
/// has been enriched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub left_id: String,
    pub right_id: String,
    pub left_name: String,
    pub right_name: String,
    pub scores: MatchScores,
    pub confidence: Confidence,
    pub rank: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceDistribution {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Aggregate statistics over a run's matches
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingStatistics {
    pub total_matches: usize,
    pub avg_final_score: f64,
    pub min_final_score: f64,
    pub max_final_score: f64,
    pub std_dev_final_score: f64,
    pub avg_frq_score: f64,
    pub min_frq_score: f64,
    pub max_frq_score: f64,
    pub avg_quant_score: f64,
    pub min_quant_score: f64,
    pub max_quant_score: f64,
    pub confidence_distribution: ConfidenceDistribution,
}

/// Participant left out of matching by the store, with the reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedParticipant {
    pub id: String,
    pub reason: String,
}

/// Output of a single matching run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingResult {
    pub run_id: uuid::Uuid,
    pub matches: Vec<Match>,
    pub statistics: MatchingStatistics,
    pub config: MatchingConfig,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub unmatched_left: Vec<String>,
    pub unmatched_right: Vec<String>,
    pub excluded_participants: Vec<ExcludedParticipant>,
}

/// Result of scoring one specific pair outside a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairScore {
    pub left_id: String,
    pub right_id: String,
    pub frq_score: f64,
    pub quant_score: f64,
    pub final_score: f64,
    pub confidence: Confidence,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = MatchingConfig::default();
        assert_eq!(config.frq_weight, 0.7);
        assert_eq!(config.quant_weight, 0.3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_weight_sum_rejected() {
        let config = MatchingConfig::with_weights(0.5, 0.6);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_weight_sum_within_tolerance() {
        let config = MatchingConfig::with_weights(0.7005, 0.3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_weight_out_of_range_rejected() {
        let config = MatchingConfig::with_weights(1.5, -0.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut config = MatchingConfig::default();
        config.confidence_thresholds = ConfidenceThresholds { high: 0.5, medium: 0.7 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_score_range_rejected() {
        let mut config = MatchingConfig::default();
        config.score_ranges.q2 = ScoreRange::new(10.0, 1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cohort_tag_normalization() {
        assert_eq!(Cohort::from_tag("Mentee"), Some(Cohort::Seeker));
        assert_eq!(Cohort::from_tag(" provider "), Some(Cohort::Provider));
        assert_eq!(Cohort::from_tag("mentor"), Some(Cohort::Provider));
        assert_eq!(Cohort::from_tag("admin"), None);
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: MatchingConfig =
            serde_json::from_str(r#"{"frqWeight": 0.5, "quantWeight": 0.5}"#).unwrap();
        assert_eq!(config.frq_weight, 0.5);
        assert_eq!(config.score_ranges.q1, ScoreRange::new(1.0, 10.0));
        assert_eq!(config.confidence_thresholds.high, 0.8);
    }

    #[test]
    fn test_match_scores_serialize_final_key() {
        let scores = MatchScores { frq: 0.5, quant: 0.5, final_score: 0.5 };
        let json = serde_json::to_value(scores).unwrap();
        assert!(json.get("final").is_some());
    }
}
