use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::MatchingConfig;

/// Request to run a full matching pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunMatchingRequest {
    #[serde(default)]
    pub config: Option<MatchingConfig>,
}

/// Request to score a single pair of participants
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScorePairRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "left_id", rename = "leftId")]
    pub left_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "right_id", rename = "rightId")]
    pub right_id: String,
    #[serde(default)]
    pub config: Option<MatchingConfig>,
}
