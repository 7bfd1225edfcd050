use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One revealed hint. `step_index` starts at 0 and grows by one per record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintRecord {
    pub step_index: usize,
    pub content: String,
    pub is_final: bool,
    pub revealed_at: DateTime<Utc>,
}

/// What the hint-fetch collaborator returns for a single step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintReply {
    pub content: String,
    #[serde(default, alias = "is_final", skip_serializing_if = "Option::is_none")]
    pub is_final: Option<bool>,
}

impl HintReply {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_final: None,
        }
    }

    pub fn final_hint(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_final: Some(true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HintState {
    Empty,
    Awaiting,
    HasHints,
    Exhausted,
    Error,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintRequest {
    pub problem_text: Option<String>,
    #[serde(default)]
    pub step_index: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HintResponse {
    pub step_index: usize,
    pub content: String,
    pub is_final: bool,
}
