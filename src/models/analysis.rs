use serde::{Deserialize, Serialize};

/// One titled explanation unit of a guided solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PedagogicalStep {
    pub title: String,
    pub explanation: String,
}

impl PedagogicalStep {
    pub fn new(title: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            explanation: explanation.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Lenient parse of a model-provided label (English or Romanian).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "easy" | "ușor" | "usor" | "ușoară" | "usoara" => Some(Self::Easy),
            "medium" | "mediu" | "medie" => Some(Self::Medium),
            "hard" | "dificil" | "dificilă" | "dificila" | "greu" | "grea" => Some(Self::Hard),
            _ => None,
        }
    }
}

/// Structured pedagogical breakdown of a problem.
///
/// `steps` is never empty once it leaves the response parser: degraded results
/// carry a single explanatory step instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PedagogicalAnalysis {
    pub problem_text: String,
    pub steps: Vec<PedagogicalStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_concepts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_estimate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caveats: Option<Vec<String>>,
}

impl PedagogicalAnalysis {
    /// Analysis carrying only steps; every optional field is absent.
    pub fn bare(problem_text: &str, steps: Vec<PedagogicalStep>) -> Self {
        Self {
            problem_text: problem_text.to_string(),
            steps,
            final_answer: None,
            key_concepts: None,
            difficulty: None,
            time_estimate: None,
            caveats: None,
        }
    }
}

/// Outcome of parsing model output. Both variants carry a usable analysis;
/// the tag only records whether the strict JSON contract was honoured.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Valid(PedagogicalAnalysis),
    Degraded(PedagogicalAnalysis),
}

impl ParseOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ParseOutcome::Valid(_))
    }

    pub fn analysis(&self) -> &PedagogicalAnalysis {
        match self {
            ParseOutcome::Valid(a) | ParseOutcome::Degraded(a) => a,
        }
    }

    pub fn into_analysis(self) -> PedagogicalAnalysis {
        match self {
            ParseOutcome::Valid(a) | ParseOutcome::Degraded(a) => a,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub problem_text: Option<String>,
}
