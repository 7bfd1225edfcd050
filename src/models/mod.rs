mod analysis;
mod hint;
mod ocr;

pub use analysis::*;
pub use hint::*;
pub use ocr::*;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub time: DateTime<Utc>,
    pub model: &'static str,
    pub ocr: &'static str,
}
