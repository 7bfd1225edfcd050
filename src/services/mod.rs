mod ocr;
pub use ocr::*;

pub mod ai_parser;
pub mod ai_tutor;
pub mod hints;
pub mod latex;
pub mod normalizer;
pub mod retry;
pub mod symbols;

pub use ai_parser::{PedagogicalResponseParser, parse_model_response};
pub use ai_tutor::{LanguageModel, Tutor};
pub use hints::{HintProvider, HintSession};
pub use latex::LatexFormatter;
pub use normalizer::MathTextNormalizer;
pub use symbols::{SymbolCorrector, SymbolTable};

use crate::models::NormalizedExpression;

/// Clean raw OCR text and derive its display form. Total: never fails.
pub fn normalize_ocr_text(table: &SymbolTable, raw_text: &str) -> NormalizedExpression {
    let cleaned_text = MathTextNormalizer::new(table).normalize(raw_text);
    let latex = LatexFormatter::new().to_display_form(&cleaned_text);
    NormalizedExpression { cleaned_text, latex }
}
