pub mod health;
pub mod ocr;
pub mod tutor;

pub use health::*;
pub use ocr::*;
pub use tutor::*;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::config::Config;
    use crate::server::AppServices;
    use crate::services::ai_tutor::StubModel;
    use crate::services::{OcrProvider, SymbolTable, Tutor};

    /// Stub model, default tables, and the given OCR provider.
    pub fn services_with_ocr(ocr: Arc<dyn OcrProvider>) -> AppServices {
        AppServices::new(
            Config::default(),
            Tutor::new(Arc::new(StubModel)),
            ocr,
            SymbolTable::default(),
        )
    }
}
