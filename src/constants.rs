// src/constants.rs

// Parser defaults (user-facing, Romanian)
pub const DEFAULT_STEP_TITLE: &str = "Pas fără titlu";
pub const FALLBACK_STEP_TITLE: &str = "Analiză";
pub const DEFAULT_TIME_ESTIMATE: &str = "5-10 minute";
pub const EMPTY_RESPONSE_NOTE: &str = "Modelul nu a returnat niciun conținut care să poată fi analizat.";
pub const PARSE_ERROR_TITLE: &str = "Eroare la procesarea răspunsului";
pub const PARSE_ERROR_EXPLANATION: &str =
    "Răspunsul modelului nu a putut fi interpretat. Te rugăm să încerci din nou.";
pub const ELLIPSIS: &str = "…";

pub const FALLBACK_EXCERPT_CHARS: usize = 200;
pub const MAX_MODEL_RESPONSE_BYTES: usize = 256 * 1024;

pub const DEFAULT_MAX_HINTS: usize = 3;

// OCR
pub const OCR_NOTE: &str =
    "OCR realizat automat. Calitatea recunoașterii formulelor matematice poate varia.";
pub const OCR_FAILED_NOTE: &str =
    "Nu am putut extrage textul din imagine. Încearcă o fotografie mai clară.";
pub const SUPPORTED_IMAGE_PREFIX: &str = "image/";
