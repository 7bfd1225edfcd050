use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, HttpResponse, web};

use crate::constants::{OCR_FAILED_NOTE, OCR_NOTE, SUPPORTED_IMAGE_PREFIX};
use crate::error::{AppError, AppResult};
use crate::models::OcrResponse;
use crate::services::{OcrProvider, SymbolTable, normalize_ocr_text};

/// `POST /api/ocr/upload`: raw image body, `Content-Type: image/*`.
pub async fn upload_image(
    req: HttpRequest,
    body: web::Bytes,
    ocr: web::Data<dyn OcrProvider>,
    symbols: web::Data<SymbolTable>,
) -> AppResult<HttpResponse> {
    let mime = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !mime.starts_with(SUPPORTED_IMAGE_PREFIX) {
        return Err(AppError::BadRequest("Fișierul trebuie să fie o imagine.".to_string()));
    }
    if body.is_empty() {
        return Err(AppError::BadRequest("Lipsește imaginea din cerere.".to_string()));
    }

    log::info!("📷 OCR upload: {} bytes ({}) via {}", body.len(), mime, ocr.provider_id());
    let raw = ocr.recognize(&body, &mime).await?;

    let normalized = normalize_ocr_text(&symbols, &raw.text);
    let note = if raw.error_message.is_some() || raw.text.is_empty() {
        log::warn!("⚠️ OCR returned no usable text: {:?}", raw.error_message);
        OCR_FAILED_NOTE
    } else {
        OCR_NOTE
    };

    Ok(HttpResponse::Ok().json(OcrResponse {
        raw,
        normalized,
        note: note.to_string(),
    }))
}
