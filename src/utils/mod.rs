use base64::{Engine as _, engine::general_purpose};

/// `data:` URL for an in-memory image; unknown MIME types are sent as PNG.
pub fn to_data_url(image: &[u8], mime_hint: &str) -> String {
    let mime = if mime_hint.starts_with("image/") {
        mime_hint
    } else {
        "image/png"
    };
    format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(image))
}
