use base64::engine::general_purpose::STANDARD;
use base64::Engine;

const DATA_URI_PREFIX: &str = "data:image/png;base64,";
const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G'];

/// Turn a bare base64 PNG into a data URI.
///
/// Data URIs pass through untouched, and so does anything that is not a
/// base64 PNG (pairing codes in particular).
pub fn normalize_qr_payload(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("data:") {
        return trimmed.to_string();
    }

    match STANDARD.decode(trimmed) {
        Ok(bytes) if bytes.starts_with(PNG_SIGNATURE) => format!("{}{}", DATA_URI_PREFIX, trimmed),
        _ => trimmed.to_string(),
    }
}
