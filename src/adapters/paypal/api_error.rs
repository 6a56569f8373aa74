//! Parsing of PayPal error bodies into `PayPalApiError`.

use serde::Deserialize;

use crate::ports::{ApiErrorDetail, ApiLink, PayPalApiError};

/// Union of the REST error shape and the OAuth error shape.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    name: Option<String>,
    message: Option<String>,
    debug_id: Option<String>,
    #[serde(default)]
    details: Vec<ApiErrorDetail>,
    #[serde(default)]
    links: Vec<ApiLink>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Builds a structured error from a non-2xx status and its raw body.
///
/// Bodies that are not JSON keep the status as the name and the body text
/// as the message.
pub fn parse_error(status: u16, debug_id_header: Option<&str>, body: &str) -> PayPalApiError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let name = parsed
        .name
        .or(parsed.error)
        .unwrap_or_else(|| format!("HTTP_{}", status));
    let message = parsed
        .message
        .or(parsed.error_description)
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no response body".to_string()
            } else {
                trimmed.chars().take(500).collect()
            }
        });

    PayPalApiError {
        status,
        name,
        message,
        debug_id: parsed.debug_id.or_else(|| debug_id_header.map(str::to_string)),
        details: parsed.details,
        links: parsed.links,
    }
}
