//! Transmission headers PayPal attaches to every webhook delivery.
//!
//! Verification itself is delegated to PayPal's verify endpoint; this
//! module only extracts and validates the header set.

use serde::{Deserialize, Serialize};

use super::WebhookError;

pub const TRANSMISSION_ID: &str = "paypal-transmission-id";
pub const TRANSMISSION_TIME: &str = "paypal-transmission-time";
pub const CERT_URL: &str = "paypal-cert-url";
pub const AUTH_ALGO: &str = "paypal-auth-algo";
pub const TRANSMISSION_SIG: &str = "paypal-transmission-sig";

/// Signature fields of a single delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransmissionHeaders {
    pub transmission_id: String,
    pub transmission_time: String,
    pub cert_url: String,
    pub auth_algo: String,
    pub transmission_sig: String,
}

impl TransmissionHeaders {
    /// Collects the headers through a case-insensitive lookup.
    ///
    /// Fails with `MissingHeader` on the first absent or empty header.
    pub fn from_lookup<'a, F>(lookup: F) -> Result<Self, WebhookError>
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let get = |name: &'static str| {
            lookup(name)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or(WebhookError::MissingHeader(name))
        };

        Ok(Self {
            transmission_id: get(TRANSMISSION_ID)?,
            transmission_time: get(TRANSMISSION_TIME)?,
            cert_url: get(CERT_URL)?,
            auth_algo: get(AUTH_ALGO)?,
            transmission_sig: get(TRANSMISSION_SIG)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_headers() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (TRANSMISSION_ID, "b2384410-f8d2-11ee-8d53-0b9b8c4f8b0e"),
            (TRANSMISSION_TIME, "2024-01-15T10:30:00Z"),
            (CERT_URL, "https://api.paypal.com/v1/notifications/certs/CERT-360caa42"),
            (AUTH_ALGO, "SHA256withRSA"),
            (TRANSMISSION_SIG, "c2lnbmF0dXJl"),
        ])
    }

    #[test]
    fn collects_all_headers() {
        let headers = full_headers();
        let parsed = TransmissionHeaders::from_lookup(|k| headers.get(k).copied()).unwrap();
        assert_eq!(parsed.auth_algo, "SHA256withRSA");
        assert_eq!(parsed.transmission_sig, "c2lnbmF0dXJl");
    }

    #[test]
    fn missing_header_is_reported_by_name() {
        let mut headers = full_headers();
        headers.remove(CERT_URL);

        let err = TransmissionHeaders::from_lookup(|k| headers.get(k).copied()).unwrap_err();

        assert!(matches!(err, WebhookError::MissingHeader(CERT_URL)));
    }

    #[test]
    fn blank_header_counts_as_missing() {
        let mut headers = full_headers();
        headers.insert(TRANSMISSION_SIG, "   ");

        let err = TransmissionHeaders::from_lookup(|k| headers.get(k).copied()).unwrap_err();

        assert!(matches!(err, WebhookError::MissingHeader(TRANSMISSION_SIG)));
    }
}
