// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use encoding_rs::Encoding;

use crate::error::{AppError, Result};
use crate::models::PortalConfig;

/// Create the HTTP client backing a portal session.
///
/// The cookie store keeps the login cookie between requests.
pub fn create_client(config: &PortalConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .cookie_store(true)
        .build()?;
    Ok(client)
}

/// Look up an encoding by its WHATWG label.
pub fn encoding_for(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| AppError::config(format!("Unknown encoding label '{label}'")))
}

/// Decode a response body with a fixed encoding, ignoring any declared charset.
pub fn decode_body(body: &[u8], encoding: &'static Encoding) -> String {
    let (decoded, _, had_errors) = encoding.decode(body);
    if had_errors {
        log::debug!("Body contained bytes invalid for {}", encoding.name());
    }
    decoded.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_windows_1251() {
        // "Неделя" in windows-1251
        let body = [0xCD, 0xE5, 0xE4, 0xE5, 0xEB, 0xFF];
        let encoding = encoding_for("windows-1251").unwrap();
        assert_eq!(decode_body(&body, encoding), "Неделя");
    }

    #[test]
    fn test_cp1251_alias() {
        assert_eq!(
            encoding_for("cp1251").unwrap(),
            encoding_rs::WINDOWS_1251
        );
    }

    #[test]
    fn test_unknown_label() {
        assert!(encoding_for("not-an-encoding").is_err());
    }
}
