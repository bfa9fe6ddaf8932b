//! Time-based one-time code derivation for the two-factor challenge.

use std::time::{SystemTime, UNIX_EPOCH};

use totp_rs::{Algorithm, Secret, TOTP};

use crate::core::error::{AppError, Result};

/// Derives the 6-digit, 30-second-window TOTP code for `secret` at the
/// given time.
///
/// The secret is the provider-issued base32 string. Provider secrets
/// are commonly 80 bits, below the RFC 4226 minimum that `TOTP::new`
/// enforces, hence the unchecked constructor after explicit base32
/// validation.
pub fn generate(secret: &str, at: SystemTime) -> Result<String> {
    let cleaned: String = secret.chars().filter(|c| !c.is_whitespace()).collect();

    let bytes = Secret::Encoded(cleaned)
        .to_bytes()
        .map_err(|e| AppError::InvalidSecret(format!("{:?}", e)))?;

    let totp = TOTP::new_unchecked(Algorithm::SHA1, 6, 1, 30, bytes);

    let unix = at
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Initialization(format!("System clock before epoch: {}", e)))?
        .as_secs();

    Ok(totp.generate(unix))
}

/// Derives the code for the current system time.
pub fn generate_now(secret: &str) -> Result<String> {
    generate(secret, SystemTime::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    // RFC 6238 SHA-1 test secret "12345678901234567890" in base32.
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn matches_rfc_vector() {
        let at = UNIX_EPOCH + Duration::from_secs(59);
        assert_eq!(generate(RFC_SECRET, at).unwrap(), "287082");
    }

    #[test]
    fn stable_within_window() {
        let a = generate(RFC_SECRET, UNIX_EPOCH + Duration::from_secs(30)).unwrap();
        let b = generate(RFC_SECRET, UNIX_EPOCH + Duration::from_secs(59)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn changes_across_windows() {
        let a = generate(RFC_SECRET, UNIX_EPOCH + Duration::from_secs(59)).unwrap();
        let b = generate(RFC_SECRET, UNIX_EPOCH + Duration::from_secs(60)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn whitespace_in_secret_is_tolerated() {
        let spaced = "GEZD GNBV GY3T QOJQ GEZD GNBV GY3T QOJQ";
        let at = UNIX_EPOCH + Duration::from_secs(59);
        assert_eq!(generate(spaced, at).unwrap(), "287082");
    }

    #[test]
    fn invalid_base32_is_rejected() {
        let result = generate("not!valid!base32!", SystemTime::now());
        assert!(matches!(result, Err(AppError::InvalidSecret(_))));
    }

    #[test]
    fn code_is_six_digits() {
        let code = generate_now(RFC_SECRET).unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }
}
