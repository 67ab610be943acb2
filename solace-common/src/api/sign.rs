//! Webhook signature verification
//!
//! Inbound tracking webhooks may carry a `sign` header: the lowercase hex
//! SHA-256 digest of the raw request body concatenated with the shared
//! secret. When a secret is configured, the digest must match before the
//! payload is trusted; when no secret is configured, verification is
//! skipped entirely.
//!
//! # Pure Functions
//!
//! This module contains only pure functions. No HTTP framework
//! dependencies - header extraction and rejection live in module-specific
//! code.

use sha2::{Digest, Sha256};

/// Signature verification error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// A secret is configured but the request carried no `sign` header
    MissingSignature,
    /// The provided signature does not match the calculated digest
    InvalidSignature { provided: String },
}

impl std::fmt::Display for SignatureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignatureError::MissingSignature => write!(f, "Missing webhook signature"),
            SignatureError::InvalidSignature { provided } => {
                write!(f, "Invalid webhook signature: {}", provided)
            }
        }
    }
}

impl std::error::Error for SignatureError {}

/// Calculate the expected signature for a raw request body
///
/// Algorithm: SHA-256 over `body || secret`, rendered as 64 lowercase hex
/// characters.
pub fn calculate_signature(body: &[u8], secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Verify a provided signature against the calculated value
///
/// Comparison is constant-time over the full digest length to avoid leaking
/// prefix information.
pub fn verify_signature(
    provided: Option<&str>,
    body: &[u8],
    secret: &str,
) -> Result<(), SignatureError> {
    let provided = provided.ok_or(SignatureError::MissingSignature)?;
    let calculated = calculate_signature(body, secret);

    let provided_lower = provided.trim().to_ascii_lowercase();
    if provided_lower.len() != calculated.len() {
        return Err(SignatureError::InvalidSignature {
            provided: provided.to_string(),
        });
    }

    let mut diff = 0u8;
    for (a, b) in provided_lower.bytes().zip(calculated.bytes()) {
        diff |= a ^ b;
    }
    if diff != 0 {
        return Err(SignatureError::InvalidSignature {
            provided: provided.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_64_hex_chars() {
        let sig = calculate_signature(b"{\"event\":\"TRACKING_UPDATED\"}", "secret-1");
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_same_input_same_signature() {
        let a = calculate_signature(b"payload", "secret");
        let b = calculate_signature(b"payload", "secret");
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_secret_different_signature() {
        let a = calculate_signature(b"payload", "secret-a");
        let b = calculate_signature(b"payload", "secret-b");
        assert_ne!(a, b);
    }

    #[test]
    fn test_valid_signature_accepted() {
        let body = b"{\"data\":{\"number\":\"1Z999AA10123456784\"}}";
        let sig = calculate_signature(body, "shared");
        assert!(verify_signature(Some(&sig), body, "shared").is_ok());
    }

    #[test]
    fn test_uppercase_signature_accepted() {
        let body = b"payload";
        let sig = calculate_signature(body, "shared").to_ascii_uppercase();
        assert!(verify_signature(Some(&sig), body, "shared").is_ok());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let sig = calculate_signature(b"original", "shared");
        let result = verify_signature(Some(&sig), b"tampered", "shared");
        assert!(matches!(result, Err(SignatureError::InvalidSignature { .. })));
    }

    #[test]
    fn test_missing_signature_rejected() {
        let result = verify_signature(None, b"payload", "shared");
        assert_eq!(result, Err(SignatureError::MissingSignature));
    }

    #[test]
    fn test_wrong_length_rejected() {
        let result = verify_signature(Some("abc123"), b"payload", "shared");
        assert!(matches!(result, Err(SignatureError::InvalidSignature { .. })));
    }
}
