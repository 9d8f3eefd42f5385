//! Webhook signature verification.
//!
//! Signatures arrive as `X-Hub-Signature: sha1=<hex digest>` where the digest is
//! HMAC-SHA1 of the raw body under the shared secret.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha1 = Hmac<Sha1>;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature";

const ALGORITHM: &str = "sha1";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing signature header")]
    Missing,
    #[error("malformed signature: {0}")]
    Malformed(&'static str),
    #[error("invalid secret")]
    InvalidKey,
    #[error("signature mismatch")]
    Mismatch,
}

fn digest(secret: &[u8], body: &[u8]) -> Result<Vec<u8>, SignatureError> {
    let mut mac = HmacSha1::new_from_slice(secret).map_err(|_| SignatureError::InvalidKey)?;
    mac.update(body);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Produce the header value for `body`.
pub fn sign(secret: &[u8], body: &[u8]) -> Result<String, SignatureError> {
    Ok(format!("{}={}", ALGORITHM, hex::encode(digest(secret, body)?)))
}

/// Check a signature header against `body`.
pub fn verify_signature(secret: &[u8], header: Option<&str>, body: &[u8]) -> Result<(), SignatureError> {
    let header = header.ok_or(SignatureError::Missing)?;
    let (algorithm, hash) = header
        .split_once('=')
        .ok_or(SignatureError::Malformed("expected <algorithm>=<digest>"))?;
    if algorithm != ALGORITHM {
        return Err(SignatureError::Malformed("unsupported algorithm"));
    }
    if hash.is_empty() {
        return Err(SignatureError::Malformed("empty digest"));
    }
    let provided = hex::decode(hash).map_err(|_| SignatureError::Malformed("digest is not hex"))?;

    let expected = digest(secret, body)?;
    if bool::from(expected.ct_eq(&provided)) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        // RFC 2202 test case 2.
        let sig = sign(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(sig, "sha1=effcdf6ae5eb2fa2d27416d5f184df9c259a7c79");
    }

    #[test]
    fn test_valid_signature() {
        let body = br#"{"event":"project.datafile_updated"}"#;
        let sig = sign(b"secret", body).unwrap();
        assert_eq!(verify_signature(b"secret", Some(&sig), body), Ok(()));
    }

    #[test]
    fn test_rejections() {
        let body = b"payload";
        let sig = sign(b"secret", body).unwrap();

        assert_eq!(verify_signature(b"secret", None, body), Err(SignatureError::Missing));
        assert_eq!(verify_signature(b"other", Some(&sig), body), Err(SignatureError::Mismatch));
        assert_eq!(verify_signature(b"secret", Some(&sig), b"tampered"), Err(SignatureError::Mismatch));
        assert!(matches!(
            verify_signature(b"secret", Some("sha256=abcd"), body),
            Err(SignatureError::Malformed(_))
        ));
        assert!(matches!(
            verify_signature(b"secret", Some("sha1="), body),
            Err(SignatureError::Malformed(_))
        ));
        assert!(matches!(
            verify_signature(b"secret", Some("sha1=zz"), body),
            Err(SignatureError::Malformed(_))
        ));
        assert!(matches!(
            verify_signature(b"secret", Some("nodelimiter"), body),
            Err(SignatureError::Malformed(_))
        ));
        // Truncated digest fails without panicking.
        assert_eq!(
            verify_signature(b"secret", Some(&sig[..13]), body),
            Err(SignatureError::Mismatch)
        );
    }
}
