//! Cryptographic helpers

use hmac::Hmac;
use hmac::Mac;
use hmac::digest::KeyInit;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
#[error("invalid HMAC key length")]
pub struct InvalidKeyError {
    /// priv place holder
    _priv: (),
}

/// Computes HMAC-SHA256 of `data` under `key`.
///
/// # Errors
/// Returns an error if the key is rejected by the MAC implementation.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<[u8; 32], InvalidKeyError> {
    let mut mac = <HmacSha256 as KeyInit>::new_from_slice(key).map_err(|_| InvalidKeyError { _priv: () })?;
    mac.update(data);
    let tag = mac.finalize().into_bytes();
    let mut out = [0u8; 32];
    out.copy_from_slice(tag.as_slice());
    Ok(out)
}

/// Base64 of the HMAC-SHA256 tag, the format of a `sig` value.
///
/// # Errors
/// Returns an error if the key is rejected by the MAC implementation.
pub fn base64_hmac_sha256(key: &[u8], data: &[u8]) -> Result<String, InvalidKeyError> {
    let tag = hmac_sha256(key, data)?;
    Ok(base64_simd::STANDARD.encode_to_string(tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc4231_case_2() {
        let tag = hmac_sha256(b"Jefe", b"what do ya want for nothing?").unwrap();
        let hex: String = tag.iter().map(|b| format!("{b:02x}")).collect();
        assert_eq!(hex, "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843");
    }

    #[test]
    fn base64_tag() {
        let sig = base64_hmac_sha256(b"key", b"The quick brown fox jumps over the lazy dog").unwrap();
        assert_eq!(sig, "97yD9DBThCSxMpjmqm+xQ+9NWaFJRhdZl0edvC0aPNg=");
    }
}
