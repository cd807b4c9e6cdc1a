//! The key derivation chain (`spec.md` §4.4).
//!
//! Every intermediate HMAC output is wrapped so it zeroizes on drop —
//! including on the error path, since `hmac::Mac::new_from_slice` only
//! fails for key lengths this crate never produces, but `spec.md` §5 still
//! requires zeroization on every exit.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::SigningError;

type HmacSha256 = Hmac<Sha256>;

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Zeroizing<[u8; 32]>, SigningError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| SigningError::InternalHashFailure(e.to_string()))?;
    mac.update(data);
    let bytes: [u8; 32] = mac
        .finalize()
        .into_bytes()
        .as_slice()
        .try_into()
        .map_err(|_| SigningError::InternalHashFailure("HMAC output was not 32 bytes".into()))?;
    Ok(Zeroizing::new(bytes))
}

/// The final per-request signing key (`kSigning`), zeroized on drop.
pub struct SigningKey(Zeroizing<[u8; 32]>);

impl SigningKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Derive the signing key via the four-step HMAC chain.
///
/// `kSecret = "AWS4" || secret`, `kDate = HMAC(kSecret, date)`,
/// `kRegion = HMAC(kDate, region)`, `kService = HMAC(kRegion, service)`,
/// `kSigning = HMAC(kService, "aws4_request")`. Every intermediate is
/// 32 bytes and is zeroized before this function returns, regardless of
/// whether it succeeds.
pub fn derive_signing_key(
    secret_access_key: &str,
    date_stamp: &str,
    region: &str,
    service: &str,
) -> Result<SigningKey, SigningError> {
    let k_secret = Zeroizing::new(format!("AWS4{secret_access_key}"));
    let k_date = hmac_sha256(k_secret.as_bytes(), date_stamp.as_bytes())?;
    drop(k_secret);

    let k_region = hmac_sha256(k_date.as_slice(), region.as_bytes())?;
    drop(k_date);

    let k_service = hmac_sha256(k_region.as_slice(), service.as_bytes())?;
    drop(k_region);

    let k_signing = hmac_sha256(k_service.as_slice(), b"aws4_request")?;
    drop(k_service);

    Ok(SigningKey(k_signing))
}

/// `HMAC(signing_key, string_to_sign)`, lowercase hex.
pub fn sign_string(signing_key: &SigningKey, string_to_sign: &str) -> Result<String, SigningError> {
    let signature = hmac_sha256(signing_key.as_bytes(), string_to_sign.as_bytes())?;
    Ok(hex::encode(signature.as_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_expected_s1_signature() {
        // spec.md S1 — AWS canonical GET, empty body.
        let key = derive_signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20150830",
            "us-east-1",
            "service",
        )
        .unwrap();
        let string_to_sign = "AWS4-HMAC-SHA256\n20150830T123600Z\n20150830/us-east-1/service/aws4_request\nf536975d06c0309214f805bb90ccff089219ecd68b2577efef23edd43b7e1a59";
        let signature = sign_string(&key, string_to_sign).unwrap();
        assert_eq!(
            signature,
            "5d672d79c15b13162d9279b0855cfba6789a8edb4c82c400e06b5924a6f2b5d7"
        );
    }

    #[test]
    fn every_intermediate_is_32_bytes() {
        let key = derive_signing_key("secret", "20150830", "us-east-1", "s3").unwrap();
        assert_eq!(key.as_bytes().len(), 32);
    }
}
