//! The string-to-sign builder (`spec.md` §4.3).

use crate::error::SigningError;
use crate::payload_hash::sha256_hex;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// `DateStamp/Region/Service/aws4_request`.
pub fn credential_scope(date_stamp: &str, region: &str, service: &str) -> Result<String, SigningError> {
    if region.is_empty() {
        return Err(SigningError::InvalidArgument("region is empty".into()));
    }
    if service.is_empty() {
        return Err(SigningError::InvalidArgument("service is empty".into()));
    }
    Ok(format!("{date_stamp}/{region}/{service}/aws4_request"))
}

/// Build the four-line string-to-sign.
pub fn build(
    amz_date: &str,
    credential_scope: &str,
    canonical_request: &str,
) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        credential_scope,
        sha256_hex(canonical_request.as_bytes()),
    )
}
