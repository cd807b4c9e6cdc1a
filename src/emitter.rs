//! The header emitter (`spec.md` §4.5).

use crate::credentials::Credentials;
use crate::keys::SigningKey;
use crate::request::Request;

/// Compute the signature and append `Authorization`, `X-Amz-Date`, and
/// (conditionally) `X-Amz-Security-Token` to `request`.
///
/// Headers are appended, never deduplicated — callers must not
/// pre-populate these names.
pub fn emit(
    request: &mut dyn Request,
    credentials: &Credentials<'_>,
    signing_key: &SigningKey,
    string_to_sign: &str,
    credential_scope: &str,
    signed_headers: &str,
    amz_date: &str,
) -> Result<(), crate::error::SigningError> {
    let signature = crate::keys::sign_string(signing_key, string_to_sign)?;

    let authorization = format!(
        "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
        credentials.access_key_id, credential_scope, signed_headers, signature,
    );

    request.add_header("Authorization", &authorization);
    request.add_header("X-Amz-Date", amz_date);
    if let Some(token) = credentials.effective_session_token() {
        request.add_header("X-Amz-Security-Token", token);
    }

    tracing::debug!(signed_headers = %signed_headers, "emitted signing headers");
    Ok(())
}
