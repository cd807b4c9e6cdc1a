//! AWS Signature Version 4 (SigV4) signing core.
//!
//! Signs one finished, in-memory-or-single-pass-stream HTTP request at a
//! time with `AWS4-HMAC-SHA256`, writing `Authorization`, `X-Amz-Date`, and
//! (conditionally) `X-Amz-Security-Token`. Streaming/chunked SigV4
//! (`STREAMING-AWS4-HMAC-SHA256-PAYLOAD`), presigned URLs, SigV4a, and
//! server-side verification are out of scope.
//!
//! The request and body-stream types this crate consumes are abstracted
//! behind the [`Request`] and [`Stream`] traits so it never needs to depend
//! on an HTTP crate; see [`OwnedRequest`] and [`CursorStream`] for minimal
//! concrete implementations.
//!
//! ```
//! use sigv4_core::{sign_request, Credentials, OwnedRequest, SigningConfig, SigningInstant};
//!
//! let mut request = OwnedRequest::new("GET", "/")
//!     .with_header("Host", "example.amazonaws.com");
//! let credentials = Credentials::new(
//!     "AKIDEXAMPLE",
//!     "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
//! );
//! let config = SigningConfig { region: "us-east-1", service: "service" };
//! let when = SigningInstant::from_unix_secs(1_440_938_160);
//!
//! sign_request(&mut request, &credentials, &config, when).unwrap();
//! ```

mod canonical;
mod credentials;
mod emitter;
mod error;
mod keys;
mod payload_hash;
mod request;
mod stream;
mod string_to_sign;
mod tee;
mod time;

pub use credentials::Credentials;
pub use error::{SigningError, StreamError};
pub use request::{OwnedRequest, Request};
pub use stream::{is_tee, CursorStream, SeekFrom, Stream, StreamStatus};
pub use tee::{Tee, TeeBranch};
pub use time::SigningInstant;

/// Region and service a request is signed against.
#[derive(Debug, Clone, Copy)]
pub struct SigningConfig<'a> {
    pub region: &'a str,
    pub service: &'a str,
}

/// Sign `request` in place: compute the canonical request, hash the
/// payload, build the string-to-sign, derive the signing key, and append
/// the signing headers.
///
/// On error, `request` is left in its input state, with one exception: if
/// the payload hasher had already installed a tee-backed body before a
/// later stage failed, the tee remains installed (`spec.md` §7) — destroy
/// the request to release it. No partial headers are ever emitted; the
/// header emitter only runs once every earlier stage has succeeded.
pub fn sign_request(
    request: &mut dyn Request,
    credentials: &Credentials<'_>,
    config: &SigningConfig<'_>,
    when: SigningInstant,
) -> Result<(), SigningError> {
    if config.region.is_empty() {
        return Err(SigningError::InvalidArgument("region is empty".into()));
    }
    if config.service.is_empty() {
        return Err(SigningError::InvalidArgument("service is empty".into()));
    }
    if credentials.access_key_id.is_empty() || credentials.secret_access_key.is_empty() {
        return Err(SigningError::InvalidArgument(
            "credentials are missing an access key id or secret".into(),
        ));
    }

    let amz_date = when.amz_date();
    let date_stamp = when.date_stamp();

    tracing::debug!(
        method = %request.method(),
        target = %request.target(),
        date = %amz_date,
        "starting SigV4 signing"
    );

    // §4.2 — payload hash. Runs before canonicalization: it may replace the
    // request's body with a tee-backed branch, but never touches headers.
    let payload_hash = payload_hash::resolve_payload_hash(request)?;

    // X-Amz-Date always participates in signing even though the real
    // header is only written once signing succeeds (stage 5); its value is
    // already fixed by `when`, so it's added here for canonicalization
    // purposes only. X-Amz-Security-Token, by contrast, is signed only if
    // the caller already added it as a real header (`spec.md` §4.5 / S4).
    let mut headers_for_signing = request.headers_in_order().to_vec();
    headers_for_signing.push(("x-amz-date".to_string(), amz_date.clone()));

    // §4.1 — canonicalizer.
    let canonical = canonical::canonicalize(
        request.method(),
        request.target(),
        &headers_for_signing,
        &payload_hash,
    )?;

    // §4.3 — string-to-sign builder.
    let scope = string_to_sign::credential_scope(&date_stamp, config.region, config.service)?;
    let sts = string_to_sign::build(&amz_date, &scope, &canonical.canonical_request);

    // §4.4 — key derivation chain.
    let signing_key = keys::derive_signing_key(
        credentials.secret_access_key,
        &date_stamp,
        config.region,
        config.service,
    )?;

    // §4.5 — header emitter. The only stage that mutates request headers.
    emitter::emit(
        request,
        credentials,
        &signing_key,
        &sts,
        &scope,
        &canonical.signed_headers,
        &amz_date,
    )?;

    tracing::debug!("SigV4 signing complete");
    Ok(())
}
