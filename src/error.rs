//! Error taxonomy for the signing core (`spec.md` §7).

use thiserror::Error;

/// Failures a tee-backed [`crate::stream::Stream`] can report.
#[derive(Debug, Error)]
pub enum StreamError {
    /// A read from the body stream, or from a tee branch pulling the
    /// underlying source, returned an error.
    #[error("failed to read request body: {0}")]
    BodyReadFailure(String),

    /// A tee operation required seeking a source that refuses to seek.
    #[error("stream is not seekable")]
    StreamNotSeekable,

    /// A branch seek resolved to a negative absolute position.
    #[error("seek resolved to a negative position")]
    InvalidSeek,
}

/// Everything that can go wrong in [`crate::sign_request`].
#[derive(Debug, Error)]
pub enum SigningError {
    /// Missing/empty request fields, credentials, region, service, or
    /// signing instant; or a malformed pre-supplied `x-amz-content-sha256`.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Propagated from the body stream or its tee branch.
    #[error(transparent)]
    BodyReadFailure(#[from] StreamError),

    /// The hash or HMAC primitive reported failure. Should be unreachable —
    /// `sha2`/`hmac` are infallible for the inputs this crate gives them —
    /// but surfaced defensively per `spec.md` §7 rather than asserted away.
    #[error("internal hash failure: {0}")]
    InternalHashFailure(String),

    /// A header value contains bytes outside `0x09, 0x20-0x7E`; SigV4 is not
    /// defined for binary header values (`spec.md` §4.1).
    #[error("header value is not valid for signing: {0}")]
    EncodingError(String),
}
