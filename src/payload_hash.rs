//! The payload hasher (`spec.md` §4.2).

use sha2::{Digest, Sha256};

use crate::error::{SigningError, StreamError};
use crate::request::Request;
use crate::stream::{self, Stream};
use crate::tee::Tee;

/// SHA-256 of the empty byte sequence, lowercase hex.
pub const EMPTY_BODY_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Compute SHA-256 of `data` and return the lowercase hex string.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn is_well_formed_sha256_hex(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Find a case-insensitive `x-amz-content-sha256` header, if present.
fn find_precomputed_hash(headers: &[(String, String)]) -> Option<&str> {
    headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("x-amz-content-sha256"))
        .map(|(_, value)| value.as_str())
}

/// Resolve the payload hash for signing, per `spec.md` §4.2's three-way
/// policy. On the tee-and-drain path, replaces `request`'s body with a tee
/// branch so the transport layer can still read it from offset zero
/// afterward.
pub fn resolve_payload_hash(request: &mut dyn Request) -> Result<String, SigningError> {
    if let Some(precomputed) = find_precomputed_hash(request.headers_in_order()) {
        if !is_well_formed_sha256_hex(precomputed) {
            return Err(SigningError::InvalidArgument(format!(
                "x-amz-content-sha256 header is not 64 lowercase hex digits: {precomputed}"
            )));
        }
        tracing::debug!("using caller-supplied x-amz-content-sha256 verbatim");
        return Ok(precomputed.to_string());
    }

    let Some(body) = request.take_body() else {
        tracing::debug!("no request body; using empty-string payload hash");
        return Ok(EMPTY_BODY_SHA256.to_string());
    };

    // Avoid double-wrapping a body that's already tee-backed: reuse it and
    // just open one more branch for hashing.
    let hashing_branch = match body.try_new_branch() {
        Some(fresh_branch) => {
            request.set_body(body);
            fresh_branch
        }
        None => {
            let tee = Tee::wrap(body);
            request.set_body(Box::new(tee.new_branch()));
            Box::new(tee.new_branch())
        }
    };

    Ok(drain_and_hash(hashing_branch)?)
}

fn drain_and_hash(mut branch: Box<dyn Stream>) -> Result<String, StreamError> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8 * 1024];
    loop {
        let n = branch.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    // The branch used for hashing is local to this function and is
    // dropped here — the signer opens exactly one branch for hashing and
    // closes it before returning, per `spec.md` §5.
    drop(branch);
    Ok(hex::encode(hasher.finalize()))
}
