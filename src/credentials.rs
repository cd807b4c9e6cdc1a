//! AWS credentials, borrowed for the lifetime of one [`crate::sign_request`] call.

/// AWS credentials used to compute a signature.
///
/// The core never retains these past `sign_request` returns (`spec.md` §3) —
/// it borrows them, derives a signing key, uses it once, and zeroizes the
/// derived key material. The secret itself is never copied into any emitted
/// header; only `access_key_id` and `session_token` are.
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    /// Non-empty ASCII access key id.
    pub access_key_id: &'a str,
    /// Non-empty secret access key.
    pub secret_access_key: &'a str,
    /// Session token for temporary credentials (STS / AssumeRole / IRSA).
    pub session_token: Option<&'a str>,
}

impl<'a> Credentials<'a> {
    pub fn new(access_key_id: &'a str, secret_access_key: &'a str) -> Self {
        Self {
            access_key_id,
            secret_access_key,
            session_token: None,
        }
    }

    pub fn with_session_token(mut self, token: &'a str) -> Self {
        self.session_token = Some(token);
        self
    }

    /// A session token is only meaningful when non-empty; the emitter treats
    /// `Some("")` the same as `None` (`spec.md` §4.5).
    pub(crate) fn effective_session_token(&self) -> Option<&'a str> {
        self.session_token.filter(|t| !t.is_empty())
    }
}
