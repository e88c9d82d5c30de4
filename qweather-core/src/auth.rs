//! Bearer-token authentication against the QWeather API.
//!
//! A single [`SigningIdentity`] is loaded at startup. [`TokenSigner`]
//! implementations turn it into short-lived [`Credential`]s, and the
//! [`TokenCache`] decides when a cached credential can be reused.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

pub mod cache;
pub mod signer;

pub use cache::TokenCache;
pub use signer::{EdDsaSigner, TokenSigner};

/// Private key plus the identity claims the provider expects.
#[derive(Clone)]
pub struct SigningIdentity {
    private_key: String,
    pub key_id: String,
    pub subject: String,
}

impl SigningIdentity {
    /// PEM strings stored in env vars or single-line TOML often carry a
    /// literal `\n` instead of newlines; both forms are accepted.
    pub fn new(private_key: &str, key_id: impl Into<String>, subject: impl Into<String>) -> Self {
        let private_key = private_key.replace("\\n", "\n").trim().to_string();

        Self {
            private_key,
            key_id: key_id.into(),
            subject: subject.into(),
        }
    }

    pub(crate) fn private_key_pem(&self) -> &[u8] {
        self.private_key.as_bytes()
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("private_key", &"<redacted>")
            .field("key_id", &self.key_id)
            .field("subject", &self.subject)
            .finish()
    }
}

/// A signed, time-bounded bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Whether the token may still be sent at `now`, keeping `refresh_lead`
    /// in reserve before the provider-side expiry.
    pub fn is_usable(&self, now: DateTime<Utc>, refresh_lead: Duration) -> bool {
        now < self.expires_at - refresh_lead
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
