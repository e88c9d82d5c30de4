use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use super::{Credential, SigningIdentity, TokenSigner};
use crate::error::WeatherError;

/// Single-slot credential cache with proactive renewal.
///
/// The check-then-mint sequence runs under one lock, so concurrent callers
/// never mint twice for the same expiry and never observe a half-written
/// slot. Signing is CPU-bound; the lock is never held across network I/O.
#[derive(Debug)]
pub struct TokenCache {
    refresh_lead: Duration,
    slot: Mutex<Option<Credential>>,
}

impl TokenCache {
    pub fn new(refresh_lead: Duration) -> Self {
        Self { refresh_lead, slot: Mutex::new(None) }
    }

    pub fn refresh_lead(&self) -> Duration {
        self.refresh_lead
    }

    /// Return the cached credential if it is still usable at `now`,
    /// otherwise mint, store and return a new one.
    ///
    /// A signing failure clears the slot before the error is returned.
    pub fn get_valid_token(
        &self,
        signer: &dyn TokenSigner,
        identity: &SigningIdentity,
        now: DateTime<Utc>,
    ) -> Result<Credential, WeatherError> {
        let mut slot = self.slot.lock();

        if let Some(cred) = slot.as_ref() {
            if cred.is_usable(now, self.refresh_lead) {
                tracing::trace!(expires_at = %cred.expires_at, "reusing cached token");
                return Ok(cred.clone());
            }
            tracing::debug!(expires_at = %cred.expires_at, "cached token due for renewal");
        }

        match signer.sign(identity, now) {
            Ok(cred) => {
                tracing::info!(
                    issued_at = %cred.issued_at,
                    expires_at = %cred.expires_at,
                    "issued new API token"
                );
                *slot = Some(cred.clone());
                Ok(cred)
            }
            Err(e) => {
                *slot = None;
                tracing::error!(error = %e, "token signing failed; cache invalidated");
                Err(e)
            }
        }
    }

    /// Current slot contents, without signing.
    pub fn current(&self) -> Option<Credential> {
        self.slot.lock().clone()
    }

    pub fn invalidate(&self) {
        self.slot.lock().take();
    }
}
