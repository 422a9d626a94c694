//! Shared-secret join gate.
//!
//! Comparison is plaintext and exact. This is not an authentication
//! scheme; it only keeps strangers from wandering into a session.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// A shared secret. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::From)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Creates a secret from any string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw secret bytes, for comparison and the wire only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Admits joining peers that present the host's secret.
#[derive(Debug, Clone, Default)]
pub struct SessionGate {
    secret: Option<Secret>,
}

impl SessionGate {
    /// Creates a gate that admits nobody until a secret is set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the secret. Called by the host before it starts accepting peers.
    #[instrument(skip_all)]
    pub fn set_secret(&mut self, secret: impl Into<Secret>) {
        self.secret = Some(secret.into());
        debug!("Session secret installed");
    }

    /// Removes the secret; every later candidate is refused.
    pub fn clear(&mut self) {
        self.secret = None;
    }

    /// Returns `true` once a secret is installed.
    pub fn is_armed(&self) -> bool {
        self.secret.is_some()
    }

    /// Byte-for-byte comparison, no trimming or case folding.
    #[instrument(skip_all)]
    pub fn approve(&self, candidate: &Secret) -> bool {
        let approved = self
            .secret
            .as_ref()
            .is_some_and(|secret| secret.expose().as_bytes() == candidate.expose().as_bytes());
        debug!(approved, "Join candidate checked");
        approved
    }
}
