//! Session Keys
//!
//! Opaque anti-cheat token issued by the backend at run start and echoed back
//! with the score. The raw value never reaches the logs; use
//! [`SessionKey::fingerprint`] instead.

use std::fmt;

use serde::{Serialize, Deserialize};

use crate::core::hash::hash_with_domain;

const FINGERPRINT_DOMAIN: &[u8] = b"HURDLE_RUNNER_SESSION_KEY_V1";

/// Backend-issued session key.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    /// Wrap a key. Blank keys are rejected.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Raw key for the submission payload.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short hash of the key, safe to log.
    pub fn fingerprint(&self) -> String {
        let digest = hash_with_domain(FINGERPRINT_DOMAIN, self.0.as_bytes());
        hex::encode(&digest[..6])
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionKey({})", self.fingerprint())
    }
}
