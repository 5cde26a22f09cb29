//! Evidence Hashing
//!
//! Deterministic SHA-256 over run evidence. The digest of the event log is
//! sent alongside a score submission so the backend can detect a payload
//! whose events were edited after the fact.

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type EvidenceHash = [u8; 32];

/// Domain-separated SHA-256 hasher with fixed-width integer helpers.
///
/// Order of updates is part of the digest.
pub struct EvidenceHasher {
    hasher: Sha256,
}

impl EvidenceHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for a run's event log.
    pub fn for_event_log() -> Self {
        Self::new(b"HURDLE_RUNNER_EVENTS_V1")
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a length-prefixed string.
    #[inline]
    pub fn update_str(&mut self, value: &str) {
        self.update_u64(value.len() as u64);
        self.hasher.update(value.as_bytes());
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a UUID (16 bytes).
    #[inline]
    pub fn update_uuid(&mut self, uuid: &[u8; 16]) {
        self.hasher.update(uuid);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> EvidenceHash {
        self.hasher.finalize().into()
    }
}

/// Compute hash with domain separator.
pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> EvidenceHash {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(data);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hasher_determinism() {
        let make_hash = || {
            let mut hasher = EvidenceHasher::for_event_log();
            hasher.update_u64(100);
            hasher.update_str("jump");
            hasher.update_u8(2);
            hasher.finalize()
        };
        assert_eq!(make_hash(), make_hash());
    }

    #[test]
    fn test_hash_order_matters() {
        let hash1 = {
            let mut h = EvidenceHasher::new(b"test");
            h.update_u64(1);
            h.update_u64(2);
            h.finalize()
        };
        let hash2 = {
            let mut h = EvidenceHasher::new(b"test");
            h.update_u64(2);
            h.update_u64(1);
            h.finalize()
        };
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_string_length_prefix() {
        // "ab" + "c" must not collide with "a" + "bc"
        let a = {
            let mut h = EvidenceHasher::new(b"t");
            h.update_str("ab");
            h.update_str("c");
            h.finalize()
        };
        let b = {
            let mut h = EvidenceHasher::new(b"t");
            h.update_str("a");
            h.update_str("bc");
            h.finalize()
        };
        assert_ne!(a, b);
    }

    #[test]
    fn test_domain_separation() {
        let data = [1u8, 2, 3, 4];
        assert_ne!(hash_with_domain(b"DOMAIN_A", &data), hash_with_domain(b"DOMAIN_B", &data));
    }
}
