//! Seeded Random Number Generator
//!
//! Xorshift128+ seeded through SplitMix64. Obstacle variation draws from this
//! generator so a run can be replayed exactly from its seed.

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

/// Deterministic PRNG using the Xorshift128+ algorithm.
///
/// # Example
///
/// ```
/// use hurdle_runner::core::rng::DeterministicRng;
///
/// let mut a = DeterministicRng::new(7);
/// let mut b = DeterministicRng::new(7);
/// assert_eq!(a.next_u64(), b.next_u64());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Create a new RNG from a 64-bit seed.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Xorshift must never sit in the all-zero state
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Create an RNG seeded from a run identifier.
    pub fn for_run(run_id: &[u8; 16]) -> Self {
        Self::new(derive_run_seed(run_id))
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Generate a random integer in range [0, max).
    #[inline]
    pub fn next_int(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        (self.next_u64() % max as u64) as u32
    }

    /// Select a random element from a slice, uniformly.
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        if slice.is_empty() {
            None
        } else {
            let idx = self.next_int(slice.len() as u32) as usize;
            Some(&slice[idx])
        }
    }

    /// Current internal state.
    pub fn state(&self) -> [u64; 2] {
        self.state
    }

    /// Restore a previously saved state.
    pub fn set_state(&mut self, state: [u64; 2]) {
        self.state = state;
    }
}

/// SplitMix64 step, used to spread weak seeds over the full state.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derive an RNG seed from a run id.
pub fn derive_run_seed(run_id: &[u8; 16]) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(b"HURDLE_RUNNER_SEED_V1");
    hasher.update(run_id);
    let hash = hasher.finalize();

    let mut seed = [0u8; 8];
    seed.copy_from_slice(&hash[0..8]);
    u64::from_le_bytes(seed)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_determinism() {
        let mut rng1 = DeterministicRng::new(12345);
        let mut rng2 = DeterministicRng::new(12345);

        for _ in 0..1000 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn test_rng_known_values() {
        // Replays depend on this sequence staying fixed.
        let mut rng = DeterministicRng::new(42);
        assert_eq!(rng.next_u64(), 16629283624882167704);
        assert_eq!(rng.next_u64(), 1420492921613871959);
        assert_eq!(rng.next_u64(), 9768315062676884790);
    }

    #[test]
    fn test_next_int_bounds() {
        let mut rng = DeterministicRng::new(1234);
        for _ in 0..1000 {
            assert!(rng.next_int(3) < 3);
        }
        assert_eq!(rng.next_int(0), 0);
        assert_eq!(rng.next_int(1), 0);
    }

    #[test]
    fn test_choose_covers_all_elements() {
        let mut rng = DeterministicRng::new(99);
        let items = ['s', 'm', 'l'];
        let mut seen = [false; 3];
        for _ in 0..300 {
            let c = rng.choose(&items).copied();
            let idx = items.iter().position(|x| Some(*x) == c);
            if let Some(i) = idx {
                seen[i] = true;
            }
        }
        assert!(seen.iter().all(|s| *s));

        let empty: [char; 0] = [];
        assert!(rng.choose(&empty).is_none());
    }

    #[test]
    fn test_run_seed_differs_per_run() {
        let a = derive_run_seed(&[1; 16]);
        let b = derive_run_seed(&[2; 16]);
        assert_eq!(a, derive_run_seed(&[1; 16]));
        assert_ne!(a, b);
    }

    #[test]
    fn test_state_restore() {
        let mut rng = DeterministicRng::new(5555);
        for _ in 0..50 {
            rng.next_u64();
        }
        let saved = rng.state();
        let expected: Vec<u64> = (0..10).map(|_| rng.next_u64()).collect();

        rng.set_state(saved);
        for value in expected {
            assert_eq!(rng.next_u64(), value);
        }
    }
}
