//! Transaction ID Generator.
//!
//! Produces a 64-hex-character `svTRID` that is process-unique with
//! overwhelming probability: a SHA-256 digest (32 bytes, exactly 64 hex
//! characters) of a monotonically increasing counter — seeded at the
//! wall-clock epoch second so two process starts never reuse the same
//! counter value — concatenated with 32 bytes of OS randomness. The counter
//! alone would already make collisions within a year of continuous
//! operation effectively impossible; the random bytes guard against a
//! system clock that has been rolled backwards.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Generates process-unique `svTRID` values.
///
/// Shared across every connection's dispatcher; the counter is advanced with
/// [`Ordering::Relaxed`] since callers only need uniqueness, not ordering,
/// between concurrently issued IDs.
#[derive(Debug)]
pub struct TridGenerator {
    counter: AtomicU64,
}

impl TridGenerator {
    /// Build a generator whose counter starts at the current wall-clock
    /// epoch second.
    #[must_use]
    pub fn new() -> Self {
        let seed = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs());
        Self { counter: AtomicU64::new(seed) }
    }

    /// Produce the next transaction ID: 64 lowercase hex characters.
    #[must_use]
    pub fn next_id(&self) -> String {
        let counter = self.counter.fetch_add(1, Ordering::Relaxed);

        let mut random = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut random);

        let mut hasher = Sha256::new();
        hasher.update(counter.to_be_bytes());
        hasher.update([0u8]);
        hasher.update(random);
        let digest = hasher.finalize();

        digest.iter().map(|byte| format!("{byte:02x}")).collect()
    }
}

impl Default for TridGenerator {
    fn default() -> Self { Self::new() }
}
