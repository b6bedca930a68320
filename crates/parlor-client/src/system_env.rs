//! Production Environment implementation using system time and RNG.
//!
//! Time comes from `std::time::Instant`, randomness from the OS (getrandom).
//! Behavior is therefore not reproducible; use the harness `SimEnv` for
//! that.

use parlor_core::Environment;

/// Production environment using the monotonic clock and OS randomness.
///
/// Randomness only feeds reconnect jitter. If the OS RNG fails the buffer is
/// left zeroed, which degrades jitter to its fixed half.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        if let Err(err) = getrandom::fill(buffer) {
            tracing::warn!(%err, "OS RNG unavailable, jitter disabled");
            buffer.fill(0);
        }
    }
}
