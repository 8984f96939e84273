//! Device link state and reconnect backoff.
//!
//! Purely time-driven: the caller passes `now` as an offset from its own
//! epoch, so the schedule is testable without a clock. After the link is
//! lost the first attempt is due [`BACKOFF_INITIAL`] later; every failed
//! attempt doubles the wait up to [`BACKOFF_MAX`]. The
//! [`MAX_RECONNECT_ATTEMPTS`]th failure exhausts the link.

use core::time::Duration;

use thiserror::Error;

use crate::timing::{BACKOFF_INITIAL, BACKOFF_MAX, MAX_RECONNECT_ATTEMPTS};

/// All reconnect attempts failed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("deck did not come back after {attempts} reconnect attempts")]
pub struct Exhausted {
    pub attempts: u32,
}

/// Wait before the attempt that follows `failures` failed attempts.
pub fn backoff_delay(failures: u32) -> Duration {
    let factor = 1u32.checked_shl(failures).unwrap_or(u32::MAX);
    BACKOFF_INITIAL.saturating_mul(factor).min(BACKOFF_MAX)
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Link {
    #[default]
    Up,
    Down {
        failures: u32,
        retry_at: Duration,
    },
}

impl Link {
    #[inline]
    pub fn is_up(&self) -> bool { matches!(self, Self::Up) }

    /// The transport failed at `now`. No-op while already down.
    pub fn lost(
        &mut self,
        now: Duration,
    ) {
        if self.is_up() {
            tracing::warn!("deck link lost, reconnecting");
            *self = Self::Down {
                failures: 0,
                retry_at: now + backoff_delay(0),
            };
        }
    }

    /// Whether a reconnect attempt should be made at `now`.
    pub fn due(
        &self,
        now: Duration,
    ) -> bool {
        match self {
            Self::Up => false,
            Self::Down { retry_at, .. } => now >= *retry_at,
        }
    }

    /// Record a failed reconnect attempt made at `now`.
    pub fn failed(
        &mut self,
        now: Duration,
    ) -> Result<(), Exhausted> {
        let Self::Down { failures, retry_at } = self else {
            return Ok(());
        };
        *failures += 1;
        if *failures >= MAX_RECONNECT_ATTEMPTS {
            return Err(Exhausted {
                attempts: *failures,
            });
        }
        *retry_at = now + backoff_delay(*failures);
        tracing::debug!("reconnect attempt {} failed, next in {:?}", failures, backoff_delay(*failures));
        Ok(())
    }

    pub fn restored(&mut self) {
        if !self.is_up() {
            tracing::info!("deck link restored");
        }
        *self = Self::Up;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
