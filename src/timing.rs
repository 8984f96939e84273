//! Timing constants for the panel loop and the device link.

use core::time::Duration;

/// Signal poll period.
pub const TICK: Duration = Duration::from_millis(10);

/// Period of the USB keepalive query.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Delay before the first reconnect attempt.
pub const BACKOFF_INITIAL: Duration = Duration::from_millis(250);

/// Upper bound for the doubling reconnect delay.
pub const BACKOFF_MAX: Duration = Duration::from_secs(8);

/// Failed reconnect attempts after which the daemon gives up.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;
