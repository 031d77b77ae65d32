// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time.
//!
//! [`HostTime`] is a point on the compositor's monotonic clock in
//! nanoseconds. Input events carry their own millisecond timestamps from the
//! device; frame callbacks carry a `HostTime` sampled by the backend.

use core::fmt;
use core::ops::Add;
use std::time::{Duration, Instant};

/// A point in time expressed as nanoseconds on a monotonic clock.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Creates a host time from milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Returns the time truncated to milliseconds, wrapped into 32 bits as
    /// client protocols expect.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "protocol timestamps wrap at 32 bits"
    )]
    pub const fn millis_u32(self) -> u32 {
        (self.0 / 1_000_000) as u32
    }

    /// Returns the elapsed time since an earlier instant, or zero.
    #[inline]
    #[must_use]
    pub const fn saturating_since(self, earlier: Self) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    #[expect(
        clippy::cast_possible_truncation,
        reason = "u64 nanoseconds cover centuries of uptime"
    )]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0.saturating_add(rhs.as_nanos() as u64))
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({}ns)", self.0)
    }
}

/// A monotonic clock anchored at its creation.
#[derive(Clone, Copy, Debug)]
pub struct Clock {
    origin: Instant,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    /// Starts a clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Returns the current time on this clock.
    #[must_use]
    pub fn now(&self) -> HostTime {
        HostTime::default() + self.origin.elapsed()
    }
}
