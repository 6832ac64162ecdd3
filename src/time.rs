//! Millisecond timestamps on a wrapping 32-bit tick counter.
//!
//! The scheduler only ever compares instants that are close together, so
//! differences are taken with wrapping arithmetic and read as signed.

use core::ops::Add;

/// A span of time in milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Duration(u32);

impl Duration {
    pub const ZERO: Duration = Duration(0);

    pub const fn from_millis(ms: u32) -> Self {
        Self(ms)
    }

    pub const fn as_millis(self) -> u32 {
        self.0
    }
}

/// A point in time, in milliseconds since boot (wraps after ~49 days).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Instant(u32);

impl Instant {
    pub const fn from_millis(ms: u32) -> Self {
        Self(ms)
    }

    pub const fn as_millis(self) -> u32 {
        self.0
    }

    /// Time elapsed from `earlier` to `self`, across counter wrap.
    pub fn duration_since(self, earlier: Instant) -> Duration {
        Duration(self.0.wrapping_sub(earlier.0))
    }

    /// Signed distance from `now` to `self`; negative once `self` has passed.
    pub(crate) fn remaining_from(self, now: Instant) -> i32 {
        self.0.wrapping_sub(now.0) as i32
    }

    /// `true` once `now` is at or past `self`.
    pub fn is_reached(self, now: Instant) -> bool {
        self.remaining_from(now) <= 0
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Instant {
        Instant(self.0.wrapping_add(rhs.0))
    }
}
