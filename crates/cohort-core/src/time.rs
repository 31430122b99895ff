//! Wall-clock timestamps in epoch seconds.
//!
//! Every persisted time value (`firstRunTimestamp`, `expireAt`,
//! `lastPromptTimestamp`) is stored in whole seconds since the Unix epoch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds in one study day.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Seconds since the Unix epoch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Construct from epoch seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Epoch seconds.
    pub const fn as_secs(self) -> u64 {
        self.0
    }

    /// Timestamp `days` whole days later, saturating at `u64::MAX`.
    pub fn plus_days(self, days: u32) -> Self {
        Self(self.0.saturating_add(u64::from(days) * SECONDS_PER_DAY))
    }

    /// Timestamp `secs` seconds later, saturating at `u64::MAX`.
    pub fn plus_secs(self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Seconds elapsed since `earlier`, zero if `earlier` is in the future.
    pub fn secs_since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Timestamp {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plus_days_uses_whole_days() {
        let t0 = Timestamp::from_secs(1_000);
        assert_eq!(t0.plus_days(14).as_secs(), 1_000 + 14 * SECONDS_PER_DAY);
    }

    #[test]
    fn secs_since_saturates() {
        let earlier = Timestamp::from_secs(50);
        let later = Timestamp::from_secs(80);
        assert_eq!(later.secs_since(earlier), 30);
        assert_eq!(earlier.secs_since(later), 0);
    }
}
