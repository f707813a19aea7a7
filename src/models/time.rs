use serde::{Deserialize, Serialize};
use std::{
    fmt,
    ops::{Add, Index, IndexMut, Neg, Sub},
};

/// Signed duration with millisecond resolution.
///
/// Deltas and corrections are routinely negative, so this is not a
/// `std::time::Duration`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TimeSpan(i64);

impl TimeSpan {
    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * 1_000)
    }

    pub const fn as_millis(self) -> i64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000.0
    }

    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl Add for TimeSpan {
    type Output = TimeSpan;

    fn add(self, rhs: TimeSpan) -> TimeSpan {
        TimeSpan(self.0.saturating_add(rhs.0))
    }
}

impl Sub for TimeSpan {
    type Output = TimeSpan;

    fn sub(self, rhs: TimeSpan) -> TimeSpan {
        TimeSpan(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for TimeSpan {
    type Output = TimeSpan;

    fn neg(self) -> TimeSpan {
        TimeSpan(self.0.saturating_neg())
    }
}

impl From<std::time::Duration> for TimeSpan {
    fn from(duration: std::time::Duration) -> Self {
        TimeSpan(i64::try_from(duration.as_millis()).unwrap_or(i64::MAX))
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum TimingMethod {
    RealTime,
    GameTime,
}

impl Default for TimingMethod {
    fn default() -> Self {
        TimingMethod::RealTime
    }
}

/// A time recorded under both timing methods. Either side may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Time {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_time: Option<TimeSpan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_time: Option<TimeSpan>,
}

impl Time {
    pub const fn new(real_time: Option<TimeSpan>, game_time: Option<TimeSpan>) -> Self {
        Self {
            real_time,
            game_time,
        }
    }

    pub const fn real(real_time: TimeSpan) -> Self {
        Self::new(Some(real_time), None)
    }

    pub fn is_empty(&self) -> bool {
        self.real_time.is_none() && self.game_time.is_none()
    }
}

impl Index<TimingMethod> for Time {
    type Output = Option<TimeSpan>;

    fn index(&self, method: TimingMethod) -> &Option<TimeSpan> {
        match method {
            TimingMethod::RealTime => &self.real_time,
            TimingMethod::GameTime => &self.game_time,
        }
    }
}

impl IndexMut<TimingMethod> for Time {
    fn index_mut(&mut self, method: TimingMethod) -> &mut Option<TimeSpan> {
        match method {
            TimingMethod::RealTime => &mut self.real_time,
            TimingMethod::GameTime => &mut self.game_time,
        }
    }
}
