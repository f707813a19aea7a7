use serde::{Deserialize, Serialize};

use crate::models::TimeSpan;
use crate::prediction::DisplayValue;

/// Placeholder for a missing time.
pub const DASH: &str = "-";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Accuracy {
    Seconds,
    Tenths,
    Hundredths,
}

impl Default for Accuracy {
    fn default() -> Self {
        Accuracy::Hundredths
    }
}

impl Accuracy {
    fn fraction(self, millis: u64) -> String {
        match self {
            Accuracy::Seconds => String::new(),
            Accuracy::Tenths => format!(".{}", millis / 100),
            Accuracy::Hundredths => format!(".{:02}", millis / 10),
        }
    }
}

struct Parts {
    negative: bool,
    hours: u64,
    minutes: u64,
    seconds: u64,
    millis: u64,
}

impl Parts {
    fn of(time: TimeSpan) -> Self {
        let total = time.as_millis();
        let abs = total.unsigned_abs();
        Self {
            negative: total < 0,
            hours: abs / 3_600_000,
            minutes: abs / 60_000 % 60,
            seconds: abs / 1_000 % 60,
            millis: abs % 1_000,
        }
    }
}

/// Absolute times: `h:mm:ss.ff` past an hour, `m:ss.ff` below.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitTimeFormatter {
    pub accuracy: Accuracy,
}

impl SplitTimeFormatter {
    pub fn new(accuracy: Accuracy) -> Self {
        Self { accuracy }
    }

    pub fn format(&self, time: Option<TimeSpan>) -> String {
        let Some(time) = time else {
            return DASH.to_string();
        };
        let parts = Parts::of(time);
        let sign = if parts.negative { "-" } else { "" };
        let fraction = self.accuracy.fraction(parts.millis);

        if parts.hours > 0 {
            format!(
                "{sign}{}:{:02}:{:02}{fraction}",
                parts.hours, parts.minutes, parts.seconds
            )
        } else {
            format!("{sign}{}:{:02}{fraction}", parts.minutes, parts.seconds)
        }
    }
}

/// Signed differences: `+1:02:03`, `-4:05`, `+3.2`.
#[derive(Debug, Clone, Copy)]
pub struct DeltaFormatter {
    pub accuracy: Accuracy,
    /// Omit the fraction once the delta reaches a minute.
    pub drop_decimals: bool,
}

impl Default for DeltaFormatter {
    fn default() -> Self {
        Self {
            accuracy: Accuracy::Tenths,
            drop_decimals: true,
        }
    }
}

impl DeltaFormatter {
    pub fn format(&self, delta: Option<TimeSpan>) -> String {
        let Some(delta) = delta else {
            return DASH.to_string();
        };
        let parts = Parts::of(delta);
        let sign = if parts.negative { "-" } else { "+" };
        let long = parts.hours > 0 || parts.minutes > 0;
        let fraction = if long && self.drop_decimals {
            String::new()
        } else {
            self.accuracy.fraction(parts.millis)
        };

        if parts.hours > 0 {
            format!(
                "{sign}{}:{:02}:{:02}{fraction}",
                parts.hours, parts.minutes, parts.seconds
            )
        } else if parts.minutes > 0 {
            format!("{sign}{}:{:02}{fraction}", parts.minutes, parts.seconds)
        } else {
            format!("{sign}{}{fraction}", parts.seconds)
        }
    }
}

/// Text for one tracker result; empty when there is nothing to show.
pub fn render(value: &DisplayValue, split: &SplitTimeFormatter, delta: &DeltaFormatter) -> String {
    match *value {
        DisplayValue::None => String::new(),
        DisplayValue::RawPrediction { value } => split.format(Some(value)),
        DisplayValue::CorrectedPrediction { correction, value } => format!(
            "({}) {}",
            delta.format(Some(correction)),
            split.format(Some(value))
        ),
    }
}
