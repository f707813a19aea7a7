use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Run, Time, TimeSpan, TimingMethod};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
    Ended,
}

impl Default for TimerPhase {
    fn default() -> Self {
        TimerPhase::Idle
    }
}

impl TimerPhase {
    pub fn is_active(self) -> bool {
        matches!(self, TimerPhase::Running | TimerPhase::Paused)
    }
}

/// The host timer: a run plus the progress of the current attempt.
///
/// Time is driven by explicit clock readings rather than `Instant`s so that a
/// replay can run faster than wall time and tests stay deterministic.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub phase: TimerPhase,
    pub run: Run,
    /// `None` while idle; equals the segment count once ended.
    pub current_split_index: Option<usize>,
    pub current_comparison: String,
    pub timing_method: TimingMethod,
    pub attempt_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    /// Attempt time accumulated before the current running window.
    #[serde(skip)]
    time_baseline: TimeSpan,
    /// Clock reading at which the current running window began.
    #[serde(skip)]
    running_since: Option<TimeSpan>,
    /// Frozen attempt time once paused or ended.
    #[serde(skip)]
    stopped_time: TimeSpan,
}

impl TimerState {
    pub fn new(run: Run) -> Result<Self> {
        run.validate()?;
        let current_comparison = run
            .comparisons
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("run has no comparisons"))?;

        Ok(Self {
            phase: TimerPhase::Idle,
            run,
            current_split_index: None,
            current_comparison,
            timing_method: TimingMethod::RealTime,
            attempt_id: None,
            started_at: None,
            time_baseline: TimeSpan::zero(),
            running_since: None,
            stopped_time: TimeSpan::zero(),
        })
    }

    /// Attempt time at `clock`. Game time is never tracked by this timer.
    pub fn current_time(&self, clock: TimeSpan) -> Time {
        let real = match (self.phase, self.running_since) {
            (TimerPhase::Idle, _) => TimeSpan::zero(),
            (TimerPhase::Running, Some(since)) => self.time_baseline + (clock - since),
            _ => self.stopped_time,
        };
        Time::new(Some(real), None)
    }

    pub fn start(&mut self, clock: TimeSpan) -> Result<()> {
        if self.phase != TimerPhase::Idle {
            bail!("timer already active");
        }
        self.run.clear_split_times();
        self.phase = TimerPhase::Running;
        self.current_split_index = Some(0);
        self.attempt_id = Some(Uuid::new_v4().to_string());
        self.started_at = Some(Utc::now());
        self.time_baseline = TimeSpan::zero();
        self.running_since = Some(clock);
        self.stopped_time = TimeSpan::zero();
        Ok(())
    }

    pub fn split(&mut self, clock: TimeSpan) -> Result<()> {
        if self.phase != TimerPhase::Running {
            bail!("cannot split while {:?}", self.phase);
        }
        let index = self.active_index()?;
        let now = self.current_time(clock);
        self.run.segments[index].split_time = now;
        self.current_split_index = Some(index + 1);

        if index + 1 == self.run.len() {
            self.stopped_time = now.real_time.unwrap_or_default();
            self.running_since = None;
            self.phase = TimerPhase::Ended;
        }
        Ok(())
    }

    pub fn skip_split(&mut self) -> Result<()> {
        if !self.phase.is_active() {
            bail!("cannot skip a split while {:?}", self.phase);
        }
        let index = self.active_index()?;
        if index + 1 >= self.run.len() {
            bail!("cannot skip the final split");
        }
        self.run.segments[index].split_time = Time::default();
        self.current_split_index = Some(index + 1);
        Ok(())
    }

    pub fn undo_split(&mut self, clock: TimeSpan) -> Result<()> {
        let index = match (self.phase, self.current_split_index) {
            (TimerPhase::Idle, _) | (_, None) => bail!("no attempt in progress"),
            (_, Some(0)) => bail!("nothing to undo"),
            (_, Some(index)) => index,
        };

        if self.phase == TimerPhase::Ended {
            // Resume the clock from where the attempt stopped.
            self.time_baseline = self.stopped_time;
            self.running_since = Some(clock);
            self.phase = TimerPhase::Running;
        }

        self.current_split_index = Some(index - 1);
        self.run.segments[index - 1].split_time = Time::default();
        Ok(())
    }

    pub fn pause(&mut self, clock: TimeSpan) -> Result<()> {
        if self.phase != TimerPhase::Running {
            bail!("cannot pause while {:?}", self.phase);
        }
        self.stopped_time = self.current_time(clock).real_time.unwrap_or_default();
        self.running_since = None;
        self.phase = TimerPhase::Paused;
        Ok(())
    }

    pub fn resume(&mut self, clock: TimeSpan) -> Result<()> {
        if self.phase != TimerPhase::Paused {
            bail!("cannot resume while {:?}", self.phase);
        }
        self.time_baseline = self.stopped_time;
        self.running_since = Some(clock);
        self.phase = TimerPhase::Running;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.run.clear_split_times();
        self.phase = TimerPhase::Idle;
        self.current_split_index = None;
        self.attempt_id = None;
        self.started_at = None;
        self.time_baseline = TimeSpan::zero();
        self.running_since = None;
        self.stopped_time = TimeSpan::zero();
    }

    pub fn switch_comparison(&mut self, comparison: &str) -> Result<()> {
        if !self.run.contains_comparison(comparison) {
            bail!("unknown comparison '{comparison}'");
        }
        self.current_comparison = comparison.to_string();
        Ok(())
    }

    pub fn set_timing_method(&mut self, method: TimingMethod) {
        self.timing_method = method;
    }

    pub fn rename_comparison(&mut self, old: &str, new: &str) -> Result<bool> {
        let renamed = self.run.rename_comparison(old, new)?;
        if renamed && self.current_comparison == old {
            self.current_comparison = new.to_string();
        }
        Ok(renamed)
    }

    fn active_index(&self) -> Result<usize> {
        self.current_split_index
            .filter(|&index| index < self.run.len())
            .ok_or_else(|| anyhow!("no current split"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Segment, PERSONAL_BEST_COMPARISON};

    fn secs(value: i64) -> TimeSpan {
        TimeSpan::from_secs(value)
    }

    fn timer() -> TimerState {
        let run = Run::new(vec![
            Segment::new("A").with_comparison(PERSONAL_BEST_COMPARISON, Time::real(secs(10))),
            Segment::new("B").with_comparison(PERSONAL_BEST_COMPARISON, Time::real(secs(20))),
        ]);
        TimerState::new(run).unwrap()
    }

    #[test]
    fn splits_record_attempt_time() {
        let mut timer = timer();
        timer.start(secs(100)).unwrap();
        assert!(timer.attempt_id.is_some());
        timer.split(secs(112)).unwrap();
        assert_eq!(timer.run.segments[0].split_time, Time::real(secs(12)));
        assert_eq!(timer.current_split_index, Some(1));

        timer.split(secs(121)).unwrap();
        assert_eq!(timer.phase, TimerPhase::Ended);
        assert_eq!(timer.current_split_index, Some(2));
        assert_eq!(timer.current_time(secs(500)).real_time, Some(secs(21)));
    }

    #[test]
    fn pause_freezes_the_clock() {
        let mut timer = timer();
        timer.start(secs(0)).unwrap();
        timer.pause(secs(5)).unwrap();
        assert_eq!(timer.current_time(secs(50)).real_time, Some(secs(5)));
        timer.resume(secs(50)).unwrap();
        assert_eq!(timer.current_time(secs(52)).real_time, Some(secs(7)));
        assert!(timer.split(secs(52)).is_ok());
    }

    #[test]
    fn undo_after_end_resumes_running() {
        let mut timer = timer();
        timer.start(secs(0)).unwrap();
        timer.split(secs(10)).unwrap();
        timer.split(secs(20)).unwrap();
        timer.undo_split(secs(30)).unwrap();

        assert_eq!(timer.phase, TimerPhase::Running);
        assert_eq!(timer.current_split_index, Some(1));
        assert!(timer.run.segments[1].split_time.is_empty());
        assert_eq!(timer.current_time(secs(31)).real_time, Some(secs(21)));
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let mut timer = timer();
        assert!(timer.split(secs(0)).is_err());
        assert!(timer.undo_split(secs(0)).is_err());
        timer.start(secs(0)).unwrap();
        assert!(timer.start(secs(1)).is_err());
        assert!(timer.undo_split(secs(1)).is_err());
        timer.skip_split().unwrap();
        assert!(timer.skip_split().is_err());
        assert!(timer.switch_comparison("Nope").is_err());
    }

    #[test]
    fn reset_clears_attempt() {
        let mut timer = timer();
        timer.start(secs(0)).unwrap();
        timer.split(secs(9)).unwrap();
        timer.reset();
        assert_eq!(timer.phase, TimerPhase::Idle);
        assert_eq!(timer.current_split_index, None);
        assert!(timer.run.segments[0].split_time.is_empty());
        assert_eq!(timer.current_time(secs(40)).real_time, Some(TimeSpan::zero()));
    }

    #[test]
    fn rename_follows_current_comparison() {
        let mut timer = timer();
        assert!(timer.rename_comparison(PERSONAL_BEST_COMPARISON, "PB v1").unwrap());
        assert_eq!(timer.current_comparison, "PB v1");
    }
}
