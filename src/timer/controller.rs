use std::{sync::Arc, time::Duration};

use anyhow::{ensure, Context, Result};
use serde::Serialize;
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;

use crate::component::{ComponentState, RunPredictionComponent};
use crate::models::TimeSpan;
use crate::replay::{ReplayEvent, ReplayScript};
use crate::{log_info, log_warn};

use super::{TimerPhase, TimerState};

const ENABLE_LOGS: bool = true;

/// One rendered tick of a replay.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionUpdate {
    pub attempt_id: Option<String>,
    pub clock: TimeSpan,
    pub phase: TimerPhase,
    pub state: ComponentState,
}

/// Drives a timer from a replay script and renders the prediction
/// component once per tick.
#[derive(Clone)]
pub struct ReplayController {
    timer: Arc<Mutex<TimerState>>,
    component: Arc<Mutex<RunPredictionComponent>>,
    latest: Arc<Mutex<Option<ComponentState>>>,
    ticker: Arc<Mutex<Option<ActiveTicker>>>,
    tick_interval: Duration,
    speed: f64,
}

/// A spawned ticker and the token that cancels it. Each `start` gets a fresh
/// token so a stopped controller can be started again.
struct ActiveTicker {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

impl ReplayController {
    pub fn new(
        timer: TimerState,
        component: RunPredictionComponent,
        tick_interval: Duration,
        speed: f64,
    ) -> Result<Self> {
        ensure!(!tick_interval.is_zero(), "tick interval must be positive");
        ensure!(
            speed.is_finite() && speed > 0.0,
            "replay speed must be a positive number, got {speed}"
        );

        Ok(Self {
            timer: Arc::new(Mutex::new(timer)),
            component: Arc::new(Mutex::new(component)),
            latest: Arc::new(Mutex::new(None)),
            ticker: Arc::new(Mutex::new(None)),
            tick_interval,
            speed,
        })
    }

    /// Latest rendered state, `None` before the first tick.
    pub async fn snapshot(&self) -> Option<ComponentState> {
        self.latest.lock().await.clone()
    }

    pub async fn timer_phase(&self) -> TimerPhase {
        self.timer.lock().await.phase
    }

    pub async fn start(
        &self,
        script: ReplayScript,
        sender: mpsc::Sender<PredictionUpdate>,
    ) -> Result<()> {
        script.validate()?;

        let mut ticker_guard = self.ticker.lock().await;
        if let Some(previous) = ticker_guard.take() {
            previous.cancel.cancel();
            previous.handle.abort();
        }

        log_info!(
            "replay started: {} events over {}, tick {:?}, speed {}x",
            script.events.len(),
            script.duration(),
            self.tick_interval,
            self.speed
        );

        let cancel = CancellationToken::new();
        let ticker = Ticker {
            timer: self.timer.clone(),
            component: self.component.clone(),
            latest: self.latest.clone(),
            cancel: cancel.clone(),
            tick_interval: self.tick_interval,
            speed: self.speed,
        };
        *ticker_guard = Some(ActiveTicker {
            handle: tokio::spawn(ticker.run(script.events, sender)),
            cancel,
        });
        Ok(())
    }

    /// Waits for the ticker to finish the script.
    pub async fn wait(&self) -> Result<()> {
        let active = self.ticker.lock().await.take();
        match active {
            Some(active) => Self::join(active.handle).await,
            None => Ok(()),
        }
    }

    /// Cancels the running replay. The timer keeps whatever state the
    /// replay left it in; `start` may be called again afterwards.
    pub async fn stop(&self) -> Result<()> {
        let active = self.ticker.lock().await.take();
        match active {
            Some(active) => {
                active.cancel.cancel();
                Self::join(active.handle).await
            }
            None => Ok(()),
        }
    }

    async fn join(handle: JoinHandle<()>) -> Result<()> {
        handle.await.context("replay ticker task failed to join")
    }
}

struct Ticker {
    timer: Arc<Mutex<TimerState>>,
    component: Arc<Mutex<RunPredictionComponent>>,
    latest: Arc<Mutex<Option<ComponentState>>>,
    cancel: CancellationToken,
    tick_interval: Duration,
    speed: f64,
}

impl Ticker {
    async fn run(self, events: Vec<ReplayEvent>, sender: mpsc::Sender<PredictionUpdate>) {
        let started = Instant::now();
        let mut interval = time::interval(self.tick_interval);
        let mut pending = events.into_iter().peekable();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    log_info!("replay cancelled");
                    break;
                }
                _ = interval.tick() => {}
            }

            let clock = TimeSpan::from(started.elapsed().mul_f64(self.speed));
            let update = {
                let mut timer = self.timer.lock().await;
                let mut component = self.component.lock().await;

                while let Some(event) = pending.next_if(|event| event.at() <= clock) {
                    match event.apply(&mut timer) {
                        Ok(Some((old, new))) => {
                            if let Err(err) = component.on_comparison_renamed(&old, &new) {
                                log_warn!("failed to persist comparison rename: {err:#}");
                            }
                        }
                        Ok(None) => {}
                        Err(err) => {
                            log_warn!("skipping {:?} at {}: {err:#}", event.action, event.at());
                        }
                    }
                }

                let state = component.update(&timer, clock);
                PredictionUpdate {
                    attempt_id: timer.attempt_id.clone(),
                    clock,
                    phase: timer.phase,
                    state,
                }
            };

            *self.latest.lock().await = Some(update.state.clone());

            if sender.send(update).await.is_err() {
                log_info!("replay receiver dropped, stopping");
                break;
            }

            if pending.peek().is_none() {
                log_info!("replay finished at {clock}");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::format::Accuracy;
    use crate::models::{Run, Segment, Time, PERSONAL_BEST_COMPARISON};
    use crate::replay::ReplayAction;
    use crate::settings::ComponentSettings;

    fn secs(value: i64) -> TimeSpan {
        TimeSpan::from_secs(value)
    }

    fn controller(speed: f64) -> ReplayController {
        let run = Run::new(vec![
            Segment::new("A").with_comparison(PERSONAL_BEST_COMPARISON, Time::real(secs(10))),
            Segment::new("B").with_comparison(PERSONAL_BEST_COMPARISON, Time::real(secs(40))),
            Segment::new("C").with_comparison(PERSONAL_BEST_COMPARISON, Time::real(secs(100))),
        ]);
        let component = RunPredictionComponent::with_settings(ComponentSettings {
            accuracy: Accuracy::Seconds,
            ..ComponentSettings::default()
        });
        ReplayController::new(
            TimerState::new(run).unwrap(),
            component,
            Duration::from_millis(500),
            speed,
        )
        .unwrap()
    }

    fn script() -> ReplayScript {
        ReplayScript::new(vec![
            ReplayEvent::new(secs(0), ReplayAction::Start),
            ReplayEvent::new(secs(12), ReplayAction::Split),
            ReplayEvent::new(secs(45), ReplayAction::Split),
            ReplayEvent::new(secs(101), ReplayAction::Split),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_bad_parameters() {
        let run = Run::new(vec![Segment::new("A")]);
        let timer = TimerState::new(run).unwrap();
        let component = RunPredictionComponent::with_settings(ComponentSettings::default());
        assert!(ReplayController::new(timer.clone(), component, Duration::ZERO, 1.0).is_err());

        let component = RunPredictionComponent::with_settings(ComponentSettings::default());
        assert!(ReplayController::new(timer, component, Duration::from_secs(1), 0.0).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn replays_a_full_attempt() {
        let controller = controller(10.0);
        let (tx, mut rx) = mpsc::channel(1024);

        controller.start(script(), tx).await.unwrap();
        controller.wait().await.unwrap();

        let mut updates = Vec::new();
        while let Some(update) = rx.recv().await {
            updates.push(update);
        }

        let last = updates.last().unwrap();
        assert_eq!(last.phase, TimerPhase::Ended);
        assert_eq!(last.state.value, "(-4.0) 1:41");
        assert!(last.attempt_id.is_some());
        assert!(updates.iter().any(|update| update.state.value == "(+3.0) 1:45"));
        assert_eq!(controller.snapshot().await.unwrap().value, "(-4.0) 1:41");
        assert_eq!(controller.timer_phase().await, TimerPhase::Ended);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_the_ticker() {
        let controller = controller(1.0);
        let (tx, mut rx) = mpsc::channel(1024);

        controller.start(script(), tx).await.unwrap();
        let first = rx.recv().await.unwrap();
        assert_eq!(first.phase, TimerPhase::Running);

        controller.stop().await.unwrap();
        assert_eq!(controller.timer_phase().await, TimerPhase::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_stop_replays_to_the_end() {
        let controller = controller(10.0);
        let (tx, mut rx) = mpsc::channel(1024);
        controller.start(script(), tx).await.unwrap();
        rx.recv().await.unwrap();
        controller.stop().await.unwrap();

        for _ in 0..5 {
            let (tx, mut rx) = mpsc::channel(1024);
            controller.start(script(), tx).await.unwrap();
            controller.wait().await.unwrap();

            let mut updates = Vec::new();
            while let Some(update) = rx.recv().await {
                updates.push(update);
            }
            assert!(updates.len() > 1);
            assert_eq!(updates.last().unwrap().phase, TimerPhase::Ended);
        }
        assert_eq!(controller.timer_phase().await, TimerPhase::Ended);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_events_are_skipped() {
        let controller = controller(10.0);
        let (tx, mut rx) = mpsc::channel(1024);
        let script = ReplayScript::new(vec![
            ReplayEvent::new(secs(0), ReplayAction::Split),
            ReplayEvent::new(secs(1), ReplayAction::Start),
            ReplayEvent::new(secs(13), ReplayAction::Split),
        ])
        .unwrap();

        controller.start(script, tx).await.unwrap();
        controller.wait().await.unwrap();

        let mut last = None;
        while let Some(update) = rx.recv().await {
            last = Some(update);
        }
        let last = last.unwrap();
        assert_eq!(last.phase, TimerPhase::Running);
        assert_eq!(last.state.value, "(+2.0) 1:42");
    }
}
