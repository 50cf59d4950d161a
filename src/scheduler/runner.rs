use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::scheduler::refresher::FeedRefresher;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between cycle starts.
    pub interval: Duration,
    /// Hard bound on one cycle; the refresher is cancelled when it passes.
    pub cycle_deadline: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15 * 60),
            cycle_deadline: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("scheduler is already running")]
    AlreadyRunning,

    #[error("scheduler has been stopped")]
    Stopped,

    #[error("refresh interval must be greater than zero")]
    ZeroInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// Runs a [`FeedRefresher`] on a fixed period from a single background task.
///
/// One cycle runs as soon as the scheduler starts, then one per tick. Cycles
/// never overlap: a slow cycle pushes the next tick back instead of queueing
/// extra ones.
pub struct RefreshScheduler {
    refresher: Arc<dyn FeedRefresher>,
    config: SchedulerConfig,
    state: SchedulerState,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    pub fn new(refresher: Arc<dyn FeedRefresher>, config: SchedulerConfig) -> Self {
        Self {
            refresher,
            config,
            state: SchedulerState::Idle,
            shutdown: CancellationToken::new(),
            handle: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Spawn the refresh loop. Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        match self.state {
            SchedulerState::Running => return Err(SchedulerError::AlreadyRunning),
            SchedulerState::Stopped => return Err(SchedulerError::Stopped),
            SchedulerState::Idle => {}
        }
        if self.config.interval.is_zero() {
            return Err(SchedulerError::ZeroInterval);
        }

        info!(
            interval_secs = self.config.interval.as_secs(),
            deadline_secs = self.config.cycle_deadline.as_secs(),
            "starting refresh scheduler"
        );
        self.handle = Some(tokio::spawn(run_loop(
            self.refresher.clone(),
            self.config.clone(),
            self.shutdown.clone(),
        )));
        self.state = SchedulerState::Running;
        Ok(())
    }

    /// Cancel the loop and wait for it to exit.
    ///
    /// A cycle in flight is cancelled and awaited, so when this returns no
    /// cycle is running and none will start.
    pub async fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.handle.take() {
            info!("stopping refresh scheduler");
            if let Err(e) = handle.await {
                error!(error = %e, "refresh loop ended abnormally");
            }
        }
        self.state = SchedulerState::Stopped;
    }
}

async fn run_loop(
    refresher: Arc<dyn FeedRefresher>,
    config: SchedulerConfig,
    shutdown: CancellationToken,
) {
    run_cycle(refresher.as_ref(), config.cycle_deadline, &shutdown).await;

    let mut ticker = interval_at(Instant::now() + config.interval, config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                run_cycle(refresher.as_ref(), config.cycle_deadline, &shutdown).await;
            }
        }
    }
    info!("refresh loop exited");
}

/// Run one cycle to completion. Failures are logged, never returned.
async fn run_cycle(refresher: &dyn FeedRefresher, deadline: Duration, shutdown: &CancellationToken) {
    let cycle_id = Uuid::new_v4();

    async {
        let started = Instant::now();
        let cancel = shutdown.child_token();
        info!("refresh cycle started");

        let refresh = refresher.refresh_all(cancel.clone());
        tokio::pin!(refresh);

        let result = tokio::select! {
            result = &mut refresh => result,
            _ = sleep(deadline) => {
                warn!(deadline_secs = deadline.as_secs(), "refresh cycle deadline reached, cancelling");
                cancel.cancel();
                refresh.await
            }
        };
        cancel.cancel();

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(()) => info!(elapsed_ms, "refresh cycle completed"),
            Err(e) => error!(elapsed_ms, error = %e, "refresh cycle failed"),
        }
    }
    .instrument(info_span!("refresh_cycle", cycle_id = %cycle_id))
    .await
}
