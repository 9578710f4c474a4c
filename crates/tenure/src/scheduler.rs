//! The periodic sweep task.
//!
//! One scheduler runs per process: a first sweep after the startup delay,
//! then one every sweep interval. A shutdown request is honored between
//! cycles only, so a cycle always finishes over the whole grant set.

use std::sync::Arc;
use std::time::Duration;

use tenure_store::GrantStore;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval, sleep, MissedTickBehavior};

use crate::manager::Manager;

/// Handle to a running sweep task.
pub struct Scheduler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Scheduler {
    /// Spawn the sweep task on the current tokio runtime.
    pub fn spawn<S>(manager: Arc<Manager<S>>) -> Self
    where
        S: GrantStore + ?Sized + 'static,
    {
        let (shutdown, rx) = watch::channel(false);
        let handle = tokio::spawn(run(manager, rx));
        Self { shutdown, handle }
    }

    /// Ask the task to stop and wait for it. An in-flight cycle completes
    /// first.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        // The receiver is gone only if the task already exited.
        let _ = self.shutdown.send(true);
        self.handle.await
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

async fn run<S>(manager: Arc<Manager<S>>, mut shutdown: watch::Receiver<bool>)
where
    S: GrantStore + ?Sized + 'static,
{
    let config = manager.config().clone();
    tracing::info!(
        startup_delay_secs = config.startup_delay.as_secs(),
        sweep_interval_secs = config.sweep_interval.as_secs(),
        "scheduler started"
    );

    tokio::select! {
        _ = sleep(config.startup_delay) => {}
        _ = shutdown.changed() => {
            tracing::info!("scheduler stopped before first sweep");
            return;
        }
    }

    // interval() panics on a zero period.
    let period = config.sweep_interval.max(Duration::from_millis(1));
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }

        match manager.sweep().await {
            Ok(report) => tracing::debug!(?report, "cycle finished"),
            Err(e) => tracing::error!(error = %e, "sweep failed"),
        }

        if *shutdown.borrow() {
            break;
        }
    }

    tracing::info!("scheduler stopped");
}
