//! A small non-reentrant periodic-tick trait shared by the three auxiliary
//! loops (§4.7-§4.9): each fires on its own cadence, and a tick that is
//! still running when the next one comes due is skipped rather than
//! overlapped (§5).

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

#[async_trait]
pub trait PeriodicLoop: Send + Sync {
    fn name(&self) -> &'static str;
    fn interval(&self) -> Duration;
    fn initial_delay(&self) -> Duration;

    async fn tick(&self) -> eyre::Result<()>;

    /// Run forever on this loop's cadence until `shutdown` fires. Uses a
    /// single `tokio::sync::Mutex`-free reentrancy guard: the loop body
    /// only ever has one in-flight `tick()` because we `.await` it
    /// directly inside the `interval.tick()` loop rather than spawning.
    async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        tokio::time::sleep(self.initial_delay()).await;
        let mut interval = tokio::time::interval(self.interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    debug!(loop_name = self.name(), "PeriodicLoop::run: tick");
                    if let Err(e) = self.tick().await {
                        warn!(loop_name = self.name(), error = %e, "PeriodicLoop::run: tick failed");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        debug!(loop_name = self.name(), "PeriodicLoop::run: shutting down");
                        return;
                    }
                }
            }
        }
    }
}
