//! Real-time clock driving the game time forward.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::info;

use super::Command;

/// Sends one `Advance` per game second at a fixed real-time rate.
pub(crate) struct ClockWorker {
    command_tx: mpsc::Sender<Command>,
    period: Duration,
}

impl ClockWorker {
    pub fn new(command_tx: mpsc::Sender<Command>, millis_per_second: u64) -> Self {
        Self {
            command_tx,
            period: Duration::from_millis(millis_per_second.max(1)),
        }
    }

    pub async fn run(self) {
        let mut interval = time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;
        info!(period_ms = self.period.as_millis() as u64, "clock started");

        loop {
            interval.tick().await;
            let command = Command::Advance {
                secs: 1,
                reply: None,
            };
            if self.command_tx.send(command).await.is_err() {
                break;
            }
        }
        info!("clock stopped");
    }
}
