//! Diagnostic unit of work
//!
//! The probe ticks until its duration elapses or its cancellation token
//! fires. Run under the cancellable runner it shows whether termination
//! signals reach the process, and with `ignore_cancel` set it exercises the
//! grace-period timeout.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use graceful_run::error::{Error, Result};
use graceful_run::CancellationToken;

use crate::config::ProbeSettings;

/// Summary of a finished probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub ticks: u64,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct Probe {
    /// `None` runs until cancelled
    duration: Option<Duration>,
    tick: Duration,
    ignore_cancel: bool,
    fail: bool,
}

impl Probe {
    pub fn from_settings(settings: &ProbeSettings) -> Self {
        Self {
            duration: match settings.duration_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
            tick: Duration::from_millis(settings.tick_ms.max(1)),
            ignore_cancel: settings.ignore_cancel,
            fail: false,
        }
    }

    /// Report a failure instead of success when the duration elapses
    pub fn failing(mut self, fail: bool) -> Self {
        self.fail = fail;
        self
    }

    pub async fn execute(self, token: CancellationToken) -> Result<ProbeReport> {
        let started = Instant::now();
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let deadline = self.duration.map(|d| started + d);
        let expiry = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(expiry);

        info!(
            duration_ms = self.duration.map(|d| d.as_millis() as u64),
            tick_ms = self.tick.as_millis() as u64,
            ignore_cancel = self.ignore_cancel,
            "Probe started"
        );

        let mut ticks = 0u64;
        let mut cancel_seen = false;

        loop {
            tokio::select! {
                _ = &mut expiry => break,
                _ = ticker.tick() => {
                    ticks += 1;
                    debug!(ticks, "Probe tick");
                }
                _ = token.cancelled(), if !cancel_seen => {
                    cancel_seen = true;
                    if !self.ignore_cancel {
                        info!(ticks, "Probe cancelled");
                        return Err(Error::cancelled("probe stopped on request"));
                    }
                    warn!("Cancellation requested, probe is ignoring it");
                }
            }
        }

        if self.fail {
            return Err(Error::Execution("probe configured to fail".to_string()));
        }

        Ok(ProbeReport {
            ticks,
            elapsed: started.elapsed(),
        })
    }
}
