//! Scan triggers.
//!
//! A startup timer fires once, then bursts of document mutations are
//! coalesced into a single trigger after a quiet period. The host reports
//! mutations through a [`MutationObserver`]; disconnecting it ends the
//! watch loop and drops any pending debounce.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;

/// Timing of monitoring triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorPolicy {
    /// Delay before the initial scan.
    ///
    /// Default: `1s`
    pub startup_delay: Duration,

    /// Silence required after the last mutation before a scan.
    ///
    /// Default: `500ms`
    pub quiet_period: Duration,
}

impl Default for MonitorPolicy {
    fn default() -> Self {
        Self {
            startup_delay: Duration::from_secs(1),
            quiet_period: Duration::from_millis(500),
        }
    }
}

impl MonitorPolicy {
    /// No startup delay and no debounce wait.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            startup_delay: Duration::ZERO,
            quiet_period: Duration::ZERO,
        }
    }
}

/// Why a scan was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The startup timer elapsed.
    Startup,
    /// A burst of mutations settled.
    Mutations {
        /// Notifications folded into this trigger.
        coalesced: usize,
    },
}

/// Host-side handle reporting document mutations.
#[derive(Debug, Clone)]
pub struct MutationObserver {
    tx: Option<mpsc::UnboundedSender<()>>,
}

impl MutationObserver {
    /// Report that the document changed. Returns `false` once disconnected
    /// or when the monitor has stopped.
    pub fn notify(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| tx.send(()).is_ok())
    }

    /// Stop reporting. The monitor ends once every clone is disconnected
    /// or dropped.
    pub fn disconnect(&mut self) {
        self.tx = None;
    }

    /// Whether this handle still reports mutations.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }
}

/// Receiving side: turns mutation reports into scan triggers.
#[derive(Debug)]
pub struct Monitor {
    rx: mpsc::UnboundedReceiver<()>,
    policy: MonitorPolicy,
}

impl Monitor {
    /// Create a connected observer/monitor pair.
    #[must_use]
    pub fn connect(policy: MonitorPolicy) -> (MutationObserver, Monitor) {
        let (tx, rx) = mpsc::unbounded_channel();
        (MutationObserver { tx: Some(tx) }, Monitor { rx, policy })
    }

    /// Run the trigger loop until the observer disconnects.
    ///
    /// `on_trigger` is awaited before more notifications are considered;
    /// notifications arriving meanwhile are folded into the next trigger.
    pub async fn watch<F, Fut>(mut self, mut on_trigger: F)
    where
        F: FnMut(Trigger) -> Fut,
        Fut: Future<Output = ()>,
    {
        if !self.policy.startup_delay.is_zero() {
            sleep(self.policy.startup_delay).await;
        }
        tracing::debug!("startup scan");
        on_trigger(Trigger::Startup).await;

        while self.rx.recv().await.is_some() {
            let Some(coalesced) = self.settle().await else {
                tracing::debug!("observer disconnected, pending scan dropped");
                return;
            };
            tracing::debug!(coalesced, "mutations settled");
            on_trigger(Trigger::Mutations { coalesced }).await;
        }
        tracing::debug!("observer disconnected");
    }

    /// Wait for `quiet_period` without notifications. `None` when the
    /// observer disconnects first.
    async fn settle(&mut self) -> Option<usize> {
        let mut coalesced = 1;
        loop {
            tokio::select! {
                biased;
                received = self.rx.recv() => match received {
                    Some(()) => coalesced += 1,
                    None => return None,
                },
                () = sleep(self.policy.quiet_period) => return Some(coalesced),
            }
        }
    }
}
