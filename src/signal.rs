//! Termination signal sources
//!
//! A [`SignalSource`] is something a run can subscribe to for the duration
//! of one call. Subscribing returns a [`SignalListener`]; dropping the
//! listener is the unsubscribe, so every exit path of the runner releases
//! it. For [`OsSignals`] on Unix, once the last listener is gone SIGINT and
//! SIGTERM get their default action back and terminate the process.
//!
//! - [`OsSignals`]: SIGINT and SIGTERM on Unix, Ctrl-C and console close on
//!   Windows.
//! - [`ManualSignals`]: an in-process trigger for embedding and tests.

use std::fmt;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::Result;

/// A termination request observed by a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGINT / Ctrl-C
    Interrupt,
    /// SIGTERM / console close
    Terminate,
    /// Raised through [`ManualSignals::trigger`]
    Manual,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => write!(f, "interrupt"),
            ShutdownSignal::Terminate => write!(f, "terminate"),
            ShutdownSignal::Manual => write!(f, "manual"),
        }
    }
}

/// A live subscription to a [`SignalSource`].
#[async_trait]
pub trait SignalListener: Send {
    /// Wait for the next signal.
    ///
    /// Returns `None` once the source can never deliver again.
    async fn recv(&mut self) -> Option<ShutdownSignal>;
}

/// Something a run can subscribe to for termination requests.
pub trait SignalSource: Send + Sync {
    type Listener: SignalListener + 'static;

    /// Register interest. Signals raised before this call are not observed.
    fn listen(&self) -> Result<Self::Listener>;
}

// ─────────────────────────────────────────────────────────────────
// Operating System Signals
// ─────────────────────────────────────────────────────────────────

/// Process termination signals: exactly interrupt and terminate.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsSignals;

#[cfg(unix)]
mod os {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::low_level::unregister;
    use tokio::signal::unix::{signal, Signal, SignalKind};

    use super::{async_trait, ShutdownSignal, SignalListener};
    use crate::error::{Error, Result};

    /// Process-wide bookkeeping for live OS listeners.
    ///
    /// Tokio never uninstalls its handlers, so a conditional default action
    /// is registered next to them. While `unguarded` is set, SIGINT and
    /// SIGTERM behave exactly as if no handler were installed.
    struct Guard {
        unguarded: Arc<AtomicBool>,
        live: usize,
    }

    static GUARD: Mutex<Option<Guard>> = Mutex::new(None);

    fn lock() -> MutexGuard<'static, Option<Guard>> {
        GUARD.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn install_default_fallback() -> Result<Guard> {
        let unguarded = Arc::new(AtomicBool::new(true));
        let mut ids = Vec::with_capacity(2);

        for (name, sig) in [("SIGINT", SIGINT), ("SIGTERM", SIGTERM)] {
            match signal_hook::flag::register_conditional_default(sig, Arc::clone(&unguarded)) {
                Ok(id) => ids.push(id),
                Err(source) => {
                    for id in ids {
                        unregister(id);
                    }
                    return Err(Error::SignalRegistration { signal: name, source });
                }
            }
        }

        Ok(Guard { unguarded, live: 0 })
    }

    /// One live listener's claim on SIGINT/SIGTERM. The last one to drop
    /// hands both signals back to their default action.
    struct Claim;

    impl Claim {
        fn acquire() -> Result<Self> {
            let mut slot = lock();
            let guard = match slot.take() {
                Some(guard) => guard,
                None => install_default_fallback()?,
            };
            let guard = slot.insert(guard);
            guard.live += 1;
            guard.unguarded.store(false, Ordering::SeqCst);
            Ok(Claim)
        }
    }

    impl Drop for Claim {
        fn drop(&mut self) {
            if let Some(guard) = lock().as_mut() {
                guard.live = guard.live.saturating_sub(1);
                if guard.live == 0 {
                    guard.unguarded.store(true, Ordering::SeqCst);
                }
            }
        }
    }

    /// Listener for SIGINT and SIGTERM
    pub struct OsListener {
        interrupt: Signal,
        terminate: Signal,
        _claim: Claim,
    }

    impl OsListener {
        pub(super) fn register() -> Result<Self> {
            let interrupt = signal(SignalKind::interrupt()).map_err(|e| Error::SignalRegistration {
                signal: "SIGINT",
                source: e,
            })?;
            let terminate = signal(SignalKind::terminate()).map_err(|e| Error::SignalRegistration {
                signal: "SIGTERM",
                source: e,
            })?;
            // Claimed last: a signal racing registration still gets the
            // default action.
            let claim = Claim::acquire()?;
            Ok(Self {
                interrupt,
                terminate,
                _claim: claim,
            })
        }
    }

    #[async_trait]
    impl SignalListener for OsListener {
        async fn recv(&mut self) -> Option<ShutdownSignal> {
            tokio::select! {
                Some(()) = self.interrupt.recv() => Some(ShutdownSignal::Interrupt),
                Some(()) = self.terminate.recv() => Some(ShutdownSignal::Terminate),
                else => None,
            }
        }
    }

    #[cfg(test)]
    pub(super) fn is_guarded() -> bool {
        lock()
            .as_ref()
            .is_some_and(|guard| guard.live > 0 && !guard.unguarded.load(Ordering::SeqCst))
    }
}

#[cfg(windows)]
mod os {
    use tokio::signal::windows::{ctrl_c, ctrl_close, CtrlC, CtrlClose};

    use super::{async_trait, ShutdownSignal, SignalListener};
    use crate::error::{Error, Result};

    /// Listener for Ctrl-C and console close
    pub struct OsListener {
        interrupt: CtrlC,
        terminate: CtrlClose,
    }

    impl OsListener {
        pub(super) fn register() -> Result<Self> {
            let interrupt = ctrl_c().map_err(|e| Error::SignalRegistration {
                signal: "CTRL_C",
                source: e,
            })?;
            let terminate = ctrl_close().map_err(|e| Error::SignalRegistration {
                signal: "CTRL_CLOSE",
                source: e,
            })?;
            Ok(Self { interrupt, terminate })
        }
    }

    #[async_trait]
    impl SignalListener for OsListener {
        async fn recv(&mut self) -> Option<ShutdownSignal> {
            tokio::select! {
                Some(()) = self.interrupt.recv() => Some(ShutdownSignal::Interrupt),
                Some(()) = self.terminate.recv() => Some(ShutdownSignal::Terminate),
                else => None,
            }
        }
    }
}

pub use os::OsListener;

impl SignalSource for OsSignals {
    type Listener = OsListener;

    fn listen(&self) -> Result<OsListener> {
        OsListener::register()
    }
}

// ─────────────────────────────────────────────────────────────────
// Manual Signals
// ─────────────────────────────────────────────────────────────────

/// In-process signal source.
///
/// Clones share the same channel, so one clone can be handed to a runner
/// while another triggers it.
#[derive(Debug, Clone)]
pub struct ManualSignals {
    tx: broadcast::Sender<ShutdownSignal>,
}

impl ManualSignals {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(8);
        Self { tx }
    }

    /// Deliver `signal` to every live listener.
    ///
    /// Returns the number of listeners notified; 0 means nobody was
    /// subscribed and the signal was dropped.
    pub fn trigger(&self, signal: ShutdownSignal) -> usize {
        self.tx.send(signal).unwrap_or(0)
    }

    /// Number of listeners currently subscribed
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ManualSignals {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscription to a [`ManualSignals`] source
#[derive(Debug)]
pub struct ManualListener {
    rx: broadcast::Receiver<ShutdownSignal>,
}

#[async_trait]
impl SignalListener for ManualListener {
    async fn recv(&mut self) -> Option<ShutdownSignal> {
        loop {
            match self.rx.recv().await {
                Ok(signal) => return Some(signal),
                // Missed signals still mean "a signal arrived".
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl SignalSource for ManualSignals {
    type Listener = ManualListener;

    fn listen(&self) -> Result<ManualListener> {
        Ok(ManualListener {
            rx: self.tx.subscribe(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_signal_display() {
        assert_eq!(ShutdownSignal::Interrupt.to_string(), "interrupt");
        assert_eq!(ShutdownSignal::Terminate.to_string(), "terminate");
        assert_eq!(ShutdownSignal::Manual.to_string(), "manual");
    }

    #[tokio::test]
    async fn test_manual_trigger_reaches_listener() {
        let signals = ManualSignals::new();
        let mut listener = signals.listen().unwrap();

        assert_eq!(signals.listener_count(), 1);
        assert_eq!(signals.trigger(ShutdownSignal::Terminate), 1);
        assert_eq!(listener.recv().await, Some(ShutdownSignal::Terminate));
    }

    #[tokio::test]
    async fn test_manual_drop_unsubscribes() {
        let signals = ManualSignals::new();
        let listener = signals.listen().unwrap();
        assert_eq!(signals.listener_count(), 1);

        drop(listener);
        assert_eq!(signals.listener_count(), 0);
        assert_eq!(signals.trigger(ShutdownSignal::Manual), 0);
    }

    #[tokio::test]
    async fn test_manual_trigger_before_listen_is_not_seen() {
        let signals = ManualSignals::new();
        assert_eq!(signals.trigger(ShutdownSignal::Interrupt), 0);

        let mut listener = signals.listen().unwrap();
        let next = tokio::time::timeout(Duration::from_millis(20), listener.recv()).await;
        assert!(next.is_err(), "stale signal must not be delivered");
    }

    #[tokio::test]
    async fn test_manual_clones_share_channel() {
        let signals = ManualSignals::new();
        let trigger = signals.clone();
        let mut listener = signals.listen().unwrap();

        trigger.trigger(ShutdownSignal::Interrupt);
        assert_eq!(listener.recv().await, Some(ShutdownSignal::Interrupt));
    }

    #[tokio::test]
    async fn test_manual_listener_closed_source() {
        let signals = ManualSignals::new();
        let mut listener = signals.listen().unwrap();
        drop(signals);
        assert_eq!(listener.recv().await, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_os_listener_holds_signals_while_alive() {
        let listener = OsSignals.listen().unwrap();
        assert!(os::is_guarded());
        drop(listener);
    }
}
