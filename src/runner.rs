//! Run a unit of work until it completes or a termination signal cancels it
//!
//! [`CancellableRunner`] starts the work on its own task, then races its
//! completion against the first shutdown signal. On a signal it stops
//! listening, cancels the work's [`CancellationToken`] and waits at most
//! [`GRACE_PERIOD`] for the work to return on its own.
//!
//! ```text
//! Running ──work done──▶ Completed
//!    │
//!  signal
//!    ▼
//! Cancelling ──work done──▶ Completed
//!    │
//!  grace elapsed
//!    ▼
//! TimedOut
//! ```
//!
//! Cancellation is cooperative. Work that ignores its token keeps running
//! detached after a timeout; its eventual result is dropped.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, info, Instrument};
use uuid::Uuid;

use crate::error::Error;
use crate::signal::{OsSignals, ShutdownSignal, SignalListener, SignalSource};

/// How long a cancelled run may take to finish before it is abandoned
pub const GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Progress of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Work is executing, no signal seen yet
    Running,
    /// A signal arrived and the work has been asked to stop
    Cancelling,
    /// Work returned a result
    Completed,
    /// Work did not return within the grace period
    TimedOut,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::TimedOut)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Running => "running",
            RunState::Cancelling => "cancelling",
            RunState::Completed => "completed",
            RunState::TimedOut => "timed_out",
        };
        f.write_str(name)
    }
}

/// Runs one unit of work per call, cancelling it on shutdown signals.
///
/// The runner holds no state between calls; one instance can serve any
/// number of sequential or concurrent runs.
#[derive(Debug, Clone, Default)]
pub struct CancellableRunner<S = OsSignals> {
    source: S,
}

impl CancellableRunner<OsSignals> {
    /// Runner that listens for SIGINT and SIGTERM
    pub fn new() -> Self {
        Self { source: OsSignals }
    }
}

impl<S: SignalSource> CancellableRunner<S> {
    /// Runner that listens to a custom signal source
    pub fn with_source(source: S) -> Self {
        Self { source }
    }

    /// Run async work to completion.
    ///
    /// `work` is called once with a fresh token and its future is spawned
    /// onto the current Tokio runtime. The work's own result is returned
    /// untouched; the only error this method adds is
    /// [`Error::CancelTimeout`] (plus [`Error::SignalRegistration`] if the
    /// listener cannot be installed, in which case `work` is never called).
    ///
    /// A panic inside the work is resumed on the caller.
    pub async fn run<F, Fut, T, E>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: From<Error> + Send + 'static,
    {
        let listener = self.source.listen()?;
        let token = CancellationToken::new();
        let handle = tokio::spawn(work(token.clone()));

        supervise(listener, token, handle)
            .instrument(debug_span!("run", run_id = %Uuid::new_v4()))
            .await
    }

    /// Run blocking work to completion on Tokio's blocking pool.
    ///
    /// Same contract as [`CancellableRunner::run`]. The work should poll
    /// [`CancellationToken::is_cancelled`] to stop early.
    pub async fn run_blocking<F, T, E>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(CancellationToken) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<Error> + Send + 'static,
    {
        let listener = self.source.listen()?;
        let token = CancellationToken::new();
        let work_token = token.clone();
        let handle = tokio::task::spawn_blocking(move || work(work_token));

        supervise(listener, token, handle)
            .instrument(debug_span!("run_blocking", run_id = %Uuid::new_v4()))
            .await
    }
}

/// Run async work, cancelling it on SIGINT or SIGTERM.
///
/// Shorthand for `CancellableRunner::new().run(work)`.
pub async fn run<F, Fut, T, E>(work: F) -> Result<T, E>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: From<Error> + Send + 'static,
{
    CancellableRunner::new().run(work).await
}

/// Run blocking work, cancelling it on SIGINT or SIGTERM.
pub async fn run_blocking<F, T, E>(work: F) -> Result<T, E>
where
    F: FnOnce(CancellationToken) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<Error> + Send + 'static,
{
    CancellableRunner::new().run_blocking(work).await
}

// ─────────────────────────────────────────────────────────────────
// Supervision
// ─────────────────────────────────────────────────────────────────

enum FirstEvent<T, E> {
    Finished(Result<Result<T, E>, JoinError>),
    Signalled(ShutdownSignal),
}

async fn supervise<L, T, E>(
    mut listener: L,
    token: CancellationToken,
    mut handle: JoinHandle<Result<T, E>>,
) -> Result<T, E>
where
    L: SignalListener,
    E: From<Error>,
{
    let mut state = RunState::Running;
    debug!(state = %state, "Run started");

    // A listener whose source is gone returns None; the branch is then
    // disabled and only completion remains.
    let first = tokio::select! {
        joined = &mut handle => FirstEvent::Finished(joined),
        Some(signal) = listener.recv() => FirstEvent::Signalled(signal),
    };

    // Stop watching on both paths. Later signals get no special handling.
    drop(listener);

    let signal = match first {
        FirstEvent::Finished(joined) => {
            transition(&mut state, RunState::Completed);
            return into_result(joined);
        }
        FirstEvent::Signalled(signal) => signal,
    };

    info!(
        signal = %signal,
        grace_secs = GRACE_PERIOD.as_secs(),
        "Shutdown signal received, cancelling run"
    );
    token.cancel();
    transition(&mut state, RunState::Cancelling);

    match tokio::time::timeout(GRACE_PERIOD, &mut handle).await {
        Ok(joined) => {
            transition(&mut state, RunState::Completed);
            into_result(joined)
        }
        Err(_) => {
            // Dropping the handle detaches the task; it is not aborted.
            transition(&mut state, RunState::TimedOut);
            Err(Error::CancelTimeout {
                grace: GRACE_PERIOD,
            }
            .into())
        }
    }
}

fn transition(state: &mut RunState, next: RunState) {
    debug!(from = %state, to = %next, "Run state changed");
    *state = next;
}

fn into_result<T, E>(joined: Result<Result<T, E>, JoinError>) -> Result<T, E>
where
    E: From<Error>,
{
    match joined {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(Error::Internal(format!("run task did not complete: {}", e)).into()),
    }
}
