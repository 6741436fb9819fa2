//! graceful-run
//!
//! Two small helpers for command-line programs:
//!
//! - [`required_env`] and [`EnvRequirements`]: read configuration that must
//!   be present in the environment, failing at startup when it is not.
//! - [`run`] and [`CancellableRunner`]: run one unit of work until it
//!   completes, cancelling it on SIGINT/SIGTERM and giving it
//!   [`GRACE_PERIOD`] to stop before reporting [`Error::CancelTimeout`].
//!
//! ```no_run
//! use graceful_run::{required_env, run, CancellationToken};
//!
//! async fn serve(url: String, token: CancellationToken) -> anyhow::Result<()> {
//!     token.cancelled().await;
//!     println!("stopping {url}");
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let url = required_env("SERVICE_URL")?;
//!     run(move |token| serve(url, token)).await
//! }
//! ```

pub mod env;
pub mod error;
pub mod runner;
pub mod signal;

pub use env::{
    required_env, required_env_from, required_env_parse, required_env_parse_from, EnvRequirements,
    ProcessEnv, ReadEnv, RequiredEnv,
};
pub use error::{Error, ErrorCode, Result};
pub use runner::{run, run_blocking, CancellableRunner, RunState, GRACE_PERIOD};
pub use signal::{ManualSignals, OsSignals, ShutdownSignal, SignalListener, SignalSource};
pub use tokio_util::sync::CancellationToken;
