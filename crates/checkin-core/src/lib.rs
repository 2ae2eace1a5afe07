//! `checkin-core`: the daily check-in batch.
//!
//! A run walks the configured accounts in order. Each account signs in for
//! its personal bonus (primary accounts only) and fires a burst of concurrent
//! family sign-ins. Primary accounts get a before/after capacity report once
//! the whole batch is done. Everything the run reports is collected in a
//! [`RunLog`], pushed as one notification, and then erased.
//!
//! ```text
//! run ─▶ Orchestrator ─▶ TaskExecutor ─▶ CloudApi
//!  │          └──────────── RunLog ◀──── AccountLogger
//!  └─▶ build_notification ─▶ Notifier ─▶ erase + clean
//! ```
//!
//! A business error fails only its own account. A timeout or connection
//! reset stops the batch; the capacity pass, push and cleanup still run.

pub mod capacity;
pub mod config;
pub mod delay;
pub mod error;
pub mod executor;
pub mod log;
pub mod notify;
pub mod orchestrator;
pub mod run;

#[cfg(test)]
mod testing;

pub use capacity::{CapacityReport, CapacitySnapshot};
pub use config::{load_accounts, load_families, Account, AccountRole, Pacing, RunConfig};
pub use error::{CheckinError, Result};
pub use executor::{dispatch_all, TaskExecutor, TaskOutcome};
pub use log::{mask, AccountLogger, LogEvent, LogLevel, RunLog};
pub use notify::build_notification;
pub use orchestrator::{AccountOutcome, BatchReport, Orchestrator};
pub use run::{run, RunSummary};
