//! # fieldwise
//!
//! Fills a typed configuration record from layered sources: command-line
//! arguments first, then environment variables, then files whose paths are
//! held in `*_FILE` environment variables. A watch session keeps the
//! file-backed fields current and publishes each change as an [`Update`].
//!
//! ```ignore
//! use fieldwise::Configurable;
//! use std::time::Duration;
//!
//! #[derive(Configurable)]
//! pub struct Config {
//!     pub log_level: String,   // -log.level, LOG_LEVEL, LOG_LEVEL_FILE
//!     pub timeout: Duration,
//! }
//!
//! let mut config = Config { log_level: "info".into(), timeout: Duration::from_secs(5) };
//! fieldwise::pick(&mut config)?;
//! ```

extern crate self as fieldwise;

pub mod controller;
pub mod convert;
pub mod fields;
pub mod names;
pub mod options;
pub mod resolver;
pub mod sources;
pub mod watch;

use std::sync::Arc;

pub use fieldwise_core::{
    ConvertError, Configurable, Directive, Element, Field, FieldSpec, FieldwiseError, Kind,
    Result, Scalar, ScalarKind, Update, Value,
};
pub use fieldwise_derive::Configurable;
pub use parking_lot::Mutex;
pub use tokio::sync::mpsc::Sender;

pub use controller::{Controller, Outcome, WatchedFile};
pub use fields::FieldDescriptor;
pub use options::Options;
pub use sources::{ArgSource, CommandLine, EnvSource, FileSource, Filesystem, ProcessEnv, Sources};
pub use watch::WatchHandle;

/// Resolve `record` once from the process arguments, environment and files,
/// with options taken from the `FIELDWISE_*` environment variables.
pub fn pick<T: Configurable>(record: &mut T) -> Result<Outcome> {
    Controller::from_env().pick(record)
}

/// Start a watch session over `record` using the process sources.
/// See [`Controller::watch`].
pub async fn watch<T>(record: Arc<Mutex<T>>, subscribers: Vec<Sender<Update>>) -> Result<WatchHandle>
where
    T: Configurable + Send + 'static,
{
    Controller::from_env().watch(record, subscribers).await
}
