use std::fmt;
use std::path::{Path, PathBuf};

use fieldwise_core::{Configurable, FieldwiseError, Kind, Result, ScalarKind, Update};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::convert::apply;
use crate::fields::{FieldDescriptor, discover};
use crate::options::Options;
use crate::resolver::{Origin, RawValue, Resolver};
use crate::sources::Sources;

/// What one resolution pass did.
#[derive(Debug, Default)]
pub struct Outcome {
    /// Fields that took a new value, in resolution order.
    pub updates: Vec<Update>,
    /// Fields that were skipped because their value could not be read or
    /// converted. Those fields kept their previous value.
    pub errors: Vec<FieldwiseError>,
}

impl Outcome {
    pub fn changed(&self) -> bool {
        !self.updates.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A file that feeds a field, re-read on every poll of a watch session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedFile {
    pub field: FieldDescriptor,
    pub path: PathBuf,
}

impl WatchedFile {
    pub fn name(&self) -> &'static str {
        self.field.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Drives discovery, resolution, conversion and notification for one record.
pub struct Controller {
    options: Options,
    sources: Sources,
    pub(crate) subscribers: Vec<mpsc::Sender<Update>>,
    watched: Vec<WatchedFile>,
}

impl Controller {
    pub fn new(sources: Sources, options: Options) -> Self {
        Self {
            options,
            sources,
            subscribers: Vec::new(),
            watched: Vec::new(),
        }
    }

    /// Process sources with options captured from the process environment.
    pub fn from_env() -> Self {
        let sources = Sources::process();
        let options = Options::from_env(sources.env());
        Self::new(sources, options)
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn subscribe(mut self, subscriber: mpsc::Sender<Update>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Files consulted so far, one entry per field.
    pub fn watched_files(&self) -> &[WatchedFile] {
        &self.watched
    }

    /// Resolve every field of `record` once.
    ///
    /// Only a malformed record table fails the call, before any field is
    /// touched. Fields that cannot be read or converted keep their value and
    /// are reported in [`Outcome::errors`].
    pub fn pick<T: Configurable>(&mut self, record: &mut T) -> Result<Outcome> {
        let fields = discover(record, &self.options)?;
        if self.options.debug >= 1 {
            info!(fields = fields.len(), options = %self.options, "resolving configuration");
        }
        Ok(self.read_fields(record, &fields))
    }

    fn read_fields<T: Configurable>(&mut self, record: &mut T, fields: &[FieldDescriptor]) -> Outcome {
        let mut outcome = Outcome::default();

        for field in fields {
            let lookup = Resolver::new(&self.options, &self.sources).resolve(field);
            if let Some(path) = lookup.file {
                self.track(field, path);
            }
            match lookup.outcome {
                Ok(Some(raw)) => self.assign(record, field, &raw, &mut outcome),
                Ok(None) => {
                    if self.options.debug >= 2 {
                        debug!(field = field.name, "no source set, keeping current value");
                    }
                }
                Err(err) => {
                    warn!(field = field.name, error = %err, "skipping field");
                    outcome.errors.push(err);
                }
            }
        }

        if self.options.debug >= 1 {
            info!(
                updated = outcome.updates.len(),
                failed = outcome.errors.len(),
                watched = self.watched.len(),
                "resolution pass complete"
            );
        }
        outcome
    }

    /// Re-read the watched files only. Arguments and environment variables
    /// do not change during the life of a process.
    pub(crate) fn read_files<T: Configurable>(&self, record: &mut T) -> Outcome {
        let mut outcome = Outcome::default();
        let resolver = Resolver::new(&self.options, &self.sources);

        for watched in &self.watched {
            match resolver.read(&watched.field, &watched.path) {
                Ok(text) => {
                    let raw = RawValue {
                        origin: Origin::File(watched.path.clone()),
                        text,
                    };
                    self.assign(record, &watched.field, &raw, &mut outcome);
                }
                Err(err) => {
                    warn!(field = watched.name(), error = %err, "skipping field");
                    outcome.errors.push(err);
                }
            }
        }

        if self.options.debug >= 1 && outcome.changed() {
            info!(updated = outcome.updates.len(), "watched files changed");
        }
        outcome
    }

    fn track(&mut self, field: &FieldDescriptor, path: PathBuf) {
        let entry = WatchedFile {
            field: field.clone(),
            path,
        };
        match self.watched.iter_mut().find(|w| w.field.name == field.name) {
            Some(existing) => *existing = entry,
            None => self.watched.push(entry),
        }
    }

    fn assign<T: Configurable>(
        &self,
        record: &mut T,
        field: &FieldDescriptor,
        raw: &RawValue,
        outcome: &mut Outcome,
    ) {
        // A bare boolean flag is present with no value.
        let text = if raw.origin == Origin::Arg
            && raw.text.is_empty()
            && field.kind == Kind::Scalar(ScalarKind::Bool)
        {
            "true"
        } else {
            raw.text.as_str()
        };

        if self.options.debug >= 2 {
            debug!(field = field.name, origin = ?raw.origin, "value found");
        }
        if self.options.debug >= 3 {
            trace!(field = field.name, raw = text, "raw value");
        }

        match apply(record, field, text) {
            Ok(Some(value)) => {
                if self.options.debug >= 2 {
                    debug!(field = field.name, value = %value, "field changed");
                }
                outcome.updates.push(Update::new(field.name, value));
            }
            Ok(None) => {}
            Err(err) => {
                warn!(field = field.name, error = %err, "skipping field");
                outcome.errors.push(err);
            }
        }
    }

    /// Deliver `updates` to every subscriber in order. Returns `false` if
    /// `cancel` fired first; whatever was not yet sent is dropped.
    pub(crate) async fn notify(&mut self, updates: &[Update], cancel: &CancellationToken) -> bool {
        for update in updates {
            for subscriber in &self.subscribers {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return false,
                    _ = subscriber.send(update.clone()) => {}
                }
            }

            let before = self.subscribers.len();
            self.subscribers.retain(|s| !s.is_closed());
            if self.subscribers.len() < before {
                warn!(
                    dropped = before - self.subscribers.len(),
                    remaining = self.subscribers.len(),
                    "subscriber went away"
                );
            }
        }
        true
    }
}

impl fmt::Display for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = self.options.parts();
        if !self.subscribers.is_empty() {
            parts.push(format!("Subscribers<{}>", self.subscribers.len()));
        }
        f.write_str(&parts.join(" + "))
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("options", &self.options)
            .field("subscribers", &self.subscribers.len())
            .field("watched", &self.watched)
            .finish()
    }
}
