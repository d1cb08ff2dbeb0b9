use std::path::PathBuf;

use thiserror::Error;

use crate::value::ScalarKind;

/// Unified error type for fieldwise.
#[derive(Error, Debug)]
pub enum FieldwiseError {
    // ── Record errors ──────────────────────────────────────────
    #[error("invalid record: {0}")]
    Structure(String),

    // ── Per-field errors ───────────────────────────────────────
    #[error("cannot convert field {field}: {source}")]
    Conversion {
        field: String,
        #[source]
        source: ConvertError,
    },

    #[error("cannot read file {} for field {field}: {source}", path.display())]
    Unreadable {
        field: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FieldwiseError {
    /// Name of the field a per-field error belongs to.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Conversion { field, .. } | Self::Unreadable { field, .. } => Some(field),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FieldwiseError>;

/// A raw string that could not be turned into a value of the requested kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind} {input:?}: {reason}")]
pub struct ConvertError {
    pub kind: ScalarKind,
    pub input: String,
    pub reason: String,
}

impl ConvertError {
    pub fn new(kind: ScalarKind, input: &str, reason: impl ToString) -> Self {
        Self {
            kind,
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }
}
