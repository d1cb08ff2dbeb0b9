//! # fieldwise-core
//!
//! Core types and traits shared by the fieldwise engine and its derive macro.
//! A configuration record describes its fields through [`Configurable`]; every
//! field value travels through the engine as a [`Value`].

pub mod error;
pub mod record;
pub mod update;
pub mod value;

pub use error::{ConvertError, FieldwiseError, Result};
pub use record::{Configurable, Directive, FieldSpec};
pub use update::Update;
pub use value::{Element, Field, Kind, Scalar, ScalarKind, Value};
