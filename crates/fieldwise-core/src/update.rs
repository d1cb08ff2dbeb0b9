use serde::Serialize;

use crate::value::{Field, Value};

/// A field took a new value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Update {
    pub name: &'static str,
    pub value: Value,
}

impl Update {
    pub fn new(name: &'static str, value: Value) -> Self {
        Self { name, value }
    }

    /// The new value as a concrete field type, if the kinds match.
    pub fn get<T: Field>(&self) -> Option<T> {
        T::from_value(self.value.clone())
    }
}
