//! Field discovery: turns a record's descriptor table into resolvable fields.

use std::collections::HashSet;

use fieldwise_core::{Configurable, FieldwiseError, Kind, Result};

use crate::names::{arg_name, env_name, file_env_name, token};
use crate::options::Options;

/// One eligible field with its source tokens worked out.
///
/// A `None` token means the source is disabled for this field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: Kind,
    pub arg: Option<String>,
    pub env: Option<String>,
    pub file_env: Option<String>,
    pub separator: String,
}

/// List the fields of `record` in resolution order.
///
/// Fails with [`FieldwiseError::Structure`] when the record's table is
/// inconsistent: duplicate names, a declared field the record cannot read, a
/// current value whose kind differs from the declared one, or an empty list
/// separator (per field or from `options`). No field is touched in that case.
pub fn discover<T: Configurable>(record: &T, options: &Options) -> Result<Vec<FieldDescriptor>> {
    let specs = T::field_specs();
    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(specs.len());

    for spec in specs {
        if !seen.insert(spec.name) {
            return Err(FieldwiseError::Structure(format!(
                "field {} is declared more than once",
                spec.name
            )));
        }
        let current = record.field_value(spec.name).ok_or_else(|| {
            FieldwiseError::Structure(format!("field {} cannot be read", spec.name))
        })?;
        if current.kind() != spec.kind {
            return Err(FieldwiseError::Structure(format!(
                "field {} is declared as {} but holds a {}",
                spec.name,
                spec.kind,
                current.kind()
            )));
        }
        let separator: &str = spec.separator.unwrap_or(options.list_sep.as_str());
        if separator.is_empty() {
            return Err(FieldwiseError::Structure(format!(
                "field {} has an empty list separator",
                spec.name
            )));
        }

        fields.push(FieldDescriptor {
            name: spec.name,
            kind: spec.kind,
            arg: token(spec.arg, &options.arg_prefix, spec.name, arg_name),
            env: token(spec.env, &options.env_prefix, spec.name, env_name),
            file_env: token(spec.file_env, &options.file_env_prefix, spec.name, file_env_name),
            separator: separator.to_string(),
        });
    }

    Ok(fields)
}
