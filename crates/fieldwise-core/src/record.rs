use crate::value::{Kind, Value};

/// Per-field override for one source token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Directive {
    /// Derive the token from the field name.
    #[default]
    Derive,
    /// Use this exact token.
    Name(&'static str),
    /// The source does not apply to this field.
    Disabled,
}

impl Directive {
    /// Reserved token that disables a source for a field.
    pub const DISABLED: &'static str = "-";

    /// Interpret an attribute value: empty derives, `"-"` disables.
    pub const fn parse(raw: &'static str) -> Self {
        if raw.is_empty() {
            Self::Derive
        } else if raw.len() == 1 && raw.as_bytes()[0] == b'-' {
            Self::Disabled
        } else {
            Self::Name(raw)
        }
    }
}

/// Static description of one eligible field of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Canonical field name, also the key of every [`Update`](crate::Update).
    pub name: &'static str,
    pub kind: Kind,
    pub arg: Directive,
    pub env: Directive,
    pub file_env: Directive,
    /// List separator override; `None` uses the resolver default.
    pub separator: Option<&'static str>,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            kind,
            arg: Directive::Derive,
            env: Directive::Derive,
            file_env: Directive::Derive,
            separator: None,
        }
    }

    pub const fn with_arg(mut self, directive: Directive) -> Self {
        self.arg = directive;
        self
    }

    pub const fn with_env(mut self, directive: Directive) -> Self {
        self.env = directive;
        self
    }

    pub const fn with_file_env(mut self, directive: Directive) -> Self {
        self.file_env = directive;
        self
    }

    pub const fn with_separator(mut self, separator: &'static str) -> Self {
        self.separator = Some(separator);
        self
    }
}

/// A configuration record whose fields can be enumerated, read and written
/// generically.
///
/// Usually derived with `#[derive(Configurable)]`, which lists the record's
/// public fields of supported types in declaration order.
pub trait Configurable {
    /// Eligible fields, in the order they are resolved.
    fn field_specs() -> Vec<FieldSpec>;

    /// Current value of the named field, `None` if there is no such field.
    fn field_value(&self, name: &str) -> Option<Value>;

    /// Store `value` into the named field. Returns `false` and leaves the
    /// record untouched when the field is unknown or the kinds disagree.
    fn set_field_value(&mut self, name: &str, value: Value) -> bool;
}
