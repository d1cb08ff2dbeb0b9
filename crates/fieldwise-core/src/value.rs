use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;
use url::Url;

/// The kinds a single value (or each element of a list) can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    String,
    Bool,
    F32,
    F64,
    Isize,
    I8,
    I16,
    I32,
    I64,
    Usize,
    U8,
    U16,
    U32,
    U64,
    Duration,
    Url,
    Regex,
}

impl ScalarKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Isize => "isize",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Usize => "usize",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::Duration => "duration",
            Self::Url => "url",
            Self::Regex => "regex",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared kind of a record field: a single value or an ordered list of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Scalar(ScalarKind),
    List(ScalarKind),
}

impl Kind {
    /// Kind of the value itself, or of each list element.
    pub fn element(self) -> ScalarKind {
        match self {
            Self::Scalar(kind) | Self::List(kind) => kind,
        }
    }

    pub fn is_list(self) -> bool {
        matches!(self, Self::List(_))
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{kind}"),
            Self::List(kind) => write!(f, "list<{kind}>"),
        }
    }
}

/// A single typed value.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    String(String),
    Bool(bool),
    F32(f32),
    F64(f64),
    Isize(isize),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Usize(usize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Duration(#[serde(serialize_with = "serialize_duration")] Duration),
    Url(Url),
    Regex(#[serde(serialize_with = "serialize_regex")] Regex),
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::String(_) => ScalarKind::String,
            Self::Bool(_) => ScalarKind::Bool,
            Self::F32(_) => ScalarKind::F32,
            Self::F64(_) => ScalarKind::F64,
            Self::Isize(_) => ScalarKind::Isize,
            Self::I8(_) => ScalarKind::I8,
            Self::I16(_) => ScalarKind::I16,
            Self::I32(_) => ScalarKind::I32,
            Self::I64(_) => ScalarKind::I64,
            Self::Usize(_) => ScalarKind::Usize,
            Self::U8(_) => ScalarKind::U8,
            Self::U16(_) => ScalarKind::U16,
            Self::U32(_) => ScalarKind::U32,
            Self::U64(_) => ScalarKind::U64,
            Self::Duration(_) => ScalarKind::Duration,
            Self::Url(_) => ScalarKind::Url,
            Self::Regex(_) => ScalarKind::Regex,
        }
    }
}

// Regex has no PartialEq; two patterns are equal when their source text is.
impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            // Bitwise, so a NaN equals itself and re-reading it is a no-op.
            (Self::F32(a), Self::F32(b)) => a.to_bits() == b.to_bits(),
            (Self::F64(a), Self::F64(b)) => a.to_bits() == b.to_bits(),
            (Self::Isize(a), Self::Isize(b)) => a == b,
            (Self::I8(a), Self::I8(b)) => a == b,
            (Self::I16(a), Self::I16(b)) => a == b,
            (Self::I32(a), Self::I32(b)) => a == b,
            (Self::I64(a), Self::I64(b)) => a == b,
            (Self::Usize(a), Self::Usize(b)) => a == b,
            (Self::U8(a), Self::U8(b)) => a == b,
            (Self::U16(a), Self::U16(b)) => a == b,
            (Self::U32(a), Self::U32(b)) => a == b,
            (Self::U64(a), Self::U64(b)) => a == b,
            (Self::Duration(a), Self::Duration(b)) => a == b,
            (Self::Url(a), Self::Url(b)) => a == b,
            (Self::Regex(a), Self::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(v) => f.write_str(v),
            Self::Bool(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::Isize(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::Usize(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::Duration(v) => write!(f, "{v:?}"),
            Self::Url(v) => f.write_str(v.as_str()),
            Self::Regex(v) => f.write_str(v.as_str()),
        }
    }
}

fn serialize_duration<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&format_args!("{value:?}"))
}

fn serialize_regex<S: Serializer>(value: &Regex, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_str())
}

/// The current or newly resolved value of a record field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    List {
        element: ScalarKind,
        items: Vec<Scalar>,
    },
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Scalar(scalar) => Kind::Scalar(scalar.kind()),
            Self::List { element, .. } => Kind::List(*element),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Scalar(scalar) => scalar.serialize(serializer),
            Self::List { items, .. } => items.serialize(serializer),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(scalar) => write!(f, "{scalar}"),
            Self::List { items, .. } => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// A Rust type that can be stored in a single [`Scalar`].
pub trait Element: Sized + Clone {
    const KIND: ScalarKind;

    fn to_scalar(&self) -> Scalar;

    fn from_scalar(scalar: Scalar) -> Option<Self>;
}

/// A Rust type a record field may have. Implemented for every [`Element`]
/// type and for `Vec` of each of them.
pub trait Field: Sized {
    const KIND: Kind;

    fn to_value(&self) -> Value;

    /// Returns `None` when `value` holds a different kind.
    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! impl_field {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const KIND: ScalarKind = ScalarKind::$variant;

                fn to_scalar(&self) -> Scalar {
                    Scalar::$variant(self.clone())
                }

                fn from_scalar(scalar: Scalar) -> Option<Self> {
                    match scalar {
                        Scalar::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }

            impl Field for $ty {
                const KIND: Kind = Kind::Scalar(ScalarKind::$variant);

                fn to_value(&self) -> Value {
                    Value::Scalar(self.to_scalar())
                }

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::Scalar(scalar) => <$ty as Element>::from_scalar(scalar),
                        _ => None,
                    }
                }
            }

            impl Field for Vec<$ty> {
                const KIND: Kind = Kind::List(ScalarKind::$variant);

                fn to_value(&self) -> Value {
                    Value::List {
                        element: ScalarKind::$variant,
                        items: self.iter().map(Element::to_scalar).collect(),
                    }
                }

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::List { element: ScalarKind::$variant, items } => items
                            .into_iter()
                            .map(<$ty as Element>::from_scalar)
                            .collect(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_field! {
    String => String,
    bool => Bool,
    f32 => F32,
    f64 => F64,
    isize => Isize,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    usize => Usize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    Duration => Duration,
    Url => Url,
    Regex => Regex,
}
