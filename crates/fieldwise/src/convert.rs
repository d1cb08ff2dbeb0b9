//! String to typed value conversion.
//!
//! Every supported kind has one parse rule; list kinds split the raw string
//! on the field's separator and convert each element, failing as a whole if
//! any element fails.

use std::time::Duration;

use fieldwise_core::{
    Configurable, ConvertError, FieldwiseError, Kind, Result, Scalar, ScalarKind, Value,
};
use regex::Regex;
use url::Url;

use crate::fields::FieldDescriptor;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Parse a compound duration such as `90m`, `1h30m`, `1.5s` or `300ms`.
///
/// Units: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. A bare `0` is allowed
/// without a unit. Negative durations are rejected.
pub fn parse_duration(raw: &str) -> std::result::Result<Duration, String> {
    let s = raw.strip_prefix('+').unwrap_or(raw);
    if s.starts_with('-') {
        return Err("negative durations are not supported".into());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err("empty duration".into());
    }

    let mut rest = s;
    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (int_part, after) = rest.split_at(int_end);
        let (frac_part, after) = match after.strip_prefix('.') {
            Some(after) => {
                let end = after.find(|c: char| !c.is_ascii_digit()).unwrap_or(after.len());
                after.split_at(end)
            }
            None => ("", after),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err("expected a number".into());
        }

        let unit_end = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let (unit, next) = after.split_at(unit_end);
        let scale: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SEC,
            "m" => 60 * NANOS_PER_SEC,
            "h" => 3_600 * NANOS_PER_SEC,
            "" => return Err("missing unit".into()),
            other => return Err(format!("unknown unit {other:?}")),
        };

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| "number out of range".to_string())?
        };
        let mut nanos = whole
            .checked_mul(scale)
            .ok_or_else(|| "duration out of range".to_string())?;
        if !frac_part.is_empty() {
            // Digits past the 18th cannot move the result by a nanosecond.
            let digits = &frac_part[..frac_part.len().min(18)];
            let frac: u128 = digits.parse().map_err(|_| "invalid fraction".to_string())?;
            nanos += frac * scale / 10u128.pow(digits.len() as u32);
        }
        total = total
            .checked_add(nanos)
            .ok_or_else(|| "duration out of range".to_string())?;
        rest = next;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| "duration out of range".to_string())?;
    Ok(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}

macro_rules! parse_number {
    ($kind:expr, $raw:expr, $variant:ident, $ty:ty) => {
        $raw.parse::<$ty>()
            .map(Scalar::$variant)
            .map_err(|e| ConvertError::new($kind, $raw, e))
    };
}

/// Convert one raw string into a value of `kind`.
pub fn parse_scalar(kind: ScalarKind, raw: &str) -> std::result::Result<Scalar, ConvertError> {
    match kind {
        ScalarKind::String => Ok(Scalar::String(raw.to_string())),
        ScalarKind::Bool => parse_bool(raw)
            .map(Scalar::Bool)
            .ok_or_else(|| ConvertError::new(kind, raw, "expected a boolean")),
        ScalarKind::F32 => parse_number!(kind, raw, F32, f32),
        ScalarKind::F64 => parse_number!(kind, raw, F64, f64),
        ScalarKind::Isize => parse_number!(kind, raw, Isize, isize),
        ScalarKind::I8 => parse_number!(kind, raw, I8, i8),
        ScalarKind::I16 => parse_number!(kind, raw, I16, i16),
        ScalarKind::I32 => parse_number!(kind, raw, I32, i32),
        ScalarKind::I64 => parse_number!(kind, raw, I64, i64),
        ScalarKind::Usize => parse_number!(kind, raw, Usize, usize),
        ScalarKind::U8 => parse_number!(kind, raw, U8, u8),
        ScalarKind::U16 => parse_number!(kind, raw, U16, u16),
        ScalarKind::U32 => parse_number!(kind, raw, U32, u32),
        ScalarKind::U64 => parse_number!(kind, raw, U64, u64),
        ScalarKind::Duration => parse_duration(raw)
            .map(Scalar::Duration)
            .map_err(|e| ConvertError::new(kind, raw, e)),
        ScalarKind::Url => Url::parse(raw)
            .map(Scalar::Url)
            .map_err(|e| ConvertError::new(kind, raw, e)),
        ScalarKind::Regex => Regex::new(raw)
            .map(Scalar::Regex)
            .map_err(|e| ConvertError::new(kind, raw, e)),
    }
}

/// Convert a raw string into a value of `kind`. List kinds split on
/// `separator`; an empty string is an empty list.
pub fn convert(kind: Kind, raw: &str, separator: &str) -> std::result::Result<Value, ConvertError> {
    match kind {
        Kind::Scalar(kind) => parse_scalar(kind, raw).map(Value::Scalar),
        Kind::List(element) => {
            let items = if raw.is_empty() {
                Vec::new()
            } else {
                raw.split(separator)
                    .map(|item| parse_scalar(element, item))
                    .collect::<std::result::Result<Vec<_>, _>>()?
            };
            Ok(Value::List { element, items })
        }
    }
}

/// Convert `raw` for `field` and store it into `record` if it differs from
/// the field's current value.
///
/// Returns the new value when the field changed, `None` when the converted
/// value equals the current one. On error the record is left untouched.
pub fn apply<T: Configurable>(
    record: &mut T,
    field: &FieldDescriptor,
    raw: &str,
) -> Result<Option<Value>> {
    let value = convert(field.kind, raw, &field.separator).map_err(|source| {
        FieldwiseError::Conversion {
            field: field.name.to_string(),
            source,
        }
    })?;

    if record.field_value(field.name).as_ref() == Some(&value) {
        return Ok(None);
    }
    if !record.set_field_value(field.name, value.clone()) {
        return Err(FieldwiseError::Structure(format!(
            "field {} rejected a {} value",
            field.name, field.kind
        )));
    }
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_forms() {
        for raw in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(parse_bool(raw), Some(true), "{raw}");
        }
        for raw in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(parse_bool(raw), Some(false), "{raw}");
        }
        assert_eq!(parse_bool("yes"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("90m"), Ok(Duration::from_secs(90 * 60)));
        assert_eq!(parse_duration("4h"), Ok(Duration::from_secs(4 * 3600)));
        assert_eq!(parse_duration("300ms"), Ok(Duration::from_millis(300)));
        assert_eq!(parse_duration("10us"), Ok(Duration::from_micros(10)));
        assert_eq!(parse_duration("10µs"), Ok(Duration::from_micros(10)));
        assert_eq!(parse_duration("7ns"), Ok(Duration::from_nanos(7)));
        assert_eq!(parse_duration("0"), Ok(Duration::ZERO));
    }

    #[test]
    fn test_parse_duration_compound_and_fractional() {
        assert_eq!(parse_duration("1h30m"), Ok(Duration::from_secs(5400)));
        assert_eq!(parse_duration("1.5s"), Ok(Duration::from_millis(1500)));
        assert_eq!(parse_duration(".5h"), Ok(Duration::from_secs(1800)));
        assert_eq!(parse_duration("2h45m30.5s"), Ok(Duration::from_millis(9_930_500)));
        assert_eq!(parse_duration("+5s"), Ok(Duration::from_secs(5)));
    }

    #[test]
    fn test_parse_duration_rejects_malformed() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("90").is_err());
        assert!(parse_duration("5d").is_err());
        assert!(parse_duration("-1s").is_err());
        assert!(parse_duration("h").is_err());
        assert!(parse_duration("1.s.").is_err());
    }

    #[test]
    fn test_integers_respect_width_and_sign() {
        assert_eq!(parse_scalar(ScalarKind::I8, "-128"), Ok(Scalar::I8(-128)));
        assert!(parse_scalar(ScalarKind::I8, "128").is_err());
        assert!(parse_scalar(ScalarKind::U8, "-1").is_err());
        assert_eq!(
            parse_scalar(ScalarKind::U64, "18446744073709551615"),
            Ok(Scalar::U64(u64::MAX))
        );
        assert!(parse_scalar(ScalarKind::U64, "18446744073709551616").is_err());
        assert_eq!(
            parse_scalar(ScalarKind::I64, "-9223372036854775808"),
            Ok(Scalar::I64(i64::MIN))
        );
    }

    #[test]
    fn test_floats() {
        assert_eq!(parse_scalar(ScalarKind::F32, "3.1415"), Ok(Scalar::F32(3.1415)));
        assert_eq!(
            parse_scalar(ScalarKind::F64, "2.7182818284"),
            Ok(Scalar::F64(2.7182818284))
        );
        assert!(parse_scalar(ScalarKind::F64, "pi").is_err());
    }

    #[test]
    fn test_composites() {
        let url = parse_scalar(ScalarKind::Url, "http://service-1:8080").unwrap();
        assert_eq!(url.to_string(), "http://service-1:8080/");
        assert!(parse_scalar(ScalarKind::Url, "not a url").is_err());

        let re = parse_scalar(ScalarKind::Regex, "[[:digit:]]+").unwrap();
        assert_eq!(re.to_string(), "[[:digit:]]+");
        assert!(parse_scalar(ScalarKind::Regex, "([").is_err());
    }

    #[test]
    fn test_list_conversion_preserves_order() {
        let value = convert(Kind::List(ScalarKind::I16), "32767,-32768", ",").unwrap();
        assert_eq!(
            value,
            Value::List {
                element: ScalarKind::I16,
                items: vec![Scalar::I16(32767), Scalar::I16(-32768)],
            }
        );
    }

    #[test]
    fn test_list_with_custom_separator() {
        let value = convert(Kind::List(ScalarKind::String), "a,b|c", "|").unwrap();
        assert_eq!(
            value,
            Value::List {
                element: ScalarKind::String,
                items: vec![Scalar::String("a,b".into()), Scalar::String("c".into())],
            }
        );
    }

    #[test]
    fn test_list_fails_when_any_element_fails() {
        let err = convert(Kind::List(ScalarKind::U8), "1,2,256", ",").unwrap_err();
        assert_eq!(err.kind, ScalarKind::U8);
        assert_eq!(err.input, "256");
    }

    #[test]
    fn test_empty_list() {
        let value = convert(Kind::List(ScalarKind::U8), "", ",").unwrap();
        assert_eq!(
            value,
            Value::List {
                element: ScalarKind::U8,
                items: vec![]
            }
        );
    }

    #[test]
    fn test_split_join_roundtrip() {
        for (raw, sep) in [("milad,mona", ","), ("a|b|c", "|"), ("one", ","), ("x::y", "::")] {
            let Value::List { items, .. } = convert(Kind::List(ScalarKind::String), raw, sep).unwrap()
            else {
                panic!("expected a list");
            };
            let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
            assert_eq!(parts.join(sep), raw);
        }
    }
}
