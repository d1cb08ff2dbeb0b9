//! Source token derivation from field names.
//!
//! A field name is split into words at `_` and at case transitions (a run of
//! capitals stays one word, digits stick to the word before them), then:
//!
//! | source   | rule                          | `field_string_slice`        |
//! |----------|-------------------------------|-----------------------------|
//! | argument | lower-case, joined with `.`   | `field.string.slice`        |
//! | env      | upper-case, joined with `_`   | `FIELD_STRING_SLICE`        |
//! | file-env | env token + `_FILE`           | `FIELD_STRING_SLICE_FILE`   |

use fieldwise_core::Directive;

/// Split an identifier into words.
pub fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c == '.' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

pub fn arg_name(prefix: &str, name: &str) -> String {
    let words: Vec<String> = split_words(name).iter().map(|w| w.to_lowercase()).collect();
    format!("{prefix}{}", words.join("."))
}

pub fn env_name(prefix: &str, name: &str) -> String {
    let words: Vec<String> = split_words(name).iter().map(|w| w.to_uppercase()).collect();
    format!("{prefix}{}", words.join("_"))
}

pub fn file_env_name(prefix: &str, name: &str) -> String {
    format!("{}_FILE", env_name(prefix, name))
}

/// Apply a directive: explicit tokens are used verbatim, `None` means the
/// source is disabled for the field.
pub fn token(
    directive: Directive,
    prefix: &str,
    name: &str,
    derive: fn(&str, &str) -> String,
) -> Option<String> {
    match directive {
        Directive::Derive => Some(derive(prefix, name)),
        Directive::Name(token) => Some(token.to_string()),
        Directive::Disabled => None,
    }
}
