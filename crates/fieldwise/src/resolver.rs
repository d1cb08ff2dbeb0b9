//! Precedence-ordered raw value lookup.
//!
//! For each field the first source that has a value wins:
//! argument, then environment variable, then the file named by the file-env
//! variable. A present-but-empty argument still wins; an empty environment
//! variable counts as unset.

use std::path::{Path, PathBuf};

use fieldwise_core::{FieldwiseError, Result};

use crate::fields::FieldDescriptor;
use crate::options::{ENV_TELEPRESENCE_ROOT, Options};
use crate::sources::Sources;

/// Where a raw value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Arg,
    Env,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawValue {
    pub origin: Origin,
    pub text: String,
}

/// Result of resolving one field.
#[derive(Debug)]
pub struct Lookup {
    /// File consulted for the field, recorded even when the read failed.
    pub file: Option<PathBuf>,
    /// `Ok(None)` when no source had a value.
    pub outcome: Result<Option<RawValue>>,
}

impl Lookup {
    fn absent() -> Self {
        Self {
            file: None,
            outcome: Ok(None),
        }
    }

    fn found(origin: Origin, text: String) -> Self {
        Self {
            file: None,
            outcome: Ok(Some(RawValue { origin, text })),
        }
    }
}

pub struct Resolver<'a> {
    options: &'a Options,
    sources: &'a Sources,
}

impl<'a> Resolver<'a> {
    pub fn new(options: &'a Options, sources: &'a Sources) -> Self {
        Self { options, sources }
    }

    pub fn resolve(&self, field: &FieldDescriptor) -> Lookup {
        if !self.options.skip_arg {
            if let Some(text) = field
                .arg
                .as_deref()
                .and_then(|token| self.sources.args().lookup_arg(token))
            {
                return Lookup::found(Origin::Arg, text);
            }
        }

        if !self.options.skip_env {
            if let Some(text) = field
                .env
                .as_deref()
                .and_then(|token| self.sources.env().lookup_env(token))
                .filter(|text| !text.is_empty())
            {
                return Lookup::found(Origin::Env, text);
            }
        }

        if !self.options.skip_file_env {
            if let Some(path) = field
                .file_env
                .as_deref()
                .and_then(|token| self.sources.env().lookup_env(token))
                .filter(|path| !path.is_empty())
            {
                let path = self.locate(&path);
                let outcome = self.read(field, &path).map(|text| {
                    Some(RawValue {
                        origin: Origin::File(path.clone()),
                        text,
                    })
                });
                return Lookup {
                    file: Some(path),
                    outcome,
                };
            }
        }

        Lookup::absent()
    }

    /// Path a file-env value points at, re-rooted in telepresence mode.
    pub fn locate(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if !self.options.telepresence {
            return path.to_path_buf();
        }
        match self.sources.env().lookup_env(ENV_TELEPRESENCE_ROOT) {
            Some(root) if !root.is_empty() => {
                let relative = path.strip_prefix("/").unwrap_or(path);
                Path::new(&root).join(relative)
            }
            _ => path.to_path_buf(),
        }
    }

    /// Read a file-backed value, dropping one trailing line terminator.
    pub fn read(&self, field: &FieldDescriptor, path: &Path) -> Result<String> {
        let mut text = self
            .sources
            .files()
            .read_file(path)
            .map_err(|source| FieldwiseError::Unreadable {
                field: field.name.to_string(),
                path: path.to_path_buf(),
                source,
            })?;
        if text.ends_with('\n') {
            text.pop();
            if text.ends_with('\r') {
                text.pop();
            }
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::FileSource;
    use fieldwise_core::{Kind, ScalarKind};
    use std::collections::HashMap;
    use std::io;

    struct MemoryFiles(HashMap<PathBuf, String>);

    impl FileSource for MemoryFiles {
        fn read_file(&self, path: &Path) -> io::Result<String> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }
    }

    fn field(arg: Option<&str>, env: Option<&str>, file_env: Option<&str>) -> FieldDescriptor {
        FieldDescriptor {
            name: "log_level",
            kind: Kind::Scalar(ScalarKind::String),
            arg: arg.map(str::to_string),
            env: env.map(str::to_string),
            file_env: file_env.map(str::to_string),
            separator: ",".into(),
        }
    }

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn sources(env_level: &str) -> Sources {
        Sources::new(
            map(&[("log.level", "debug")]),
            map(&[("LOG_LEVEL", env_level), ("LOG_LEVEL_FILE", "/etc/app/level")]),
            MemoryFiles(HashMap::from([
                (PathBuf::from("/etc/app/level"), "error\n".to_string()),
                (PathBuf::from("/mnt/remote/etc/app/level"), "warn".to_string()),
            ])),
        )
    }

    fn resolve(
        options: &Options,
        sources: &Sources,
        field: &FieldDescriptor,
    ) -> (Option<RawValue>, Option<PathBuf>) {
        let lookup = Resolver::new(options, sources).resolve(field);
        (lookup.outcome.unwrap(), lookup.file)
    }

    fn text(raw: Option<RawValue>) -> Option<String> {
        raw.map(|r| r.text)
    }

    const ALL: (Option<&str>, Option<&str>, Option<&str>) =
        (Some("log.level"), Some("LOG_LEVEL"), Some("LOG_LEVEL_FILE"));

    #[test]
    fn test_argument_wins() {
        let (raw, file) = resolve(&Options::default(), &sources("info"), &field(ALL.0, ALL.1, ALL.2));
        assert_eq!(raw.as_ref().map(|r| &r.origin), Some(&Origin::Arg));
        assert_eq!(text(raw).as_deref(), Some("debug"));
        assert_eq!(file, None);
    }

    #[test]
    fn test_empty_argument_still_wins() {
        let sources = sources("info").with_args(map(&[("log.level", "")]));
        let (raw, _) = resolve(&Options::default(), &sources, &field(ALL.0, ALL.1, ALL.2));
        assert_eq!(text(raw).as_deref(), Some(""));
    }

    #[test]
    fn test_disabled_argument_token_falls_to_env() {
        let (raw, _) = resolve(&Options::default(), &sources("info"), &field(None, ALL.1, ALL.2));
        assert_eq!(text(raw).as_deref(), Some("info"));
    }

    #[test]
    fn test_disabled_argument_and_env_falls_to_file() {
        let (raw, file) = resolve(&Options::default(), &sources("info"), &field(None, None, ALL.2));
        assert_eq!(text(raw).as_deref(), Some("error"));
        assert_eq!(file, Some(PathBuf::from("/etc/app/level")));
    }

    #[test]
    fn test_all_disabled_is_absent() {
        let (raw, file) = resolve(&Options::default(), &sources("info"), &field(None, None, None));
        assert_eq!(raw, None);
        assert_eq!(file, None);
    }

    #[test]
    fn test_skip_options() {
        let f = field(ALL.0, ALL.1, ALL.2);
        let (raw, _) = resolve(&Options::default().skip_arg(), &sources("info"), &f);
        assert_eq!(text(raw).as_deref(), Some("info"));

        let (raw, _) = resolve(&Options::default().skip_arg().skip_env(), &sources("info"), &f);
        assert_eq!(text(raw).as_deref(), Some("error"));

        let options = Options::default().skip_arg().skip_env().skip_file_env();
        let (raw, file) = resolve(&options, &sources("info"), &f);
        assert_eq!(raw, None);
        assert_eq!(file, None);
    }

    #[test]
    fn test_empty_env_counts_as_unset() {
        let (raw, _) = resolve(&Options::default(), &sources(""), &field(None, ALL.1, ALL.2));
        assert_eq!(
            raw.map(|r| r.origin),
            Some(Origin::File(PathBuf::from("/etc/app/level")))
        );
    }

    #[test]
    fn test_telepresence_reroots_path() {
        let sources = sources("").with_env(map(&[
            ("LOG_LEVEL_FILE", "/etc/app/level"),
            (ENV_TELEPRESENCE_ROOT, "/mnt/remote"),
        ]));
        let options = Options::default().telepresence();
        let (raw, file) = resolve(&options, &sources, &field(None, ALL.1, ALL.2));
        assert_eq!(text(raw).as_deref(), Some("warn"));
        assert_eq!(file, Some(PathBuf::from("/mnt/remote/etc/app/level")));
    }

    #[test]
    fn test_telepresence_without_root_keeps_path() {
        let options = Options::default().telepresence();
        let (raw, _) = resolve(&options, &sources(""), &field(None, ALL.1, ALL.2));
        assert_eq!(text(raw).as_deref(), Some("error"));
    }

    #[test]
    fn test_unreadable_file_is_an_error_but_path_is_recorded() {
        let sources = sources("").with_env(map(&[("LOG_LEVEL_FILE", "/missing")]));
        let options = Options::default();
        let lookup = Resolver::new(&options, &sources).resolve(&field(None, ALL.1, ALL.2));
        assert_eq!(lookup.file, Some(PathBuf::from("/missing")));
        assert!(matches!(
            lookup.outcome,
            Err(FieldwiseError::Unreadable { ref field, .. }) if field == "log_level"
        ));
    }

    #[test]
    fn test_read_strips_one_line_terminator() {
        let files = MemoryFiles(HashMap::from([
            (PathBuf::from("/a"), "value\r\n".to_string()),
            (PathBuf::from("/b"), "value\n\n".to_string()),
        ]));
        let sources = Sources::new(map(&[]), map(&[]), files);
        let options = Options::default();
        let resolver = Resolver::new(&options, &sources);
        let f = field(None, None, None);
        assert_eq!(resolver.read(&f, Path::new("/a")).unwrap(), "value");
        assert_eq!(resolver.read(&f, Path::new("/b")).unwrap(), "value\n");
    }
}
