//! The three capabilities the resolver reads raw values through.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// "Is there a value registered for this argument token?"
pub trait ArgSource: Send + Sync {
    fn lookup_arg(&self, name: &str) -> Option<String>;
}

/// Raw environment variable lookup.
pub trait EnvSource: Send + Sync {
    fn lookup_env(&self, name: &str) -> Option<String>;
}

/// Whole-file reads for file-backed values.
pub trait FileSource: Send + Sync {
    fn read_file(&self, path: &Path) -> io::Result<String>;
}

impl ArgSource for HashMap<String, String> {
    fn lookup_arg(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl EnvSource for HashMap<String, String> {
    fn lookup_env(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Arguments of the form `-name=value`, `--name=value`, `-name value` and
/// bare `-name` (an empty value). Parsing stops at `--`; later occurrences
/// of a name win.
///
/// A token following a flag is taken as its value unless it looks like a
/// flag itself; negative numbers (`-5`, `-.5`) count as values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    values: HashMap<String, String>,
}

impl CommandLine {
    /// Arguments of the current process, without the program name.
    /// Arguments that are not valid UTF-8 are converted lossily.
    pub fn from_env() -> Self {
        Self::parse_os(std::env::args_os().skip(1))
    }

    pub fn parse_os<I>(args: I) -> Self
    where
        I: IntoIterator<Item = OsString>,
    {
        Self::parse(args.into_iter().map(|arg| {
            arg.into_string()
                .unwrap_or_else(|raw| raw.to_string_lossy().into_owned())
        }))
    }

    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut values = HashMap::new();
        let mut args = args.into_iter().map(Into::into).peekable();

        while let Some(arg) = args.next() {
            if arg == "--" {
                break;
            }
            let Some(flag) = flag_name(&arg) else {
                continue;
            };
            match flag.split_once('=') {
                Some((name, value)) => {
                    values.insert(name.to_string(), value.to_string());
                }
                None => {
                    let name = flag.to_string();
                    let value = args.next_if(|next| !looks_like_flag(next)).unwrap_or_default();
                    values.insert(name, value);
                }
            }
        }

        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ArgSource for CommandLine {
    fn lookup_arg(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

fn looks_like_flag(arg: &str) -> bool {
    match arg.strip_prefix('-') {
        Some(rest) => !rest.is_empty() && !rest.starts_with(|c: char| c.is_ascii_digit() || c == '.'),
        None => false,
    }
}

fn flag_name(arg: &str) -> Option<&str> {
    if !looks_like_flag(arg) {
        return None;
    }
    let name = arg.strip_prefix("--").unwrap_or(&arg[1..]);
    if name.is_empty() || name.starts_with('-') || name.starts_with('=') {
        return None;
    }
    Some(name)
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn lookup_env(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// The local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct Filesystem;

impl FileSource for Filesystem {
    fn read_file(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// The set of capabilities one controller reads from.
#[derive(Clone)]
pub struct Sources {
    args: Arc<dyn ArgSource>,
    env: Arc<dyn EnvSource>,
    files: Arc<dyn FileSource>,
}

impl Sources {
    pub fn new(
        args: impl ArgSource + 'static,
        env: impl EnvSource + 'static,
        files: impl FileSource + 'static,
    ) -> Self {
        Self {
            args: Arc::new(args),
            env: Arc::new(env),
            files: Arc::new(files),
        }
    }

    /// Process arguments, process environment and the local filesystem.
    pub fn process() -> Self {
        Self::new(CommandLine::from_env(), ProcessEnv, Filesystem)
    }

    pub fn with_args(mut self, args: impl ArgSource + 'static) -> Self {
        self.args = Arc::new(args);
        self
    }

    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    pub fn with_files(mut self, files: impl FileSource + 'static) -> Self {
        self.files = Arc::new(files);
        self
    }

    pub fn args(&self) -> &dyn ArgSource {
        self.args.as_ref()
    }

    pub fn env(&self) -> &dyn EnvSource {
        self.env.as_ref()
    }

    pub fn files(&self) -> &dyn FileSource {
        self.files.as_ref()
    }
}

impl Default for Sources {
    fn default() -> Self {
        Self::process()
    }
}

impl fmt::Debug for Sources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sources").finish_non_exhaustive()
    }
}
