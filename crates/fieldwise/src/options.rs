use std::fmt;
use std::time::Duration;

use crate::convert::{parse_bool, parse_duration};
use crate::sources::EnvSource;

pub const DEFAULT_LIST_SEP: &str = ",";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub const ENV_DEBUG: &str = "FIELDWISE_DEBUG";
pub const ENV_LIST_SEP: &str = "FIELDWISE_LIST_SEP";
pub const ENV_SKIP_ARG: &str = "FIELDWISE_SKIP_ARG";
pub const ENV_SKIP_ENV: &str = "FIELDWISE_SKIP_ENV";
pub const ENV_SKIP_FILE_ENV: &str = "FIELDWISE_SKIP_FILE_ENV";
pub const ENV_PREFIX_ARG: &str = "FIELDWISE_PREFIX_ARG";
pub const ENV_PREFIX_ENV: &str = "FIELDWISE_PREFIX_ENV";
pub const ENV_PREFIX_FILE_ENV: &str = "FIELDWISE_PREFIX_FILE_ENV";
pub const ENV_TELEPRESENCE: &str = "FIELDWISE_TELEPRESENCE";
pub const ENV_POLL_INTERVAL: &str = "FIELDWISE_POLL_INTERVAL";

/// Root under which file-backed paths are re-rooted in telepresence mode.
pub const ENV_TELEPRESENCE_ROOT: &str = "TELEPRESENCE_ROOT";

/// Resolution-wide settings.
///
/// Start from [`Options::default`] or [`Options::from_env`] and chain the
/// named option methods; each method overrides whatever the environment set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Log verbosity, 0 (quiet) to 3 (raw values).
    pub debug: u8,
    /// Default separator for list fields.
    pub list_sep: String,
    pub skip_arg: bool,
    pub skip_env: bool,
    pub skip_file_env: bool,
    pub arg_prefix: String,
    pub env_prefix: String,
    pub file_env_prefix: String,
    /// Re-root file-backed paths under `$TELEPRESENCE_ROOT`.
    pub telepresence: bool,
    /// How often a watch session re-reads its files.
    pub poll_interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            debug: 0,
            list_sep: DEFAULT_LIST_SEP.into(),
            skip_arg: false,
            skip_env: false,
            skip_file_env: false,
            arg_prefix: String::new(),
            env_prefix: String::new(),
            file_env_prefix: String::new(),
            telepresence: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl Options {
    /// Defaults overlaid with the `FIELDWISE_*` variables found in `env`.
    /// Values that do not parse are ignored.
    pub fn from_env(env: &dyn EnvSource) -> Self {
        let mut options = Self::default();

        if let Some(level) = env.lookup_env(ENV_DEBUG).and_then(|v| v.parse::<u8>().ok()) {
            if (1..=3).contains(&level) {
                options.debug = level;
            }
        }
        if let Some(sep) = env.lookup_env(ENV_LIST_SEP).filter(|v| !v.is_empty()) {
            options.list_sep = sep;
        }

        let flag = |name: &str| env.lookup_env(name).and_then(|v| parse_bool(&v));
        if let Some(skip) = flag(ENV_SKIP_ARG) {
            options.skip_arg = skip;
        }
        if let Some(skip) = flag(ENV_SKIP_ENV) {
            options.skip_env = skip;
        }
        if let Some(skip) = flag(ENV_SKIP_FILE_ENV) {
            options.skip_file_env = skip;
        }
        if let Some(telepresence) = flag(ENV_TELEPRESENCE) {
            options.telepresence = telepresence;
        }

        if let Some(prefix) = env.lookup_env(ENV_PREFIX_ARG) {
            options.arg_prefix = prefix;
        }
        if let Some(prefix) = env.lookup_env(ENV_PREFIX_ENV) {
            options.env_prefix = prefix;
        }
        if let Some(prefix) = env.lookup_env(ENV_PREFIX_FILE_ENV) {
            options.file_env_prefix = prefix;
        }

        if let Some(interval) = env
            .lookup_env(ENV_POLL_INTERVAL)
            .and_then(|v| parse_duration(&v).ok())
            .filter(|d| !d.is_zero())
        {
            options.poll_interval = interval;
        }

        options
    }

    pub fn debug(mut self, verbosity: u8) -> Self {
        self.debug = verbosity;
        self
    }

    pub fn list_sep(mut self, sep: impl Into<String>) -> Self {
        self.list_sep = sep.into();
        self
    }

    pub fn skip_arg(mut self) -> Self {
        self.skip_arg = true;
        self
    }

    pub fn skip_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    pub fn skip_file_env(mut self) -> Self {
        self.skip_file_env = true;
        self
    }

    pub fn arg_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.arg_prefix = prefix.into();
        self
    }

    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn file_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_env_prefix = prefix.into();
        self
    }

    pub fn telepresence(mut self) -> Self {
        self.telepresence = true;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub(crate) fn parts(&self) -> Vec<String> {
        let mut parts = Vec::new();
        if self.debug > 0 {
            parts.push(format!("Debug<{}>", self.debug));
        }
        if self.list_sep != DEFAULT_LIST_SEP {
            parts.push(format!("ListSep<{}>", self.list_sep));
        }
        if self.skip_arg {
            parts.push("SkipArg".into());
        }
        if self.skip_env {
            parts.push("SkipEnv".into());
        }
        if self.skip_file_env {
            parts.push("SkipFileEnv".into());
        }
        if !self.arg_prefix.is_empty() {
            parts.push(format!("PrefixArg<{}>", self.arg_prefix));
        }
        if !self.env_prefix.is_empty() {
            parts.push(format!("PrefixEnv<{}>", self.env_prefix));
        }
        if !self.file_env_prefix.is_empty() {
            parts.push(format!("PrefixFileEnv<{}>", self.file_env_prefix));
        }
        if self.telepresence {
            parts.push("Telepresence".into());
        }
        if self.poll_interval != DEFAULT_POLL_INTERVAL {
            parts.push(format!("PollInterval<{:?}>", self.poll_interval));
        }
        parts
    }
}

impl fmt::Display for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.parts().join(" + "))
    }
}
