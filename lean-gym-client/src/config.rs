//! Configuration for lean-gym connections.

use std::path::{Path, PathBuf};

/// Default program run inside the multiplexer session.
pub const DEFAULT_REPL_PROGRAM: &str = "lean";

/// Default arguments passed to the REPL program.
pub const DEFAULT_REPL_ARGS: &[&str] = &["--run", "src/repl.lean"];

/// Default prefix for generated session names.
pub const DEFAULT_SESSION_PREFIX: &str = "lean_repl";

/// Configuration for a lean-gym connection.
#[derive(Debug, Clone)]
pub struct LeanGymConfig {
    /// Path to the `screen` executable.
    /// If None, `screen` is looked up in PATH.
    pub multiplexer_path: Option<PathBuf>,

    /// REPL program launched inside the session.
    pub repl_program: String,

    /// Arguments passed to the REPL program.
    pub repl_args: Vec<String>,

    /// Prefix for generated session names.
    pub session_prefix: String,

    /// Sleep between empty log reads while collecting, in milliseconds.
    pub poll_interval_ms: u64,

    /// Upper bound for a single `collect` call in milliseconds.
    /// If None, `collect` polls until every outstanding response arrives.
    pub timeout_ms: Option<u64>,

    /// Whether to log wire traffic.
    pub verbose: bool,
}

impl Default for LeanGymConfig {
    fn default() -> Self {
        Self {
            multiplexer_path: None,
            repl_program: DEFAULT_REPL_PROGRAM.to_string(),
            repl_args: DEFAULT_REPL_ARGS.iter().map(|s| s.to_string()).collect(),
            session_prefix: DEFAULT_SESSION_PREFIX.to_string(),
            poll_interval_ms: 10,
            timeout_ms: Some(300_000), // init_search may load all of mathlib
            verbose: false,
        }
    }
}

impl LeanGymConfig {
    /// Create configuration from environment variables.
    ///
    /// `LEAN_GYM_TIMEOUT_MS=0` disables the collect timeout.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            multiplexer_path: std::env::var("LEAN_GYM_SCREEN")
                .ok()
                .map(|p| expand_path(&p)),
            repl_program: std::env::var("LEAN_GYM_REPL").unwrap_or(defaults.repl_program),
            timeout_ms: match std::env::var("LEAN_GYM_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
            {
                Some(0) => None,
                Some(ms) => Some(ms),
                None => defaults.timeout_ms,
            },
            poll_interval_ms: std::env::var("LEAN_GYM_POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.poll_interval_ms),
            verbose: std::env::var("LEAN_GYM_VERBOSE")
                .map(|s| s != "0" && s.to_lowercase() != "false")
                .unwrap_or(defaults.verbose),
            ..defaults
        }
    }

    /// Use an explicit `screen` executable.
    pub fn with_multiplexer(mut self, path: impl AsRef<Path>) -> Self {
        self.multiplexer_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the REPL program and its arguments.
    pub fn with_repl(
        mut self,
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.repl_program = program.into();
        self.repl_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the session name prefix.
    pub fn with_session_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.session_prefix = prefix.into();
        self
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Set the collect timeout.
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Poll without a deadline.
    pub fn without_timeout(mut self) -> Self {
        self.timeout_ms = None;
        self
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Expand a leading `~` in a user-supplied path.
pub(crate) fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = LeanGymConfig::default();
        assert!(config.multiplexer_path.is_none());
        assert_eq!(config.repl_program, "lean");
        assert_eq!(config.repl_args, vec!["--run", "src/repl.lean"]);
        assert_eq!(config.session_prefix, "lean_repl");
        assert_eq!(config.timeout_ms, Some(300_000));
    }

    #[test]
    fn test_config_builders() {
        let config = LeanGymConfig::default()
            .with_multiplexer("/usr/bin/screen")
            .with_repl("lake", ["env", "lean", "--run", "src/repl.lean"])
            .with_session_prefix("gym")
            .with_poll_interval(1)
            .without_timeout()
            .with_verbose(true);

        assert_eq!(
            config.multiplexer_path,
            Some(PathBuf::from("/usr/bin/screen"))
        );
        assert_eq!(config.repl_program, "lake");
        assert_eq!(config.repl_args.len(), 4);
        assert_eq!(config.session_prefix, "gym");
        assert_eq!(config.poll_interval_ms, 1);
        assert!(config.timeout_ms.is_none());
        assert!(config.verbose);
    }

    #[test]
    fn test_expand_path_leaves_absolute_paths() {
        assert_eq!(expand_path("/opt/lean-gym"), PathBuf::from("/opt/lean-gym"));
    }

    #[test]
    fn test_expand_path_expands_tilde() {
        let expanded = expand_path("~/lean-gym");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.ends_with("lean-gym"));
    }
}
