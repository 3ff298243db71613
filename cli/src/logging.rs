//! Tracing subscriber setup.
//!
//! The dashboard owns the terminal, so in TUI mode logs go to a file. The
//! one-shot commands log to stderr.
//!
//! Filter priority: `QUAKEWATCH_LOG`, then `RUST_LOG`, then `--verbose`.

use anyhow::{anyhow, Context, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "QUAKEWATCH_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

pub fn default_log_file() -> PathBuf {
    std::env::temp_dir().join("quakewatch.log")
}

pub fn init(verbose: bool, target: &LogTarget) -> Result<()> {
    let filter = build_env_filter(verbose);
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = open_log_file(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };

    installed.map_err(|err| anyhow!(err).context("Failed to install tracing subscriber"))
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

fn build_env_filter(verbose: bool) -> EnvFilter {
    if let Ok(directives) = std::env::var(LOG_ENV) {
        if let Ok(filter) = EnvFilter::try_new(&directives) {
            return filter;
        }
    }

    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    EnvFilter::new(default_directives(verbose))
}

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "warn,quakewatch=debug"
    } else {
        "warn,quakewatch=info"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_parse() {
        for verbose in [false, true] {
            assert!(EnvFilter::try_new(default_directives(verbose)).is_ok());
        }
        assert!(default_directives(true).contains("debug"));
    }

    #[test]
    fn log_file_is_created_in_append_mode() {
        let path = std::env::temp_dir().join(format!("quakewatch-test-{}.log", std::process::id()));
        let _ = std::fs::remove_file(&path);

        open_log_file(&path).unwrap();
        assert!(path.exists());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn unwritable_log_path_is_reported() {
        let path = std::env::temp_dir().join("no-such-dir-quakewatch").join("x.log");
        let err = open_log_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to open log file"));
    }
}
