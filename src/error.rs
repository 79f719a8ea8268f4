//! Error type shared by all operations.

use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// What kind of filesystem entry a path is expected to be.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PathKind {
    File,
    Dir,
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKind::File => write!(f, "file"),
            PathKind::Dir => write!(f, "directory"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// A configured external tool or library is not where the configuration says.
    #[error("missing dependency {name}: {path}")]
    MissingDependency { name: &'static str, path: PathBuf },

    /// A required input or an expected output is absent.
    #[error("trying to use {kind} that does not exist: {path}")]
    MissingArtifact { kind: PathKind, path: PathBuf },

    #[error("unsupported configuration: {message}")]
    UnsupportedConfiguration { message: String },

    #[error("experiment directory already exists: {path} (delete it, pick another name, or allow replacing it)")]
    ExperimentExists { path: PathBuf },

    /// The external process ran but exited unsuccessfully.
    #[error("`{program}` failed with {status}{}", stderr_suffix(.stderr))]
    ToolFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("failed to start `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("malformed DIMACS CNF at line {line}: {message}")]
    Cnf { line: usize, message: String },

    #[error("invalid {what}: {value:?}")]
    InvalidValue { what: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Error::UnsupportedConfiguration {
            message: message.into(),
        }
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let tail = stderr.trim();
    if tail.is_empty() {
        String::new()
    } else {
        // Keep the last few lines, the rest is usually progress noise.
        let lines: Vec<&str> = tail.lines().collect();
        let start = lines.len().saturating_sub(5);
        format!(":\n{}", lines[start..].join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_missing_artifact_message() {
        let err = Error::MissingArtifact {
            kind: PathKind::Dir,
            path: PathBuf::from("/nowhere"),
        };
        assert_eq!(err.to_string(), "trying to use directory that does not exist: /nowhere");
    }

    #[test]
    fn test_stderr_suffix_keeps_tail() {
        assert_eq!(stderr_suffix("  \n"), "");
        let noisy = (1..=8).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
        assert_eq!(stderr_suffix(&noisy), ":\nline 4\nline 5\nline 6\nline 7\nline 8");
    }
}
