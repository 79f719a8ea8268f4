//! Structured command lines.
//!
//! An [`Invocation`] is a program, an ordered list of arguments, and extra
//! environment variables for the child. Operations build one with the
//! `arg`/`flag`/`opt` helpers in the order the external tool's parser expects,
//! and hand it to a [`ProcessRunner`](crate::runner::ProcessRunner).
//!
//! The [`Display`](fmt::Display) form is what gets logged. It is deterministic:
//! the same invocation always prints the same string, with shell quoting applied
//! to arguments that need it.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Invocation {
    program: OsString,
    args: Vec<OsString>,
    env: Vec<(String, OsString)>,
}

impl Invocation {
    /// Runs `program` with no arguments and the parent's environment.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// `java -jar <jar>`, the prefix of every learner command.
    pub fn java_jar(java: impl Into<OsString>, jar: &Path) -> Self {
        Self::new(java).arg("-jar").arg(jar)
    }

    /// Appends a positional argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Appends `flag value`.
    pub fn flag(self, flag: &str, value: impl AsRef<OsStr>) -> Self {
        self.arg(flag).arg(value)
    }

    /// Appends `flag value` when `value` is present, nothing otherwise.
    pub fn opt<V: AsRef<OsStr>>(self, flag: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.flag(flag, value),
            None => self,
        }
    }

    /// Appends a bare switch when `on` is set.
    pub fn switch(self, flag: &str, on: bool) -> Self {
        if on {
            self.arg(flag)
        } else {
            self
        }
    }

    /// Sets an environment variable on the child.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.env.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.env.push((key, value)),
        }
        self
    }

    /// Program name or path, as handed to the OS.
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Arguments in command-line order.
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn envs(&self) -> &[(String, OsString)] {
        &self.env
    }

    /// Value following the first occurrence of `flag`, if any.
    pub fn value_of(&self, flag: &str) -> Option<&OsStr> {
        let pos = self.args.iter().position(|a| a == flag)?;
        self.args.get(pos + 1).map(|v| v.as_os_str())
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(s: &OsStr) -> String {
    let s = s.to_string_lossy();
    let plain = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./,:=+@%".contains(c));
    if plain {
        s.into_owned()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

/// A `PATH`-like search path variable.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct SearchPath {
    entries: Vec<PathBuf>,
}

impl SearchPath {
    pub fn parse(value: Option<&OsStr>) -> Self {
        let entries = match value {
            Some(v) if !v.is_empty() => std::env::split_paths(v).collect(),
            _ => Vec::new(),
        };
        Self { entries }
    }

    /// Reads the variable from the current process environment.
    pub fn from_env(key: &str) -> Self {
        Self::parse(std::env::var_os(key).as_deref())
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.entries.iter().any(|e| same_dir(e, dir))
    }

    /// Appends `dir` unless already present. Returns whether anything changed.
    pub fn append(&mut self, dir: &Path) -> bool {
        if self.contains(dir) {
            false
        } else {
            self.entries.push(dir.to_path_buf());
            true
        }
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Joins the entries with the platform separator.
    ///
    /// Fails if an entry contains the separator itself, since the child would
    /// split it into two unrelated directories.
    pub fn join(&self) -> Result<OsString> {
        std::env::join_paths(&self.entries).map_err(|_| {
            let bad = self
                .entries
                .iter()
                .find(|e| std::env::join_paths([e]).is_err())
                .map_or_else(String::new, |e| e.display().to_string());
            Error::InvalidValue {
                what: "search path entry",
                value: bad,
            }
        })
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    // `lib/` and `lib` name the same directory.
    a.components().eq(b.components())
}
