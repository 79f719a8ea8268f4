//! Shared fixtures: a fake tool installation and a runner that plays the tools.

#![allow(dead_code)]

use std::cell::RefCell;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;

use learn_psdd::command::Invocation;
use learn_psdd::config::ToolConfig;
use learn_psdd::error::{Error, Result};
use learn_psdd::runner::{ProcessRunner, RunOutput};
use learn_psdd::toolchain::{sdd_binary_name, Toolchain};

pub struct Install {
    pub home: tempfile::TempDir,
    pub config: ToolConfig,
}

impl Install {
    /// Lays out jar, library dir, SDD compiler and `java`/`dot` stubs below a temporary home.
    pub fn new() -> Self {
        let home = tempfile::tempdir().unwrap();
        let mut config = ToolConfig::from_home(home.path());
        let root = &config.learnpsdd_root;
        fs::create_dir_all(root.join("target/scala-2.11")).unwrap();
        fs::create_dir_all(root.join("lib")).unwrap();
        fs::write(root.join("target/scala-2.11/psdd.jar"), b"jar").unwrap();
        fs::create_dir_all(&config.sdd_bin).unwrap();
        fs::write(config.sdd_bin.join(sdd_binary_name()), b"elf").unwrap();
        let bin = home.path().join("bin");
        config.java = executable(&bin, "java").display().to_string();
        config.dot = executable(&bin, "dot").display().to_string();
        Self { home, config }
    }

    pub fn toolchain(&self) -> Toolchain {
        Toolchain::resolve(&self.config).unwrap()
    }

    /// Writes `content` to `name` below the temporary home.
    pub fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.home.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.home.path().join(name)
    }
}

fn executable(dir: &Path, name: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }
    path
}

pub fn status(code: i32) -> ExitStatus {
    #[cfg(unix)]
    use std::os::unix::process::ExitStatusExt;
    #[cfg(windows)]
    use std::os::windows::process::ExitStatusExt;

    #[cfg(unix)]
    let raw = code << 8;
    #[cfg(windows)]
    let raw = code as u32;
    ExitStatus::from_raw(raw)
}

fn ok() -> RunOutput {
    RunOutput {
        status: status(0),
        stdout: String::new(),
        stderr: String::new(),
        duration: Duration::ZERO,
    }
}

fn touch(path: impl AsRef<Path>, content: &str) {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Records every invocation and writes the files each tool would produce.
#[derive(Default)]
pub struct FakeTools {
    pub calls: RefCell<Vec<Invocation>>,
    /// Learner mode that exits with status 1 instead of producing output.
    pub fail_mode: Option<&'static str>,
}

impl FakeTools {
    pub fn failing(mode: &'static str) -> Self {
        Self {
            fail_mode: Some(mode),
            ..Self::default()
        }
    }

    /// Learner modes (`learnVtree`, `sdd2psdd`, ...) and `sdd`/`dot`, in call order.
    pub fn modes(&self) -> Vec<String> {
        self.calls.borrow().iter().map(mode_of).collect()
    }

    pub fn call(&self, mode: &str) -> Option<Invocation> {
        self.calls.borrow().iter().find(|inv| mode_of(inv) == mode).cloned()
    }
}

fn mode_of(inv: &Invocation) -> String {
    let program = Path::new(inv.program()).file_name().unwrap_or_default();
    if program == "java" {
        inv.args()[2].to_string_lossy().into_owned()
    } else if program == "dot" {
        "dot".to_string()
    } else {
        "sdd".to_string()
    }
}

fn value(inv: &Invocation, flag: &str) -> PathBuf {
    PathBuf::from(inv.value_of(flag).unwrap_or_else(|| panic!("{flag} missing in {inv}")))
}

impl ProcessRunner for FakeTools {
    fn run(&self, inv: &Invocation) -> Result<RunOutput> {
        self.calls.borrow_mut().push(inv.clone());
        let mode = mode_of(inv);
        if self.fail_mode == Some(mode.as_str()) {
            return Err(Error::ToolFailed {
                program: inv.program().to_string_lossy().into_owned(),
                status: status(1),
                stderr: format!("{mode} crashed"),
            });
        }
        match mode.as_str() {
            "learnVtree" => {
                let out = value(inv, "--out");
                touch(out.join(".vtree"), "vtree 3");
                touch(out.join(".vtree.dot"), "digraph {}");
            }
            "sdd" => {
                for flag in ["-W", "-V", "-R", "-S"] {
                    touch(value(inv, flag), flag);
                }
            }
            "sdd2psdd" => touch(value(inv, "-o"), "psdd"),
            "learnPsdd" => {
                let out = value(inv, "--out");
                touch(out.join("models/final.psdd"), "psdd");
                touch(out.join("models/final.dot"), "digraph {}");
            }
            "query" => touch(value(inv, "-o"), "0\n1\n"),
            "dot" => touch(value(inv, "-o"), "%PDF"),
            _ => {}
        }
        Ok(ok())
    }
}

pub fn has_flag(inv: &Invocation, flag: &str) -> bool {
    inv.args().iter().any(|a| a == OsStr::new(flag))
}
