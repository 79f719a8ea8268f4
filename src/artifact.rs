//! Output files: copying, Graphviz rendering, and scratch directories.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::command::Invocation;
use crate::error::{Error, Result};
use crate::runner::ProcessRunner;
use crate::toolchain::Toolchain;

/// `<path>` with `suffix` appended to the full file name (`model.vtree` → `model.vtree.dot`).
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = OsString::from(path.as_os_str());
    s.push(suffix);
    PathBuf::from(s)
}

pub fn dot_sibling(path: &Path) -> PathBuf {
    with_suffix(path, ".dot")
}

pub fn pdf_sibling(path: &Path) -> PathBuf {
    with_suffix(path, ".pdf")
}

pub fn copy_artifact(from: &Path, to: &Path) -> Result<()> {
    debug!("copy {} -> {}", from.display(), to.display());
    fs::copy(from, to).map_err(|e| Error::io(from, e))?;
    Ok(())
}

/// Renders `<path>.dot` to `<path>.pdf` with Graphviz.
///
/// A no-op unless rendering is `enabled`, Graphviz is available, and the
/// `.dot` file exists. Never fails: rendering problems are logged and the
/// function returns whether a PDF was produced.
pub fn render<R: ProcessRunner>(toolchain: &Toolchain, runner: &R, path: &Path, enabled: bool) -> bool {
    let dot = dot_sibling(path);
    if !enabled || !toolchain.graphviz || !dot.is_file() {
        return false;
    }
    let pdf = pdf_sibling(path);
    let inv = Invocation::new(&toolchain.dot).arg("-Tpdf").arg(&dot).arg("-o").arg(&pdf);
    match runner.run(&inv) {
        Ok(_) => {
            info!("Converted {} to pdf: {}", dot.display(), pdf.display());
            true
        }
        Err(e) => {
            warn!("Could not render {}: {}", dot.display(), e);
            false
        }
    }
}

/// A scratch directory for the output of one external tool.
///
/// Removed when dropped, on success and on error alike, unless retained.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    retain: bool,
}

impl ScratchDir {
    /// Uses `path` as the scratch directory, replacing whatever is there.
    pub fn named(path: &Path, retain: bool) -> Result<Self> {
        if path.is_dir() {
            fs::remove_dir_all(path).map_err(|e| Error::io(path, e))?;
        }
        fs::create_dir_all(path).map_err(|e| Error::io(path, e))?;
        debug!("scratch dir {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            retain,
        })
    }

    /// Atomically creates a fresh, uniquely named directory inside `parent`.
    pub fn unique_in(parent: &Path, prefix: &str, retain: bool) -> Result<Self> {
        let path = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(parent)
            .map_err(|e| Error::io(parent, e))?
            .keep();
        debug!("scratch dir {}", path.display());
        Ok(Self { path, retain })
    }

    /// [`ScratchDir::named`] when a path is given, [`ScratchDir::unique_in`] otherwise.
    pub fn prepare(path: Option<&Path>, parent: &Path, prefix: &str, retain: bool) -> Result<Self> {
        match path {
            Some(path) => Self::named(path, retain),
            None => Self::unique_in(parent, prefix, retain),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.path.join(rel)
    }

    pub fn set_retain(&mut self, retain: bool) {
        self.retain = retain;
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.retain {
            return;
        }
        debug!("removing scratch dir {}", self.path.display());
        if let Err(e) = fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Could not remove {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Parent directory of `path`, or `.` for bare file names.
pub(crate) fn parent_or_cwd(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}
