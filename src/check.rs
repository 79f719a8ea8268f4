//! Filesystem preconditions.
//!
//! Required inputs are checked with `fatal = true` and abort the calling
//! operation with [`Error::MissingArtifact`]. Optional inputs go through
//! [`optional_file`]: when the caller supplies a path that does not exist, the
//! input is treated as absent and the corresponding flag is left out.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{Error, PathKind, Result};

/// Checks that `path` exists and is of the given `kind`.
///
/// Returns `Ok(true)` if it does. Otherwise returns `Err(MissingArtifact)` when
/// `fatal` is set, and `Ok(false)` when it is not.
pub fn exists(path: &Path, kind: PathKind, fatal: bool) -> Result<bool> {
    let found = match kind {
        PathKind::File => path.is_file(),
        PathKind::Dir => path.is_dir(),
    };
    debug!("exists({}, {}) = {}", path.display(), kind, found);
    if found {
        Ok(true)
    } else if fatal {
        Err(Error::MissingArtifact {
            kind,
            path: path.to_path_buf(),
        })
    } else {
        Ok(false)
    }
}

/// Fails with [`Error::MissingArtifact`](crate::Error::MissingArtifact) unless `path` is a file.
pub fn require_file(path: &Path) -> Result<()> {
    exists(path, PathKind::File, true).map(|_| ())
}

/// Fails with [`Error::MissingArtifact`](crate::Error::MissingArtifact) unless `path` is a directory.
pub fn require_dir(path: &Path) -> Result<()> {
    exists(path, PathKind::Dir, true).map(|_| ())
}

/// Resolves an optional input file: `None` if not supplied or not on disk.
pub fn optional_file(path: Option<&Path>) -> Option<PathBuf> {
    let path = path?;
    if path.is_file() {
        Some(path.to_path_buf())
    } else {
        warn!("Optional input {} does not exist, ignoring it", path.display());
        None
    }
}
