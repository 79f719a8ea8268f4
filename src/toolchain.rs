//! Resolved locations of the external tools.
//!
//! [`Toolchain::resolve`] runs once at startup and checks every required path,
//! so a missing dependency aborts before any learning is attempted. The result
//! is immutable and passed by reference into every operation.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::command::{Invocation, SearchPath};
use crate::config::ToolConfig;
use crate::error::{Error, Result};

const LIBRARY_PATH_VAR: &str = "LD_LIBRARY_PATH";
const PATH_VAR: &str = "PATH";

#[derive(Debug, Clone)]
pub struct Toolchain {
    /// LearnPSDD checkout.
    pub learnpsdd_root: PathBuf,
    /// Assembled LearnPSDD jar.
    pub learnpsdd_jar: PathBuf,
    /// Native libraries the learner loads, added to every child's search paths.
    pub learnpsdd_lib: PathBuf,
    /// Updated LearnPSDD build; `None` if it is not installed.
    pub learnpsdd2_jar: Option<PathBuf>,
    /// Where the updated build was looked for.
    pub learnpsdd2_location: PathBuf,
    /// SDD compiler binary for this platform.
    pub sdd: PathBuf,
    /// Java launcher, resolved on `PATH`.
    pub java: PathBuf,
    /// Graphviz `dot`. Only resolved when `graphviz` is set.
    pub dot: PathBuf,
    /// Whether `.dot` files are rendered to PDF.
    pub graphviz: bool,
    /// Whether multi-component ensembles may be learned.
    pub ensemble_enabled: bool,
}

/// Name of the SDD compiler binary for the host OS.
pub fn sdd_binary_name() -> &'static str {
    if cfg!(target_os = "linux") {
        "sdd-linux"
    } else {
        "sdd-darwin"
    }
}

fn under(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn lookup(name: &'static str, program: &str) -> Result<PathBuf> {
    which::which(program).map_err(|e| {
        debug!("{} lookup for {:?} failed: {}", name, program, e);
        Error::MissingDependency {
            name,
            path: PathBuf::from(program),
        }
    })
}

fn require(name: &'static str, path: &Path, dir: bool) -> Result<()> {
    let found = if dir { path.is_dir() } else { path.is_file() };
    if found {
        Ok(())
    } else {
        Err(Error::MissingDependency {
            name,
            path: path.to_path_buf(),
        })
    }
}

impl Toolchain {
    /// Checks every configured tool and turns the config into absolute locations.
    ///
    /// A missing Graphviz only disables rendering; everything else is a
    /// [`Error::MissingDependency`].
    pub fn resolve(config: &ToolConfig) -> Result<Self> {
        let root = &config.learnpsdd_root;
        info!("LearnPSDD root: {}", root.display());
        require("LearnPSDD root directory", root, true)?;

        let jar = under(root, &config.learnpsdd_jar);
        info!("LearnPSDD jar: {}", jar.display());
        require("LearnPSDD jar", &jar, false)?;

        let lib = under(root, &config.learnpsdd_lib);
        require("LearnPSDD library directory", &lib, true)?;
        if std::env::join_paths([&lib]).is_err() {
            return Err(Error::InvalidValue {
                what: "LearnPSDD library directory",
                value: lib.display().to_string(),
            });
        }

        info!("SDD bin: {}", config.sdd_bin.display());
        require("SDD bin directory", &config.sdd_bin, true)?;
        let sdd_name = match &config.sdd_binary {
            Some(name) => name.as_str(),
            None => {
                let name = sdd_binary_name();
                if !cfg!(target_os = "linux") {
                    warn!("The SDD compiler is only fully supported on Linux, assuming macOS ({})", name);
                }
                name
            }
        };
        let sdd = config.sdd_bin.join(sdd_name);
        info!("SDD compiler: {}", sdd.display());
        require("SDD compiler", &sdd, false)?;

        let jar2 = under(root, &config.learnpsdd2_jar);
        let learnpsdd2_jar = if jar2.is_file() {
            info!("LearnPSDD (updated) jar: {}", jar2.display());
            Some(jar2.clone())
        } else {
            warn!("Updated LearnPSDD jar not found at {}, SoftEM ensembles are unavailable", jar2.display());
            None
        };

        let java = lookup("java", &config.java)?;
        info!("Java: {}", java.display());

        let mut graphviz = config.graphviz;
        let dot = if graphviz {
            match lookup("Graphviz dot", &config.dot) {
                Ok(dot) => dot,
                Err(_) => {
                    warn!("Graphviz {:?} not found, .dot files will not be rendered", config.dot);
                    graphviz = false;
                    PathBuf::from(&config.dot)
                }
            }
        } else {
            PathBuf::from(&config.dot)
        };

        Ok(Self {
            learnpsdd_root: root.clone(),
            learnpsdd_jar: jar,
            learnpsdd_lib: lib,
            learnpsdd2_jar,
            learnpsdd2_location: jar2,
            sdd,
            java,
            dot,
            graphviz,
            ensemble_enabled: config.ensemble_enabled,
        })
    }

    /// `java -jar <learnpsdd jar>`.
    pub fn learner(&self) -> Invocation {
        Invocation::java_jar(&self.java, &self.learnpsdd_jar)
    }

    /// `java -jar <updated learnpsdd jar>`.
    pub fn learner2(&self) -> Result<Invocation> {
        match &self.learnpsdd2_jar {
            Some(jar) => Ok(Invocation::java_jar(&self.java, jar)),
            None => Err(Error::MissingDependency {
                name: "updated LearnPSDD jar",
                path: self.learnpsdd2_location.clone(),
            }),
        }
    }

    /// Puts the native library directory on the child's `LD_LIBRARY_PATH` and `PATH`.
    ///
    /// Starts from the parent's values and only appends when the directory is
    /// not already listed, so applying it repeatedly never duplicates entries.
    /// Fails if the library directory contains the path separator.
    pub fn with_library_paths(&self, inv: Invocation) -> Result<Invocation> {
        let mut inv = inv;
        for key in [LIBRARY_PATH_VAR, PATH_VAR] {
            let mut path = match inv.envs().iter().find(|(k, _)| k == key) {
                Some((_, value)) => SearchPath::parse(Some(value.as_os_str())),
                None => SearchPath::from_env(key),
            };
            if path.append(&self.learnpsdd_lib) {
                debug!("{} += {}", key, self.learnpsdd_lib.display());
            }
            inv = inv.env(key, path.join()?);
        }
        Ok(inv)
    }
}
