//! Tool locations, persisted as TOML.
//!
//! ```toml
//! learnpsdd_root = "/opt/Scala-LearnPsdd"
//! sdd_bin = "/opt/libsdd/bin"
//! graphviz = false
//! ```
//!
//! Every key is optional. Missing keys fall back to the locations below `$HOME`
//! that [`ToolConfig::from_home`] derives.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Root of the LearnPSDD source tree (holds `target/` and `lib/`).
    pub learnpsdd_root: PathBuf,
    /// Jar path, relative to `learnpsdd_root` unless absolute.
    pub learnpsdd_jar: PathBuf,
    /// Native library directory, relative to `learnpsdd_root` unless absolute.
    pub learnpsdd_lib: PathBuf,
    /// Updated LearnPSDD build, only needed by the SoftEM ensemble learner.
    /// Relative to `learnpsdd_root` unless absolute.
    pub learnpsdd2_jar: PathBuf,
    /// Directory holding the `sdd-linux`/`sdd-darwin` binaries.
    pub sdd_bin: PathBuf,
    /// Overrides the platform-selected SDD binary name.
    pub sdd_binary: Option<String>,
    pub java: String,
    pub dot: String,
    /// Whether Graphviz is installed. When false no PDF is ever rendered.
    pub graphviz: bool,
    /// Allows ensemble learning with more than one component learner.
    /// The upstream ensemble learner is known to fail, so this is off by default.
    pub ensemble_enabled: bool,
}

impl Default for ToolConfig {
    fn default() -> Self {
        let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default();
        Self::from_home(&home)
    }
}

impl ToolConfig {
    /// Default layout below the given home directory.
    pub fn from_home(home: &Path) -> Self {
        Self {
            learnpsdd_root: home.join("code/msc/src/Scala-LearnPsdd"),
            learnpsdd_jar: PathBuf::from("target/scala-2.11/psdd.jar"),
            learnpsdd_lib: PathBuf::from("lib"),
            learnpsdd2_jar: PathBuf::from("../learnPSDD/target/scala-2.11/psdd.jar"),
            sdd_bin: home.join("code/msc/src/wmisdd/bin"),
            sdd_binary: None,
            java: "java".to_string(),
            dot: "dot".to_string(),
            graphviz: true,
            ensemble_enabled: false,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml(&text).map_err(|message| Error::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_toml(text: &str) -> std::result::Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_from_home_layout() {
        let config = ToolConfig::from_home(Path::new("/home/u"));
        assert_eq!(config.learnpsdd_root, PathBuf::from("/home/u/code/msc/src/Scala-LearnPsdd"));
        assert_eq!(config.sdd_bin, PathBuf::from("/home/u/code/msc/src/wmisdd/bin"));
        assert!(config.graphviz);
        assert!(!config.ensemble_enabled);
    }

    #[test]
    fn test_partial_toml() {
        let config = ToolConfig::from_toml(
            r#"
            learnpsdd_root = "/opt/lp"
            graphviz = false
            "#,
        )
        .unwrap();
        assert_eq!(config.learnpsdd_root, PathBuf::from("/opt/lp"));
        assert!(!config.graphviz);
        assert_eq!(config.java, "java");
        assert_eq!(config.learnpsdd_jar, PathBuf::from("target/scala-2.11/psdd.jar"));
    }

    #[test]
    fn test_toml_errors() {
        assert!(ToolConfig::from_toml("graphviz = \"maybe\"").is_err());
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tools.toml");
        std::fs::write(&path, "java = 42").unwrap();
        match ToolConfig::load(&path).unwrap_err() {
            Error::Config { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(ToolConfig::load(&dir.path().join("nope.toml")), Err(Error::Io { .. })));
    }
}
