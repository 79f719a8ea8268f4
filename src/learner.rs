//! Operations backed by the LearnPSDD jar.
//!
//! Each operation has a parameter struct whose `command` method builds the
//! exact command line, with flags in the order the learner's parser expects,
//! and a [`Driver`] method that checks the inputs, runs the command, and
//! collects the outputs.
//!
//! | Operation | Learner mode |
//! |---|---|
//! | [`Driver::learn_vtree`] | `learnVtree` |
//! | [`Driver::compile_sdd_to_psdd`] | `sdd2psdd` |
//! | [`Driver::learn_psdd_from_data`] | `learnPsdd search` |
//! | [`Driver::learn_ensemble_psdd`] | `learnEnsemblePsdd softEM` |
//! | [`Driver::learn_ensemble_softem`] | `SoftEM` (updated learner build) |
//! | [`Driver::classify`] | `query -m classify` |
//!
//! Required inputs must exist or the operation fails with
//! [`Error::MissingArtifact`] before anything is spawned. Optional inputs
//! (validation/test data, a seed PSDD) that do not exist are left out.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::artifact::{self, ScratchDir};
use crate::check::{optional_file, require_dir, require_file};
use crate::command::Invocation;
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::options::{Completion, MaxIterations, OpTypes, SaveFrequency, Scorer, Smoothing, VtreeMethod};
use crate::runner::ProcessRunner;
use crate::toolchain::Toolchain;

/// File name the learner gives the learned vtree inside its output directory.
pub const LEARNED_VTREE: &str = ".vtree";
/// Final model of a PSDD search, relative to the learner's output directory.
pub const FINAL_PSDD: &str = "models/final.psdd";
pub const FINAL_DOT: &str = "models/final.dot";

// ─── learnVtree ───

#[derive(Debug, Clone)]
pub struct LearnVtree {
    pub train_data: PathBuf,
    pub vtree_out: PathBuf,
    pub method: VtreeMethod,
    /// Where the learner writes its files. A fresh unique directory next to
    /// `vtree_out` when `None`.
    pub scratch_dir: Option<PathBuf>,
    pub keep_generated_files: bool,
    pub render: bool,
}

impl LearnVtree {
    pub fn new(train_data: impl Into<PathBuf>, vtree_out: impl Into<PathBuf>) -> Self {
        Self {
            train_data: train_data.into(),
            vtree_out: vtree_out.into(),
            method: VtreeMethod::default(),
            scratch_dir: None,
            keep_generated_files: false,
            render: true,
        }
    }

    pub fn command(&self, toolchain: &Toolchain, out_dir: &Path) -> Invocation {
        toolchain
            .learner()
            .arg("learnVtree")
            .flag("--trainData", &self.train_data)
            .flag("--vtreeMethod", self.method.as_str())
            .flag("--out", out_dir)
    }
}

// ─── sdd2psdd ───

#[derive(Debug, Clone)]
pub struct Sdd2Psdd {
    pub train_data: PathBuf,
    pub vtree: PathBuf,
    pub sdd: PathBuf,
    pub psdd_out: PathBuf,
    pub valid_data: Option<PathBuf>,
    pub test_data: Option<PathBuf>,
    pub smoothing: Smoothing,
}

impl Sdd2Psdd {
    pub fn new(
        train_data: impl Into<PathBuf>,
        vtree: impl Into<PathBuf>,
        sdd: impl Into<PathBuf>,
        psdd_out: impl Into<PathBuf>,
    ) -> Self {
        Self {
            train_data: train_data.into(),
            vtree: vtree.into(),
            sdd: sdd.into(),
            psdd_out: psdd_out.into(),
            valid_data: None,
            test_data: None,
            smoothing: Smoothing::default(),
        }
    }

    pub fn command(&self, toolchain: &Toolchain) -> Invocation {
        toolchain
            .learner()
            .arg("sdd2psdd")
            .flag("-d", &self.train_data)
            .flag("-v", &self.vtree)
            .flag("-s", &self.sdd)
            .flag("-o", &self.psdd_out)
            .flag("-m", self.smoothing.to_string())
            .opt("-b", optional_file(self.valid_data.as_deref()))
            .opt("-t", optional_file(self.test_data.as_deref()))
    }
}

// ─── learnPsdd search ───

#[derive(Debug, Clone)]
pub struct LearnPsdd {
    pub train_data: PathBuf,
    pub vtree: PathBuf,
    pub psdd_out: PathBuf,
    pub scratch_dir: Option<PathBuf>,
    /// Initial PSDD. Without it, learning starts from a mixture of marginals.
    pub psdd_in: Option<PathBuf>,
    pub valid_data: Option<PathBuf>,
    pub test_data: Option<PathBuf>,
    pub smoothing: Smoothing,
    pub op_types: OpTypes,
    pub completion: Completion,
    pub scorer: Scorer,
    pub max_iterations: MaxIterations,
    pub save_frequency: SaveFrequency,
    pub keep_generated_files: bool,
    pub render: bool,
}

impl LearnPsdd {
    pub fn new(train_data: impl Into<PathBuf>, vtree: impl Into<PathBuf>, psdd_out: impl Into<PathBuf>) -> Self {
        Self {
            train_data: train_data.into(),
            vtree: vtree.into(),
            psdd_out: psdd_out.into(),
            scratch_dir: None,
            psdd_in: None,
            valid_data: None,
            test_data: None,
            smoothing: Smoothing::default(),
            op_types: OpTypes::default(),
            completion: Completion::default(),
            scorer: Scorer::default(),
            max_iterations: MaxIterations::default(),
            save_frequency: SaveFrequency::default(),
            keep_generated_files: false,
            render: true,
        }
    }

    pub fn command(&self, toolchain: &Toolchain, out_dir: &Path) -> Invocation {
        toolchain
            .learner()
            .arg("learnPsdd")
            .arg("search")
            .flag("--trainData", &self.train_data)
            .flag("--vtree", &self.vtree)
            .flag("--out", out_dir)
            .opt("--validData", optional_file(self.valid_data.as_deref()))
            .opt("--testData", optional_file(self.test_data.as_deref()))
            .opt("-p", optional_file(self.psdd_in.as_deref()))
            .flag("--smooth", self.smoothing.to_string())
            .flag("--opTypes", self.op_types.to_string())
            .flag("--completion", self.completion.to_string())
            .flag("--scorer", self.scorer.to_string())
            .flag("--freq", self.save_frequency.to_string())
            .opt("--maxIt", self.max_iterations.limit().map(|n| n.to_string()))
    }
}

// ─── learnEnsemblePsdd softEM ───

#[derive(Debug, Clone)]
pub struct LearnEnsemble {
    pub train_data: PathBuf,
    pub vtree: PathBuf,
    pub out_dir: PathBuf,
    pub psdd_in: Option<PathBuf>,
    pub components: usize,
    pub valid_data: Option<PathBuf>,
    pub test_data: Option<PathBuf>,
    pub smoothing: Smoothing,
    /// Structure changes before a new round of parameter learning.
    pub structure_change_it: u32,
    /// Parameter learning iterations before the structure changes again.
    pub parameter_learning_it: u32,
    pub scorer: Scorer,
    /// Maximum number of ensemble learning iterations.
    pub max_iterations: MaxIterations,
}

impl LearnEnsemble {
    pub fn new(train_data: impl Into<PathBuf>, vtree: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            train_data: train_data.into(),
            vtree: vtree.into(),
            out_dir: out_dir.into(),
            psdd_in: None,
            components: 5,
            valid_data: None,
            test_data: None,
            smoothing: Smoothing::default(),
            structure_change_it: 3,
            parameter_learning_it: 1,
            scorer: Scorer::default(),
            max_iterations: MaxIterations::default(),
        }
    }

    pub fn command(&self, toolchain: &Toolchain) -> Invocation {
        toolchain
            .learner()
            .arg("learnEnsemblePsdd")
            .arg("softEM")
            .flag("--trainData", &self.train_data)
            .flag("--vtree", &self.vtree)
            .flag("--out", &self.out_dir)
            .flag("--numComponentLearners", self.components.to_string())
            .opt("--validData", optional_file(self.valid_data.as_deref()))
            .opt("--testData", optional_file(self.test_data.as_deref()))
            .opt("-p", optional_file(self.psdd_in.as_deref()))
            .flag("--smooth", self.smoothing.to_string())
            .flag("--structureChangeIt", self.structure_change_it.to_string())
            .flag("--parameterLearningIt", self.parameter_learning_it.to_string())
            .flag("--scorer", self.scorer.to_string())
            .opt("--maxIt", self.max_iterations.limit().map(|n| n.to_string()))
    }
}

/// Checks the component count of an ensemble run.
///
/// A single component is a plain PSDD and must go through
/// [`Driver::learn_psdd_from_data`]. More than one is only accepted when the
/// ensemble learner has been explicitly enabled, since upstream it is broken.
pub fn check_ensemble_components(components: usize, enabled: bool) -> Result<()> {
    match components {
        0 => Err(Error::unsupported("the number of ensemble components has to be > 0")),
        1 => Err(Error::unsupported(
            "a single component is not an ensemble, learn it with learn-psdd-from-data instead",
        )),
        _ if !enabled => Err(Error::unsupported(format!(
            "ensemble learning ({} components) is disabled: the upstream ensemble learner does not work",
            components
        ))),
        _ => Ok(()),
    }
}

// ─── SoftEM (updated learner) ───

pub const SOFTEM_DATA_FILES: [&str; 3] = ["train.data", "valid.data", "test.data"];

#[derive(Debug, Clone)]
pub struct SoftEm {
    /// Directory holding `train.data`, `valid.data` and `test.data`.
    pub data_dir: PathBuf,
    pub vtree: PathBuf,
    pub out_dir: PathBuf,
    pub components: usize,
}

impl SoftEm {
    pub fn new(data_dir: impl Into<PathBuf>, vtree: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            vtree: vtree.into(),
            out_dir: out_dir.into(),
            components: 10,
        }
    }

    pub fn command(&self, toolchain: &Toolchain) -> Result<Invocation> {
        // The learner appends the file names to this argument verbatim.
        let mut data_dir = OsString::from(self.data_dir.as_os_str());
        if !data_dir.to_string_lossy().ends_with(std::path::MAIN_SEPARATOR) {
            data_dir.push(std::path::MAIN_SEPARATOR_STR);
        }
        Ok(toolchain
            .learner2()?
            .arg("SoftEM")
            .arg(data_dir)
            .arg(&self.vtree)
            .arg(&self.out_dir)
            .arg(self.components.to_string()))
    }
}

// ─── query -m classify ───

#[derive(Debug, Clone)]
pub struct Classify {
    pub vtree: PathBuf,
    pub psdds: Vec<PathBuf>,
    /// Mixture weight of each PSDD, same order as `psdds`.
    pub weights: Vec<f64>,
    /// Data used to initialize the PSDDs.
    pub data_sample: PathBuf,
    /// Categorical dimension of the FLx variable group.
    pub flx_cat_dim: u32,
    /// Categorical dimension of the FLy variable group (the number of labels).
    pub fly_cat_dim: u32,
    pub query: PathBuf,
    pub output: PathBuf,
}

impl Classify {
    pub fn command(&self, toolchain: &Toolchain) -> Invocation {
        let psdds = self
            .psdds
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(",");
        let weights = self.weights.iter().map(|w| w.to_string()).collect::<Vec<_>>().join(",");
        toolchain
            .learner()
            .arg("query")
            .flag("-m", "classify")
            .flag("-v", &self.vtree)
            .flag("-p", psdds)
            .flag("-a", weights)
            .flag("-d", &self.data_sample)
            .flag("-x", self.flx_cat_dim.to_string())
            .flag("-y", self.fly_cat_dim.to_string())
            .flag("-q", &self.query)
            .flag("-o", &self.output)
    }

    fn validate(&self) -> Result<()> {
        if self.psdds.is_empty() {
            return Err(Error::unsupported("classification needs at least one PSDD"));
        }
        if self.psdds.len() != self.weights.len() {
            return Err(Error::unsupported(format!(
                "got {} PSDDs but {} weights",
                self.psdds.len(),
                self.weights.len()
            )));
        }
        if self.weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::unsupported("PSDD weights must be finite and non-negative"));
        }
        Ok(())
    }
}

// ─── Operations ───

impl<R: ProcessRunner> Driver<'_, R> {
    /// Learns a vtree from data and copies it (and its `.dot`) to `vtree_out`.
    pub fn learn_vtree(&self, params: &LearnVtree) -> Result<PathBuf> {
        require_file(&params.train_data)?;

        let scratch = ScratchDir::prepare(
            params.scratch_dir.as_deref(),
            artifact::parent_or_cwd(&params.vtree_out),
            ".learnVtree_tmp",
            params.keep_generated_files,
        )?;
        self.execute(params.command(self.toolchain(), scratch.path()))?;

        let learned = scratch.join(LEARNED_VTREE);
        require_file(&learned)?;
        artifact::copy_artifact(&learned, &params.vtree_out)?;
        let learned_dot = artifact::dot_sibling(&learned);
        if learned_dot.is_file() {
            artifact::copy_artifact(&learned_dot, &artifact::dot_sibling(&params.vtree_out))?;
            self.render(&params.vtree_out, params.render);
        } else {
            warn!("Vtree dot file could not be found at {}", learned_dot.display());
        }

        info!("Finished learning vtree from data: {}", params.vtree_out.display());
        Ok(params.vtree_out.clone())
    }

    /// Turns an SDD into a PSDD by estimating its parameters from data.
    pub fn compile_sdd_to_psdd(&self, params: &Sdd2Psdd) -> Result<PathBuf> {
        require_file(&params.train_data)?;
        require_file(&params.vtree)?;
        require_file(&params.sdd)?;

        self.execute(params.command(self.toolchain()))?;

        require_file(&params.psdd_out)?;
        info!("Finished compiling SDD to PSDD: {}", params.psdd_out.display());
        Ok(params.psdd_out.clone())
    }

    /// Learns a PSDD by structure search and copies the final model to `psdd_out`.
    pub fn learn_psdd_from_data(&self, params: &LearnPsdd) -> Result<PathBuf> {
        require_file(&params.train_data)?;
        require_file(&params.vtree)?;

        let scratch = ScratchDir::prepare(
            params.scratch_dir.as_deref(),
            artifact::parent_or_cwd(&params.psdd_out),
            ".learnerPsdd_tmp",
            params.keep_generated_files,
        )?;
        self.execute(params.command(self.toolchain(), scratch.path()))?;

        let final_psdd = scratch.join(FINAL_PSDD);
        require_file(&final_psdd)?;
        artifact::copy_artifact(&final_psdd, &params.psdd_out)?;

        let final_dot = scratch.join(FINAL_DOT);
        if final_dot.is_file() {
            artifact::copy_artifact(&final_dot, &artifact::dot_sibling(&params.psdd_out))?;
            self.render(&params.psdd_out, params.render);
        } else {
            warn!("Final PSDD dot file could not be found at {}", final_dot.display());
        }

        info!("Finished PSDD learning: {}", params.psdd_out.display());
        Ok(params.psdd_out.clone())
    }

    /// Learns an ensemble of PSDDs into `out_dir`.
    ///
    /// The component models are not checked afterwards.
    pub fn learn_ensemble_psdd(&self, params: &LearnEnsemble) -> Result<PathBuf> {
        check_ensemble_components(params.components, self.toolchain().ensemble_enabled)?;
        require_file(&params.train_data)?;
        require_file(&params.vtree)?;
        require_dir(&params.out_dir)?;

        self.execute(params.command(self.toolchain()))?;

        info!("Finished ensemble learning: {}", params.out_dir.display());
        Ok(params.out_dir.clone())
    }

    /// Learns a SoftEM ensemble with the updated learner build.
    pub fn learn_ensemble_softem(&self, params: &SoftEm) -> Result<PathBuf> {
        if params.components == 0 {
            return Err(Error::unsupported("the number of ensemble components has to be > 0"));
        }
        for name in SOFTEM_DATA_FILES {
            require_file(&params.data_dir.join(name))?;
        }
        require_file(&params.vtree)?;
        require_dir(&params.out_dir)?;

        self.execute(params.command(self.toolchain())?)?;

        info!("Finished SoftEM ensemble learning: {}", params.out_dir.display());
        Ok(params.out_dir.clone())
    }

    /// Classifies `query` with a weighted mixture of PSDDs, writing the result to `output`.
    pub fn classify(&self, params: &Classify) -> Result<PathBuf> {
        params.validate()?;
        require_file(&params.vtree)?;
        for psdd in &params.psdds {
            require_file(psdd)?;
        }
        require_file(&params.data_sample)?;
        require_file(&params.query)?;

        let out_dir = artifact::parent_or_cwd(&params.output);
        std::fs::create_dir_all(out_dir).map_err(|e| Error::io(out_dir, e))?;

        self.execute(params.command(self.toolchain()))?;

        require_file(&params.output)?;
        info!("Finished classification: {}", params.output.display());
        Ok(params.output.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use test_log::test;

    use super::*;
    use crate::error::PathKind;
    use crate::runner::Spy;
    use crate::toolchain::tests::fake_install;

    struct Fixture {
        dir: tempfile::TempDir,
        toolchain: Toolchain,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let toolchain = Toolchain::resolve(&fake_install(dir.path())).unwrap();
            Self { dir, toolchain }
        }

        fn file(&self, name: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            fs::write(&path, name).unwrap();
            path
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn args(inv: &Invocation) -> Vec<String> {
            inv.args().iter().map(|a| a.to_string_lossy().into_owned()).collect()
        }
    }

    #[test]
    fn test_learn_vtree_command() {
        let fx = Fixture::new();
        let params = LearnVtree {
            method: VtreeMethod::MiMetis,
            ..LearnVtree::new("/d/train.data", "/e/model.vtree")
        };
        let inv = params.command(&fx.toolchain, Path::new("/e/.learnVtree_tmp"));
        let args = Fixture::args(&inv);
        assert_eq!(inv.program(), fx.toolchain.java.as_os_str());
        assert_eq!(
            args[2..],
            [
                "learnVtree",
                "--trainData",
                "/d/train.data",
                "--vtreeMethod",
                "miMetis",
                "--out",
                "/e/.learnVtree_tmp"
            ]
        );
        assert_eq!(args[0], "-jar");
        assert_eq!(PathBuf::from(&args[1]), fx.toolchain.learnpsdd_jar);
    }

    #[test]
    fn test_sdd2psdd_command_optional_data() {
        let fx = Fixture::new();
        let valid = fx.file("valid.data");
        let mut params = Sdd2Psdd::new("t.data", "m.vtree", "c.sdd", "c.psdd");
        params.valid_data = Some(valid.clone());
        params.test_data = Some(fx.path("missing-test.data"));
        params.smoothing = Smoothing::MEstimator(2.0);

        let args = Fixture::args(&params.command(&fx.toolchain));
        assert_eq!(
            args[2..],
            [
                "sdd2psdd",
                "-d",
                "t.data",
                "-v",
                "m.vtree",
                "-s",
                "c.sdd",
                "-o",
                "c.psdd",
                "-m",
                "m-2",
                "-b",
                valid.to_str().unwrap()
            ]
        );
        assert!(!args.contains(&"-t".to_string()));
    }

    #[test]
    fn test_learn_psdd_command() {
        let fx = Fixture::new();
        let seed = fx.file("constraints.psdd");
        let mut params = LearnPsdd::new("t.data", "m.vtree", "m.psdd");
        params.psdd_in = Some(seed.clone());
        params.valid_data = Some(fx.path("nope.data"));

        let inv = params.command(&fx.toolchain, Path::new("tmp"));
        let args = Fixture::args(&inv);
        assert_eq!(
            args[2..],
            [
                "learnPsdd",
                "search",
                "--trainData",
                "t.data",
                "--vtree",
                "m.vtree",
                "--out",
                "tmp",
                "-p",
                seed.to_str().unwrap(),
                "--smooth",
                "l-1",
                "--opTypes",
                "clone-3,split-1",
                "--completion",
                "maxDepth-3",
                "--scorer",
                "dll/ds",
                "--freq",
                "best-3"
            ]
        );

        params.max_iterations = MaxIterations::Limit(50);
        let inv = params.command(&fx.toolchain, Path::new("tmp"));
        assert_eq!(inv.value_of("--maxIt").unwrap(), "50");
        assert_eq!(inv.args().last().unwrap(), "50");
    }

    #[test]
    fn test_command_is_deterministic() {
        let fx = Fixture::new();
        let mut params = LearnPsdd::new("t.data", "m.vtree", "m.psdd");
        params.completion = Completion::MaxEdges(9);
        let a = params.command(&fx.toolchain, Path::new("tmp"));
        let b = params.command(&fx.toolchain, Path::new("tmp"));
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_ensemble_command() {
        let fx = Fixture::new();
        let mut params = LearnEnsemble::new("t.data", "m.vtree", "out");
        params.components = 4;
        params.max_iterations = MaxIterations::Limit(7);
        let args = Fixture::args(&params.command(&fx.toolchain));
        assert_eq!(
            args[2..],
            [
                "learnEnsemblePsdd",
                "softEM",
                "--trainData",
                "t.data",
                "--vtree",
                "m.vtree",
                "--out",
                "out",
                "--numComponentLearners",
                "4",
                "--smooth",
                "l-1",
                "--structureChangeIt",
                "3",
                "--parameterLearningIt",
                "1",
                "--scorer",
                "dll/ds",
                "--maxIt",
                "7"
            ]
        );
    }

    #[test]
    fn test_ensemble_component_policy() {
        let unsupported = |r: Result<()>| matches!(r, Err(Error::UnsupportedConfiguration { .. }));
        assert!(unsupported(check_ensemble_components(0, false)));
        assert!(unsupported(check_ensemble_components(1, false)));
        assert!(unsupported(check_ensemble_components(2, false)));
        assert!(unsupported(check_ensemble_components(0, true)));
        assert!(unsupported(check_ensemble_components(1, true)));
        assert!(check_ensemble_components(2, true).is_ok());
    }

    #[test]
    fn test_ensemble_disabled_spawns_nothing() {
        let fx = Fixture::new();
        let spy = Spy::default();
        let driver = Driver::new(&fx.toolchain, &spy);
        let params = LearnEnsemble::new(fx.file("t.data"), fx.file("m.vtree"), fx.dir.path());
        let err = driver.learn_ensemble_psdd(&params).unwrap_err();
        assert!(matches!(err, Error::UnsupportedConfiguration { .. }));
        assert_eq!(spy.count(), 0);
    }

    #[test]
    fn test_ensemble_enabled_runs() {
        let mut fx = Fixture::new();
        fx.toolchain.ensemble_enabled = true;
        let spy = Spy::default();
        let driver = Driver::new(&fx.toolchain, &spy);
        let params = LearnEnsemble::new(fx.file("t.data"), fx.file("m.vtree"), fx.dir.path());
        driver.learn_ensemble_psdd(&params).unwrap();
        assert_eq!(spy.count(), 1);
        let inv = &spy.calls.borrow()[0];
        assert!(inv.envs().iter().any(|(k, _)| k == "LD_LIBRARY_PATH"));
    }

    #[test]
    fn test_missing_inputs_spawn_nothing() {
        let fx = Fixture::new();
        let spy = Spy::default();
        let driver = Driver::new(&fx.toolchain, &spy);
        let train = fx.file("train.data");
        let missing = fx.path("missing");

        let is_missing = |r: Result<PathBuf>| matches!(r, Err(Error::MissingArtifact { .. }));

        assert!(is_missing(driver.learn_vtree(&LearnVtree::new(&missing, fx.path("m.vtree")))));
        assert!(is_missing(driver.compile_sdd_to_psdd(&Sdd2Psdd::new(&train, &missing, &missing, "o"))));
        assert!(is_missing(driver.learn_psdd_from_data(&LearnPsdd::new(&train, &missing, "o"))));
        assert!(is_missing(driver.learn_ensemble_softem(&SoftEm::new(&missing, &missing, &missing))));
        assert!(is_missing(driver.classify(&Classify {
            vtree: missing.clone(),
            psdds: vec![missing.clone()],
            weights: vec![1.0],
            data_sample: train.clone(),
            flx_cat_dim: 2,
            fly_cat_dim: 10,
            query: train.clone(),
            output: fx.path("eval/classification.txt"),
        })));

        let mut fx2 = Fixture::new();
        fx2.toolchain.ensemble_enabled = true;
        let driver2 = Driver::new(&fx2.toolchain, &spy);
        let mut ensemble = LearnEnsemble::new(&train, &missing, fx2.dir.path());
        ensemble.components = 3;
        assert!(is_missing(driver2.learn_ensemble_psdd(&ensemble)));

        assert_eq!(spy.count(), 0);
        // The scratch directory is only created after the inputs check out.
        assert!(!fx.path(".learnVtree_tmp").exists());
    }

    #[test]
    fn test_learn_vtree_missing_output() {
        // The spy does not produce `.vtree`, so the output check must fail.
        let fx = Fixture::new();
        let spy = Spy::default();
        let driver = Driver::new(&fx.toolchain, &spy);
        let mut params = LearnVtree::new(fx.file("train.data"), fx.path("model.vtree"));
        params.scratch_dir = Some(fx.path("scratch"));

        match driver.learn_vtree(&params).unwrap_err() {
            Error::MissingArtifact { kind, path } => {
                assert_eq!(kind, PathKind::File);
                assert_eq!(path, fx.path("scratch").join(LEARNED_VTREE));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(spy.count(), 1);
        // Not retained, so cleaned up despite the failure.
        assert!(!fx.path("scratch").exists());
    }

    #[test]
    fn test_classify_command_and_validation() {
        let fx = Fixture::new();
        let mut params = Classify {
            vtree: "m.vtree".into(),
            psdds: vec!["a.psdd".into(), "b.psdd".into()],
            weights: vec![0.25, 0.75],
            data_sample: "train.data.sample".into(),
            flx_cat_dim: 4,
            fly_cat_dim: 10,
            query: "test.data".into(),
            output: "eval/classification.txt".into(),
        };
        let args = Fixture::args(&params.command(&fx.toolchain));
        assert_eq!(
            args[2..],
            [
                "query",
                "-m",
                "classify",
                "-v",
                "m.vtree",
                "-p",
                "a.psdd,b.psdd",
                "-a",
                "0.25,0.75",
                "-d",
                "train.data.sample",
                "-x",
                "4",
                "-y",
                "10",
                "-q",
                "test.data",
                "-o",
                "eval/classification.txt"
            ]
        );
        assert!(params.validate().is_ok());

        params.weights.pop();
        assert!(matches!(params.validate(), Err(Error::UnsupportedConfiguration { .. })));
        params.psdds.clear();
        params.weights.clear();
        assert!(matches!(params.validate(), Err(Error::UnsupportedConfiguration { .. })));
    }

    #[test]
    fn test_softem_command() {
        let mut fx = Fixture::new();
        assert!(SoftEm::new("data", "m.vtree", "out").command(&fx.toolchain).is_err());

        let jar2 = fx.file("psdd2.jar");
        fx.toolchain.learnpsdd2_jar = Some(jar2.clone());
        let args = Fixture::args(&SoftEm::new("data", "m.vtree", "out").command(&fx.toolchain).unwrap());
        let data_dir = format!("data{}", std::path::MAIN_SEPARATOR);
        assert_eq!(args[1], jar2.to_str().unwrap());
        assert_eq!(args[2..], ["SoftEM", data_dir.as_str(), "m.vtree", "out", "10"]);
    }
}
