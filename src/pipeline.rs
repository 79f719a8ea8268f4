//! The end-to-end experiment: vtree, optional constraints, then the model.
//!
//! ```text
//! Init → VtreeLearned → [ConstraintsCompiled] → ModelLearned → Cleanup → Done
//! ```
//!
//! Everything lands in a freshly created experiment directory:
//!
//! ```text
//! <exp>/model.vtree[.dot[.pdf]]
//! <exp>/model.psdd[.dot[.pdf]]        (single learner)
//! <exp>/ensemble/                     (ensemble learner)
//! <exp>/.learnVtree_tmp/              (retained)
//! <exp>/.learnerPsdd_tmp/             (retained)
//! <exp>/.constraints_tmp/             (removed unless generated files are kept)
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::artifact::ScratchDir;
use crate::check::require_file;
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::learner::{check_ensemble_components, LearnEnsemble, LearnPsdd, LearnVtree, Sdd2Psdd};
use crate::options::VtreeMethod;
use crate::runner::ProcessRunner;
use crate::sdd::CompileCnf;

pub const MODEL_VTREE: &str = "model.vtree";
pub const MODEL_PSDD: &str = "model.psdd";
pub const ENSEMBLE_DIR: &str = "ensemble";
pub const VTREE_SCRATCH: &str = ".learnVtree_tmp";
pub const PSDD_SCRATCH: &str = ".learnerPsdd_tmp";
pub const CONSTRAINTS_SCRATCH: &str = ".constraints_tmp";
pub const CONSTRAINTS_SDD: &str = "constraints_as.sdd";
pub const CONSTRAINTS_PSDD: &str = "constraints_as.psdd";

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Stage {
    Init,
    VtreeLearned,
    ConstraintsCompiled,
    ModelLearned,
    Cleanup,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::VtreeLearned => "vtree learned",
            Stage::ConstraintsCompiled => "constraints compiled",
            Stage::ModelLearned => "model learned",
            Stage::Cleanup => "cleanup",
            Stage::Done => "done",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct LearnPsddExperiment {
    pub experiment_dir: PathBuf,
    pub train_data: PathBuf,
    pub valid_data: Option<PathBuf>,
    pub test_data: Option<PathBuf>,
    /// Delete and recreate the experiment directory if it already exists.
    pub replace_existing: bool,
    pub vtree_method: VtreeMethod,
    /// Number of component learners. `1` learns a single PSDD.
    pub components: usize,
    /// DIMACS CNF enforced in the PSDD structure before learning starts.
    pub constraints: Option<PathBuf>,
    /// Keep the compiled constraint circuits in `.constraints_tmp`.
    pub keep_generated_files: bool,
    pub render: bool,
}

impl LearnPsddExperiment {
    pub fn new(experiment_dir: impl Into<PathBuf>, train_data: impl Into<PathBuf>) -> Self {
        Self {
            experiment_dir: experiment_dir.into(),
            train_data: train_data.into(),
            valid_data: None,
            test_data: None,
            replace_existing: false,
            vtree_method: VtreeMethod::default(),
            components: 1,
            constraints: None,
            keep_generated_files: true,
            render: true,
        }
    }
}

/// What the learner produced.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Model {
    Psdd(PathBuf),
    Ensemble(PathBuf),
}

impl Model {
    pub fn path(&self) -> &Path {
        match self {
            Model::Psdd(p) | Model::Ensemble(p) => p,
        }
    }
}

/// Paths produced by a finished experiment.
#[derive(Debug, Clone)]
pub struct Experiment {
    pub dir: PathBuf,
    pub vtree: PathBuf,
    pub model: Model,
    /// The constraint PSDD that seeded the learner, if it is still on disk.
    pub constraints_psdd: Option<PathBuf>,
}

fn enter(stage: Stage) {
    info!("learn_psdd: {}", stage);
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let cwd = std::env::current_dir().map_err(|e| Error::io(".", e))?;
        Ok(cwd.join(path))
    }
}

fn create_experiment_dir(path: &Path, replace_existing: bool) -> Result<()> {
    if path.exists() {
        if !replace_existing {
            return Err(Error::ExperimentExists {
                path: path.to_path_buf(),
            });
        }
        info!("Replacing existing experiment dir {}", path.display());
        fs::remove_dir_all(path).map_err(|e| Error::io(path, e))?;
    }
    fs::create_dir_all(path).map_err(|e| Error::io(path, e))
}

impl<R: ProcessRunner> Driver<'_, R> {
    /// Runs a whole experiment.
    ///
    /// Fails before touching the filesystem when the experiment directory
    /// exists (and may not be replaced), when the training data is missing, or
    /// when the component count is not supported.
    pub fn learn_psdd(&self, params: &LearnPsddExperiment) -> Result<Experiment> {
        enter(Stage::Init);
        check_ensemble_components_for(params.components, self.toolchain().ensemble_enabled)?;
        require_file(&params.train_data)?;
        if let Some(cnf) = &params.constraints {
            require_file(cnf)?;
        }

        let exp = absolute(&params.experiment_dir)?;
        info!("Experiment dir: {}", exp.display());
        create_experiment_dir(&exp, params.replace_existing)?;

        let vtree = exp.join(MODEL_VTREE);
        let psdd = exp.join(MODEL_PSDD);
        info!("Output vtree: {}", vtree.display());

        self.learn_vtree(&LearnVtree {
            method: params.vtree_method,
            scratch_dir: Some(exp.join(VTREE_SCRATCH)),
            keep_generated_files: true,
            render: params.render,
            ..LearnVtree::new(&params.train_data, &vtree)
        })?;
        enter(Stage::VtreeLearned);

        let mut constraints_scratch = None;
        let constraints_psdd = match &params.constraints {
            Some(cnf) => {
                let scratch = ScratchDir::named(&exp.join(CONSTRAINTS_SCRATCH), params.keep_generated_files)?;
                let sdd = scratch.join(CONSTRAINTS_SDD);
                self.compile_cnf_to_sdd(&CompileCnf {
                    vtree_in: Some(vtree.clone()),
                    post_compilation_search: false,
                    render: params.render,
                    ..CompileCnf::new(cnf, &sdd, &vtree)
                })?;
                let constraints_psdd = scratch.join(CONSTRAINTS_PSDD);
                self.compile_sdd_to_psdd(&Sdd2Psdd {
                    valid_data: params.valid_data.clone(),
                    test_data: params.test_data.clone(),
                    ..Sdd2Psdd::new(&params.train_data, &vtree, &sdd, &constraints_psdd)
                })?;
                constraints_scratch = Some(scratch);
                enter(Stage::ConstraintsCompiled);
                Some(constraints_psdd)
            }
            None => None,
        };

        let model = if params.components == 1 {
            info!("Output psdd: {}", psdd.display());
            self.learn_psdd_from_data(&LearnPsdd {
                scratch_dir: Some(exp.join(PSDD_SCRATCH)),
                psdd_in: constraints_psdd.clone(),
                valid_data: params.valid_data.clone(),
                test_data: params.test_data.clone(),
                keep_generated_files: true,
                render: params.render,
                ..LearnPsdd::new(&params.train_data, &vtree, &psdd)
            })?;
            Model::Psdd(psdd)
        } else {
            let out_dir = exp.join(ENSEMBLE_DIR);
            fs::create_dir_all(&out_dir).map_err(|e| Error::io(&out_dir, e))?;
            self.learn_ensemble_psdd(&LearnEnsemble {
                psdd_in: constraints_psdd.clone(),
                components: params.components,
                valid_data: params.valid_data.clone(),
                test_data: params.test_data.clone(),
                ..LearnEnsemble::new(&params.train_data, &vtree, &out_dir)
            })?;
            Model::Ensemble(out_dir)
        };
        enter(Stage::ModelLearned);

        enter(Stage::Cleanup);
        // Dropping the scratch dir removes it unless generated files are kept.
        drop(constraints_scratch);
        let constraints_psdd = constraints_psdd.filter(|p| p.is_file());

        enter(Stage::Done);
        Ok(Experiment {
            dir: exp,
            vtree,
            model,
            constraints_psdd,
        })
    }
}

fn check_ensemble_components_for(components: usize, enabled: bool) -> Result<()> {
    if components == 1 {
        Ok(())
    } else {
        check_ensemble_components(components, enabled)
    }
}
