//! The entry point for every operation.
//!
//! A [`Driver`] pairs a resolved [`Toolchain`] with a [`ProcessRunner`]. The
//! operations themselves live next to their command builders, in
//! [`learner`](crate::learner) and [`sdd`](crate::sdd), and the full pipeline in
//! [`pipeline`](crate::pipeline).
//!
//! ```no_run
//! use learn_psdd::config::ToolConfig;
//! use learn_psdd::driver::Driver;
//! use learn_psdd::learner::LearnVtree;
//! use learn_psdd::runner::SystemRunner;
//! use learn_psdd::toolchain::Toolchain;
//!
//! let toolchain = Toolchain::resolve(&ToolConfig::default())?;
//! let driver = Driver::new(&toolchain, SystemRunner::new());
//! driver.learn_vtree(&LearnVtree::new("train.data", "model.vtree"))?;
//! # Ok::<(), learn_psdd::error::Error>(())
//! ```

use std::path::Path;

use crate::artifact;
use crate::command::Invocation;
use crate::error::Result;
use crate::runner::{ProcessRunner, RunOutput, SystemRunner};
use crate::toolchain::Toolchain;

#[derive(Debug)]
pub struct Driver<'a, R = SystemRunner> {
    toolchain: &'a Toolchain,
    runner: R,
}

impl<'a, R: ProcessRunner> Driver<'a, R> {
    pub fn new(toolchain: &'a Toolchain, runner: R) -> Self {
        Self { toolchain, runner }
    }

    pub fn toolchain(&self) -> &'a Toolchain {
        self.toolchain
    }

    /// Runs `inv` with the LearnPSDD native libraries on its search paths.
    pub(crate) fn execute(&self, inv: Invocation) -> Result<RunOutput> {
        let inv = self.toolchain.with_library_paths(inv)?;
        self.runner.run(&inv)
    }

    pub(crate) fn render(&self, path: &Path, enabled: bool) -> bool {
        artifact::render(self.toolchain, &self.runner, path, enabled)
    }
}
