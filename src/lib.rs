//! # learn-psdd: driving the LearnPSDD toolchain from Rust
//!
//! **`learn-psdd`** builds command lines for, runs, and collects the output of three
//! external tools used to learn **Probabilistic Sentential Decision Diagrams (PSDDs)**:
//!
//! - the LearnPSDD structure learner (`java -jar psdd.jar ...`),
//! - the libsdd compiler (`sdd-linux` / `sdd-darwin`),
//! - Graphviz `dot`, for rendering `.dot` files to PDF.
//!
//! The learning itself happens in those tools. This crate checks inputs before
//! anything runs, assembles arguments in the order each tool expects, verifies
//! that the expected outputs exist afterwards, copies them into place, and
//! cleans up scratch directories.
//!
//! ## Key Features
//!
//! - **Resolved once**: tool locations are checked at startup into an immutable
//!   [`Toolchain`][crate::toolchain::Toolchain] that every operation borrows.
//! - **Structured commands**: an [`Invocation`][crate::command::Invocation] is an
//!   argument list, not a shell string, and logs deterministically.
//! - **Checked exits**: a nonzero exit status is an error
//!   ([`Error::ToolFailed`][crate::error::Error::ToolFailed]), with the tail of stderr.
//! - **Pluggable runner**: everything goes through a
//!   [`ProcessRunner`][crate::runner::ProcessRunner], so pipelines can be tested without Java.
//!
//! ## Basic Usage
//!
//! ```no_run
//! use learn_psdd::config::ToolConfig;
//! use learn_psdd::driver::Driver;
//! use learn_psdd::pipeline::LearnPsddExperiment;
//! use learn_psdd::runner::SystemRunner;
//! use learn_psdd::toolchain::Toolchain;
//!
//! // 1. Resolve the tools (defaults below $HOME)
//! let toolchain = Toolchain::resolve(&ToolConfig::default())?;
//! let driver = Driver::new(&toolchain, SystemRunner::new());
//!
//! // 2. Learn a vtree and a PSDD into a fresh experiment directory
//! let experiment = driver.learn_psdd(&LearnPsddExperiment {
//!     valid_data: Some("data/valid.data".into()),
//!     constraints: Some("data/one-hot.cnf".into()),
//!     ..LearnPsddExperiment::new("experiments/ex_1", "data/train.data")
//! })?;
//! println!("model at {}", experiment.model.path().display());
//! # Ok::<(), learn_psdd::error::Error>(())
//! ```
//!
//! ## Core Components
//!
//! - **[`pipeline`]**: the end-to-end experiment.
//! - **[`learner`]**: LearnPSDD operations (vtree, PSDD, ensembles, classification).
//! - **[`sdd`]**: CNF to SDD compilation.
//! - **[`cnf`]**: reading and writing DIMACS constraint files.

pub mod artifact;
pub mod check;
pub mod cnf;
pub mod command;
pub mod config;
pub mod driver;
pub mod error;
pub mod learner;
pub mod options;
pub mod pipeline;
pub mod runner;
pub mod sdd;
pub mod toolchain;

pub use error::{Error, Result};
