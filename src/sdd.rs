//! CNF to SDD compilation with the libsdd command-line compiler.
//!
//! ```text
//! sdd (-c FILE | -d FILE | -s FILE) [-v FILE | -t TYPE] [-WVRS FILE] [-r MODE] [-mhqp]
//! ```
//!
//! Only the CNF input mode is used. The vtree either comes from a file (`-v`,
//! with dynamic vtree search disabled) or is generated from an initial type
//! (`-t`, searched every [`CompileCnf::vtree_search_freq`] clauses).

use std::path::PathBuf;

use log::{info, warn};

use crate::artifact::dot_sibling;
use crate::check::require_file;
use crate::cnf::Cnf;
use crate::command::Invocation;
use crate::driver::Driver;
use crate::error::Result;
use crate::options::InitialVtree;
use crate::runner::ProcessRunner;
use crate::toolchain::Toolchain;

#[derive(Debug, Clone)]
pub struct CompileCnf {
    pub cnf: PathBuf,
    pub sdd_out: PathBuf,
    pub vtree_out: PathBuf,
    /// Existing vtree to compile against. A vtree is generated when `None`.
    pub vtree_in: Option<PathBuf>,
    pub initial_vtree: InitialVtree,
    /// Clauses between vtree searches while compiling a generated vtree.
    pub vtree_search_freq: u32,
    /// Run a vtree search after compilation (`-q`).
    pub post_compilation_search: bool,
    pub render: bool,
}

impl CompileCnf {
    pub fn new(cnf: impl Into<PathBuf>, sdd_out: impl Into<PathBuf>, vtree_out: impl Into<PathBuf>) -> Self {
        Self {
            cnf: cnf.into(),
            sdd_out: sdd_out.into(),
            vtree_out: vtree_out.into(),
            vtree_in: None,
            initial_vtree: InitialVtree::default(),
            vtree_search_freq: 5,
            post_compilation_search: true,
            render: true,
        }
    }

    pub fn command(&self, toolchain: &Toolchain) -> Invocation {
        let inv = Invocation::new(&toolchain.sdd).flag("-c", &self.cnf);
        let inv = match &self.vtree_in {
            Some(vtree) => inv.flag("-v", vtree),
            None => inv.flag("-t", self.initial_vtree.to_string()),
        };
        let search = match self.vtree_in {
            Some(_) => 0,
            None => self.vtree_search_freq,
        };
        inv.flag("-W", &self.vtree_out)
            .flag("-V", dot_sibling(&self.vtree_out))
            .flag("-R", &self.sdd_out)
            .flag("-S", dot_sibling(&self.sdd_out))
            .arg("-m")
            .flag("-r", search.to_string())
            .switch("-q", self.post_compilation_search)
    }
}

impl<R: ProcessRunner> Driver<'_, R> {
    /// Compiles a CNF into an SDD and its vtree, rendering both.
    ///
    /// The CNF is parsed first and a malformed file fails with [`Error::Cnf`](crate::Error::Cnf)
    /// without running the compiler.
    pub fn compile_cnf_to_sdd(&self, params: &CompileCnf) -> Result<PathBuf> {
        require_file(&params.cnf)?;
        if let Some(vtree) = &params.vtree_in {
            require_file(vtree)?;
        }
        let cnf = Cnf::read(&params.cnf)?;
        if cnf.num_clauses() == 0 {
            warn!("{} has no clauses, the SDD will be constant true", params.cnf.display());
        }

        self.execute(params.command(self.toolchain()))?;

        require_file(&params.vtree_out)?;
        require_file(&params.sdd_out)?;
        self.render(&params.vtree_out, params.render);
        self.render(&params.sdd_out, params.render);

        info!("Finished compiling CNF to SDD: {}", params.sdd_out.display());
        Ok(params.sdd_out.clone())
    }
}
