use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;

use learn_psdd::cnf::Cnf;
use learn_psdd::config::ToolConfig;
use learn_psdd::driver::Driver;
use learn_psdd::learner::{Classify, LearnEnsemble, LearnPsdd, LearnVtree, Sdd2Psdd, SoftEm};
use learn_psdd::options::{
    Completion, InitialVtree, MaxIterations, OpTypes, SaveFrequency, Scorer, Smoothing, VtreeMethod,
};
use learn_psdd::pipeline::{LearnPsddExperiment, Model};
use learn_psdd::runner::SystemRunner;
use learn_psdd::sdd::CompileCnf;
use learn_psdd::toolchain::Toolchain;

#[derive(Parser)]
#[command(author, version, about = "Learn vtrees, SDDs and PSDDs with LearnPSDD and libsdd")]
struct Cli {
    /// Tool locations (TOML)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Root of the LearnPSDD checkout
    #[arg(long, value_name = "DIR", global = true)]
    learnpsdd_root: Option<PathBuf>,

    /// Directory holding the libsdd binaries
    #[arg(long, value_name = "DIR", global = true)]
    sdd_bin: Option<PathBuf>,

    /// Never render .dot files to PDF
    #[arg(long, global = true)]
    no_graphviz: bool,

    /// Allow ensemble learning with more than one component
    #[arg(long, global = true)]
    enable_ensemble: bool,

    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a CNF that one-hot encodes groups of variables
    OneHot(OneHotArgs),

    #[command(flatten)]
    Tool(ToolCommand),
}

#[derive(Subcommand)]
enum ToolCommand {
    /// Full experiment: vtree, optional constraints, PSDD
    Learn {
        /// Experiment directory (must not exist unless --replace)
        experiment: PathBuf,
        #[command(flatten)]
        data: DataArgs,
        #[arg(long)]
        replace: bool,
        #[arg(long, default_value = "miBlossom")]
        vtree_method: VtreeMethod,
        #[arg(long, default_value_t = 1)]
        components: usize,
        /// DIMACS CNF with hard constraints
        #[arg(long, value_name = "FILE")]
        constraints: Option<PathBuf>,
        /// Remove the compiled constraint circuits afterwards
        #[arg(long)]
        discard_generated: bool,
        #[arg(long)]
        no_render: bool,
    },

    /// Learn a vtree from data
    LearnVtree {
        #[arg(long, value_name = "FILE")]
        train: PathBuf,
        #[arg(short, long, value_name = "FILE")]
        out: PathBuf,
        #[arg(long, default_value = "miBlossom")]
        method: VtreeMethod,
        #[arg(long, value_name = "DIR")]
        scratch: Option<PathBuf>,
        /// Keep the learner's scratch directory
        #[arg(long)]
        keep: bool,
        #[arg(long)]
        no_render: bool,
    },

    /// Compile a CNF to an SDD
    Cnf2sdd {
        #[arg(long, value_name = "FILE")]
        cnf: PathBuf,
        #[arg(long, value_name = "FILE")]
        sdd: PathBuf,
        #[arg(long, value_name = "FILE")]
        vtree_out: PathBuf,
        /// Compile against this vtree instead of generating one
        #[arg(long, value_name = "FILE")]
        vtree_in: Option<PathBuf>,
        #[arg(long, default_value = "random")]
        initial_vtree: InitialVtree,
        /// Clauses between vtree searches
        #[arg(long, default_value_t = 5)]
        search_freq: u32,
        /// Skip the vtree search after compilation
        #[arg(long)]
        no_post_search: bool,
        #[arg(long)]
        no_render: bool,
    },

    /// Estimate PSDD parameters for an SDD
    Sdd2psdd {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long, value_name = "FILE")]
        vtree: PathBuf,
        #[arg(long, value_name = "FILE")]
        sdd: PathBuf,
        #[arg(short, long, value_name = "FILE")]
        out: PathBuf,
        #[arg(long, default_value = "l-1")]
        smooth: Smoothing,
    },

    /// Learn a PSDD by structure search
    LearnPsddSearch {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long, value_name = "FILE")]
        vtree: PathBuf,
        #[arg(short, long, value_name = "FILE")]
        out: PathBuf,
        /// Initial PSDD
        #[arg(long, value_name = "FILE")]
        psdd_in: Option<PathBuf>,
        #[command(flatten)]
        search: SearchArgs,
        #[arg(long, default_value = "clone-3,split-1")]
        op_types: OpTypes,
        #[arg(long, default_value = "maxDepth-3")]
        completion: Completion,
        #[arg(long, default_value = "best-3")]
        freq: SaveFrequency,
        #[arg(long, value_name = "DIR")]
        scratch: Option<PathBuf>,
        #[arg(long)]
        keep: bool,
        #[arg(long)]
        no_render: bool,
    },

    /// Learn an ensemble of PSDDs
    LearnEnsemble {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long, value_name = "FILE")]
        vtree: PathBuf,
        #[arg(short, long, value_name = "DIR")]
        out: PathBuf,
        #[arg(long, value_name = "FILE")]
        psdd_in: Option<PathBuf>,
        #[arg(long, default_value_t = 5)]
        components: usize,
        #[command(flatten)]
        search: SearchArgs,
        #[arg(long, default_value_t = 3)]
        structure_change_it: u32,
        #[arg(long, default_value_t = 1)]
        parameter_learning_it: u32,
    },

    /// Learn a SoftEM ensemble with the updated learner
    Softem {
        /// Directory with train.data, valid.data and test.data
        data_dir: PathBuf,
        vtree: PathBuf,
        out_dir: PathBuf,
        #[arg(long, default_value_t = 10)]
        components: usize,
    },

    /// Classify data with a weighted mixture of PSDDs
    Classify {
        #[arg(long, value_name = "FILE")]
        vtree: PathBuf,
        #[arg(long = "psdd", value_name = "FILE", required = true, value_delimiter = ',')]
        psdds: Vec<PathBuf>,
        #[arg(long = "weight", value_name = "W", required = true, value_delimiter = ',')]
        weights: Vec<f64>,
        /// Data used to initialize the PSDDs
        #[arg(long, value_name = "FILE")]
        sample: PathBuf,
        #[arg(long)]
        flx: u32,
        /// Number of labels
        #[arg(long)]
        fly: u32,
        #[arg(long, value_name = "FILE")]
        query: PathBuf,
        #[arg(short, long, value_name = "FILE")]
        out: PathBuf,
    },

    /// Resolve and print the tool locations
    CheckEnv,
}

#[derive(Args)]
struct OneHotArgs {
    #[arg(long)]
    vars: u32,
    /// Comma-separated variables, e.g. "1,2,3,4" (repeatable)
    #[arg(long = "group", required = true)]
    groups: Vec<Group>,
    /// Output file, stdout if omitted
    #[arg(short, long, value_name = "FILE")]
    out: Option<PathBuf>,
}

#[derive(Args)]
struct DataArgs {
    #[arg(long, value_name = "FILE")]
    train: PathBuf,
    #[arg(long, value_name = "FILE")]
    valid: Option<PathBuf>,
    #[arg(long, value_name = "FILE")]
    test: Option<PathBuf>,
}

#[derive(Args)]
struct SearchArgs {
    #[arg(long, default_value = "l-1")]
    smooth: Smoothing,
    #[arg(long, default_value = "dll/ds")]
    scorer: Scorer,
    /// Iteration limit, or "max" for none
    #[arg(long, default_value = "max")]
    max_it: MaxIterations,
}

#[derive(Clone, Debug)]
struct Group(Vec<u32>);

impl FromStr for Group {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.split(',')
            .map(|v| v.trim().parse::<u32>().map_err(|_| format!("invalid variable {:?}", v)))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Group)
    }
}

fn tool_config(cli: &Cli) -> Result<ToolConfig> {
    let mut config = match &cli.config {
        Some(path) => ToolConfig::load(path)?,
        None => ToolConfig::default(),
    };
    if let Some(root) = &cli.learnpsdd_root {
        config.learnpsdd_root = root.clone();
    }
    if let Some(bin) = &cli.sdd_bin {
        config.sdd_bin = bin.clone();
    }
    if cli.no_graphviz {
        config.graphviz = false;
    }
    if cli.enable_ensemble {
        config.ensemble_enabled = true;
    }
    Ok(config)
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let level = if cli.verbose {
        simplelog::LevelFilter::Debug
    } else if cli.quiet {
        simplelog::LevelFilter::Warn
    } else {
        simplelog::LevelFilter::Info
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let config = tool_config(&cli)?;
    match cli.command {
        Commands::OneHot(args) => write_one_hot(&args),
        Commands::Tool(command) => run(command, &config, cli.quiet),
    }
}

fn write_one_hot(args: &OneHotArgs) -> Result<()> {
    let groups: Vec<Vec<u32>> = args.groups.iter().map(|g| g.0.clone()).collect();
    let cnf = Cnf::one_hot(args.vars, &groups)?;
    match &args.out {
        Some(path) => {
            cnf.write(path)?;
            log::info!("Wrote {} clauses to {}", cnf.num_clauses(), path.display());
        }
        None => print!("{}", cnf.to_dimacs()),
    }
    Ok(())
}

fn run(command: ToolCommand, config: &ToolConfig, quiet: bool) -> Result<()> {
    let toolchain = Toolchain::resolve(config).wrap_err("could not resolve the LearnPSDD toolchain")?;
    let driver = Driver::new(&toolchain, SystemRunner { echo: !quiet });

    let time_total = std::time::Instant::now();

    match command {
        ToolCommand::Learn {
            experiment,
            data,
            replace,
            vtree_method,
            components,
            constraints,
            discard_generated,
            no_render,
        } => {
            let result = driver.learn_psdd(&LearnPsddExperiment {
                valid_data: data.valid,
                test_data: data.test,
                replace_existing: replace,
                vtree_method,
                components,
                constraints,
                keep_generated_files: !discard_generated,
                render: !no_render,
                ..LearnPsddExperiment::new(experiment, data.train)
            })?;
            println!("vtree: {}", result.vtree.display());
            match &result.model {
                Model::Psdd(p) => println!("psdd: {}", p.display()),
                Model::Ensemble(p) => println!("ensemble: {}", p.display()),
            }
            if let Some(p) = &result.constraints_psdd {
                println!("constraints: {}", p.display());
            }
        }

        ToolCommand::LearnVtree {
            train,
            out,
            method,
            scratch,
            keep,
            no_render,
        } => {
            driver.learn_vtree(&LearnVtree {
                method,
                scratch_dir: scratch,
                keep_generated_files: keep,
                render: !no_render,
                ..LearnVtree::new(train, out)
            })?;
        }

        ToolCommand::Cnf2sdd {
            cnf,
            sdd,
            vtree_out,
            vtree_in,
            initial_vtree,
            search_freq,
            no_post_search,
            no_render,
        } => {
            driver.compile_cnf_to_sdd(&CompileCnf {
                vtree_in,
                initial_vtree,
                vtree_search_freq: search_freq,
                post_compilation_search: !no_post_search,
                render: !no_render,
                ..CompileCnf::new(cnf, sdd, vtree_out)
            })?;
        }

        ToolCommand::Sdd2psdd {
            data,
            vtree,
            sdd,
            out,
            smooth,
        } => {
            driver.compile_sdd_to_psdd(&Sdd2Psdd {
                valid_data: data.valid,
                test_data: data.test,
                smoothing: smooth,
                ..Sdd2Psdd::new(data.train, vtree, sdd, out)
            })?;
        }

        ToolCommand::LearnPsddSearch {
            data,
            vtree,
            out,
            psdd_in,
            search,
            op_types,
            completion,
            freq,
            scratch,
            keep,
            no_render,
        } => {
            driver.learn_psdd_from_data(&LearnPsdd {
                scratch_dir: scratch,
                psdd_in,
                valid_data: data.valid,
                test_data: data.test,
                smoothing: search.smooth,
                op_types,
                completion,
                scorer: search.scorer,
                max_iterations: search.max_it,
                save_frequency: freq,
                keep_generated_files: keep,
                render: !no_render,
                ..LearnPsdd::new(data.train, vtree, out)
            })?;
        }

        ToolCommand::LearnEnsemble {
            data,
            vtree,
            out,
            psdd_in,
            components,
            search,
            structure_change_it,
            parameter_learning_it,
        } => {
            driver.learn_ensemble_psdd(&LearnEnsemble {
                psdd_in,
                components,
                valid_data: data.valid,
                test_data: data.test,
                smoothing: search.smooth,
                structure_change_it,
                parameter_learning_it,
                scorer: search.scorer,
                max_iterations: search.max_it,
                ..LearnEnsemble::new(data.train, vtree, out)
            })?;
        }

        ToolCommand::Softem {
            data_dir,
            vtree,
            out_dir,
            components,
        } => {
            driver.learn_ensemble_softem(&SoftEm {
                components,
                ..SoftEm::new(data_dir, vtree, out_dir)
            })?;
        }

        ToolCommand::Classify {
            vtree,
            psdds,
            weights,
            sample,
            flx,
            fly,
            query,
            out,
        } => {
            driver.classify(&Classify {
                vtree,
                psdds,
                weights,
                data_sample: sample,
                flx_cat_dim: flx,
                fly_cat_dim: fly,
                query,
                output: out,
            })?;
        }

        ToolCommand::CheckEnv => {
            println!("learnpsdd root: {}", toolchain.learnpsdd_root.display());
            println!("learnpsdd jar:  {}", toolchain.learnpsdd_jar.display());
            println!("learnpsdd lib:  {}", toolchain.learnpsdd_lib.display());
            match &toolchain.learnpsdd2_jar {
                Some(jar) => println!("learnpsdd2 jar: {}", jar.display()),
                None => println!("learnpsdd2 jar: (not installed)"),
            }
            println!("sdd compiler:   {}", toolchain.sdd.display());
            println!("java:           {}", toolchain.java.display());
            if toolchain.graphviz {
                println!("graphviz:       {}", toolchain.dot.display());
            } else {
                println!("graphviz:       disabled");
            }
            println!("ensembles:      {}", if toolchain.ensemble_enabled { "enabled" } else { "disabled" });
        }
    }

    log::info!("All done in {:.3} s", time_total.elapsed().as_secs_f64());
    Ok(())
}
