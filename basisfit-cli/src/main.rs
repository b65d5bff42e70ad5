use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::Context;
use basisfit_core::{
    basis::{AtomicBasis, BasisLibrary},
    config::ExperimentConfig,
    device::{ComputeDevice, EvaluationContext},
    experiment::Experiment,
    hf::RestrictedHartreeFock,
    integrals::McMurchieDavidson,
    molecule::MolecularSystem,
};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log debug output (RUST_LOG still takes precedence)
    #[arg(long, short, action = ArgAction::SetTrue, global = true)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// The experiment description (molecule, trial and reference basis)
    #[arg(long, short)]
    config: PathBuf,
    /// Directories searched for `<basis>.json` before the bundled basis sets
    #[arg(long)]
    basis_dir: Vec<PathBuf>,
    /// Where integrals are evaluated
    #[arg(long, value_enum, default_value_t = DeviceArg::Auto)]
    device: DeviceArg,
    /// Write a human readable log of the reference SCF to this file
    #[arg(long)]
    scf_output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum DeviceArg {
    Auto,
    Serial,
    Parallel,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the objective at the unperturbed trial basis
    Evaluate {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Minimize the objective over the trial basis parameters
    Optimize {
        #[command(flatten)]
        common: CommonArgs,
        /// `adam` or `gd`
        #[arg(long)]
        method: Option<String>,
        /// Learning rate of the optimizer
        #[arg(long)]
        step: Option<f64>,
        #[arg(long)]
        max_iterations: Option<usize>,
        /// Step of the central difference gradient
        #[arg(long)]
        difference_step: Option<f64>,
        /// Write the optimized trial basis to this file as JSON
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Run the SCF of the trial system and print energies and occupations
    Scf {
        #[command(flatten)]
        common: CommonArgs,
    },
}

impl DeviceArg {
    fn context(self) -> EvaluationContext {
        match self {
            DeviceArg::Auto => EvaluationContext::detect(),
            DeviceArg::Serial => EvaluationContext::serial(),
            DeviceArg::Parallel => {
                let threads = std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN);
                EvaluationContext::new(ComputeDevice::Parallel { threads })
            }
        }
    }
}

/// Everything the subcommands share, resolved from the config file and the flags.
struct Setup {
    config: ExperimentConfig,
    library: BasisLibrary,
    context: EvaluationContext,
    trial: MolecularSystem,
    reference: MolecularSystem,
}

impl Setup {
    fn load(common: &CommonArgs) -> anyhow::Result<Self> {
        let mut config = ExperimentConfig::from_path(&common.config).with_context(|| {
            format!("failed to read experiment from {}", common.config.display())
        })?;
        if let Some(path) = &common.scf_output {
            config.scf.report = Some(path.clone());
        }

        let library = common
            .basis_dir
            .iter()
            .fold(BasisLibrary::new(), |library, dir| library.with_search_dir(dir));
        let context = common.device.context();
        log::info!("evaluating on {}", context.device);

        let trial = config.trial_system().context("invalid trial system")?;
        let reference = config
            .reference_system()
            .context("invalid reference system")?;
        log::debug!("structure: {}", trial.structure());

        Ok(Self {
            config,
            library,
            context,
            trial,
            reference,
        })
    }

    fn provider(&self) -> RestrictedHartreeFock {
        RestrictedHartreeFock::new(self.config.scf.clone()).with_context(self.context)
    }

    fn experiment(&self) -> anyhow::Result<Experiment<McMurchieDavidson>> {
        Experiment::prepare(
            &self.trial,
            &self.reference,
            &self.library,
            &self.provider(),
            McMurchieDavidson,
            self.context,
        )
        .context("failed to prepare the experiment")
    }
}

#[derive(Serialize)]
struct OptimizedAtom<'a> {
    element: String,
    position: [f64; 3],
    basis: &'a AtomicBasis,
}

#[derive(Serialize)]
struct OptimizedBasis<'a> {
    initial_objective: f64,
    objective: f64,
    iterations: usize,
    history: &'a [f64],
    atoms: Vec<OptimizedAtom<'a>>,
}

fn write_json(path: &Path, value: &impl Serialize) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, value)
        .with_context(|| format!("failed to write {}", path.display()))
}

fn init_logger(verbose: bool) {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Command::Evaluate { common } => {
            let setup = Setup::load(&common)?;
            let experiment = setup.experiment()?;

            let start = Instant::now();
            let value = experiment
                .evaluate()
                .context("failed to evaluate the objective")?;
            println!("objective: {value:.10} ({:0.2?})", start.elapsed());
        }

        Command::Optimize {
            common,
            method,
            step,
            max_iterations,
            difference_step,
            output,
        } => {
            let mut setup = Setup::load(&common)?;
            if let Some(method) = method {
                setup.config.optimizer.method = method;
            }
            if let Some(step) = step {
                setup.config.optimizer.step = step;
            }
            if let Some(max_iterations) = max_iterations {
                setup.config.optimizer.max_iterations = max_iterations;
            }
            if let Some(difference_step) = difference_step {
                setup.config.optimizer.difference_step = difference_step;
            }

            let mut experiment = setup.experiment()?;

            let start = Instant::now();
            let outcome = experiment
                .optimize(&setup.config.optimizer)
                .context("optimization failed")?;

            let initial = outcome.history.first().copied().unwrap_or(outcome.best_value);
            println!(
                "optimized {} parameters in {} iterations and {:0.2?}",
                outcome.best_params.len(),
                outcome.iterations,
                start.elapsed()
            );
            println!("initial objective: {initial:.10}");
            println!("best objective:    {:.10}", outcome.best_value);

            if let Some(path) = output {
                let bases = experiment.trial_bases(&outcome.best_params)?;
                let atoms = setup
                    .trial
                    .atoms()
                    .iter()
                    .zip(&bases)
                    .map(|(atom, basis)| OptimizedAtom {
                        element: atom.element().to_string(),
                        position: atom.position(),
                        basis,
                    })
                    .collect();

                write_json(
                    &path,
                    &OptimizedBasis {
                        initial_objective: initial,
                        objective: outcome.best_value,
                        iterations: outcome.iterations,
                        history: &outcome.history,
                        atoms,
                    },
                )?;
                println!("optimized basis written to {}", path.display());
            }
        }

        Command::Scf { common } => {
            let setup = Setup::load(&common)?;

            let start = Instant::now();
            let solution = setup
                .trial
                .solve_reference(&setup.provider(), &setup.library)
                .context("scf failed")?;

            let status = if solution.converged {
                "converged"
            } else {
                "did not converge"
            };
            println!(
                "hartree fock {status} after {} iterations and {:0.2?}",
                solution.iterations,
                start.elapsed()
            );
            println!("electronic energy: {:3.6}", solution.electronic_energy);
            println!("nuclear repulsion energy: {:3.6}", solution.nuclear_repulsion);
            println!("hartree fock energy: {:3.6}", solution.total_energy());
            println!("orbital energies: {:3.4?}", solution.orbital_energies.as_slice());
            println!("occupations: {:?}", solution.occupations.as_slice());
        }
    }

    Ok(())
}
