use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use rhizotroph::motifs::{self, MotifSettings};
use rhizotroph::network::{self, NetworkSettings};
use rhizotroph::pipeline::{self, Layout};
use rhizotroph::simulate::{self, SimulationSettings};

/// Predict trophic interactions in a microbial community from
/// genome-scale metabolic models
#[derive(Parser)]
#[command(name = "rhizotroph")]
#[command(about = "Predict trophic interactions from genome-scale metabolic models", long_about = None)]
struct Cli {
    /// Base directory holding media/, models/ and target/
    #[arg(short, long, global = true, default_value = ".")]
    base_dir: PathBuf,

    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate community growth and gather secretion profiles
    Simulate {
        #[command(flatten)]
        options: SimulateOptions,
    },
    /// Build the trophic interaction network from secretion profiles
    Network {
        #[command(flatten)]
        options: NetworkOptions,
    },
    /// Extract motif sub-networks seeded at root exudates
    Paths {
        #[command(flatten)]
        options: PathsOptions,
    },
    /// Run all three stages in order
    Run {
        #[command(flatten)]
        simulate: SimulateOptions,
        #[command(flatten)]
        network: NetworkOptions,
        #[command(flatten)]
        paths: PathsOptions,
    },
}

#[derive(clap::Args)]
struct SimulateOptions {
    /// Number of growth iterations to run
    #[arg(short = 'n', long, default_value = "5")]
    iterations: usize,

    /// Initial medium file (default: <base>/media/initial_medium.csv)
    #[arg(long)]
    initial_medium: Option<PathBuf>,

    /// Supplement medium merged in before the iteration given by --supplement-at
    #[arg(long)]
    supplement: Option<PathBuf>,

    /// Iteration before which the supplement is merged
    #[arg(long, default_value = "4")]
    supplement_at: usize,
}

#[derive(clap::Args)]
struct NetworkOptions {
    /// Final medium file (default: the last medium the simulation wrote)
    #[arg(long)]
    final_medium: Option<PathBuf>,

    /// Organic compound filter (default: organic_metabolites.csv at the base dir, if present)
    #[arg(long)]
    organic_filter: Option<PathBuf>,
}

#[derive(clap::Args)]
struct PathsOptions {
    /// Exudate list (default: <base>/media/exudates.csv)
    #[arg(long)]
    exudates: Option<PathBuf>,

    /// Differential abundance classification table
    #[arg(long)]
    classification: Option<PathBuf>,
}

impl From<SimulateOptions> for SimulationSettings {
    fn from(options: SimulateOptions) -> Self {
        SimulationSettings {
            iterations: options.iterations,
            initial_medium: options.initial_medium,
            supplement: options.supplement,
            supplement_at: options.supplement_at,
        }
    }
}

impl From<NetworkOptions> for NetworkSettings {
    fn from(options: NetworkOptions) -> Self {
        NetworkSettings {
            final_medium: options.final_medium,
            organic_filter: options.organic_filter,
        }
    }
}

impl From<PathsOptions> for MotifSettings {
    fn from(options: PathsOptions) -> Self {
        MotifSettings {
            exudates: options.exudates,
            classification: options.classification,
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let layout = Layout::new(&cli.base_dir);

    match cli.command {
        Commands::Simulate { options } => {
            simulate::run_stage(&layout, &options.into())?;
        }
        Commands::Network { options } => {
            network::run_stage(&layout, &options.into())?;
        }
        Commands::Paths { options } => {
            motifs::run_stage(&layout, &options.into())?;
        }
        Commands::Run {
            simulate,
            network,
            paths,
        } => {
            pipeline::run(&layout, &simulate.into(), &network.into(), &paths.into())?;
        }
    }
    Ok(())
}
