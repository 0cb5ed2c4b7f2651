use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod average_flux;
mod composite;
mod config;
mod demo;
mod info;
mod read_perf;
mod validate;

/// specstack - SDSS quasar spectrum store and composite builder
#[derive(Parser)]
#[command(name = "specstack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Quantity to bin composites by
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ByArg {
    /// Redshift bins
    Redshift,
    /// Absolute magnitude bins
    Luminosity,
    /// Both, one after the other
    #[default]
    Both,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic catalog and spectrum store
    Demo {
        /// Directory to write catalog.csv and quasars.spdb into
        #[arg(value_name = "OUTPUT_DIR")]
        output_dir: PathBuf,

        /// Number of quasars
        #[arg(short = 'n', long, default_value_t = 500)]
        count: usize,

        /// Write a lite store instead of a full one
        #[arg(long)]
        lite: bool,
    },

    /// Build composite spectra binned by redshift and/or luminosity
    Composite {
        /// Quasar catalog CSV
        #[arg(long, value_name = "CSV")]
        catalog: PathBuf,

        /// Spectrum store
        #[arg(long, value_name = "FILE")]
        store: PathBuf,

        /// Quantity to bin by
        #[arg(long, value_enum, default_value = "both")]
        by: ByArg,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output directory (overrides the config file)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Keep broad absorption line quasars
        #[arg(long)]
        include_bal: bool,

        /// Process bins in parallel (requires the parallel feature)
        #[arg(long, default_value_t = false)]
        parallel: bool,
    },

    /// Mean rest-frame flux of every quasar in each normalisation window
    AverageFlux {
        /// Quasar catalog CSV
        #[arg(long, value_name = "CSV")]
        catalog: PathBuf,

        /// Spectrum store
        #[arg(long, value_name = "FILE")]
        store: PathBuf,

        /// Output CSV
        #[arg(short, long, value_name = "CSV")]
        output: PathBuf,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Display information about a spectrum store
    Info {
        /// Spectrum store
        #[arg(value_name = "STORE")]
        store: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate spectrum store integrity
    Validate {
        /// Spectrum store
        #[arg(value_name = "STORE")]
        store: PathBuf,
    },

    /// Time a forward and a backward pass over every spectrum
    ReadPerf {
        /// Spectrum store
        #[arg(value_name = "STORE")]
        store: PathBuf,

        /// Seek and read every record directly
        #[arg(long)]
        unbuffered: bool,

        /// Page buffer size in bytes
        #[arg(long, value_name = "BYTES")]
        buffer_size: Option<usize>,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Demo {
            output_dir,
            count,
            lite,
        } => demo::run(output_dir, count, lite),
        Commands::Composite {
            catalog,
            store,
            by,
            config,
            output,
            include_bal,
            parallel,
        } => composite::run(composite::Args {
            catalog,
            store,
            by,
            config,
            output,
            include_bal,
            parallel,
        }),
        Commands::AverageFlux {
            catalog,
            store,
            output,
            config,
        } => average_flux::run(catalog, store, output, config),
        Commands::Info { store, json } => info::run(store, json),
        Commands::Validate { store } => validate::run(store),
        Commands::ReadPerf {
            store,
            unbuffered,
            buffer_size,
        } => read_perf::run(store, unbuffered, buffer_size),
    }
}
