use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use mzdb::model::XicMethod;

mod config;
mod dump;
mod info;
mod spectrum;
mod xic;

use config::Config;

/// mzdb - Inspect and extract data from mzDB files
#[derive(Parser)]
#[command(name = "mzdb")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// TOML configuration file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Peak selection rule for extracted ion chromatograms.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum XicMethodArg {
    /// Most intense peak within tolerance
    Max,
    /// Peak closest to the target m/z
    Nearest,
}

impl From<XicMethodArg> for XicMethod {
    fn from(arg: XicMethodArg) -> Self {
        match arg {
            XicMethodArg::Max => XicMethod::Max,
            XicMethodArg::Nearest => XicMethod::Nearest,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Display a summary of an mzDB file
    Info {
        /// mzDB file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print the peaks of one spectrum
    Spectrum {
        /// mzDB file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Spectrum id
        #[arg(value_name = "ID")]
        id: i64,

        /// Print header and peaks as JSON instead of TSV
        #[arg(long)]
        json: bool,
    },

    /// Stream spectra in acquisition order
    Dump {
        /// mzDB file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Only spectra of this MS level
        #[arg(short = 'l', long)]
        ms_level: Option<i64>,

        /// Stop after this many spectra
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// One JSON object per line instead of a header summary per spectrum
        #[arg(long)]
        json: bool,
    },

    /// Extract an ion chromatogram from MS1 spectra
    Xic {
        /// mzDB file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Target m/z
        #[arg(value_name = "MZ")]
        mz: f64,

        /// m/z tolerance in ppm [default: 10, or the config file value]
        #[arg(long)]
        ppm: Option<f64>,

        /// Lower retention time bound (seconds)
        #[arg(long)]
        min_time: Option<f32>,

        /// Upper retention time bound (seconds)
        #[arg(long)]
        max_time: Option<f32>,

        /// Peak selection rule [default: max, or the config file value]
        #[arg(long, value_enum)]
        method: Option<XicMethodArg>,
    },
}

impl Cli {
    /// Requested verbosity.
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

/// Install the env_logger backend; `RUST_LOG` overrides the verbosity flag.
pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

/// Run the selected subcommand.
pub fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Info { file } => info::run(file, &config),
        Commands::Spectrum { file, id, json } => spectrum::run(file, id, json, &config),
        Commands::Dump {
            file,
            ms_level,
            limit,
            json,
        } => dump::run(file, ms_level, limit, json, &config),
        Commands::Xic {
            file,
            mz,
            ppm,
            min_time,
            max_time,
            method,
        } => xic::run(
            file,
            mz,
            ppm,
            min_time,
            max_time,
            method.map(XicMethod::from),
            &config,
        ),
    }
}
