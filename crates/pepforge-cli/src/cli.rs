use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu, William A. Goddard III, Victor Wai Tak Kam",
    version,
    about = "pepforge CLI - Reproducible peptide binder design: target preparation, backbone generation, sequence design, scoring, ranking, and structure prediction.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used for parallel scoring.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full design pipeline described by a configuration file.
    Run(RunArgs),
    /// Validate a configuration file without running any stage.
    Validate(ValidateArgs),
    /// Print the physicochemical properties of one or more peptide sequences.
    Score(ScoreArgs),
    /// Re-score and re-rank an externally produced designs table.
    Rescore(RescoreArgs),
}

/// Configuration source shared by every command that builds a run configuration.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to the run configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Override the output root directory from the config file.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Override the global random seed.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Pin every external tool to the simulated backend (dry run).
    #[arg(long)]
    pub simulate: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S backbone.num-backbones=20
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Arguments for the `validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Arguments for the `score` subcommand.
#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// One-letter peptide sequences to score.
    #[arg(required = true, value_name = "SEQUENCE")]
    pub sequences: Vec<String>,

    /// pH used for the net charge calculation.
    #[arg(long, default_value_t = 7.4, value_name = "FLOAT")]
    pub ph: f64,
}

/// Arguments for the `rescore` subcommand.
#[derive(Args, Debug)]
pub struct RescoreArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Designs table (`design_id, backbone_id, sequence, score`) to re-score.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub designs: PathBuf,
}
