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
    author,
    version,
    about = "vdock - a command-line pipeline that docks small molecules against prepared protein targets with AutoDock Vina.",
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
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dock a ligand against a prepared target and report its scored poses.
    Dock(DockArgs),
    /// List the prepared targets available in the targets directory.
    Targets(TargetsArgs),
}

/// Arguments for the `dock` subcommand.
#[derive(Args, Debug)]
pub struct DockArgs {
    /// Ligand to dock, as a SMILES or InChI string (InChI is recognized
    /// by its `InChI=` prefix).
    #[arg(value_name = "LIGAND")]
    pub ligand: String,

    /// Name of the prepared target to dock against.
    #[arg(short, long, required = true, value_name = "NAME")]
    pub target: String,

    /// Interpret the ligand argument as an InChI string.
    #[arg(long)]
    pub inchi: bool,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the targets directory from the config file.
    #[arg(long, value_name = "PATH")]
    pub targets_dir: Option<PathBuf>,

    /// Override the random seed used for embedding and the engine search.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Number of CPUs the engine may use. Defaults to the engine's choice.
    #[arg(long, value_name = "INT")]
    pub cpus: Option<u32>,

    /// Abort any external tool invocation after this many seconds.
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Keep intermediate files in this directory instead of a temporary one.
    #[arg(long, value_name = "PATH")]
    pub keep: Option<PathBuf>,

    /// Write the docked poses as a multi-model PDB file.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Append the scores to a CSV file (created with a header if missing).
    #[arg(long, value_name = "PATH")]
    pub scores_csv: Option<PathBuf>,
}

/// Arguments for the `targets` subcommand.
#[derive(Args, Debug)]
pub struct TargetsArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the targets directory from the config file.
    #[arg(long, value_name = "PATH")]
    pub targets_dir: Option<PathBuf>,

    /// Also print each target's search box.
    #[arg(long)]
    pub detail: bool,
}
