use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Lemon Contributors",
    version,
    about = "LEMON CLI - Mine large collections of macromolecular structures in parallel, from a PDB mirror or from Hadoop sequence archives.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors, and hide progress bars
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count selected residues (metal ions, waters or ligands) in every structure.
    Count(CountArgs),
    /// List the record keys stored in the sequence archives of a directory.
    List(ListArgs),
}

/// Residue families the `count` command can tally.
#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Selection {
    #[default]
    MetalIons,
    Waters,
    /// Hetero residues that are neither water nor a metal ion.
    Ligands,
}

/// Arguments for the `count` subcommand.
#[derive(Args, Debug, Default)]
pub struct CountArgs {
    /// Directory holding the records: a divided PDB mirror when an entries file is given,
    /// otherwise a directory of sequence archives.
    #[arg(short, long, value_name = "PATH")]
    pub work_dir: Option<PathBuf>,

    /// File listing one structure identifier per line.
    /// Without it, every record of every archive in the working directory is processed.
    #[arg(short, long, value_name = "PATH")]
    pub entries_file: Option<PathBuf>,

    /// Number of pool workers. Defaults to the number of logical cores.
    #[arg(short = 'j', long, value_name = "NUM")]
    pub ncpu: Option<usize>,

    /// Records a pool worker processes from an archive before handing results over.
    #[arg(long, value_name = "NUM")]
    pub flush_threshold: Option<usize>,

    /// Emit results in submission order instead of completion order.
    #[arg(long)]
    pub ordered: bool,

    /// Residue family to count.
    #[arg(short, long, value_enum, value_name = "KIND")]
    pub select: Option<Selection>,

    /// Path to an optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S run.ncpu=8
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `list` subcommand.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Directory holding the sequence archives.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub work_dir: PathBuf,

    /// Print only the number of keys instead of the keys themselves.
    #[arg(long)]
    pub count: bool,
}
