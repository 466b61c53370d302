use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the sweep configuration YAML
    #[arg(short = 'c', long = "config")]
    pub config: PathBuf,

    /// Number of worker threads; 0 auto-detects via the CPU count
    #[arg(short = 'n', long = "cores", default_value_t = 0)]
    pub cores: usize,

    /// Output directory for the per-triple result files
    #[arg(short = 'o', long = "out")]
    pub out: PathBuf,

    /// Base directory of the CSV price archive
    #[arg(short = 's', long = "archive")]
    pub archive: PathBuf,

    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    /// Write the cross-triple per-zone aggregate report after the sweep
    #[arg(long, default_value_t = false)]
    pub aggregate: bool,
}
