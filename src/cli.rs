//! Command-line interface definitions.
//!
//! Paths default to `config/` and `logs/` relative to the working directory.
//! `--mode` overrides the `operation.mode` value from `config.yaml`.

use crate::config::RunMode;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Mode selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Run one cycle and exit
    Single,
    /// Run a cycle every check interval until stopped
    Continuous,
}

impl From<ModeArg> for RunMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Single => RunMode::Single,
            ModeArg::Continuous => RunMode::Continuous,
        }
    }
}

/// Cross-post relevant YouTube uploads to a Lemmy community.
///
/// # Examples
///
/// ```sh
/// # Use ./config and ./logs, mode from config.yaml
/// yt_lemmy_bot
///
/// # Force a single pass with a different config directory
/// yt_lemmy_bot --config /etc/yt_lemmy_bot --mode single
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory containing config.yaml, channels.json and keywords.json
    #[arg(short, long, env = "BOT_CONFIG_DIR", default_value = "config")]
    pub config: PathBuf,

    /// Directory for log files
    #[arg(short, long, env = "BOT_LOG_DIR", default_value = "logs")]
    pub logs: PathBuf,

    /// Override the operation mode from config.yaml
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,
}

impl Cli {
    /// The CLI override if given, otherwise `configured`.
    pub fn run_mode(&self, configured: RunMode) -> RunMode {
        self.mode.map(RunMode::from).unwrap_or(configured)
    }
}
