use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "tally", version = "0.1", author = "Tally Contributors")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Lint a Dockerfile and report violations")]
    Lint {
        /// Path to the Dockerfile to lint.
        path: PathBuf,

        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Path to a JSON config file; falls back to built-in defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Skip async checks (registry probes etc.).
        #[arg(long)]
        no_async: bool,
    },

    #[command(about = "Lint a Dockerfile and apply safe (or unsafe) fixes in place")]
    Fix {
        path: PathBuf,

        #[arg(long, value_enum, default_value = "safe")]
        mode: FixModeArg,

        /// Path to a JSON config file; falls back to built-in defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Skip async checks (registry probes etc.).
        #[arg(long)]
        no_async: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FixModeArg {
    Safe,
    Unsafe,
}

impl From<FixModeArg> for crate::config::FixMode {
    fn from(value: FixModeArg) -> Self {
        match value {
            FixModeArg::Safe => crate::config::FixMode::Safe,
            FixModeArg::Unsafe => crate::config::FixMode::Unsafe,
        }
    }
}
