//! Strata CLI - resolve layered bundler configuration for a build variant.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Resolve layered bundler configuration for a build variant")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the project file (strata.toml, .yaml or .json)
    #[arg(short, long, global = true, default_value = strata_config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter project file
    Init {
        /// Overwrite an existing project file
        #[arg(short, long)]
        yes: bool,
    },

    /// Resolve the configuration for a variant
    Resolve {
        /// Build variant (development or production)
        #[arg(env = "STRATA_MODE")]
        variant: String,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Resolve every variant the project defines and report problems
    Check,
}

/// Serialization format for resolved configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so resolved output on stdout stays parseable
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(&cli.config, yes)?;
        }
        Commands::Resolve {
            variant,
            out,
            format,
        } => {
            commands::resolve::run(&cli.config, &variant, out, format)?;
        }
        Commands::Check => {
            commands::check::run(&cli.config)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "strata",
            "resolve",
            "production",
            "--config",
            "web/strata.yaml",
            "--verbose",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("web/strata.yaml"));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Resolve { ref variant, .. } if variant == "production"));
    }
}
