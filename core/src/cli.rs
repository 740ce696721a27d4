use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::package::FsPackageLoader;
use crate::syntax::{self, reflect};
use crate::translate;
use crate::value::Value;

#[derive(Parser)]
#[command(name = "relish")]
#[command(about = "Relish - a relational expression language", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate an expression given on the command line
    Eval {
        /// Source text of the expression
        expr: String,

        /// Directory local package references resolve against
        #[arg(long)]
        source_dir: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate a source file
    Run {
        /// Path to a .rel file
        file: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Translate JSON text into a value
    Json {
        /// JSON document
        text: String,
    },

    /// Print the syntax tree of an expression as a value
    Syntax {
        /// Source text of the expression
        expr: String,
    },

    /// Print the effective configuration
    Config,
}

/// Run the CLI by parsing process arguments
pub fn run_cli() -> Result<()> {
    run_cli_with_args(Cli::parse())
}

/// Run the CLI with provided arguments
pub fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    run_cli_with_args(Cli::try_parse_from(args)?)
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    // Ignore a second initialisation when embedded in a host that already set one
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_cli_with_args(cli: Cli) -> Result<()> {
    // Apply CLI overrides to environment before loading configuration
    if let Some(config_path) = &cli.config {
        std::env::set_var("RELISH_CONFIG_PATH", config_path);
    }
    let config = Config::load()?;
    init_tracing(&config);
    debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Eval {
            expr,
            source_dir,
            json,
        } => {
            let source_dir = source_dir
                .or_else(|| config.source_dir.clone())
                .map(|dir| dir.to_string_lossy().into_owned())
                .unwrap_or_default();
            let loader = FsPackageLoader::new(config.package_path.clone());
            let value = syntax::parse_source(&expr, &source_dir)
                .and_then(|e| e.eval(&loader.scope()))
                .context("Evaluation failed")?;
            print_value(&value, json)?;
        }

        Commands::Run { file, json } => {
            let loader = FsPackageLoader::new(config.package_path.clone());
            let value = loader.load_file(&file).map_err(|message| anyhow!(message))?;
            print_value(&value, json)?;
        }

        Commands::Json { text } => {
            let value = translate::from_json_str(&text)?;
            println!("{value}");
        }

        Commands::Syntax { expr } => {
            let tree = syntax::parse_tree(&expr).context("Failed to parse expression")?;
            println!("{}", reflect::tree_to_value(&tree));
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn print_value(value: &Value, json: bool) -> Result<()> {
    if json {
        println!("{}", translate::to_json_string(value)?);
    } else {
        println!("{value}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_eval_command() {
        let cli = Cli::try_parse_from(["relish", "eval", "1 + 2", "--json"]).expect("Should parse");
        assert!(matches!(
            cli.command,
            Commands::Eval { ref expr, json: true, source_dir: None } if expr == "1 + 2"
        ));
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["relish", "config", "--config", "/etc/relish.toml"])
            .expect("Should parse");
        assert_eq!(cli.config.as_deref(), Some("/etc/relish.toml"));
        assert!(matches!(cli.command, Commands::Config));
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(run_cli_from_args(vec!["relish".to_string(), "frobnicate".to_string()]).is_err());
    }
}
