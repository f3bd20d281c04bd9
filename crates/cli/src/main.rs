mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stitch_lib::consts::CONFIG_FILENAME;

use crate::output::{OutputFormat, print_error};

/// stitch - Resolve module classpaths and assemble them into one artifact
#[derive(Parser)]
#[command(name = "stitch")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Path to the configuration file
  #[arg(short, long, global = true, default_value = CONFIG_FILENAME)]
  config: PathBuf,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  format: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Load and resolve the configuration, reporting any error
  Check,

  /// Print resolved classpaths
  Resolve {
    /// Only show this module
    #[arg(short, long)]
    module: Option<String>,
  },

  /// Resolve, assemble and write the jar
  Assemble {
    /// Output directory (default: [assembly] destination)
    #[arg(short, long)]
    out: Option<PathBuf>,
  },

  /// Write the POM and JSON publication descriptor
  Publish {
    /// Output directory (default: [assembly] destination)
    #[arg(short, long)]
    out: Option<PathBuf>,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "stitch_lib=debug,stitch=debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Check => cmd::cmd_check(&cli.config, cli.format),
    Commands::Resolve { module } => cmd::cmd_resolve(&cli.config, module.as_deref(), cli.verbose, cli.format),
    Commands::Assemble { out } => cmd::cmd_assemble(&cli.config, out.as_deref(), cli.format),
    Commands::Publish { out } => cmd::cmd_publish(&cli.config, out.as_deref(), cli.format),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}
