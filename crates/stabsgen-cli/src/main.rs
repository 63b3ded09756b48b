use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stabsgen")]
#[command(about = "Write dbx/stabs debug symbols for a compiled translation unit", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit the stabs directives for a unit
    Emit {
        /// Input unit file (JSON format)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Target configuration (TOML)
        #[arg(short, long, env = "STABSGEN_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config {
        /// Target configuration (TOML)
        #[arg(short, long, env = "STABSGEN_CONFIG")]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.debug {
        tracing::Level::TRACE
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(cli.debug) // Show target module in debug mode
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Emit {
            input,
            output,
            config,
        } => {
            let code = stabsgen::handle_emit(&input, output.as_deref(), config.as_deref())?;
            if output.is_none() {
                print!("{}", code);
            }
            Ok(())
        }
        Commands::Config { config } => {
            print!("{}", stabsgen::handle_config(config.as_deref())?);
            Ok(())
        }
    }
}
