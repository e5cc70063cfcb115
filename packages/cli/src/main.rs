mod commands;
mod config;
mod elements;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{check, init, list, preview, CheckArgs, InitArgs, ListArgs, PreviewArgs};
use config::Config;
use std::path::{Path, PathBuf};

/// Dashcraft CLI - edit and preview dashboard elements
#[derive(Parser, Debug)]
#[command(name = "dashcraft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of ./dashcraft.config.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log pipeline activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new dashcraft project
    Init(InitArgs),

    /// Render an element configuration
    Preview(PreviewArgs),

    /// Open a configuration in the editor and report problems
    Check(CheckArgs),

    /// List built-in elements
    List(ListArgs),
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(if cli.verbose { "debug" } else { "warn" })
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| run(cli, &cwd));

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}

fn run(cli: Cli, cwd: &Path) -> anyhow::Result<()> {
    let load_config = || match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(cwd),
    };

    match cli.command {
        Command::Init(args) => init(args, cwd),
        Command::Preview(args) => runtime()?.block_on(preview(args, &load_config()?)),
        Command::Check(args) => runtime()?.block_on(check(args, &load_config()?)),
        Command::List(args) => list(args, &load_config()?),
    }
}

fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
}
