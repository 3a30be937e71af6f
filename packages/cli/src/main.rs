mod commands;
mod watcher;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{apply, parse, watch, ApplyArgs, ParseArgs, WatchArgs};

/// Weft CLI - keep a block editor and its tagged-prose source in step
#[derive(Parser, Debug)]
#[command(name = "weft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a document and print its tree and diagnostics
    Parse(ParseArgs),

    /// Apply a JSON batch of mutations to a document
    Apply(ApplyArgs),

    /// Watch a document and keep a sync controller on it
    Watch(WatchArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Parse(args) => parse(args, &cwd),
        Command::Apply(args) => apply(args, &cwd),
        Command::Watch(args) => watch(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
