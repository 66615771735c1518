//! # Chat Math Normalizer
//!
//! Watches rendered chat messages and rewrites informal math such as
//! `(x = y + 1)` or bracketed `\begin{align}` blocks into delimiters a
//! math typesetting pass recognizes (`\(...\)`, `\[...\]`, `$$...$$`).
//!
//! ## Features
//! - Replay a saved chat page through the mutation watcher
//! - Rewrite a single markup fragment
//! - Configuration via config file, environment, and flags

mod cli;
mod core;
mod run;

use clap::{CommandFactory, Parser};
use dotenv::dotenv;

use cli::{Args, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();

    let args = Args::parse();
    run::init_logger(&args);

    if let Commands::Completions { shell } = &args.command {
        let mut cmd = Args::command();
        let name = cmd.get_name().to_string();
        cli::generate(*shell, &mut cmd, name, &mut std::io::stdout());
        return Ok(());
    }

    // Print a user-friendly message; exit uses Display not Debug
    let config = core::config::load().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let result = match args.command {
        Commands::Replay {
            input,
            container,
            selector,
            burst,
            json,
            stats,
        } => run::run_replay(
            run::ReplayArgs {
                input: &input,
                container,
                selector,
                burst,
                json,
                stats,
            },
            config,
        ),
        Commands::Rewrite { markup, no_gate } => {
            run::run_rewrite(markup.as_deref(), no_gate, &config)
        }
        Commands::Config => {
            run::run_config(&config);
            Ok(())
        }
        Commands::Completions { .. } => Ok(()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
