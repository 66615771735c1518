//! Application run modes: logger init, replay, single rewrite, config display.

use std::io::{self, Read};

use crate::cli::Args;
use crate::core;
use crate::core::config::Config;
use crate::core::event_loop::{self, Arrival};
use crate::core::rules::{self, RewriteOptions};
use crate::core::watcher::MessageSelector;

/// Initialize env_logger on stderr so stdout carries only output.
pub fn init_logger(args: &Args) {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(args.log_level()),
    )
    .target(env_logger::Target::Stderr)
    .try_init();
}

/// Read `input` as a path, or stdin when it is `-`.
fn read_input(input: &str) -> io::Result<String> {
    if input == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input)
    }
}

/// Options for [`run_replay`], taken from the `replay` subcommand.
pub struct ReplayArgs<'a> {
    pub input: &'a str,
    pub container: Option<String>,
    pub selector: Option<String>,
    pub burst: bool,
    pub json: bool,
    pub stats: bool,
}

/// Replay a saved page and print the normalized markup or a JSON report.
pub fn run_replay(
    args: ReplayArgs<'_>,
    mut config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(container) = args.container {
        config.container_id = container;
    }
    if let Some(selector) = args.selector {
        config.message_selector = selector.parse::<MessageSelector>()?;
    }
    let page = read_input(args.input)?;
    let arrival = if args.burst {
        Arrival::Burst
    } else {
        Arrival::Streamed
    };
    let report = event_loop::replay(&page, &config, arrival)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.markup);
    }
    if args.stats {
        let s = &report.stats;
        eprintln!(
            "messages: {}  rewritten: {}  unchanged: {}  no math: {}  failed: {}  frames: {}",
            report.messages, s.rewritten, s.unchanged, s.gate_misses, s.failed, report.frames
        );
    }
    Ok(())
}

/// Rewrite one fragment and print it. Gate misses print the input unchanged.
pub fn run_rewrite(
    markup: Option<&str>,
    no_gate: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let markup = match markup {
        Some(m) if m != "-" => m.to_string(),
        _ => read_input("-")?,
    };
    if !no_gate && !rules::looks_like_math(&markup) {
        log::info!("no math-like content; leaving input unchanged");
        println!("{}", markup);
        return Ok(());
    }
    let options = RewriteOptions {
        skip_tags: config.skip_tags.clone(),
    };
    println!("{}", rules::rewrite(&markup, &options)?);
    Ok(())
}

/// Print config path and effective values.
pub fn run_config(config: &Config) {
    println!("{} {}", core::app::NAME, core::app::VERSION);
    match core::config::config_path() {
        Some(path) => {
            let status = if path.exists() { "" } else { " (not found)" };
            println!("Config file:      {}{}", path.display(), status);
        }
        None => println!("Config file:      (no config directory)"),
    }
    println!("Container id:     {}", config.container_id);
    println!("Message selector: {}", config.message_selector);
    println!("Skip tags:        {}", config.skip_tags.join(", "));
}
