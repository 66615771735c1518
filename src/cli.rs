//! CLI definitions: argument parsing, subcommands, and help text.

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;

pub use clap_complete::generate;

const AFTER_HELP: &str = "\
EXAMPLES:
  chat-math-normalizer replay chat.html            Normalize a saved chat page
  chat-math-normalizer replay - --json < chat.html Read from stdin, print a JSON report
  chat-math-normalizer replay chat.html --burst    Deliver all messages in one batch
  chat-math-normalizer rewrite '<p>(x = y + 1)</p>'
  chat-math-normalizer config                      Show config path and effective values
  chat-math-normalizer completions bash            Generate bash completions
";

/// Command-line arguments for the application.
#[derive(Parser)]
#[command(
    author,
    version,
    about = "Rewrites informal math in rendered chat messages into LaTeX delimiters",
    after_help = AFTER_HELP
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (use multiple times for debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce log output (errors only)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a saved chat page through the watcher and print the result
    Replay {
        /// HTML file to read ('-' for stdin)
        #[arg(default_value = "-")]
        input: String,
        /// Id of the element holding the messages
        #[arg(long)]
        container: Option<String>,
        /// Message selector, e.g. ".message" or "div.message.bot"
        #[arg(long)]
        selector: Option<String>,
        /// Append all messages in a single batch instead of one at a time
        #[arg(long)]
        burst: bool,
        /// Print a JSON report (markup and counters) instead of markup
        #[arg(long)]
        json: bool,
        /// Print counters to stderr after the markup
        #[arg(long)]
        stats: bool,
    },
    /// Rewrite one markup fragment and print it
    Rewrite {
        /// Markup to rewrite ('-' or omitted reads stdin)
        markup: Option<String>,
        /// Rewrite even when the detection gate finds nothing math-like
        #[arg(long)]
        no_gate: bool,
    },
    /// Show config path and effective configuration
    Config,
    /// Generate shell completion script
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        #[arg(value_parser = clap::value_parser!(Shell))]
        shell: Shell,
    },
}

impl Args {
    /// Log level based on -v/-q flags: error, warn, info, or debug.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose >= 2 {
            "debug"
        } else if self.verbose >= 1 {
            "info"
        } else {
            "warn"
        }
    }
}
