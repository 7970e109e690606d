pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "partline",
    about = "Partline appliance parts assistant CLI",
    long_about = "Ask the parts assistant questions, run an interactive chat session, and inspect configuration and readiness.",
    after_help = "Examples:\n  partline ask \"How do I install part PS11752778?\"\n  partline chat --remote\n  partline doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Classify one question and print the composed answer")]
    Ask {
        #[arg(required = true, num_args = 1.., help = "The question to ask")]
        text: Vec<String>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Start an interactive conversation (type /reset or /quit)")]
    Chat {
        #[arg(long, help = "Forward questions to the configured answer service")]
        remote: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, catalog loading, and classifier behavior")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Ask { text, json } => commands::ask::run(&text.join(" "), json),
        Command::Chat { remote } => commands::chat::run(remote),
        Command::Config => commands::CommandResult::plain(commands::config::run()),
        Command::Doctor { json } => commands::doctor::run(json),
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}
