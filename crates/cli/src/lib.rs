pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "recipebot",
    about = "Recipebot operator CLI",
    long_about = "Inspect recipebot configuration, check readiness, and rehearse dialog turns offline.",
    after_help = "Examples:\n  recipebot doctor --json\n  recipebot duration PT1H30M\n  recipebot turn fixtures/turn.json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, search credential readiness, and the dialog rehearsal")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Convert a duration token such as PT1H30M into total seconds")]
    Duration {
        #[arg(help = "Duration token in P[nD]T[nH][nM][nS] form")]
        token: String,
    },
    #[command(about = "Run one dialog code hook turn from a JSON file and print the response")]
    Turn {
        #[arg(help = "Path to a platform turn JSON document")]
        file: PathBuf,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Duration { token } => commands::duration::run(&token),
        Command::Turn { file } => commands::turn::run(&file),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
