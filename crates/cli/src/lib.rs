pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "scently",
    about = "Scently operator CLI",
    long_about = "Inspect configuration, check readiness, load catalog data and run \
                  suggestions against the configured backends.",
    after_help = "Examples:\n  scently doctor --json\n  scently config\n  \
                  scently ingest perfumes.json --hard\n  \
                  scently suggest --brand Chanel --name \"N°5\"\n  \
                  scently suggest-tags --tags warm,amber --sex female"
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
    #[command(about = "Validate config and check catalog and cache reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Send perfumes from a JSON file to the catalog update endpoint")]
    Ingest {
        #[arg(help = "JSON file holding a list of perfumes or {\"perfumes\": [...]}")]
        file: PathBuf,
        #[arg(long, help = "Replace the catalog instead of merging into it")]
        hard: bool,
    },
    #[command(about = "Run the suggestion pipeline in-process for one perfume")]
    Suggest {
        #[arg(long)]
        brand: String,
        #[arg(long)]
        name: String,
        #[arg(long, help = "Shortlist candidates with the AI advisor")]
        use_ai: bool,
        #[arg(long, help = "Print the ranked list as JSON")]
        json: bool,
    },
    #[command(name = "suggest-tags", about = "Run the tag-based suggestion flow in-process")]
    SuggestTags {
        #[arg(long, help = "Comma-separated tags, e.g. warm,amber")]
        tags: String,
        #[arg(long, help = "male, female or unisex; omitted means any")]
        sex: Option<String>,
        #[arg(long, help = "Print the ranked list as JSON")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Ingest { file, hard } => commands::ingest::run(&file, hard),
        Command::Suggest { brand, name, use_ai, json } => {
            commands::suggest::run(&brand, &name, use_ai, json)
        }
        Command::SuggestTags { tags, sex, json } => {
            commands::suggest::run_tags(&tags, sex.as_deref(), json)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
