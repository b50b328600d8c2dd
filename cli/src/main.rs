mod client;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use client::DaemonClient;
use shared::ipc::{Command, Response};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "voxroute")]
#[command(about = "CLI tool for the voxroute voice command daemon")]
struct Cli {
    /// Daemon socket, if not the default runtime location
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Switch {
    On,
    Off,
}

#[derive(Subcommand)]
enum Commands {
    /// Route one recognized utterance
    Say {
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
    Status,
    /// Turn game mode on or off
    Game { state: Switch },
    /// Teach a correction: what you meant, then what was heard
    Train { expected: String, heard: String },
    /// Drop the learned pattern for a token
    Forget { token: String },
    /// List learned correction patterns
    Patterns,
    /// Show trusted corrections for some text
    Corrections {
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
    ClearCache,
}

impl Commands {
    fn into_command(self) -> Command {
        match self {
            Commands::Say { text } => Command::Process(text.join(" ")),
            Commands::Status => Command::Status,
            Commands::Game { state } => Command::SetGameMode(state == Switch::On),
            Commands::Train { expected, heard } => Command::Train { expected, heard },
            Commands::Forget { token } => Command::Forget(token),
            Commands::Patterns => Command::ListPatterns,
            Commands::Corrections { text } => Command::Corrections(text.join(" ")),
            Commands::ClearCache => Command::ClearCache,
        }
    }
}

/// Human-readable output for a response; `Err` carries a daemon-side error.
fn render(response: Response) -> Result<String, String> {
    match response {
        Response::Ok => Ok("Success".to_string()),
        Response::Error(msg) => Err(msg),
        Response::Continue(true) => Ok("Handled".to_string()),
        Response::Continue(false) => Ok("Session ended".to_string()),
        Response::Status(info) => {
            let available = match info.semantic_available {
                Some(true) => "yes",
                Some(false) => "no",
                None => "not probed",
            };
            Ok(format!(
                "Status:\n  Running: {}\n  Game mode: {}\n  Semantic: {} (available: {})\n  Patterns: {}\n  Cached intents: {}",
                info.is_running,
                info.gaming_active,
                info.semantic_enabled,
                available,
                info.pattern_count,
                info.cached_intents
            ))
        }
        Response::Patterns(patterns) if patterns.is_empty() => Ok("No patterns learned".to_string()),
        Response::Patterns(patterns) => Ok(patterns
            .iter()
            .map(|p| {
                format!(
                    "{} -> {}  (confidence {:.2}, {} samples, {:?})",
                    p.token, p.correction, p.confidence, p.count, p.source
                )
            })
            .collect::<Vec<_>>()
            .join("\n")),
        Response::Corrections(corrections) if corrections.is_empty() => {
            Ok("No trusted corrections".to_string())
        }
        Response::Corrections(corrections) => Ok(corrections
            .iter()
            .map(|(token, correction)| format!("{} -> {}", token, correction))
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = DaemonClient::new(cli.socket);

    match client.send_command(cli.command.into_command()).await {
        Ok(response) => match render(response) {
            Ok(output) => println!("{}", output),
            Err(msg) => {
                eprintln!("Error: {}", msg);
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("Failed to reach voxrouted: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
