//! campusctl - CLI client for the campus assistant daemon.

mod client;
mod session;

use anyhow::Result;
use clap::{Parser, Subcommand};
use client::{CampusdClient, DEFAULT_BASE_URL};
use owo_colors::OwoColorize;

#[derive(Parser)]
#[command(name = "campusctl")]
#[command(about = "Campus assistant - ask about documents and student records", long_about = None)]
#[command(version)]
struct Cli {
    /// Daemon base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the assistant a question
    Chat {
        /// The question to ask
        message: Vec<String>,

        /// Start a fresh session instead of continuing the cached one
        #[arg(long)]
        new_session: bool,
    },

    /// Show the conversation history of the current session
    History {
        /// Number of turns to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Check daemon health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = CampusdClient::new(&cli.url);

    match cli.command {
        Commands::Chat {
            message,
            new_session,
        } => {
            let message = message.join(" ");
            if message.trim().is_empty() {
                eprintln!("{}", "Nothing to ask - give me a question.".yellow());
                return Ok(());
            }

            let session_id = if new_session {
                let session = client.new_session().await?;
                session::store_session_id(&session.session_id)?;
                session.session_id
            } else {
                match session::load_session_id() {
                    Some(id) => id,
                    None => {
                        let session = client.new_session().await?;
                        session::store_session_id(&session.session_id)?;
                        session.session_id
                    }
                }
            };

            let response = client.chat(&session_id, &message).await?;
            println!("{}", response.answer);
        }

        Commands::History { limit } => match session::load_session_id() {
            Some(session_id) => {
                let response = client.history(&session_id, limit).await?;
                if response.history.is_empty() {
                    println!("No history yet for session {}", session_id);
                }
                for turn in response.history {
                    println!("{} {}", "you:".cyan().bold(), turn.user_text);
                    println!("{} {}", "bot:".green().bold(), turn.bot_text);
                    println!();
                }
            }
            None => {
                println!("No session yet - ask something first with `campusctl chat`.");
            }
        },

        Commands::Health => {
            let health = client.health().await?;
            println!(
                "{} v{} (up {}s)",
                health.status.green(),
                health.version,
                health.uptime_seconds
            );
        }
    }

    Ok(())
}
