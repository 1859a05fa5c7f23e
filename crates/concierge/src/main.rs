use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use concierge::models::Role;
use concierge::{Concierge, Session};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "concierge", about = "Family office wealth concierge")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/concierge.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the clients in the portfolio dataset
    Clients,

    /// Print a client's portfolio profile
    Profile {
        #[arg(short, long)]
        client: String,
    },

    /// Answer one question and print `{"agent", "response"}` JSON
    Ask {
        #[arg(short, long)]
        client: String,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,

        question: Vec<String>,
    },

    /// Interactive chat with one client
    Chat {
        #[arg(short, long)]
        client: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // API keys may live in a .env file
    dotenv::dotenv().ok();

    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = concierge::load_config(&cli.config)?;

    match cli.command {
        Command::Clients => {
            for client in concierge::list_clients(&config.data)? {
                println!("{client}");
            }
        }
        Command::Profile { client } => {
            println!("{}", concierge::portfolio_profile(&config.data, &client)?);
        }
        Command::Ask {
            client,
            pretty,
            question,
        } => {
            let question = question.join(" ");
            anyhow::ensure!(!question.trim().is_empty(), "No question given");

            let concierge =
                Arc::new(Concierge::from_config(config).context("Failed to build concierge")?);
            let mut session = Session::start(concierge, &client).await?;
            let result = session.ask(&question).await;

            let output = if pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            println!("{output}");
        }
        Command::Chat { client } => {
            let concierge =
                Arc::new(Concierge::from_config(config).context("Failed to build concierge")?);
            let session = Session::start(concierge, &client).await?;
            chat_loop(session).await?;
        }
    }

    Ok(())
}

async fn chat_loop(mut session: Session) -> Result<()> {
    println!(
        "Session {}: chatting with the {} family office.\n\
         Commands: /switch <client>, /reload, /reset, /history, /quit",
        session.id(),
        session.client()
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{}> ", session.client());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await.context("Failed to read from stdin")? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_once(' ').unwrap_or((line, "")) {
            ("/quit" | "/exit", _) => break,
            ("/reload", _) => match session.reload().await {
                Ok(()) => println!("Reloaded data for the {} family office.", session.client()),
                Err(e) => eprintln!("Could not reload client data: {e:#}"),
            },
            ("/reset", _) => {
                session.reset();
                println!("History cleared.");
            }
            ("/history", _) => {
                for turn in session.history() {
                    let who = match turn.role {
                        Role::User => "you",
                        Role::Assistant => "concierge",
                    };
                    println!("[{}] {who}: {}", turn.at.format("%H:%M:%S"), turn.text);
                }
            }
            ("/switch", client) if !client.trim().is_empty() => {
                match session.switch_client(client.trim()).await {
                    Ok(()) => println!("Now serving the {} family office.", session.client()),
                    Err(e) => eprintln!("Could not switch client: {e:#}"),
                }
            }
            ("/switch", _) => eprintln!("Usage: /switch <client>"),
            _ => {
                let result = session.ask(line).await;
                println!("\n{}\n", result.render());
            }
        }
    }

    Ok(())
}
