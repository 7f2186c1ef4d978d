use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use completion_client::{CompletionFetcher, Config};
use session_manager::{FileStateStorage, SessionController, StateStorage, Submission};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "chat-tree")]
#[command(about = "Branching conversation client for chat completion models")]
#[command(version)]
struct Cli {
    /// Directory holding the saved state (defaults to the platform state dir)
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Model to request completions from
    #[arg(long, env = "OPENAI_MODEL")]
    model: Option<String>,

    /// Enable debug logging
    #[arg(long, short, default_value = "false")]
    debug: bool,
}

const HELP: &str = "commands:\n\
  <text>       send the text as your next message\n\
  /sw a b      switch the level-a message to alternative b\n\
  /nb n [str]  branch at level n (str ignored when regenerating a reply)\n\
  /new         start a new conversation\n\
  /open n      open conversation n from the list\n\
  /list        list conversations\n\
  /help        show this help\n\
  /quit        save and exit";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // One subscriber for both `tracing` spans and `log` records.
    let default_filter = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let mut config = Config::new();
    if cli.model.is_some() {
        config.model = cli.model.clone();
    }
    let fetcher = Arc::new(CompletionFetcher::from_config(&config));
    if fetcher.is_offline() {
        println!("(no API key configured, replies are simulated)");
    }

    let storage = match &cli.state_dir {
        Some(dir) => FileStateStorage::new(dir),
        None => FileStateStorage::default_location(),
    };

    let mut controller = SessionController::load(Arc::clone(&fetcher), &storage)
        .await
        .context("loading saved state")?;

    println!("{HELP}\n");
    print_transcript(&controller);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt();
        let Some(line) = lines.next_line().await? else {
            break; // EOF
        };

        match line.trim() {
            "/quit" => break,
            "/help" => println!("{HELP}"),
            "/list" => print_list(&controller),
            "/new" => match controller.new_conversation() {
                Ok(_) => print_transcript(&controller),
                Err(err) => println!("{err}"),
            },
            open if open.starts_with("/open") => {
                match open
                    .split_whitespace()
                    .nth(1)
                    .and_then(|n| n.parse::<usize>().ok())
                {
                    Some(idx) => match controller.select_conversation(idx) {
                        Ok(()) => print_transcript(&controller),
                        Err(err) => println!("{err}"),
                    },
                    None => println!("usage: /open n"),
                }
            }
            input => match controller.submit(input) {
                Submission::FetchStarted => {
                    println!("...");
                    // A stale title outcome from the previous exchange can
                    // arrive ahead of the reply; drain until the fetch
                    // itself has resolved.
                    while controller.is_fetching() {
                        if let Some(notice) = controller.process_next_outcome().await {
                            println!("{notice}");
                        }
                    }
                    print_transcript(&controller);
                }
                Submission::Handled => print_transcript(&controller),
                Submission::Rejected(notice) => println!("{notice}"),
            },
        }

        // Late title results and the like; applied without blocking.
        for notice in controller.try_process_outcomes() {
            println!("{notice}");
        }
    }

    controller
        .save(&storage)
        .await
        .context("saving state")?;
    Ok(())
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn print_transcript(controller: &SessionController) {
    let transcript = controller.transcript();
    if transcript.is_empty() {
        println!("(no conversation yet, type something or /new)");
    } else {
        println!("{transcript}");
    }
}

fn print_list(controller: &SessionController) {
    if controller.conversations().is_empty() {
        println!("(no conversations)");
        return;
    }
    for (i, entry) in controller.conversations().iter().enumerate() {
        let marker = if Some(i) == controller.current_index() {
            "*"
        } else {
            " "
        };
        println!("{marker} {i}: {}", entry.title());
    }
}
