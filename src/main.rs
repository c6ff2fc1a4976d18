//! minicoder - Interactive REPL Entry Point
//!
//! Reads one user utterance per line and runs the agent loop for it.
//! Nothing persists across restarts: conversation and task list are
//! memory-only.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use minicoder::agent::{AgentEvent, Session};
use minicoder::config::Config;
use minicoder::llm::AnthropicGateway;
use minicoder::tools::Workspace;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const EXIT_KEYWORDS: &[&str] = &["exit", "quit", "q"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "minicoder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration: model={}", config.model);

    let workspace = Workspace::new(&config.workspace_path)?;
    let gateway = Arc::new(AnthropicGateway::new(&config));
    let mut session =
        Session::new(gateway, workspace.clone(), config.max_rounds).on_event(print_event);

    println!("minicoder - {}", workspace.root().display());
    println!("Type 'exit' to quit.\n");

    let stdin = io::stdin();
    loop {
        print!("You: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if EXIT_KEYWORDS.contains(&input.to_lowercase().as_str()) {
            break;
        }

        // Ctrl-C aborts only this outer turn; the REPL itself survives.
        tokio::select! {
            result = session.run_turn(input) => {
                if let Err(err) = result {
                    eprintln!("Error: {err}");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nInterrupted.");
            }
        }

        println!();
    }

    Ok(())
}

fn print_event(event: &AgentEvent) {
    match event {
        AgentEvent::ModelText(text) => println!("{text}"),
        AgentEvent::ToolStarted { name } => println!("\n> {name}"),
        AgentEvent::ToolFinished { result, .. } => println!("  {}", preview(result, 300)),
    }
}

/// Single-line preview of a tool result for the transcript.
fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars).collect();
    format!("{kept}...")
}
