use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use codebridge::error::RetryPolicy;
use codebridge::host::fs::FsWorkspace;
use codebridge::status::ConsoleReporter;
use codebridge::{transport, Bridge, BridgeCommand, DEFAULT_ENDPOINT};

#[derive(Parser)]
#[command(name = "codebridge", version)]
#[command(about = "Bridge a dual-pane code explorer to its companion tool over WebSocket")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bridge with two local files standing in for the panes
    Run {
        /// Companion service endpoint
        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        url: String,

        /// File backing the assembly pane
        #[arg(long, default_value = "func.s")]
        asm: PathBuf,

        /// File backing the source pane
        #[arg(long, default_value = "func.c")]
        source: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run {
        url: DEFAULT_ENDPOINT.into(),
        asm: "func.s".into(),
        source: "func.c".into(),
    });

    match command {
        Commands::Run { url, asm, source } => {
            println!(
                "{}",
                format!(
                    "🔗 Bridging {} / {} to {}",
                    asm.display(),
                    source.display(),
                    url
                )
                .cyan()
                .bold()
            );
            run(url, asm, source).await?;
        }
    }

    Ok(())
}

async fn run(url: String, asm: PathBuf, source: PathBuf) -> Result<()> {
    for path in [&asm, &source] {
        if !path.exists() {
            tokio::fs::write(path, "").await?;
            println!("{} created {}", "✓".green(), path.display());
        }
    }

    let host = Arc::new(FsWorkspace::new(asm, source));
    let link = transport::spawn(&url, RetryPolicy::persistent())?;
    let (commands_tx, commands) = mpsc::channel::<BridgeCommand>(8);

    let mut bridge = Bridge::new(host, Arc::new(ConsoleReporter), link.outbound.clone());
    bridge.discover_editors();
    let engine = tokio::spawn(bridge.run(link.events, commands));

    tokio::signal::ctrl_c().await?;
    println!("\n{}", "shutting down".yellow());

    // closing the command channel lets the engine drain and stop
    drop(commands_tx);
    link.task.abort();
    engine.abort();
    Ok(())
}
