use codegenius::config::Config;
use codegenius::mcp::server::{McpContext, McpServer};
use codegenius::supervisor::{Supervisor, list_generated_docs};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "codegenius", version, about = "Generate markdown documentation for a code repository")]
struct Cli {
    /// Path to the JSON config file (default: codegenius.json)
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Document a repository (git URL or local directory)
    Generate {
        location: String,

        /// Output directory, overriding the config
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also print the document to stdout
        #[arg(long)]
        print: bool,
    },
    /// List generated documents
    List {
        /// Output directory, overriding the config
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Serve the pipeline over MCP on stdio
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout belongs to the MCP transport, so logs go to stderr.
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load(cli.config.as_deref().unwrap_or_default())?;

    match cli.command {
        Commands::Generate {
            location,
            output,
            print,
        } => {
            if let Some(dir) = output {
                config.output_dir = dir;
            }
            config.validate().context("Invalid configuration")?;

            let mut supervisor = Supervisor::new(&config)?;
            let outcome = supervisor.process_repository(&location).await;
            if !outcome.success {
                anyhow::bail!("{}", outcome.message);
            }

            if let Some(path) = &outcome.output_path {
                println!("{} {}", outcome.message, path.display());
            }
            if print {
                if let Some(doc) = supervisor.get_documentation() {
                    println!("\n{doc}");
                }
            }
            Ok(())
        }
        Commands::List { output } => {
            if let Some(dir) = output {
                config.output_dir = dir;
            }
            let docs = list_generated_docs(&config.output_dir);
            if docs.is_empty() {
                println!("No documentation found in {}", config.output_dir.display());
            }
            for name in docs {
                println!("{name}");
            }
            Ok(())
        }
        Commands::Serve => {
            config.validate().context("Invalid configuration")?;
            tracing::info!("Starting codegenius MCP Server...");

            let ctx = McpContext::new(config)?;
            McpServer::new(ctx).start().await
        }
    }
}
