//! Toolbridge CLI - run bridge tools from the shell or serve them over MCP.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use toolbridge_core::BridgeConfig;
use toolbridge_mcp::{Dispatcher, McpServer};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "toolbridge")]
#[command(author, version, about = "Toolbridge - one result shape for many tool backends", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: <config dir>/toolbridge/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the bridge tools as an MCP server on stdin/stdout
    Serve,

    /// Run a single tool and print the result envelope
    Call {
        /// Tool name, e.g. control_light
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(short, long)]
        args: Option<String>,
    },

    /// List the tools offered by the remote MCP server
    RemoteTools,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration (secrets masked)
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries JSON-RPC under `serve`.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref())?;
    tracing::debug!("Configured services: {:?}", config.configured_services());

    match cli.command {
        Some(Commands::Serve) => {
            let mut server = McpServer::new(Dispatcher::new(&config));
            server.run().await?;
        }
        Some(Commands::Call { tool, args }) => {
            let arguments = parse_args(args.as_deref())?;
            let envelope = Dispatcher::new(&config).execute(&tool, arguments).await;
            println!("{}", serde_json::to_string_pretty(&envelope)?);

            if !envelope.success {
                std::process::exit(1);
            }
        }
        Some(Commands::RemoteTools) => {
            let dispatcher = Dispatcher::new(&config);
            let tools = dispatcher
                .mcp()
                .list_tools()
                .await
                .with_context(|| format!("Failed to list tools from {}", config.mcp.url))?;

            if tools.is_empty() {
                println!("No tools offered by {}", config.mcp.url);
            }
            for tool in tools {
                println!("{:<32} {}", tool.name, tool.description);
            }
        }
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => {
                let path = match cli.config {
                    Some(path) => path,
                    None => BridgeConfig::config_path()?,
                };
                println!("# {}", path.display());
                print!("{}", config.to_masked_toml()?);
            }
        },
        None => {
            println!("Toolbridge - one result shape for many tool backends");
            println!("Run with --help for usage information");
        }
    }

    Ok(())
}

/// File (or defaults), then environment.
fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<BridgeConfig> {
    let config = match path {
        Some(path) => BridgeConfig::load_from(path)?,
        None => BridgeConfig::load()?,
    };
    Ok(config.with_env())
}

fn parse_args(raw: Option<&str>) -> anyhow::Result<Option<Value>> {
    raw.map(|raw| serde_json::from_str(raw).context("--args must be valid JSON"))
        .transpose()
}
