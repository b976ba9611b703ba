use clap::{Parser, Subcommand, ValueEnum};
use std::{net::SocketAddr, path::PathBuf};

use weather_core::{CompletionClient, Config, ToolDispatcher, WeatherAgent, tools};

use crate::{
    chat::{AppState, ChatRequest},
    server,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-llm", version, about = "Weather-aware LLM demo")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server.
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        #[arg(long, default_value_t = 8000)]
        port: u16,

        /// Directory holding index.html.
        #[arg(long, default_value = ".")]
        static_dir: PathBuf,
    },

    /// Ask a single question and print the reply.
    Ask {
        message: String,

        /// Leave today's and tomorrow's forecast out of the prompt.
        #[arg(long)]
        no_forecast: bool,
    },

    /// Print the tool registry.
    Tools {
        #[arg(long, value_enum, default_value_t = ToolFormat::Mcp)]
        format: ToolFormat,
    },

    /// Show the resolved configuration.
    Config {
        /// Write a default config file if none exists yet.
        #[arg(long)]
        init: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ToolFormat {
    /// Schema-only form served at /api/mcp/tools.
    Mcp,
    /// Function-calling form for chat-completion APIs.
    Function,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve {
                host,
                port,
                static_dir,
            } => {
                let addr: SocketAddr = format!("{host}:{port}").parse()?;
                let state = build_state(Config::load()?)?;
                server::serve(state, static_dir, addr).await?;
            }
            Command::Ask {
                message,
                no_forecast,
            } => {
                let state = build_state(Config::load()?)?;
                let request = ChatRequest {
                    message,
                    include_forecast: !no_forecast,
                };
                let reply = state.answer(&request).await?;
                println!("{}", reply.response);
            }
            Command::Tools { format } => {
                let rendered = match format {
                    ToolFormat::Mcp => serde_json::to_string_pretty(&tools::tools_definition())?,
                    ToolFormat::Function => serde_json::to_string_pretty(&tools::function_tools())?,
                };
                println!("{rendered}");
            }
            Command::Config { init } => {
                let path = Config::config_file_path()?;
                if init && !path.exists() {
                    Config::default().save_to(&path)?;
                    println!("Wrote default config to {}", path.display());
                }

                let cfg = Config::load()?;
                println!("Config file: {}", path.display());
                println!("Demo mode: {}", cfg.is_demo_mode());
                println!("{}", serde_json::to_string_pretty(&cfg.redacted())?);
            }
        }

        Ok(())
    }
}

fn build_state(config: Config) -> anyhow::Result<AppState> {
    let agent = WeatherAgent::from_config(&config)?;
    let llm = CompletionClient::from_config(&config)?;
    Ok(AppState::new(config, ToolDispatcher::new(agent), llm))
}
