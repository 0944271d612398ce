//! Command line interface.
//!
//! # Responsibilities
//! - Parse `version`, `server`, `routes` and `middleware` commands
//! - Load configuration and boot the application the binary provides
//!
//! # Design Decisions
//! - The binary supplies an `ApplicationBuilder` factory; the CLI never
//!   knows which slices exist
//! - `--config` defaults to `config/app.toml` when that file exists,
//!   otherwise defaults plus environment variables are used

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use thiserror::Error;
use tokio::net::TcpListener;

use crate::application::{ApplicationBuilder, BootError};
use crate::config::{global, loader, AppConfig, ConfigError};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::logging;

pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";

#[derive(Debug, Parser)]
#[command(name = "hanami")]
#[command(about = "Boot and inspect a Hanami application", long_about = None)]
pub struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the framework version
    Version,
    /// Boot the application and serve it over HTTP
    Server {
        /// Bind host, overrides configuration
        #[arg(long)]
        host: Option<String>,
        /// Bind port, overrides configuration
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the combined route table
    Routes {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the middleware stack, outermost first
    Middleware,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Boot(#[from] BootError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration from `path`, the default file, or the environment.
pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => loader::load_config(path),
        None if Path::new(DEFAULT_CONFIG_PATH).is_file() => {
            loader::load_config(Path::new(DEFAULT_CONFIG_PATH))
        }
        None => loader::from_env(),
    }
}

pub fn version() -> String {
    format!("hanami {}", env!("CARGO_PKG_VERSION"))
}

/// Run `cli` against the application `build` produces.
pub async fn run<F>(cli: Cli, build: F) -> Result<(), CliError>
where
    F: FnOnce(AppConfig) -> ApplicationBuilder,
{
    if let Command::Version = cli.command {
        println!("{}", version());
        return Ok(());
    }

    let mut config = load(cli.config.as_deref())?;

    match cli.command {
        Command::Version => {}
        Command::Server { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            logging::init(&config.logger);
            global::configure(config.clone())?;

            let address = config.bind_address();
            let app = build(config).boot()?;

            let listener = TcpListener::bind(&address).await?;
            let shutdown = Shutdown::new();
            signals::forward_to(shutdown.clone());
            app.serve(listener, shutdown.signalled()).await?;
        }
        Command::Routes { json } => {
            let app = build(config).boot()?;
            if json {
                println!("{}", serde_json::to_string_pretty(app.routes())?);
            } else {
                print!("{}", app.routes());
            }
        }
        Command::Middleware => {
            let app = build(config).boot()?;
            for name in app.middleware() {
                println!("{name}");
            }
        }
    }
    Ok(())
}
