use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pastebin::config::ServerConfig;
use pastebin::highlight::Highlighter;
use pastebin::server::{AppState, create_router};
use pastebin::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "pastebin")]
#[command(about = "A small multi-user pastebin", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database management commands
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },

    /// Start the server
    Serve {
        #[command(flatten)]
        source: ConfigArgs,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Create all tables (safe to run repeatedly)
    Init {
        #[command(flatten)]
        source: ConfigArgs,
    },

    /// Drop all tables and their data
    Drop {
        #[command(flatten)]
        source: ConfigArgs,
    },
}

#[derive(Args)]
struct ConfigArgs {
    /// TOML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the config file)
    #[arg(long)]
    database: Option<PathBuf>,
}

impl ConfigArgs {
    fn load(&self) -> anyhow::Result<ServerConfig> {
        let mut config = ServerConfig::load(self.config.as_deref())?;
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
        Ok(config)
    }
}

fn open_store(config: &ServerConfig) -> anyhow::Result<SqliteStore> {
    if let Some(parent) = config.database.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(SqliteStore::new(&config.database)?)
}

fn run_db(command: DbCommands) -> anyhow::Result<()> {
    match command {
        DbCommands::Init { source } => {
            let config = source.load()?;
            let store = open_store(&config)?;
            store.initialize()?;
            println!("Initialized database at {}", config.database.display());
        }
        DbCommands::Drop { source } => {
            let config = source.load()?;
            let store = open_store(&config)?;
            store.drop_schema()?;
            println!("Dropped all tables in {}", config.database.display());
        }
    }
    Ok(())
}

async fn run_serve(
    source: ConfigArgs,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let mut config = source.load()?;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    let store = open_store(&config)?;
    store.initialize()?;

    let removed = store.delete_expired_sessions()?;
    if removed > 0 {
        info!("Removed {removed} expired sessions");
    }

    let highlighter = Highlighter::new()?;
    let state = Arc::new(AppState::new(
        Arc::new(store),
        Arc::new(highlighter),
        &config,
    )?);

    let app = create_router(state);
    let addr = config.socket_addr()?;

    info!("Using database {}", config.database.display());
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pastebin=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Db { command } => run_db(command)?,
        Commands::Serve { source, host, port } => run_serve(source, host, port).await?,
    }

    Ok(())
}
