use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use segmenter::config::{DEFAULT_PORT, ServerConfig};
use segmenter::server::{AppState, create_router};
use segmenter::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "segmenter")]
#[command(about = "A user segmentation service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema and exit
    Init {
        /// Database connection string (e.g. "sqlite://data/segmenter.db")
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Database connection string (e.g. "sqlite://data/segmenter.db")
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
    },
}

fn open_store(config: &ServerConfig) -> anyhow::Result<SqliteStore> {
    let db_path = config.db_path()?;
    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;
    info!("Database ready at {}", db_path.display());
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("segmenter=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { database_url } => {
            let config = ServerConfig {
                database_url,
                ..ServerConfig::default()
            };
            open_store(&config)?;
            println!("Database initialized");
        }
        Commands::Serve {
            host,
            port,
            database_url,
        } => {
            let config = ServerConfig {
                host,
                port,
                database_url,
            };

            let store = open_store(&config)?;
            let state = Arc::new(AppState::new(Arc::new(store)));

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
