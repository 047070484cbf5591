use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fabula::api;
use fabula::config::Config;
use fabula::generator::StoryGenerator;
use fabula::llm::ChatClient;
use fabula_core::Database;

#[derive(Parser)]
#[command(name = "fabula")]
#[command(about = "Choose-your-own-adventure story generation server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Fabula server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "fabula=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let port = match cli.command {
        Some(Commands::Serve { port }) => port,
        None => 8000,
    };

    serve(port).await
}

async fn serve(port: u16) -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let db = match &config.database_path {
        Some(path) => Database::open(path)?,
        None => Database::open_default()?,
    };
    db.migrate()?;

    let model = Arc::new(ChatClient::new(&config.model)?);
    let generator = StoryGenerator::new(db.clone(), model);
    let app = api::create_router(db, generator, &config);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    tracing::info!("Fabula server listening on http://127.0.0.1:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
