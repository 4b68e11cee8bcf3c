use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qna_backend::config::Config;
use qna_backend::web;

#[derive(Parser)]
#[command(name = "qna-backend")]
#[command(about = "Interactive Q&A backend with LLM-generated answers")]
struct Cli {
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model to use
    #[arg(long, env = "GEMINI_MODEL")]
    model: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Path to the history database
    #[arg(long, env = "QNA_DB_PATH")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::resolve(cli.api_key, cli.model, cli.port, cli.database)?;

    if config.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; query requests will be rejected with 503");
    }

    web::serve(config).await
}
