use clap::Parser;
use scribble_server::{ServerConfig, ServerError};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scribble_server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::parse();
    scribble_server::serve(config).await
}
