//! Research papers MCP server binary

use anyhow::Context;
use clap::Parser;
use research_papers_server::cli::{Args, LogFormat};
use research_papers_server::research_server;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format);

    let config = args.into_config();
    info!(
        "Starting research papers server on {} (papers in {})",
        config.bind_address,
        config.paper_dir.display()
    );

    let server = research_server(config).context("failed to build server")?;
    server.run().await.context("server error")?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Pretty => builder.with_target(false).init(),
        LogFormat::Json => builder.json().init(),
    }
}
