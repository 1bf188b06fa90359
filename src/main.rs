use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trawler::app::AppContext;
use trawler::cli::{commands, Cli, Commands};
use trawler::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(workers) = cli.workers {
        config.scraper.max_concurrency = workers;
    }
    let ctx = AppContext::new(cli.db, config)?;

    match cli.command {
        Commands::Improve {
            strategy,
            batch_size,
            include_same_domain,
        } => {
            let token = ctx.cancellation_token();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupted, finishing in-flight batches...");
                    token.cancel();
                }
            });
            commands::improve(&ctx, strategy, batch_size, include_same_domain).await?;
        }
        Commands::Import { collection, path } => {
            commands::import_documents(&ctx, &collection, &path)?;
        }
        Commands::Count { collection } => {
            commands::count_documents(&ctx, &collection)?;
        }
        Commands::List {
            collection,
            limit,
            sort,
        } => {
            commands::list_documents(&ctx, &collection, limit, sort)?;
        }
    }

    Ok(())
}
