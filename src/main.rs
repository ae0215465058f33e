use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feedfs::app::AppContext;
use feedfs::cli::{commands, CacheAction, Cli, Commands};
use feedfs::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }

    let ctx = AppContext::new(config, !cli.no_persist)?;
    let result = run(&ctx, cli.command).await;
    ctx.shutdown();

    result
}

async fn run(ctx: &AppContext, command: Commands) -> anyhow::Result<()> {
    let refreshed_by_listing = match &command {
        Commands::Ls { path } => ctx.projection.policy().refreshes(path),
        _ => false,
    };
    if command.needs_tree() && !refreshed_by_listing {
        if let Err(e) = ctx.projection.rebuild().await {
            tracing::warn!("Initial build failed: {}", e);
        }
    }

    match command {
        Commands::Tree => commands::print_tree(ctx)?,
        Commands::Ls { path } => commands::list(ctx, &path).await?,
        Commands::Cat {
            path,
            offset,
            length,
        } => commands::cat(ctx, &path, offset, length)?,
        Commands::Stat { path } => commands::stat(ctx, &path)?,
        Commands::Cache {
            action: CacheAction::Clear,
        } => commands::clear_cache(ctx)?,
    }

    Ok(())
}
