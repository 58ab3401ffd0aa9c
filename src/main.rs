// ABOUTME: Entry point for the atelier binary.
// ABOUTME: Loads configuration, initializes tracing, opens the data root, and reports what it holds.

use atelier_core::RunLogFilter;
use atelier_store::{AtelierConfig, Storage};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("atelier=debug,atelier_store=debug")),
        )
        .init();

    let config = AtelierConfig::from_env()?;
    let cwd = std::env::current_dir()?;
    tracing::info!("atelier starting up in {} mode", config.mode);

    let storage = Storage::open_with(&config, &cwd).await?;
    storage.load_all().await?;

    let resources = storage.resources().read().await?;
    let library = storage.library().read().await?;
    tracing::info!(
        "{} providers, {} models, {} templates",
        resources.providers.len(),
        resources.models.len(),
        resources.templates.len()
    );
    tracing::info!(
        "{} folders, {} images in library",
        library.folders.len(),
        library.images.len()
    );

    let recent = storage
        .run_logs()
        .get_recent(30, &RunLogFilter::default())
        .await?;
    tracing::info!("{} runs in the last 30 days", recent.len());

    Ok(())
}
