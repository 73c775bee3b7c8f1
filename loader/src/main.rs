mod config;
mod load;
mod persistence;

#[cfg(test)]
mod integration_tests;

use anyhow::Context;
use cardpack::{expand_pack, ExpandedPack, PackDocument};
use clap::Parser;
use config::{Cli, DestinationConfig, LoaderConfig};
use load::LoadReport;
use persistence::{PostgresDestination, SqliteDestination, Store, StoreError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with span durations
    use tracing_subscriber::fmt::format::FmtSpan;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let config = LoaderConfig::try_from(Cli::parse())?;

    tracing::info!(
        input = %config.input.display(),
        db_type = %config.destination.kind(),
        schema = %config.schema,
        dry_run = config.dry_run,
        "Starting card pack load"
    );

    let doc = PackDocument::from_path(&config.input)
        .with_context(|| format!("Failed to read card pack {}", config.input.display()))?;
    let pack = expand_pack(&doc);

    tracing::info!(
        decks = pack.decks.len(),
        cards = pack.cards.len(),
        invalid_indices = pack.warnings.len(),
        "Expanded card pack"
    );

    if config.dry_run {
        tracing::info!("Dry run, database untouched");
        return Ok(());
    }

    match &config.destination {
        DestinationConfig::Sqlite { path } => {
            tracing::info!("Using SQLite database: {}", path.display());
            let store = SqliteDestination::open(path).await?;
            run(store, &config, &pack).await
        }
        DestinationConfig::Postgres { url } => {
            let store = PostgresDestination::connect(url).await?;
            run(store, &config, &pack).await
        }
    }
}

/// Load into `store` and close it whatever the outcome.
async fn run<S: Store>(store: S, config: &LoaderConfig, pack: &ExpandedPack) -> anyhow::Result<()> {
    let result = health_check_and_load(&store, config, pack).await;

    store.close().await;

    let report = result.with_context(|| format!("Failed to load card pack into {}", store.kind()))?;
    tracing::info!(
        decks_inserted = report.decks_inserted,
        decks_skipped = report.decks_skipped,
        cards_inserted = report.cards_inserted,
        cards_skipped = report.cards_skipped,
        "Card pack load finished"
    );
    Ok(())
}

async fn health_check_and_load<S: Store>(
    store: &S,
    config: &LoaderConfig,
    pack: &ExpandedPack,
) -> Result<LoadReport, StoreError> {
    store.health_check().await?;
    load::load_pack(store, &config.schema, &pack.decks, &pack.cards).await
}
