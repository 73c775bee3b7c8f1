//! Loads expanded decks and cards inside a single transaction.
//!
//! Decks go in one row at a time so that a deck left over from an earlier
//! run is skipped instead of failing the load. Cards go in batches of
//! [`CARD_BATCH_SIZE`]; existing card ids are skipped by the insert itself,
//! and any other batch error aborts the run. On abort nothing from this run
//! stays visible.

use cardpack::{Card, Deck};
use tracing::{error, info, warn};

use crate::persistence::{InsertErrorClass, Store, StoreError};

pub const CARD_BATCH_SIZE: usize = 50;

/// Row counts for one load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub decks_inserted: u64,
    pub decks_skipped: u64,
    pub cards_inserted: u64,
    pub cards_skipped: u64,
}

/// Provision tables, then insert `decks` and `cards` as one unit of work.
pub async fn load_pack<S: Store>(
    store: &S,
    schema: &str,
    decks: &[Deck],
    cards: &[Card],
) -> Result<LoadReport, StoreError> {
    store.ensure_tables(schema).await?;

    let mut tx = store.begin().await?;
    match insert_rows(store, &mut tx, schema, decks, cards).await {
        Ok(report) => {
            store.commit(tx).await?;
            info!(
                decks_inserted = report.decks_inserted,
                decks_skipped = report.decks_skipped,
                cards_inserted = report.cards_inserted,
                cards_skipped = report.cards_skipped,
                "Card pack committed"
            );
            Ok(report)
        }
        Err(err) => {
            error!(error = %err, "Load failed, rolling back");
            if let Err(rollback_err) = store.rollback(tx).await {
                error!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

async fn insert_rows<S: Store>(
    store: &S,
    tx: &mut S::Tx,
    schema: &str,
    decks: &[Deck],
    cards: &[Card],
) -> Result<LoadReport, StoreError> {
    let mut report = LoadReport::default();

    for deck in decks {
        match store.insert_deck(tx, schema, deck).await {
            Ok(()) => report.decks_inserted += 1,
            Err(err) => match store.classify_insert_error(&err) {
                InsertErrorClass::Conflict => {
                    warn!(deck_id = deck.id, deck = %deck.name, "Deck already present, skipped");
                    report.decks_skipped += 1;
                }
                InsertErrorClass::Fatal => {
                    return Err(StoreError::FatalInsert {
                        entity: "deck",
                        key: deck.id.to_string(),
                        source: err,
                    });
                }
            },
        }
    }
    info!(
        inserted = report.decks_inserted,
        skipped = report.decks_skipped,
        "Decks loaded"
    );

    if cards.is_empty() {
        info!("No cards to insert");
        return Ok(report);
    }

    let batches = cards.len().div_ceil(CARD_BATCH_SIZE);
    for (i, batch) in cards.chunks(CARD_BATCH_SIZE).enumerate() {
        let inserted = store
            .insert_card_batch(tx, schema, batch)
            .await
            .map_err(|source| StoreError::FatalInsert {
                entity: "card batch",
                key: batch_key(i, batch),
                source,
            })?;

        let skipped = batch.len() as u64 - inserted;
        if skipped > 0 {
            warn!(batch = i + 1, skipped, "Cards already present, skipped");
        }
        report.cards_inserted += inserted;
        report.cards_skipped += skipped;
        info!(batch = i + 1, batches, inserted, "Card batch loaded");
    }

    Ok(report)
}

fn batch_key(index: usize, batch: &[Card]) -> String {
    match (batch.first(), batch.last()) {
        (Some(first), Some(last)) => format!(
            "#{} (deck {} card {} .. deck {} card {})",
            index + 1,
            first.deck_id,
            first.id,
            last.deck_id,
            last.id
        ),
        _ => format!("#{}", index + 1),
    }
}
