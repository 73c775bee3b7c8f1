//! Async store trait used by the load coordinator.
//!
//! Methods return `impl Future + Send` rather than using `async fn` so that
//! the futures are guaranteed `Send`.

use cardpack::{Card, Deck};
use std::future::Future;

use super::{DbKind, InsertErrorClass, StoreError};

/// A relational destination for decks and cards.
///
/// `Tx` is the store's unit of work. It is handed back to [`Store::commit`]
/// or [`Store::rollback`] exactly once; dropping it uncommitted rolls back.
pub trait Store: Send + Sync {
    type Tx: Send;

    fn kind(&self) -> DbKind;

    fn health_check(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Create `Decks` and `Cards` under `schema` unless they already exist.
    /// Existing tables are left untouched.
    fn ensure_tables(&self, schema: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn begin(&self) -> impl Future<Output = Result<Self::Tx, StoreError>> + Send;

    /// Insert one deck. A failure leaves `tx` usable so the caller can skip
    /// the row and carry on.
    fn insert_deck(
        &self,
        tx: &mut Self::Tx,
        schema: &str,
        deck: &Deck,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;

    /// Insert a batch of cards in one statement, skipping ids that already
    /// exist. Returns the number of rows actually inserted.
    fn insert_card_batch(
        &self,
        tx: &mut Self::Tx,
        schema: &str,
        cards: &[Card],
    ) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;

    fn commit(&self, tx: Self::Tx) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn rollback(&self, tx: Self::Tx) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn classify_insert_error(&self, err: &sqlx::Error) -> InsertErrorClass;

    fn close(&self) -> impl Future<Output = ()> + Send;
}
