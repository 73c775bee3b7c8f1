//! SQLite destination.

use cardpack::{Card, Deck};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Connection, QueryBuilder, Sqlite, SqlitePool, Transaction};
use std::path::Path;
use tracing::debug;

use super::schema::{self, CARDS_TABLE, DECKS_TABLE};
use super::traits::Store;
use super::{DbKind, InsertErrorClass, StoreError};

/// Extended result codes for duplicate keys.
const SQLITE_CONSTRAINT_PRIMARYKEY: &str = "1555";
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";

/// Holds a connection pool to a SQLite database file.
#[derive(Clone, Debug)]
pub struct SqliteDestination {
    pool: SqlitePool,
}

impl SqliteDestination {
    /// Open (or create) the database at `path`.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|source| StoreError::Connection {
                kind: DbKind::Sqlite,
                source,
            })?;

        Ok(Self { pool })
    }

    /// In-memory database for tests. A single connection keeps the data alive.
    #[cfg(test)]
    pub async fn new_in_memory() -> Result<Self, StoreError> {
        use std::str::FromStr;

        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

pub(crate) fn classify_sqlite_code(code: Option<&str>) -> InsertErrorClass {
    match code {
        Some(SQLITE_CONSTRAINT_PRIMARYKEY | SQLITE_CONSTRAINT_UNIQUE) => InsertErrorClass::Conflict,
        _ => InsertErrorClass::Fatal,
    }
}

impl Store for SqliteDestination {
    type Tx = Transaction<'static, Sqlite>;

    fn kind(&self) -> DbKind {
        DbKind::Sqlite
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|source| StoreError::Connection {
                kind: DbKind::Sqlite,
                source,
            })?;
        Ok(())
    }

    async fn ensure_tables(&self, schema: &str) -> Result<(), StoreError> {
        debug!(schema, "SQLite has no schema namespaces, ignoring qualifier");

        for (table, sql) in [
            (DECKS_TABLE, schema::create_decks_sql(DbKind::Sqlite, schema)),
            (CARDS_TABLE, schema::create_cards_sql(DbKind::Sqlite, schema)),
        ] {
            sqlx::query(&sql)
                .execute(&self.pool)
                .await
                .map_err(|source| StoreError::Schema {
                    table: table.to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        Ok(self.pool.begin().await?)
    }

    async fn insert_deck(
        &self,
        tx: &mut Self::Tx,
        schema: &str,
        deck: &Deck,
    ) -> Result<(), sqlx::Error> {
        let sql = schema::insert_deck_sql(DbKind::Sqlite, schema);
        let mut savepoint = Connection::begin(&mut **tx).await?;

        let result = sqlx::query(&sql)
            .bind(deck.id)
            .bind(&deck.name)
            .bind(deck.official)
            .execute(&mut *savepoint)
            .await;

        match result {
            Ok(_) => savepoint.commit().await,
            Err(err) => {
                savepoint.rollback().await?;
                Err(err)
            }
        }
    }

    async fn insert_card_batch(
        &self,
        tx: &mut Self::Tx,
        schema: &str,
        cards: &[Card],
    ) -> Result<u64, sqlx::Error> {
        let mut builder =
            QueryBuilder::<Sqlite>::new(schema::insert_cards_prefix(DbKind::Sqlite, schema));
        builder.push_values(cards, |mut row, card| {
            row.push_bind(card.id.as_str())
                .push_bind(card.deck_id)
                .push_bind(card.text.as_str())
                .push_bind(card.pick);
        });
        builder.push(schema::ON_CONFLICT_DO_NOTHING);

        let result = builder.build().execute(&mut **tx).await?;
        Ok(result.rows_affected())
    }

    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError> {
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<(), StoreError> {
        tx.rollback().await?;
        Ok(())
    }

    fn classify_insert_error(&self, err: &sqlx::Error) -> InsertErrorClass {
        let code = err.as_database_error().and_then(|e| e.code());
        classify_sqlite_code(code.as_deref())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
