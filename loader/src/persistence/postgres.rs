//! PostgreSQL destination.

use cardpack::{Card, Deck};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, PgPool, Postgres, QueryBuilder, Transaction};

use super::schema::{self, CARDS_TABLE, DECKS_TABLE};
use super::traits::Store;
use super::{DbKind, InsertErrorClass, StoreError};

/// SQLSTATE `unique_violation`.
const PG_UNIQUE_VIOLATION: &str = "23505";

/// Holds a connection pool to a PostgreSQL server.
#[derive(Clone, Debug)]
pub struct PostgresDestination {
    pool: PgPool,
}

impl PostgresDestination {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|source| StoreError::Connection {
                kind: DbKind::Postgres,
                source,
            })?;

        Ok(Self { pool })
    }

    #[cfg(test)]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub(crate) fn classify_pg_code(code: Option<&str>) -> InsertErrorClass {
    match code {
        Some(PG_UNIQUE_VIOLATION) => InsertErrorClass::Conflict,
        _ => InsertErrorClass::Fatal,
    }
}

impl Store for PostgresDestination {
    type Tx = Transaction<'static, Postgres>;

    fn kind(&self) -> DbKind {
        DbKind::Postgres
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|source| StoreError::Connection {
                kind: DbKind::Postgres,
                source,
            })?;
        Ok(())
    }

    async fn ensure_tables(&self, schema: &str) -> Result<(), StoreError> {
        sqlx::query(&schema::create_schema_sql(schema))
            .execute(&self.pool)
            .await
            .map_err(|source| StoreError::Schema {
                table: schema.to_string(),
                source,
            })?;

        for (table, sql) in [
            (DECKS_TABLE, schema::create_decks_sql(DbKind::Postgres, schema)),
            (CARDS_TABLE, schema::create_cards_sql(DbKind::Postgres, schema)),
        ] {
            sqlx::query(&sql)
                .execute(&self.pool)
                .await
                .map_err(|source| StoreError::Schema {
                    table: format!("{schema}.{table}"),
                    source,
                })?;
        }
        Ok(())
    }

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        Ok(self.pool.begin().await?)
    }

    /// Runs inside a savepoint: PostgreSQL refuses further statements in a
    /// transaction once one has failed, unless the failure is rolled back.
    async fn insert_deck(
        &self,
        tx: &mut Self::Tx,
        schema: &str,
        deck: &Deck,
    ) -> Result<(), sqlx::Error> {
        let sql = schema::insert_deck_sql(DbKind::Postgres, schema);
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
            QueryBuilder::<Postgres>::new(schema::insert_cards_prefix(DbKind::Postgres, schema));
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
        classify_pg_code(code.as_deref())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
