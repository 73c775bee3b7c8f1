use cardpack::{expand_pack, Card, Deck, PackDocument};

use crate::load::{load_pack, LoadReport};
use crate::persistence::{SqliteDestination, Store, StoreError};

const SAMPLE_PACK: &str = r#"{
    "white": ["Bananas", "A rock"],
    "black": [{"text": "___ is great.", "pick": 1}],
    "metadata": {
        "1": {"id": 1, "name": "Base", "official": true, "white": [0, 1], "black": [0]}
    }
}"#;

type DeckRow = (i32, String, bool);
type CardRow = (String, i32, String, Option<i32>);

async fn deck_rows(db: &SqliteDestination) -> Vec<DeckRow> {
    sqlx::query_as(r#"SELECT "id", "name", "official" FROM "Decks" ORDER BY "id""#)
        .fetch_all(db.pool())
        .await
        .unwrap()
}

async fn card_rows(db: &SqliteDestination) -> Vec<CardRow> {
    sqlx::query_as(r#"SELECT "id", "deckId", "text", "pick" FROM "Cards" ORDER BY "text""#)
        .fetch_all(db.pool())
        .await
        .unwrap()
}

fn sample_pack() -> cardpack::ExpandedPack {
    expand_pack(&PackDocument::from_json(SAMPLE_PACK).unwrap())
}

#[tokio::test]
async fn test_end_to_end_sample_pack() {
    let db = SqliteDestination::new_in_memory().await.unwrap();
    let pack = sample_pack();

    let report = load_pack(&db, "public", &pack.decks, &pack.cards).await.unwrap();
    assert_eq!(
        report,
        LoadReport {
            decks_inserted: 1,
            decks_skipped: 0,
            cards_inserted: 3,
            cards_skipped: 0,
        }
    );

    assert_eq!(deck_rows(&db).await, vec![(1, "Base".to_string(), true)]);

    let cards = card_rows(&db).await;
    assert_eq!(cards.len(), 3);
    assert_eq!((cards[0].2.as_str(), cards[0].3), ("A rock", None));
    assert_eq!((cards[1].2.as_str(), cards[1].3), ("Bananas", None));
    assert_eq!((cards[2].2.as_str(), cards[2].3), ("___ is great.", Some(1)));
    assert!(cards.iter().all(|c| c.1 == 1));

    let mut ids: Vec<&str> = cards.iter().map(|c| c.0.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn test_rerun_inserts_nothing() {
    let db = SqliteDestination::new_in_memory().await.unwrap();

    let first = sample_pack();
    load_pack(&db, "public", &first.decks, &first.cards).await.unwrap();

    // A fresh parse of the same document yields the same ids.
    let second = sample_pack();
    let report = load_pack(&db, "public", &second.decks, &second.cards)
        .await
        .unwrap();

    assert_eq!(
        report,
        LoadReport {
            decks_inserted: 0,
            decks_skipped: 1,
            cards_inserted: 0,
            cards_skipped: 3,
        }
    );
    assert_eq!(deck_rows(&db).await.len(), 1);
    assert_eq!(card_rows(&db).await.len(), 3);
}

#[tokio::test]
async fn test_resume_after_decks_only_run() {
    let db = SqliteDestination::new_in_memory().await.unwrap();
    let pack = sample_pack();

    // An earlier run that got as far as the decks.
    load_pack(&db, "public", &pack.decks, &[]).await.unwrap();

    let report = load_pack(&db, "public", &pack.decks, &pack.cards).await.unwrap();
    assert_eq!(report.decks_skipped, 1);
    assert_eq!(report.cards_inserted, 3);
    assert_eq!(card_rows(&db).await.len(), 3);
}

#[tokio::test]
async fn test_card_failure_rolls_back_decks() {
    let db = SqliteDestination::new_in_memory().await.unwrap();
    let mut pack = sample_pack();
    pack.cards.push(Card {
        id: "orphan".to_string(),
        deck_id: 99,
        text: "No such deck".to_string(),
        pick: None,
    });

    let err = load_pack(&db, "public", &pack.decks, &pack.cards)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::FatalInsert {
            entity: "card batch",
            ..
        }
    ));

    assert!(deck_rows(&db).await.is_empty());
    assert!(card_rows(&db).await.is_empty());
}

#[tokio::test]
async fn test_legacy_table_surfaces_as_insert_failure() {
    let db = SqliteDestination::new_in_memory().await.unwrap();
    sqlx::query(r#"CREATE TABLE "Decks" ("id" INTEGER PRIMARY KEY, "title" TEXT)"#)
        .execute(db.pool())
        .await
        .unwrap();

    let pack = sample_pack();
    let err = load_pack(&db, "public", &pack.decks, &pack.cards)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::FatalInsert { entity: "deck", ref key, .. } if key == "1"
    ));

    let count: (i64,) = sqlx::query_as(r#"SELECT COUNT(*) FROM "Decks""#)
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(count.0, 0);
}

#[tokio::test]
async fn test_many_cards_across_batches() {
    let db = SqliteDestination::new_in_memory().await.unwrap();
    let white: Vec<String> = (0..130).map(|i| format!("White card {i}")).collect();
    let doc = PackDocument {
        white_pool: white,
        black_pool: vec![],
        deck_metadata: [(
            "5".to_string(),
            cardpack::DeckSpec {
                id: 5,
                name: "Big".to_string(),
                official: false,
                white_indices: (0..130).collect(),
                black_indices: vec![],
            },
        )]
        .into_iter()
        .collect(),
    };
    let pack = expand_pack(&doc);

    let report = load_pack(&db, "public", &pack.decks, &pack.cards).await.unwrap();
    assert_eq!(report.cards_inserted, 130);
    assert_eq!(card_rows(&db).await.len(), 130);
}

#[tokio::test]
async fn test_empty_pack_creates_tables_only() {
    let db = SqliteDestination::new_in_memory().await.unwrap();
    let decks: Vec<Deck> = vec![];
    let report = load_pack(&db, "public", &decks, &[]).await.unwrap();
    assert_eq!(report, LoadReport::default());
    assert!(deck_rows(&db).await.is_empty());
}

#[tokio::test]
async fn test_file_backed_pack_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let pack_path = dir.path().join("pack.json");
    std::fs::write(&pack_path, SAMPLE_PACK).unwrap();

    let db_path = dir.path().join("cards.db");
    let db = SqliteDestination::open(&db_path).await.unwrap();
    let pack = expand_pack(&PackDocument::from_path(&pack_path).unwrap());
    load_pack(&db, "public", &pack.decks, &pack.cards).await.unwrap();
    db.close().await;

    let reopened = SqliteDestination::open(&db_path).await.unwrap();
    assert_eq!(card_rows(&reopened).await.len(), 3);
    reopened.close().await;
}

/// Same scenarios against a live PostgreSQL server. Run with
/// `DATABASE_URL=postgres://... cargo test -- --ignored`.
mod postgres {
    use super::*;
    use crate::persistence::PostgresDestination;

    /// Each test works in its own schema so runs can share one database.
    async fn connect(suffix: &str) -> Option<(PostgresDestination, String)> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping");
            return None;
        };
        let db = PostgresDestination::connect(&url).await.unwrap();
        let schema = format!("cardpack_it_{}_{suffix}", std::process::id());
        drop_schema(&db, &schema).await;
        Some((db, schema))
    }

    async fn drop_schema(db: &PostgresDestination, schema: &str) {
        sqlx::query(&format!(r#"DROP SCHEMA IF EXISTS "{schema}" CASCADE"#))
            .execute(db.pool())
            .await
            .unwrap();
    }

    async fn count(db: &PostgresDestination, schema: &str, table: &str) -> i64 {
        let sql = format!(r#"SELECT COUNT(*) FROM "{schema}"."{table}""#);
        let row: (i64,) = sqlx::query_as(&sql).fetch_one(db.pool()).await.unwrap();
        row.0
    }

    #[tokio::test]
    #[ignore = "needs a PostgreSQL server in DATABASE_URL"]
    async fn test_rerun_inserts_nothing() {
        let Some((db, schema)) = connect("rerun").await else {
            return;
        };

        let first = sample_pack();
        let report = load_pack(&db, &schema, &first.decks, &first.cards)
            .await
            .unwrap();
        assert_eq!(report.decks_inserted, 1);
        assert_eq!(report.cards_inserted, 3);

        let second = sample_pack();
        let report = load_pack(&db, &schema, &second.decks, &second.cards)
            .await
            .unwrap();
        assert_eq!(
            report,
            LoadReport {
                decks_inserted: 0,
                decks_skipped: 1,
                cards_inserted: 0,
                cards_skipped: 3,
            }
        );
        assert_eq!(count(&db, &schema, "Decks").await, 1);
        assert_eq!(count(&db, &schema, "Cards").await, 3);

        drop_schema(&db, &schema).await;
        db.close().await;
    }

    #[tokio::test]
    #[ignore = "needs a PostgreSQL server in DATABASE_URL"]
    async fn test_card_failure_rolls_back_decks() {
        let Some((db, schema)) = connect("rollback").await else {
            return;
        };
        let mut pack = sample_pack();
        pack.cards.push(Card {
            id: "orphan".to_string(),
            deck_id: 99,
            text: "No such deck".to_string(),
            pick: None,
        });

        let err = load_pack(&db, &schema, &pack.decks, &pack.cards)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::FatalInsert {
                entity: "card batch",
                ..
            }
        ));

        // Tables survive the rollback; the rows do not.
        assert_eq!(count(&db, &schema, "Decks").await, 0);
        assert_eq!(count(&db, &schema, "Cards").await, 0);

        drop_schema(&db, &schema).await;
        db.close().await;
    }
}
