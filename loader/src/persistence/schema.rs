//! SQL text shared by every store.
//!
//! Table and column names are quoted so that the mixed-case names (`Decks`,
//! `deckId`) survive PostgreSQL's case folding. SQLite has no schema
//! namespaces, so the schema qualifier only applies to PostgreSQL.

use super::DbKind;

pub const DECKS_TABLE: &str = "Decks";
pub const CARDS_TABLE: &str = "Cards";

pub const CARD_COLUMNS: &str = r#"("id", "deckId", "text", "pick")"#;
pub const ON_CONFLICT_DO_NOTHING: &str = r#" ON CONFLICT ("id") DO NOTHING"#;

/// Whether `name` can be used as a schema qualifier.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Table name as it appears in statements for `kind`.
pub fn qualified(kind: DbKind, schema: &str, table: &str) -> String {
    match kind {
        DbKind::Sqlite => quote_ident(table),
        DbKind::Postgres => format!("{}.{}", quote_ident(schema), quote_ident(table)),
    }
}

pub fn create_schema_sql(schema: &str) -> String {
    format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema))
}

pub fn create_decks_sql(kind: DbKind, schema: &str) -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS {} (
            "id" INTEGER PRIMARY KEY,
            "name" VARCHAR(255) NOT NULL,
            "official" BOOLEAN NOT NULL
        )"#,
        qualified(kind, schema, DECKS_TABLE)
    )
}

pub fn create_cards_sql(kind: DbKind, schema: &str) -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS {} (
            "id" VARCHAR(255) PRIMARY KEY,
            "deckId" INTEGER NOT NULL REFERENCES {} ("id"),
            "text" TEXT NOT NULL,
            "pick" INTEGER
        )"#,
        qualified(kind, schema, CARDS_TABLE),
        qualified(kind, schema, DECKS_TABLE)
    )
}

pub fn insert_deck_sql(kind: DbKind, schema: &str) -> String {
    let placeholders = match kind {
        DbKind::Sqlite => "?, ?, ?",
        DbKind::Postgres => "$1, $2, $3",
    };
    format!(
        r#"INSERT INTO {} ("id", "name", "official") VALUES ({placeholders})"#,
        qualified(kind, schema, DECKS_TABLE)
    )
}

/// Start of a multi-row card insert; rows are appended with `QueryBuilder`.
pub fn insert_cards_prefix(kind: DbKind, schema: &str) -> String {
    format!(
        "INSERT INTO {} {CARD_COLUMNS} ",
        qualified(kind, schema, CARDS_TABLE)
    )
}
