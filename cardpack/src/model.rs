//! Typed shape of a compact card pack and of the rows it expands into.
//!
//! A pack stores every card text exactly once, in the `white` and `black`
//! pools, and each deck refers to cards by their position in those pools.
//! Decoding only checks structure; index bounds and `pick` ranges are the
//! transformer's concern.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Errors raised while reading a pack document.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("Malformed pack document: {0}")]
    MalformedInput(#[from] serde_json::Error),
    #[error("Failed to read pack file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A black card in the shared pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlackCardSpec {
    pub text: String,
    /// Number of white cards the prompt asks for.
    pub pick: i32,
}

/// One deck entry from the pack metadata.
///
/// Indices are signed so that a negative index decodes and is later skipped
/// as out of range instead of failing the whole document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeckSpec {
    pub id: i32,
    pub name: String,
    pub official: bool,
    #[serde(rename = "white")]
    pub white_indices: Vec<i64>,
    #[serde(rename = "black")]
    pub black_indices: Vec<i64>,
}

/// The whole input document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackDocument {
    #[serde(rename = "white")]
    pub white_pool: Vec<String>,
    #[serde(rename = "black")]
    pub black_pool: Vec<BlackCardSpec>,
    /// Keyed by deck id as text; iteration follows document order.
    #[serde(rename = "metadata")]
    pub deck_metadata: IndexMap<String, DeckSpec>,
}

impl PackDocument {
    pub fn from_json(json: &str) -> Result<Self, PackError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PackError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Open and decode the pack at `path`.
    pub fn from_path(path: &Path) -> Result<Self, PackError> {
        let file = File::open(path).map_err(|source| PackError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }
}

/// Card color. White cards are answers, black cards are prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardColor {
    White,
    Black,
}

impl CardColor {
    pub fn tag(self) -> &'static str {
        match self {
            CardColor::White => "white",
            CardColor::Black => "black",
        }
    }
}

impl fmt::Display for CardColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Row destined for the `Decks` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    pub id: i32,
    pub name: String,
    pub official: bool,
}

impl From<&DeckSpec> for Deck {
    fn from(spec: &DeckSpec) -> Self {
        Self {
            id: spec.id,
            name: spec.name.clone(),
            official: spec.official,
        }
    }
}

/// Row destined for the `Cards` table. `pick` is `None` for white cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: String,
    pub deck_id: i32,
    pub text: String,
    pub pick: Option<i32>,
}
