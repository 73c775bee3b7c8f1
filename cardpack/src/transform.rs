//! Expands pooled deck indices into concrete card rows.
//!
//! Out-of-range indices never fail a deck: the entry is skipped, logged, and
//! returned as an [`InvalidIndex`] so the caller can report it.

use tracing::{debug, warn};

use crate::card_id::derive_card_id;
use crate::model::{BlackCardSpec, Card, CardColor, Deck, DeckSpec, PackDocument};

/// A deck entry that pointed outside its pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidIndex {
    pub deck_id: i32,
    pub deck_name: String,
    pub color: CardColor,
    pub index: i64,
    pub pool_len: usize,
}

/// Cards produced from one deck plus the entries that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    pub cards: Vec<Card>,
    pub warnings: Vec<InvalidIndex>,
}

/// Every deck and card of a pack, ready to load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandedPack {
    pub decks: Vec<Deck>,
    pub cards: Vec<Card>,
    pub warnings: Vec<InvalidIndex>,
}

/// Expand one deck: white cards in list order, then black cards.
pub fn expand_deck(
    deck: &DeckSpec,
    white_pool: &[String],
    black_pool: &[BlackCardSpec],
) -> Expansion {
    let mut expansion = Expansion::default();

    for (position, &index) in deck.white_indices.iter().enumerate() {
        match pool_entry(white_pool, index) {
            Some(text) => expansion.cards.push(Card {
                id: derive_card_id(&deck.name, CardColor::White, position, text),
                deck_id: deck.id,
                text: text.clone(),
                pick: None,
            }),
            None => expansion.warnings.push(invalid_index(
                deck,
                CardColor::White,
                index,
                white_pool.len(),
            )),
        }
    }

    for (position, &index) in deck.black_indices.iter().enumerate() {
        match pool_entry(black_pool, index) {
            Some(black) => {
                if !(1..=3).contains(&black.pick) {
                    debug!(
                        deck_id = deck.id,
                        index,
                        pick = black.pick,
                        "Black card has unusual pick value"
                    );
                }
                expansion.cards.push(Card {
                    id: derive_card_id(&deck.name, CardColor::Black, position, &black.text),
                    deck_id: deck.id,
                    text: black.text.clone(),
                    pick: Some(black.pick),
                });
            }
            None => expansion.warnings.push(invalid_index(
                deck,
                CardColor::Black,
                index,
                black_pool.len(),
            )),
        }
    }

    expansion
}

/// Expand every deck of a pack in metadata order.
///
/// A metadata key that disagrees with its deck's `id` is logged; the `id`
/// wins.
pub fn expand_pack(doc: &PackDocument) -> ExpandedPack {
    let mut pack = ExpandedPack::default();

    for (key, spec) in &doc.deck_metadata {
        if key.parse::<i32>().ok() != Some(spec.id) {
            warn!(
                key = %key,
                deck_id = spec.id,
                deck = %spec.name,
                "Metadata key does not match deck id, using deck id"
            );
        }

        let expansion = expand_deck(spec, &doc.white_pool, &doc.black_pool);
        debug!(
            deck_id = spec.id,
            deck = %spec.name,
            cards = expansion.cards.len(),
            skipped = expansion.warnings.len(),
            "Expanded deck"
        );

        pack.decks.push(Deck::from(spec));
        pack.cards.extend(expansion.cards);
        pack.warnings.extend(expansion.warnings);
    }

    pack
}

fn pool_entry<T>(pool: &[T], index: i64) -> Option<&T> {
    usize::try_from(index).ok().and_then(|i| pool.get(i))
}

fn invalid_index(deck: &DeckSpec, color: CardColor, index: i64, pool_len: usize) -> InvalidIndex {
    warn!(
        deck_id = deck.id,
        deck = %deck.name,
        color = %color,
        index,
        valid_range = %format!("0..{pool_len}"),
        "Deck references a card outside the pool, skipping"
    );
    InvalidIndex {
        deck_id: deck.id,
        deck_name: deck.name.clone(),
        color,
        index,
        pool_len,
    }
}
