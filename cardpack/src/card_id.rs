//! Content-addressed card identifiers.
//!
//! A card id is a v5 UUID of `"<deck>|<color>|<position>|<prefix>"`, where
//! `position` is the card's index within its deck's own white or black list
//! and `prefix` is the first seven characters of the card text. The same
//! inputs always give the same id, so reloading a pack hits primary-key
//! conflicts instead of creating duplicates.

use uuid::Uuid;

use crate::model::CardColor;

/// Namespace shared by every installation. Changing it re-keys every card.
pub const CARD_ID_NAMESPACE: Uuid = Uuid::from_u128(0x1b67_1a64_40d5_491e_99b0_da01_ff1f_3341);

const DELIMITER: char = '|';
const TEXT_PREFIX_CHARS: usize = 7;

/// Derive a card id under [`CARD_ID_NAMESPACE`].
pub fn derive_card_id(deck_name: &str, color: CardColor, position: usize, text: &str) -> String {
    derive_card_id_in(&CARD_ID_NAMESPACE, deck_name, color, position, text)
}

/// Derive a card id under an explicit namespace.
pub fn derive_card_id_in(
    namespace: &Uuid,
    deck_name: &str,
    color: CardColor,
    position: usize,
    text: &str,
) -> String {
    let name = id_name(deck_name, color, position, text);
    Uuid::new_v5(namespace, name.as_bytes()).to_string()
}

fn id_name(deck_name: &str, color: CardColor, position: usize, text: &str) -> String {
    // Counted in chars so multi-byte text is never cut mid-character.
    let prefix: String = text.chars().take(TEXT_PREFIX_CHARS).collect();
    format!(
        "{deck_name}{DELIMITER}{}{DELIMITER}{position}{DELIMITER}{prefix}",
        color.tag()
    )
}
