pub mod card_id;
pub mod model;
pub mod transform;

pub use card_id::{derive_card_id, derive_card_id_in, CARD_ID_NAMESPACE};
pub use model::{BlackCardSpec, Card, CardColor, Deck, DeckSpec, PackDocument, PackError};
pub use transform::{expand_deck, expand_pack, Expansion, ExpandedPack, InvalidIndex};
