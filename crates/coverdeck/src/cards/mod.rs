//! Card abstraction and factory registry.
//!
//! A card is a pure render function plus a press handler, bound to a single
//! entity at construction time. Cards register a factory under a fixed type
//! tag at link time; the host instantiates them by tag when a dashboard
//! configuration references them.

mod cover;

pub use cover::Command;
pub use cover::CoverCard;
pub use cover::CoverConfig;
pub use cover::Press;
pub use cover::COVER_CARD_TYPE;

use linkme::distributed_slice;
use thiserror::Error;

use crate::config::CardEntry;
use crate::host::ServiceBus;
use crate::host::StateSnapshot;
use crate::view::View;

/// Errors from card construction and press handling.
#[derive(Debug, Error)]
pub enum CardError {
    #[error("card requires a non-empty `entity`")]
    MissingEntity,

    #[error("unknown card type: {0}")]
    UnknownCardType(String),

    #[error("no card at index {0}")]
    NoSuchCard(usize),

    #[error("entity {0} is not present in the state snapshot")]
    EntityUnavailable(String),
}

/// Whether the originating UI event should keep bubbling after a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// The press was consumed; no ancestor may also react to it.
    Stop,

    /// The card did not recognise the button; let the event bubble.
    Continue,
}

/// A dashboard card.
pub trait Card: Send + Sync {
    /// Display name, derived from the configured entity.
    fn name(&self) -> &str;

    /// Rows the card occupies in the host's grid layout.
    fn card_size(&self) -> u8;

    /// Produce the card's view for a state snapshot.
    ///
    /// Must be pure: no side effects, no snapshot mutation, and identical
    /// inputs yield an identical view.
    fn render(&self, snapshot: &StateSnapshot) -> View;

    /// Handle a button press by id, dispatching at most one service call.
    fn press(
        &self,
        button: &str,
        snapshot: &StateSnapshot,
        bus: &ServiceBus,
    ) -> Result<Propagation, CardError>;
}

/// Context handed to card factories at startup.
pub struct CardContext<'a> {
    pub entry: &'a CardEntry,
}

/// Result type for card factory functions.
///
/// `Ok(None)` means the factory does not handle this entry's card type.
pub type CardFactoryResult = Result<Option<Box<dyn Card>>, CardError>;

#[distributed_slice]
pub static CARD_REGISTRY: [fn(&CardContext) -> CardFactoryResult];

/// Instantiate a card for a dashboard entry.
///
/// Asks every registered factory in turn; the first one that recognises the
/// entry's type tag wins.
pub fn build_card(entry: &CardEntry) -> Result<Box<dyn Card>, CardError> {
    let ctx = CardContext { entry };
    for factory in CARD_REGISTRY {
        if let Some(card) = factory(&ctx)? {
            return Ok(card);
        }
    }
    Err(CardError::UnknownCardType(entry.kind.clone()))
}
