//! The host runtime that cards bind to.
//!
//! Owns the entity-state snapshot and the service bus. Data flow is
//! unidirectional: the host publishes new snapshots, cards read them at
//! render time and answer button presses by putting calls on the bus. The
//! host (not the card) is responsible for eventually reflecting the effect
//! of a call in a later snapshot.

mod bus;
pub mod state;
mod transport;

pub use bus::run_delivery;
pub use bus::ServiceBus;
pub use bus::ServiceCall;
pub use bus::ServiceCallReceiver;
pub use bus::ServiceTransport;
pub use state::EntityAttributes;
pub use state::InvalidAttributes;
pub use state::StateSnapshot;
pub use transport::LoopbackTransport;

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use crate::cards::Card;
use crate::cards::CardError;
use crate::cards::Propagation;
use crate::view::View;

/// In-process host for a set of dashboard cards.
pub struct Host {
    /// Centralized state snapshot (readers load the Arc, writer stores a new one)
    state: ArcSwap<StateSnapshot>,

    /// Cards in dashboard order.
    cards: Vec<Box<dyn Card>>,

    /// Sending half of the service bus, shared with press handlers.
    bus: ServiceBus,
}

impl Host {
    pub fn new(bus: ServiceBus) -> Self {
        Self {
            state: ArcSwap::new(Arc::default()),
            cards: Vec::new(),
            bus,
        }
    }

    /// Add a card to the end of the dashboard.
    pub fn add_card(&mut self, card: Box<dyn Card>) {
        info!("Card added: {} (size {})", card.name(), card.card_size());
        self.cards.push(card);
    }

    pub fn cards(&self) -> &[Box<dyn Card>] {
        &self.cards
    }

    /// Get the current snapshot.
    ///
    /// Clones the `Arc` (atomic refcount bump), essentially free.
    pub fn snapshot(&self) -> Arc<StateSnapshot> {
        self.state.load_full()
    }

    /// Replace one entity's attributes, publishing a new snapshot.
    ///
    /// Writers can race (API handlers and the delivery task), so the
    /// read-modify-write goes through `rcu`: a concurrent store retries the
    /// update against the newer snapshot instead of discarding it.
    pub fn set_entity(&self, entity_id: String, attributes: EntityAttributes) {
        self.state.rcu(|current| {
            let mut next = StateSnapshot::clone(current);
            next.entities
                .insert(entity_id.clone(), attributes.clone());
            next
        });
    }

    /// Drop an entity from the snapshot (device removed upstream).
    pub fn remove_entity(&self, entity_id: &str) {
        self.state.rcu(|current| {
            let mut next = StateSnapshot::clone(current);
            next.entities.remove(entity_id);
            next
        });
    }

    /// Render every card against the current snapshot, in dashboard order.
    pub fn render_all(&self) -> Vec<View> {
        let snapshot = self.snapshot();
        self.cards.iter().map(|c| c.render(&snapshot)).collect()
    }

    /// Forward a button press to a card by dashboard position.
    pub fn press(&self, card: usize, button: &str) -> Result<Propagation, CardError> {
        let card = self.cards.get(card).ok_or(CardError::NoSuchCard(card))?;
        let snapshot = self.snapshot();
        card.press(button, &snapshot, &self.bus)
    }
}
