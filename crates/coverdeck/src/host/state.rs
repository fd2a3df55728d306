use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

/// Attributes of a single window-covering entity.
///
/// Mirrors the attribute record the upstream integration publishes for a
/// cover: a display name, the current position as a percentage, and the
/// opaque device uuid that websocket commands are addressed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityAttributes {
    /// Human-readable name shown on the card.
    pub friendly_name: String,

    /// Position in percent, 0 (closed) to 100 (fully open).
    pub current_position: u8,

    /// Opaque device identifier used by websocket commands.
    pub uuid: String,

    /// Whether the shade preset is currently engaged.
    #[serde(default)]
    pub shade_mode: bool,

    /// Room the device is assigned to, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

/// Read-only snapshot of every entity the host tracks.
///
/// Replaced wholesale whenever any entity changes. Cards only ever hold a
/// reference to it for the duration of a single render or press, and never
/// mutate it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub entities: HashMap<String, EntityAttributes>,
}

/// Attribute invariants that serde cannot express.
#[derive(Debug, thiserror::Error)]
pub enum InvalidAttributes {
    #[error("current_position must be 0-100, got {0}")]
    PositionOutOfRange(u8),
}

impl EntityAttributes {
    /// Check invariants before attributes enter a snapshot.
    ///
    /// Called at every ingestion boundary (config seeds, API writes) so an
    /// out-of-range position never renders.
    pub fn validate(&self) -> Result<(), InvalidAttributes> {
        if self.current_position > 100 {
            return Err(InvalidAttributes::PositionOutOfRange(self.current_position));
        }
        Ok(())
    }
}

impl StateSnapshot {
    /// Look up one entity's attributes.
    pub fn get(&self, entity_id: &str) -> Option<&EntityAttributes> {
        self.entities.get(entity_id)
    }
}
