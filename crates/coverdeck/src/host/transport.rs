use std::sync::Arc;

use anyhow::bail;
use anyhow::Context;
use async_trait::async_trait;
use tracing::info;

use super::bus::ServiceCall;
use super::bus::ServiceTransport;
use super::Host;

/// Delivery transport that applies each call's implied state transition
/// straight back to the host snapshot.
///
/// Stands in for the upstream bridge that would forward calls to a real
/// device gateway, so a standalone instance stays interactive: pressing
/// "open" is visible in the next render.
pub struct LoopbackTransport {
    host: Arc<Host>,
}

impl LoopbackTransport {
    pub fn new(host: Arc<Host>) -> Self {
        Self { host }
    }

    /// Move a cover addressed by entity id to a fixed position.
    fn set_position(&self, call: &ServiceCall, position: u8) -> anyhow::Result<()> {
        let entity_id = call
            .data
            .get("entity_id")
            .and_then(|v| v.as_str())
            .context("missing entity_id in service data")?;

        let snapshot = self.host.snapshot();
        let Some(attributes) = snapshot.get(entity_id) else {
            bail!("unknown entity: {}", entity_id);
        };

        let mut attributes = attributes.clone();
        attributes.current_position = position;
        attributes.shade_mode = false;
        self.host.set_entity(entity_id.to_string(), attributes);
        Ok(())
    }

    /// Handle a websocket command addressed by device uuid.
    fn apply_websocket_command(&self, call: &ServiceCall) -> anyhow::Result<()> {
        let uuid = call
            .data
            .get("uuid")
            .and_then(|v| v.as_str())
            .context("missing uuid in service data")?;
        let value = call
            .data
            .get("value")
            .and_then(|v| v.as_str())
            .context("missing value in service data")?;

        if value != "shade" {
            bail!("unsupported websocket command: {}", value);
        }

        let snapshot = self.host.snapshot();
        let Some((entity_id, attributes)) = snapshot
            .entities
            .iter()
            .find(|(_, attributes)| attributes.uuid == uuid)
        else {
            bail!("no entity with uuid: {}", uuid);
        };

        let mut attributes = attributes.clone();
        attributes.shade_mode = true;
        self.host.set_entity(entity_id.clone(), attributes);
        Ok(())
    }
}

#[async_trait]
impl ServiceTransport for LoopbackTransport {
    async fn deliver(&self, call: ServiceCall) -> anyhow::Result<()> {
        info!(
            "Delivering {}.{} with {}",
            call.domain, call.service, call.data
        );

        match (call.domain.as_str(), call.service.as_str()) {
            ("cover", "open_cover") => self.set_position(&call, 100),
            ("cover", "close_cover") => self.set_position(&call, 0),
            // Positions only change on open/close here, so stop is a no-op.
            ("cover", "stop_cover") => Ok(()),
            ("loxone", "event_websocket_command") => self.apply_websocket_command(&call),
            _ => bail!("no route for service {}.{}", call.domain, call.service),
        }
    }
}
