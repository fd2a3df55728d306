//! Window-covering card.
//!
//! Renders one cover entity (name, position, four controls) and translates
//! button presses into service calls. The three positional buttons target
//! the generic cover domain; the shade button goes through the integration's
//! websocket channel and is addressed by device uuid rather than entity id.

use std::str::FromStr;

use linkme::distributed_slice;
use serde_json::json;
use strum::Display;
use strum::EnumString;
use tracing::debug;

use super::Card;
use super::CardContext;
use super::CardError;
use super::CardFactoryResult;
use super::Propagation;
use super::CARD_REGISTRY;
use crate::host::ServiceBus;
use crate::host::ServiceCall;
use crate::host::StateSnapshot;
use crate::view::Control;
use crate::view::View;

/// Type tag dashboard configurations reference this card by.
pub const COVER_CARD_TYPE: &str = "loxone-cover";

/// Static card icon, in the upstream frontend's naming scheme.
const CARD_ICON: &str = "mdi:window-closed";

#[distributed_slice(CARD_REGISTRY)]
fn init_cover(ctx: &CardContext) -> CardFactoryResult {
    if ctx.entry.kind != COVER_CARD_TYPE {
        return Ok(None);
    }

    let card = CoverCard::new(CoverConfig {
        entity: ctx.entry.entity.clone(),
    })?;
    Ok(Some(Box::new(card)))
}

/// Configuration for a single cover card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverConfig {
    /// Entity id the card is bound to, e.g. "cover.kitchen".
    pub entity: String,
}

/// The four buttons on the card, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Press {
    Shade,
    Open,
    Stop,
    Close,
}

impl Press {
    const ALL: [Press; 4] = [Press::Shade, Press::Open, Press::Stop, Press::Close];

    fn icon(self) -> &'static str {
        match self {
            Press::Shade => "mdi:view-column",
            Press::Open => "hass:arrow-up",
            Press::Stop => "hass:stop",
            Press::Close => "hass:arrow-down",
        }
    }
}

/// The closed set of commands this card can issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Engage the shade preset over the integration's websocket channel.
    Shade { uuid: String },

    Open { entity_id: String },
    Stop { entity_id: String },
    Close { entity_id: String },
}

impl Command {
    /// The wire shape of this command on the service bus.
    pub fn into_service_call(self) -> ServiceCall {
        match self {
            Command::Shade { uuid } => ServiceCall {
                domain: "loxone".to_string(),
                service: "event_websocket_command".to_string(),
                data: json!({ "uuid": uuid, "value": "shade" }),
            },
            Command::Open { entity_id } => ServiceCall {
                domain: "cover".to_string(),
                service: "open_cover".to_string(),
                data: json!({ "entity_id": entity_id }),
            },
            Command::Stop { entity_id } => ServiceCall {
                domain: "cover".to_string(),
                service: "stop_cover".to_string(),
                data: json!({ "entity_id": entity_id }),
            },
            Command::Close { entity_id } => ServiceCall {
                domain: "cover".to_string(),
                service: "close_cover".to_string(),
                data: json!({ "entity_id": entity_id }),
            },
        }
    }
}

/// Card showing one window covering with shade/open/stop/close controls.
pub struct CoverCard {
    config: CoverConfig,
    name: String,
}

impl CoverCard {
    /// Build a card from its configuration.
    ///
    /// Fails when `entity` is empty. The display name is derived from the
    /// entity id; render substitutes the friendly name when the entity is
    /// present in the snapshot.
    pub fn new(config: CoverConfig) -> Result<Self, CardError> {
        if config.entity.is_empty() {
            return Err(CardError::MissingEntity);
        }

        let name = config.entity.clone();
        Ok(Self { config, name })
    }

    /// Map a button press to the command it should issue.
    ///
    /// The shade command is addressed by device uuid, so it requires the
    /// entity to be present in the snapshot.
    fn command_for(&self, press: Press, snapshot: &StateSnapshot) -> Result<Command, CardError> {
        let entity_id = self.config.entity.clone();
        Ok(match press {
            Press::Shade => {
                let attributes = snapshot
                    .get(&self.config.entity)
                    .ok_or(CardError::EntityUnavailable(entity_id))?;
                Command::Shade {
                    uuid: attributes.uuid.clone(),
                }
            }
            Press::Open => Command::Open { entity_id },
            Press::Stop => Command::Stop { entity_id },
            Press::Close => Command::Close { entity_id },
        })
    }

    /// Single outbound boundary: every command leaves through here.
    fn dispatch(&self, command: Command, bus: &ServiceBus) {
        let call = command.into_service_call();
        debug!(
            "Dispatching {}.{} for {}",
            call.domain, call.service, self.name
        );
        bus.call(call);
    }

    fn controls() -> Vec<Control> {
        Press::ALL
            .iter()
            .map(|p| Control {
                id: p.to_string(),
                icon: p.icon().to_string(),
            })
            .collect()
    }
}

impl Card for CoverCard {
    fn name(&self) -> &str {
        &self.name
    }

    fn card_size(&self) -> u8 {
        1
    }

    fn render(&self, snapshot: &StateSnapshot) -> View {
        match snapshot.get(&self.config.entity) {
            Some(attributes) => {
                let mut lines = vec![format!("Position: {} %", attributes.current_position)];
                if attributes.shade_mode {
                    lines.push("Shade mode".to_string());
                }

                View {
                    icon: CARD_ICON.to_string(),
                    title: attributes.friendly_name.clone(),
                    lines,
                    controls: Self::controls(),
                    available: true,
                }
            }
            None => View {
                icon: CARD_ICON.to_string(),
                title: self.name.clone(),
                lines: vec!["Entity unavailable".to_string()],
                controls: Self::controls(),
                available: false,
            },
        }
    }

    fn press(
        &self,
        button: &str,
        snapshot: &StateSnapshot,
        bus: &ServiceBus,
    ) -> Result<Propagation, CardError> {
        let Ok(press) = Press::from_str(button) else {
            // Not one of ours; let the event keep bubbling.
            return Ok(Propagation::Continue);
        };

        let command = self.command_for(press, snapshot)?;
        self.dispatch(command, bus);
        Ok(Propagation::Stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::EntityAttributes;
    use crate::host::ServiceCallReceiver;

    fn kitchen_snapshot() -> StateSnapshot {
        let mut snapshot = StateSnapshot::default();
        snapshot.entities.insert(
            "cover.kitchen".to_string(),
            EntityAttributes {
                friendly_name: "Kitchen Blind".to_string(),
                current_position: 42,
                uuid: "abc-1".to_string(),
                shade_mode: false,
                room: Some("Kitchen".to_string()),
            },
        );
        snapshot
    }

    fn kitchen_card() -> CoverCard {
        CoverCard::new(CoverConfig {
            entity: "cover.kitchen".to_string(),
        })
        .unwrap()
    }

    fn bus() -> (ServiceBus, ServiceCallReceiver) {
        ServiceBus::channel()
    }

    #[test]
    fn test_new_rejects_empty_entity() {
        let result = CoverCard::new(CoverConfig {
            entity: String::new(),
        });
        assert!(matches!(result, Err(CardError::MissingEntity)));
    }

    #[test]
    fn test_name_derived_from_entity() {
        assert_eq!(kitchen_card().name(), "cover.kitchen");
    }

    #[test]
    fn test_card_size_is_one() {
        let card = kitchen_card();
        assert_eq!(card.card_size(), 1);
        // Independent of entity availability.
        card.render(&StateSnapshot::default());
        assert_eq!(card.card_size(), 1);
    }

    #[test]
    fn test_render_kitchen_blind() {
        let view = kitchen_card().render(&kitchen_snapshot());

        assert!(view.available);
        assert_eq!(view.title, "Kitchen Blind");
        assert_eq!(view.icon, "mdi:window-closed");
        assert_eq!(view.lines, vec!["Position: 42 %".to_string()]);
        assert_eq!(view.controls.len(), 4);

        insta::assert_snapshot!(view.to_string(), @r"
        [mdi:window-closed] Kitchen Blind
          Position: 42 %
          (shade | open | stop | close)
        ");
    }

    #[test]
    fn test_render_is_deterministic() {
        let card = kitchen_card();
        let snapshot = kitchen_snapshot();

        let first = card.render(&snapshot);
        let second = card.render(&snapshot);
        assert_eq!(first, second);

        // The serialized form the HTTP surface exposes must match too.
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_render_shade_mode_line() {
        let mut snapshot = kitchen_snapshot();
        snapshot.entities.get_mut("cover.kitchen").unwrap().shade_mode = true;

        let view = kitchen_card().render(&snapshot);
        assert_eq!(
            view.lines,
            vec!["Position: 42 %".to_string(), "Shade mode".to_string()]
        );
    }

    #[test]
    fn test_render_missing_entity_is_unavailable() {
        let view = kitchen_card().render(&StateSnapshot::default());

        assert!(!view.available);
        assert_eq!(view.title, "cover.kitchen");
        assert_eq!(view.lines, vec!["Entity unavailable".to_string()]);
        // Controls stay visible even when the entity is gone.
        assert_eq!(view.controls.len(), 4);
    }

    #[test]
    fn test_press_open_dispatches_exactly_one_call() {
        let (bus, mut rx) = bus();
        let propagation = kitchen_card()
            .press("open", &kitchen_snapshot(), &bus)
            .unwrap();

        assert_eq!(propagation, Propagation::Stop);
        let call = rx.try_recv().unwrap();
        assert_eq!(call.domain, "cover");
        assert_eq!(call.service, "open_cover");
        assert_eq!(call.data, json!({ "entity_id": "cover.kitchen" }));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_press_stop_and_close() {
        let (bus, mut rx) = bus();
        let card = kitchen_card();
        let snapshot = kitchen_snapshot();

        card.press("stop", &snapshot, &bus).unwrap();
        card.press("close", &snapshot, &bus).unwrap();

        assert_eq!(rx.try_recv().unwrap().service, "stop_cover");
        assert_eq!(rx.try_recv().unwrap().service, "close_cover");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_press_shade_is_addressed_by_uuid() {
        let (bus, mut rx) = bus();
        let propagation = kitchen_card()
            .press("shade", &kitchen_snapshot(), &bus)
            .unwrap();

        assert_eq!(propagation, Propagation::Stop);
        let call = rx.try_recv().unwrap();
        assert_eq!(call.domain, "loxone");
        assert_eq!(call.service, "event_websocket_command");
        assert_eq!(call.data, json!({ "uuid": "abc-1", "value": "shade" }));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_press_shade_without_entity_dispatches_nothing() {
        let (bus, mut rx) = bus();
        let result = kitchen_card().press("shade", &StateSnapshot::default(), &bus);

        assert!(matches!(
            result,
            Err(CardError::EntityUnavailable(entity)) if entity == "cover.kitchen"
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unknown_button_bubbles() {
        let (bus, mut rx) = bus();
        let propagation = kitchen_card()
            .press("tilt", &kitchen_snapshot(), &bus)
            .unwrap();

        assert_eq!(propagation, Propagation::Continue);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_command_wire_shapes() {
        let open = Command::Open {
            entity_id: "cover.kitchen".to_string(),
        }
        .into_service_call();
        assert_eq!(open.domain, "cover");
        assert_eq!(open.service, "open_cover");

        let shade = Command::Shade {
            uuid: "abc-1".to_string(),
        }
        .into_service_call();
        assert_eq!(shade.domain, "loxone");
        assert_eq!(shade.data["value"], "shade");
    }
}
