//! Rendered-view data model.
//!
//! A `View` is the pure output of a card's render pass. The host (or the
//! HTTP surface standing in for a frontend) decides how to draw it; cards
//! only describe structure. Identical inputs must always produce an
//! identical `View`.

use serde::Serialize;

/// A single pressable control on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Control {
    /// Stable identifier the host posts back when the control is pressed.
    pub id: String,

    /// Icon hint, in the upstream frontend's naming scheme (e.g. "hass:stop").
    pub icon: String,
}

/// The rendered state of one card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct View {
    /// Static icon shown next to the title.
    pub icon: String,

    /// Card title: the entity's friendly name, or the entity id as a fallback.
    pub title: String,

    /// Body lines, already formatted for display.
    pub lines: Vec<String>,

    /// Controls in display order.
    pub controls: Vec<Control>,

    /// Whether the backing entity was present in the snapshot.
    pub available: bool,
}

impl std::fmt::Display for View {
    /// Plain-text rendering, used for logs and tests.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "[{}] {}", self.icon, self.title)?;
        for line in &self.lines {
            writeln!(f, "  {}", line)?;
        }
        let ids: Vec<&str> = self.controls.iter().map(|c| c.id.as_str()).collect();
        write!(f, "  ({})", ids.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_lists_controls_in_order() {
        let view = View {
            icon: "mdi:window-closed".to_string(),
            title: "Test".to_string(),
            lines: vec!["Position: 0 %".to_string()],
            controls: vec![
                Control {
                    id: "open".to_string(),
                    icon: "hass:arrow-up".to_string(),
                },
                Control {
                    id: "close".to_string(),
                    icon: "hass:arrow-down".to_string(),
                },
            ],
            available: true,
        };

        let text = view.to_string();
        assert!(text.contains("[mdi:window-closed] Test"));
        assert!(text.contains("(open | close)"));
    }
}
