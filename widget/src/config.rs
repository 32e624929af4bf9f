use feedback::{
    FeedbackPoint, GeneralFeedback,
    client::{FEEDBACK_PATH, GENERAL_PATH, ROUNDS_PATH},
};
use serde::{Deserialize, Serialize};

const BUTTON_OFFSET: u32 = 24;
const PANEL_OFFSET: u32 = 96;

/// Corner the floating buttons are anchored to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    #[default]
    BottomLeft,
    BottomRight,
    TopLeft,
    TopRight,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

/// Fixed placement as pixel offsets from two viewport edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub vertical: Edge,
    pub vertical_offset: u32,
    pub horizontal: Edge,
    pub horizontal_offset: u32,
}

impl Position {
    pub fn edges(self) -> (Edge, Edge) {
        match self {
            Position::BottomLeft => (Edge::Bottom, Edge::Left),
            Position::BottomRight => (Edge::Bottom, Edge::Right),
            Position::TopLeft => (Edge::Top, Edge::Left),
            Position::TopRight => (Edge::Top, Edge::Right),
        }
    }

    pub fn buttons(self) -> Placement {
        self.placement(BUTTON_OFFSET)
    }

    /// Panels and helper text sit above (or below) the button row.
    pub fn panel(self) -> Placement {
        self.placement(PANEL_OFFSET)
    }

    fn placement(self, vertical_offset: u32) -> Placement {
        let (vertical, horizontal) = self.edges();

        Placement {
            vertical,
            vertical_offset,
            horizontal,
            horizontal_offset: BUTTON_OFFSET,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub primary: String,
    pub secondary: String,
    pub success: String,
    pub warning: String,
    pub danger: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: "#3b82f6".to_string(),
            secondary: "#6b7280".to_string(),
            success: "#22c55e".to_string(),
            warning: "#f59e0b".to_string(),
            danger: "#ef4444".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Labels {
    pub add_feedback: String,
    pub stop_feedback: String,
    pub placeholder: String,
    pub save: String,
    pub cancel: String,
    pub delete: String,
    pub resolve: String,
    pub resolved: String,
    pub new_feedback: String,
    pub click_to_add: String,
    pub feedback_saved: String,
    pub feedback_deleted: String,
    pub rounds: String,
    pub no_rounds: String,
    pub view_all: String,
    pub general_feedback: String,
    pub no_general_feedback: String,
    pub add_general_feedback: String,
    pub general_placeholder: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            add_feedback: "Add Feedback".to_string(),
            stop_feedback: "Stop".to_string(),
            placeholder: "Describe your feedback...".to_string(),
            save: "Save".to_string(),
            cancel: "Cancel".to_string(),
            delete: "Delete".to_string(),
            resolve: "Mark Resolved".to_string(),
            resolved: "Resolved".to_string(),
            new_feedback: "New Feedback".to_string(),
            click_to_add: "Click anywhere to add feedback".to_string(),
            feedback_saved: "Feedback saved!".to_string(),
            feedback_deleted: "Feedback deleted!".to_string(),
            rounds: "Feedback Rounds".to_string(),
            no_rounds: "No rounds found".to_string(),
            view_all: "View all feedback".to_string(),
            general_feedback: "General Feedback".to_string(),
            no_general_feedback: "No general feedback yet".to_string(),
            add_general_feedback: "Add Feedback".to_string(),
            general_placeholder: "Share your thoughts or suggestions...".to_string(),
        }
    }
}

/// Host supplied settings. Missing fields, including nested theme and
/// label fields, fall back to their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WidgetConfig {
    pub api_endpoint: String,
    pub rounds_endpoint: String,
    pub general_feedback_endpoint: String,
    pub position: Position,
    pub theme: Theme,
    pub labels: Labels,
    pub disabled: bool,
    pub show_rounds_button: bool,
    pub show_general_feedback: bool,
    pub feedback_page_url: Option<String>,
    pub z_index: i32,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            api_endpoint: FEEDBACK_PATH.to_string(),
            rounds_endpoint: ROUNDS_PATH.to_string(),
            general_feedback_endpoint: GENERAL_PATH.to_string(),
            position: Position::default(),
            theme: Theme::default(),
            labels: Labels::default(),
            disabled: false,
            show_rounds_button: true,
            show_general_feedback: true,
            feedback_page_url: Some("/feedback".to_string()),
            z_index: 99999,
        }
    }
}

/// Stacking order derived from the configured base z-index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layers {
    pub overlay: i32,
    pub markers: i32,
    pub popups: i32,
    pub toast: i32,
}

impl WidgetConfig {
    pub fn layers(&self) -> Layers {
        Layers {
            overlay: self.z_index.saturating_sub(10),
            markers: self.z_index,
            popups: self.z_index.saturating_add(1),
            toast: self.z_index.saturating_add(10),
        }
    }
}

type Callback<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Hooks fired after the server confirms a change.
#[derive(Default)]
pub struct WidgetCallbacks {
    pub(crate) on_feedback_add: Option<Callback<FeedbackPoint>>,
    pub(crate) on_feedback_delete: Option<Box<dyn Fn(&str) + Send + Sync>>,
    pub(crate) on_general_feedback_add: Option<Callback<GeneralFeedback>>,
}

impl WidgetCallbacks {
    pub fn on_feedback_add(mut self, f: impl Fn(&FeedbackPoint) + Send + Sync + 'static) -> Self {
        self.on_feedback_add = Some(Box::new(f));
        self
    }

    pub fn on_feedback_delete(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_feedback_delete = Some(Box::new(f));
        self
    }

    pub fn on_general_feedback_add(
        mut self,
        f: impl Fn(&GeneralFeedback) + Send + Sync + 'static,
    ) -> Self {
        self.on_general_feedback_add = Some(Box::new(f));
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: WidgetConfig = serde_json::from_value(json!({
            "position": "top-right",
            "theme": { "primary": "#000000" },
            "labels": { "save": "Enregistrer" },
            "showRoundsButton": false,
            "feedbackPageUrl": null
        }))
        .unwrap();

        assert_eq!(config.position, Position::TopRight);
        assert_eq!(config.theme.primary, "#000000");
        assert_eq!(config.theme.success, "#22c55e");
        assert_eq!(config.labels.save, "Enregistrer");
        assert_eq!(config.labels.cancel, "Cancel");
        assert!(!config.show_rounds_button);
        assert!(config.show_general_feedback);
        assert_eq!(config.feedback_page_url, None);
        assert_eq!(config.api_endpoint, "/api/feedback");
        assert_eq!(config.z_index, 99999);
    }

    #[test]
    fn test_placements() {
        let buttons = Position::BottomLeft.buttons();
        assert_eq!(buttons.vertical, Edge::Bottom);
        assert_eq!(buttons.horizontal, Edge::Left);
        assert_eq!(buttons.vertical_offset, 24);

        let panel = Position::TopRight.panel();
        assert_eq!(panel.vertical, Edge::Top);
        assert_eq!(panel.horizontal, Edge::Right);
        assert_eq!(panel.vertical_offset, 96);
        assert_eq!(panel.horizontal_offset, 24);
    }

    #[test]
    fn test_layers() {
        let layers = WidgetConfig::default().layers();

        assert_eq!(layers.overlay, 99989);
        assert_eq!(layers.popups, 100000);
        assert_eq!(layers.toast, 100009);
    }

    #[test]
    fn test_layers_clamp_at_extremes() {
        let top: WidgetConfig = serde_json::from_value(json!({ "zIndex": i32::MAX })).unwrap();
        let layers = top.layers();
        assert_eq!(layers.toast, i32::MAX);
        assert_eq!(layers.popups, i32::MAX);
        assert_eq!(layers.overlay, i32::MAX - 10);

        let bottom: WidgetConfig = serde_json::from_value(json!({ "zIndex": i32::MIN })).unwrap();
        assert_eq!(bottom.layers().overlay, i32::MIN);
    }
}
