//! Render models. The host UI layer draws these as-is.
use chrono::{DateTime, Local};
use feedback::{FeedbackPoint, FeedbackRound, RoundStatus};

use crate::{
    config::{Placement, WidgetConfig},
    geometry::PagePoint,
    state::{Mode, Panel, WidgetState},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Badge {
    Check,
    Alert,
}

impl Badge {
    pub fn symbol(self) -> &'static str {
        match self {
            Badge::Check => "✓",
            Badge::Alert => "!",
        }
    }
}

/// Actions offered in a marker tooltip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MarkerActions {
    pub delete: bool,
    pub resolve: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    /// Unique across live and round markers, used for hover tracking.
    pub key: String,
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub badge: Badge,
    pub header: String,
    pub comment: String,
    pub resolution: Option<String>,
    pub timestamp: String,
    pub actions: MarkerActions,
    pub tooltip_visible: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoundRow {
    pub id: String,
    pub name: String,
    pub date: String,
    pub status: RoundStatus,
    pub badge_color: String,
    pub item_count: usize,
    pub checked: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoundsPanel {
    pub title: String,
    pub rows: Vec<RoundRow>,
    pub empty_label: Option<String>,
    /// Link to the full feedback page, when configured.
    pub view_all: Option<(String, String)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeneralRow {
    pub id: String,
    pub comment: String,
    pub timestamp: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeneralPanel {
    pub title: String,
    pub comment: String,
    pub placeholder: String,
    pub submit_label: String,
    pub submit_enabled: bool,
    pub rows: Vec<GeneralRow>,
    pub empty_label: Option<String>,
}

/// Inline form next to a selected spot.
#[derive(Clone, Debug, PartialEq)]
pub struct InputPopup {
    pub spot: PagePoint,
    pub comment: String,
    pub placeholder: String,
    pub save_label: String,
    pub cancel_label: String,
    pub save_enabled: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonKind {
    Toggle,
    Rounds,
    General,
    FeedbackPage,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Button {
    pub kind: ButtonKind,
    pub title: String,
    pub active: bool,
}

/// Everything the host draws for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct WidgetView {
    pub buttons: Vec<Button>,
    pub button_placement: Placement,
    pub panel_placement: Placement,
    pub overlay_active: bool,
    pub helper: Option<String>,
    pub markers: Vec<Marker>,
    pub popup: Option<InputPopup>,
    pub rounds_panel: Option<RoundsPanel>,
    pub general_panel: Option<GeneralPanel>,
    pub toast: Option<String>,
}

impl WidgetView {
    pub fn build(state: &WidgetState, config: &WidgetConfig) -> Self {
        let mut markers = live_markers(state, config);
        markers.extend(round_markers(state, config));

        Self {
            buttons: buttons(state, config),
            button_placement: config.position.buttons(),
            panel_placement: config.position.panel(),
            overlay_active: state.mode() == Mode::Placing,
            helper: state
                .helper_visible()
                .then(|| config.labels.click_to_add.clone()),
            markers,
            popup: input_popup(state, config),
            rounds_panel: rounds_panel(state, config),
            general_panel: general_panel(state, config),
            toast: state.toast().map(|t| t.message.clone()),
        }
    }
}

pub fn buttons(state: &WidgetState, config: &WidgetConfig) -> Vec<Button> {
    let labels = &config.labels;
    let placing = state.mode() != Mode::Idle;

    let mut buttons = vec![Button {
        kind: ButtonKind::Toggle,
        title: if placing {
            labels.stop_feedback.clone()
        } else {
            labels.add_feedback.clone()
        },
        active: placing,
    }];

    if config.show_rounds_button {
        buttons.push(Button {
            kind: ButtonKind::Rounds,
            title: labels.rounds.clone(),
            active: state.panel() == Some(Panel::Rounds),
        });
    }

    if config.show_general_feedback {
        buttons.push(Button {
            kind: ButtonKind::General,
            title: labels.general_feedback.clone(),
            active: state.panel() == Some(Panel::General),
        });
    }

    if config.feedback_page_url.is_some() {
        buttons.push(Button {
            kind: ButtonKind::FeedbackPage,
            title: labels.view_all.clone(),
            active: false,
        });
    }

    buttons
}

pub fn live_markers(state: &WidgetState, config: &WidgetConfig) -> Vec<Marker> {
    let theme = &config.theme;
    let labels = &config.labels;

    state
        .points()
        .iter()
        .map(|point| {
            let resolved = point.is_resolved();
            let (color, badge, header) = if resolved {
                (&theme.success, Badge::Check, &labels.resolved)
            } else {
                (&theme.primary, Badge::Alert, &labels.new_feedback)
            };

            Marker {
                key: point.id.clone(),
                color: color.clone(),
                badge,
                header: header.clone(),
                resolution: if resolved {
                    point.resolution.clone()
                } else {
                    None
                },
                actions: MarkerActions {
                    delete: true,
                    resolve: !resolved,
                },
                tooltip_visible: state.hovered() == Some(point.id.as_str()),
                ..marker_base(point)
            }
        })
        .collect()
}

/// Items of every checked round. Round markers are read only.
pub fn round_markers(state: &WidgetState, config: &WidgetConfig) -> Vec<Marker> {
    state
        .visible_rounds()
        .flat_map(|round| {
            round.items.iter().map(move |item| {
                let key = format!("{}-{}", round.id, item.id);
                let completed = round.status == RoundStatus::Completed;

                Marker {
                    tooltip_visible: state.hovered() == Some(key.as_str()),
                    key,
                    color: if completed {
                        config.theme.success.clone()
                    } else {
                        config.theme.warning.clone()
                    },
                    badge: if completed { Badge::Check } else { Badge::Alert },
                    header: round_header(round, config),
                    resolution: item.resolution.clone(),
                    actions: MarkerActions::default(),
                    ..marker_base(item)
                }
            })
        })
        .collect()
}

fn marker_base(point: &FeedbackPoint) -> Marker {
    Marker {
        key: String::new(),
        id: point.id.clone(),
        x: point.x,
        y: point.y,
        color: String::new(),
        badge: Badge::Alert,
        header: String::new(),
        comment: point.comment.clone(),
        resolution: None,
        timestamp: display_timestamp(&point.timestamp),
        actions: MarkerActions::default(),
        tooltip_visible: false,
    }
}

fn round_header(round: &FeedbackRound, config: &WidgetConfig) -> String {
    if round.status == RoundStatus::Completed {
        format!("{} - {}", round.name, config.labels.resolved)
    } else {
        round.name.clone()
    }
}

pub fn status_color(status: RoundStatus, config: &WidgetConfig) -> &str {
    match status {
        RoundStatus::Completed => &config.theme.success,
        RoundStatus::Active => &config.theme.warning,
        RoundStatus::Archived => &config.theme.secondary,
    }
}

pub fn rounds_panel(state: &WidgetState, config: &WidgetConfig) -> Option<RoundsPanel> {
    if state.panel() != Some(Panel::Rounds) {
        return None;
    }

    let rows: Vec<RoundRow> = state
        .rounds()
        .iter()
        .map(|round| RoundRow {
            id: round.id.clone(),
            name: round.name.clone(),
            date: round.date.clone(),
            status: round.status,
            badge_color: status_color(round.status, config).to_string(),
            item_count: round.items.len(),
            checked: state.is_round_visible(&round.id),
        })
        .collect();

    Some(RoundsPanel {
        title: config.labels.rounds.clone(),
        empty_label: rows.is_empty().then(|| config.labels.no_rounds.clone()),
        rows,
        view_all: config
            .feedback_page_url
            .as_ref()
            .map(|url| (config.labels.view_all.clone(), url.clone())),
    })
}

pub fn general_panel(state: &WidgetState, config: &WidgetConfig) -> Option<GeneralPanel> {
    if state.panel() != Some(Panel::General) {
        return None;
    }

    let labels = &config.labels;
    let rows: Vec<GeneralRow> = state
        .general_feedback()
        .iter()
        .map(|feedback| GeneralRow {
            id: feedback.id.clone(),
            comment: feedback.comment.clone(),
            timestamp: display_timestamp(&feedback.timestamp),
        })
        .collect();

    Some(GeneralPanel {
        title: labels.general_feedback.clone(),
        comment: state.general_comment().to_string(),
        placeholder: labels.general_placeholder.clone(),
        submit_label: labels.add_general_feedback.clone(),
        submit_enabled: state.can_submit_general(),
        empty_label: rows.is_empty().then(|| labels.no_general_feedback.clone()),
        rows,
    })
}

pub fn input_popup(state: &WidgetState, config: &WidgetConfig) -> Option<InputPopup> {
    let Mode::Selected(spot) = state.mode() else {
        return None;
    };

    Some(InputPopup {
        spot,
        comment: state.comment().to_string(),
        placeholder: config.labels.placeholder.clone(),
        save_label: config.labels.save.clone(),
        cancel_label: config.labels.cancel.clone(),
        save_enabled: state.can_submit(),
    })
}

/// Local time for RFC 3339 stamps, anything else verbatim.
pub fn display_timestamp(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(parsed) => parsed
            .with_timezone(&Local)
            .format("%-m/%-d/%Y, %-I:%M:%S %p")
            .to_string(),
        Err(_) => timestamp.to_string(),
    }
}
