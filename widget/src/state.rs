//! Widget state machine.
//!
//! `Idle -> Placing -> Selected -> Idle`. The rounds and general panels are
//! tracked next to the mode and never open at the same time.
use std::{
    collections::HashSet,
    time::{Duration, Instant},
};

use feedback::{
    FeedbackPoint, FeedbackRound, GENERAL_ID_PREFIX, GeneralFeedback, POINT_ID_PREFIX,
    utils::{generate_id, timestamp_now},
};

use crate::geometry::{PagePoint, Viewport};

pub const TOAST_DURATION: Duration = Duration::from_millis(2500);

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Mode {
    #[default]
    Idle,
    /// The overlay is capturing the next page click.
    Placing,
    /// A spot was picked and the comment form is open.
    Selected(PagePoint),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Panel {
    Rounds,
    General,
}

/// Where a click landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickTarget {
    Page,
    Marker,
    Widget,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub message: String,
    pub expires_at: Instant,
}

#[derive(Debug, Default)]
pub struct WidgetState {
    mode: Mode,
    comment: String,
    general_comment: String,
    points: Vec<FeedbackPoint>,
    rounds: Vec<FeedbackRound>,
    general: Vec<GeneralFeedback>,
    visible_rounds: HashSet<String>,
    panel: Option<Panel>,
    toast: Option<Toast>,
    hovered: Option<String>,
}

impl WidgetState {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn general_comment(&self) -> &str {
        &self.general_comment
    }

    pub fn points(&self) -> &[FeedbackPoint] {
        &self.points
    }

    pub fn rounds(&self) -> &[FeedbackRound] {
        &self.rounds
    }

    pub fn general_feedback(&self) -> &[GeneralFeedback] {
        &self.general
    }

    pub fn panel(&self) -> Option<Panel> {
        self.panel
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn set_points(&mut self, points: Vec<FeedbackPoint>) {
        self.points = points;
    }

    pub fn set_rounds(&mut self, rounds: Vec<FeedbackRound>) {
        self.visible_rounds
            .retain(|id| rounds.iter().any(|round| &round.id == id));
        self.rounds = rounds;
    }

    pub fn set_general_feedback(&mut self, general: Vec<GeneralFeedback>) {
        self.general = general;
    }

    /// The add/stop button. Any active placement or open form goes back to idle.
    pub fn toggle_placement(&mut self) {
        self.mode = match self.mode {
            Mode::Idle => Mode::Placing,
            Mode::Placing | Mode::Selected(_) => Mode::Idle,
        };
        self.comment.clear();
    }

    /// Returns the captured point when the click selected a spot.
    pub fn click(
        &mut self,
        target: ClickTarget,
        client_x: f64,
        client_y: f64,
        viewport: &Viewport,
    ) -> Option<PagePoint> {
        if self.mode != Mode::Placing || target != ClickTarget::Page {
            return None;
        }

        let point = PagePoint::capture(client_x, client_y, viewport);
        self.mode = Mode::Selected(point);
        self.comment.clear();

        Some(point)
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    pub fn cancel(&mut self) {
        if let Mode::Selected(_) = self.mode {
            self.mode = Mode::Idle;
            self.comment.clear();
        }
    }

    pub fn can_submit(&self) -> bool {
        matches!(self.mode, Mode::Selected(_)) && !self.comment.trim().is_empty()
    }

    /// The record a submit would send, or `None` when submitting is not possible.
    pub fn draft_point(&self, page: &str) -> Option<FeedbackPoint> {
        let Mode::Selected(spot) = self.mode else {
            return None;
        };

        let comment = self.comment.trim();
        if comment.is_empty() {
            return None;
        }

        Some(FeedbackPoint {
            id: generate_id(POINT_ID_PREFIX),
            x: spot.x,
            y: spot.y,
            comment: comment.to_string(),
            page: page.to_string(),
            timestamp: timestamp_now(),
            resolved: Some(false),
            resolution: None,
        })
    }

    pub fn point_saved(&mut self, point: FeedbackPoint, message: &str, now: Instant) {
        self.points.push(point);
        self.mode = Mode::Idle;
        self.comment.clear();
        self.show_toast(message, now);
    }

    pub fn point_updated(&mut self, point: FeedbackPoint) {
        if let Some(existing) = self.points.iter_mut().find(|p| p.id == point.id) {
            *existing = point;
        }
    }

    pub fn point_deleted(&mut self, id: &str, message: &str, now: Instant) {
        self.points.retain(|p| p.id != id);
        if self.hovered.as_deref() == Some(id) {
            self.hovered = None;
        }
        self.show_toast(message, now);
    }

    pub fn toggle_rounds_panel(&mut self) {
        self.toggle_panel(Panel::Rounds);
    }

    pub fn toggle_general_panel(&mut self) {
        self.toggle_panel(Panel::General);
    }

    fn toggle_panel(&mut self, panel: Panel) {
        self.panel = if self.panel == Some(panel) {
            None
        } else {
            Some(panel)
        };
    }

    /// Shows or hides the items of one round as markers.
    pub fn toggle_round(&mut self, id: &str) {
        if !self.visible_rounds.remove(id) {
            self.visible_rounds.insert(id.to_string());
        }
    }

    pub fn is_round_visible(&self, id: &str) -> bool {
        self.visible_rounds.contains(id)
    }

    pub fn visible_rounds(&self) -> impl Iterator<Item = &FeedbackRound> {
        self.rounds
            .iter()
            .filter(|round| self.visible_rounds.contains(&round.id))
    }

    pub fn set_general_comment(&mut self, comment: impl Into<String>) {
        self.general_comment = comment.into();
    }

    pub fn can_submit_general(&self) -> bool {
        !self.general_comment.trim().is_empty()
    }

    pub fn draft_general(&self, page: &str) -> Option<GeneralFeedback> {
        let comment = self.general_comment.trim();
        if comment.is_empty() {
            return None;
        }

        Some(GeneralFeedback {
            id: generate_id(GENERAL_ID_PREFIX),
            comment: comment.to_string(),
            page: page.to_string(),
            timestamp: timestamp_now(),
            resolved: Some(false),
            resolution: None,
            author: None,
        })
    }

    pub fn general_saved(&mut self, feedback: GeneralFeedback, message: &str, now: Instant) {
        self.general.insert(0, feedback);
        self.general_comment.clear();
        self.show_toast(message, now);
    }

    pub fn general_deleted(&mut self, id: &str, message: &str, now: Instant) {
        self.general.retain(|f| f.id != id);
        self.show_toast(message, now);
    }

    pub fn show_toast(&mut self, message: &str, now: Instant) {
        self.toast = Some(Toast {
            message: message.to_string(),
            expires_at: now + TOAST_DURATION,
        });
    }

    /// Drops the toast once it has expired.
    pub fn tick(&mut self, now: Instant) {
        if self.toast.as_ref().is_some_and(|t| now >= t.expires_at) {
            self.toast = None;
        }
    }

    pub fn hover(&mut self, key: impl Into<String>) {
        self.hovered = Some(key.into());
    }

    pub fn leave(&mut self, key: &str) {
        if self.hovered.as_deref() == Some(key) {
            self.hovered = None;
        }
    }

    pub fn helper_visible(&self) -> bool {
        self.mode == Mode::Placing && self.panel != Some(Panel::Rounds)
    }
}
