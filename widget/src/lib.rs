//! Documentation of the Pinpoint widget core.
//!
//! Everything the embeddable widget does except drawing pixels.
//!
//!
//!
//! # Flow
//! - The host creates a [`FeedbackWidget`] with a [`WidgetConfig`] and mounts it on the current path
//! - Mounting loads the points, rounds and general feedback of that path
//! - The host forwards clicks, typing and hover to [`FeedbackWidget::state_mut`]
//! - Saving and deleting go through the async methods on [`FeedbackWidget`]
//! - Each frame the host draws [`FeedbackWidget::view`] and calls [`FeedbackWidget::tick`]
//!
//!
//!
//! # Failure
//! Every request failure is logged with `tracing::warn!` and leaves the state as it was.
//! Nothing is retried.
//!
//!
//!
//! # Example
//! ```no_run
//! use widget::{ClickTarget, FeedbackWidget, Viewport, WidgetCallbacks, WidgetConfig};
//!
//! # async fn run() {
//! let callbacks = WidgetCallbacks::default().on_feedback_add(|point| println!("{}", point.id));
//! let mut widget = FeedbackWidget::new("http://localhost:3000", WidgetConfig::default(), callbacks);
//! widget.mount("/pricing").await;
//!
//! widget.state_mut().toggle_placement();
//! widget.state_mut().click(ClickTarget::Page, 200.0, 300.0, &Viewport::new(1000.0, 0.0));
//! widget.state_mut().set_comment("Price is cut off on mobile");
//! widget.submit().await;
//! # }
//! ```
use std::time::Instant;

use feedback::{ClientError, Endpoints, FeedbackClient, FeedbackPatch};
use tracing::{debug, warn};

pub mod config;
pub mod geometry;
pub mod state;
pub mod view;

pub use config::{Labels, Position, Theme, WidgetCallbacks, WidgetConfig};
pub use geometry::{PagePoint, Viewport};
pub use state::{ClickTarget, Mode, Panel, WidgetState};
pub use view::WidgetView;

pub struct FeedbackWidget {
    config: WidgetConfig,
    callbacks: WidgetCallbacks,
    client: FeedbackClient,
    state: WidgetState,
    page: String,
}

impl FeedbackWidget {
    /// `origin` resolves relative endpoints, absolute ones are used as given.
    pub fn new(origin: &str, config: WidgetConfig, callbacks: WidgetCallbacks) -> Self {
        let endpoints = Endpoints::new(
            origin,
            &config.api_endpoint,
            &config.rounds_endpoint,
            &config.general_feedback_endpoint,
        );

        Self {
            config,
            callbacks,
            client: FeedbackClient::new(endpoints),
            state: WidgetState::default(),
            page: String::new(),
        }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn page(&self) -> &str {
        &self.page
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut WidgetState {
        &mut self.state
    }

    /// `None` while disabled.
    pub fn view(&self) -> Option<WidgetView> {
        (!self.config.disabled).then(|| WidgetView::build(&self.state, &self.config))
    }

    pub fn tick(&mut self, now: Instant) {
        self.state.tick(now);
    }

    /// Loads everything shown for `page`. An empty page loads nothing.
    pub async fn mount(&mut self, page: impl Into<String>) {
        self.page = page.into();

        if self.config.disabled {
            debug!("Widget disabled, skipping load");
            return;
        }

        if self.page.is_empty() {
            debug!("No current page, skipping load");
            return;
        }

        let page = Some(self.page.as_str());

        match self.client.list_points(page).await {
            Ok(points) => self.state.set_points(points),
            Err(e) => warn!("Failed to load feedback: {e}"),
        }

        if self.config.show_rounds_button {
            match self.client.list_rounds(page).await {
                Ok(rounds) => self.state.set_rounds(rounds),
                Err(e) => warn!("Failed to load rounds: {e}"),
            }
        }

        if self.config.show_general_feedback {
            match self.client.list_general(page).await {
                Ok(general) => self.state.set_general_feedback(general),
                Err(e) => warn!("Failed to load general feedback: {e}"),
            }
        }
    }

    /// Saves the open form. `false` when nothing was saved.
    pub async fn submit(&mut self) -> bool {
        if self.config.disabled {
            return false;
        }

        let Some(draft) = self.state.draft_point(&self.page) else {
            return false;
        };

        let saved = match self.client.create_point(&draft).await {
            Ok(saved) => saved.unwrap_or(draft),
            Err(e) => return failed("save feedback", e),
        };

        if let Some(on_add) = &self.callbacks.on_feedback_add {
            on_add(&saved);
        }
        self.state
            .point_saved(saved, &self.config.labels.feedback_saved, Instant::now());

        true
    }

    pub async fn resolve(&mut self, id: &str, resolution: Option<String>) -> bool {
        if self.config.disabled {
            return false;
        }

        match self
            .client
            .update_point(id, &FeedbackPatch::resolve(resolution))
            .await
        {
            Ok(Some(point)) => {
                self.state.point_updated(point);
                true
            }
            Ok(None) => false,
            Err(e) => failed("resolve feedback", e),
        }
    }

    pub async fn delete(&mut self, id: &str) -> bool {
        if self.config.disabled {
            return false;
        }

        if let Err(e) = self.client.delete_point(id).await {
            return failed("delete feedback", e);
        }

        self.state
            .point_deleted(id, &self.config.labels.feedback_deleted, Instant::now());
        if let Some(on_delete) = &self.callbacks.on_feedback_delete {
            on_delete(id);
        }

        true
    }

    pub async fn submit_general(&mut self) -> bool {
        if self.config.disabled {
            return false;
        }

        let Some(draft) = self.state.draft_general(&self.page) else {
            return false;
        };

        let saved = match self.client.create_general(&draft).await {
            Ok(saved) => saved.unwrap_or(draft),
            Err(e) => return failed("save general feedback", e),
        };

        if let Some(on_add) = &self.callbacks.on_general_feedback_add {
            on_add(&saved);
        }
        self.state
            .general_saved(saved, &self.config.labels.feedback_saved, Instant::now());

        true
    }

    pub async fn delete_general(&mut self, id: &str) -> bool {
        if self.config.disabled {
            return false;
        }

        if let Err(e) = self.client.delete_general(id).await {
            return failed("delete general feedback", e);
        }

        self.state
            .general_deleted(id, &self.config.labels.feedback_deleted, Instant::now());

        true
    }
}

fn failed(action: &str, e: ClientError) -> bool {
    warn!("Failed to {action}: {e}");
    false
}
