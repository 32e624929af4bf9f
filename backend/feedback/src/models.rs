use serde::{Deserialize, Serialize};

use crate::{
    GENERAL_ID_PREFIX, POINT_ID_PREFIX,
    utils::{generate_id, timestamp_now},
};

/// Anything that belongs to a single page path.
pub trait OnPage {
    fn page(&self) -> &str;
}

/// A comment pinned to a spot on a page.
///
/// `x` is a percentage of the viewport width, `y` is a pixel offset from the
/// top of the document (scroll included).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedbackPoint {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(alias = "feedback")]
    pub comment: String,
    pub page: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<bool>,
    #[serde(default, alias = "solution", skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

impl FeedbackPoint {
    pub fn is_resolved(&self) -> bool {
        self.resolved.unwrap_or(false)
    }
}

impl OnPage for FeedbackPoint {
    fn page(&self) -> &str {
        &self.page
    }
}

/// Page level feedback with no coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneralFeedback {
    pub id: String,
    pub comment: String,
    pub page: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl OnPage for GeneralFeedback {
    fn page(&self) -> &str {
        &self.page
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    Active,
    Completed,
    Archived,
}

/// A named, dated review cycle grouping historical points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRound {
    pub id: String,
    pub name: String,
    pub date: String,
    pub status: RoundStatus,
    #[serde(default)]
    pub items: Vec<FeedbackPoint>,
}

impl FeedbackRound {
    /// Keeps the round but drops every item from another page.
    pub fn for_page(mut self, page: &str) -> Self {
        self.items.retain(|item| item.page == page);
        self
    }
}

pub fn filter_page<T: OnPage>(items: Vec<T>, page: Option<&str>) -> Vec<T> {
    match page {
        Some(page) => items.into_iter().filter(|item| item.page() == page).collect(),
        None => items,
    }
}

pub fn filter_rounds(rounds: Vec<FeedbackRound>, page: Option<&str>) -> Vec<FeedbackRound> {
    match page {
        Some(page) => rounds.into_iter().map(|round| round.for_page(page)).collect(),
        None => rounds,
    }
}

/// Fields a `PUT` may overwrite. The id is not patchable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

impl FeedbackPatch {
    pub fn resolve(resolution: Option<String>) -> Self {
        Self {
            resolved: Some(true),
            resolution,
            ..Self::default()
        }
    }

    pub fn apply(self, point: &mut FeedbackPoint) {
        if let Some(x) = self.x {
            point.x = x;
        }
        if let Some(y) = self.y {
            point.y = y;
        }
        if let Some(comment) = self.comment {
            point.comment = comment;
        }
        if let Some(page) = self.page {
            point.page = page;
        }
        if let Some(timestamp) = self.timestamp {
            point.timestamp = timestamp;
        }
        if self.resolved.is_some() {
            point.resolved = self.resolved;
        }
        if self.resolution.is_some() {
            point.resolution = self.resolution;
        }
    }
}

/// `POST /api/feedback` body. Everything but `page` and `comment` is optional.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FeedbackDraft {
    pub id: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub comment: Option<String>,
    pub page: Option<String>,
    pub timestamp: Option<String>,
    pub resolved: Option<bool>,
    pub resolution: Option<String>,
}

impl FeedbackDraft {
    /// Fills server defaults. `None` when `page` or `comment` is missing or empty.
    pub fn stamp(self) -> Option<FeedbackPoint> {
        let page = present(self.page)?;
        let comment = present(self.comment)?;

        Some(FeedbackPoint {
            id: present(self.id).unwrap_or_else(|| generate_id(POINT_ID_PREFIX)),
            x: self.x.unwrap_or(0.0),
            y: self.y.unwrap_or(0.0),
            comment,
            page,
            timestamp: present(self.timestamp).unwrap_or_else(timestamp_now),
            resolved: Some(self.resolved.unwrap_or(false)),
            resolution: present(self.resolution),
        })
    }
}

/// `POST /api/feedback/general` body.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GeneralDraft {
    pub id: Option<String>,
    pub comment: Option<String>,
    pub page: Option<String>,
    pub timestamp: Option<String>,
    pub resolved: Option<bool>,
    pub author: Option<String>,
}

impl GeneralDraft {
    pub fn stamp(self) -> Option<GeneralFeedback> {
        let page = present(self.page)?;
        let comment = present(self.comment)?;

        Some(GeneralFeedback {
            id: present(self.id).unwrap_or_else(|| generate_id(GENERAL_ID_PREFIX)),
            comment,
            page,
            timestamp: present(self.timestamp).unwrap_or_else(timestamp_now),
            resolved: Some(self.resolved.unwrap_or(false)),
            resolution: None,
            author: present(self.author),
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
