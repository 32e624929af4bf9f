//! JSON bodies for `/api/feedback`, `/api/feedback/rounds` and `/api/feedback/general`.
use serde::{Deserialize, Serialize};

use crate::models::FeedbackRound;

/// `{"feedback": [...], "count": n}`, used for points and general feedback.
#[derive(Debug, Serialize, Deserialize)]
pub struct Listing<T> {
    pub feedback: Vec<T>,
    pub count: usize,
}

impl<T> Listing<T> {
    pub fn new(feedback: Vec<T>) -> Self {
        let count = feedback.len();
        Self { feedback, count }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoundListing {
    pub rounds: Vec<FeedbackRound>,
    pub count: usize,
}

impl RoundListing {
    pub fn new(rounds: Vec<FeedbackRound>) -> Self {
        let count = rounds.len();
        Self { rounds, count }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Saved<T> {
    pub success: bool,
    pub feedback: T,
}

impl<T> Saved<T> {
    pub fn new(feedback: T) -> Self {
        Self {
            success: true,
            feedback,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Lenient list shape accepted by clients: wrapped under `feedback`,
/// wrapped under `points`, or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListBody<T> {
    Feedback { feedback: Vec<T> },
    Points { points: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListBody<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            ListBody::Feedback { feedback } => feedback,
            ListBody::Points { points } => points,
            ListBody::Bare(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RoundsBody {
    #[serde(default)]
    pub rounds: Vec<FeedbackRound>,
}

/// Lenient save response: the stored record under `feedback` or `point`.
#[derive(Debug, Deserialize)]
pub struct SavedBody<T> {
    pub feedback: Option<T>,
    pub point: Option<T>,
}

impl<T> SavedBody<T> {
    pub fn into_record(self) -> Option<T> {
        self.feedback.or(self.point)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::FeedbackPoint;

    fn raw_point(id: &str) -> serde_json::Value {
        json!({
            "id": id, "x": 5, "y": 6, "comment": "c", "page": "/",
            "timestamp": "2024-01-01T00:00:00.000Z"
        })
    }

    #[test]
    fn test_list_body_shapes() {
        let wrapped: ListBody<FeedbackPoint> =
            serde_json::from_value(json!({ "feedback": [raw_point("a")], "count": 1 })).unwrap();
        let points: ListBody<FeedbackPoint> =
            serde_json::from_value(json!({ "points": [raw_point("b")] })).unwrap();
        let bare: ListBody<FeedbackPoint> =
            serde_json::from_value(json!([raw_point("c"), raw_point("d")])).unwrap();

        assert_eq!(wrapped.into_items()[0].id, "a");
        assert_eq!(points.into_items()[0].id, "b");
        assert_eq!(bare.into_items().len(), 2);
    }

    #[test]
    fn test_saved_body_fallbacks() {
        let under_point: SavedBody<FeedbackPoint> =
            serde_json::from_value(json!({ "success": true, "point": raw_point("p") })).unwrap();
        let empty: SavedBody<FeedbackPoint> =
            serde_json::from_value(json!({ "success": true })).unwrap();

        assert_eq!(under_point.into_record().unwrap().id, "p");
        assert!(empty.into_record().is_none());
    }

    #[test]
    fn test_listing_counts() {
        let listing = Listing::new(vec![1, 2, 3]);
        let value = serde_json::to_value(&listing).unwrap();

        assert_eq!(value["count"], 3);
        assert_eq!(value["feedback"], json!([1, 2, 3]));
    }
}
