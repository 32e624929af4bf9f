//! # Feedback
//!
//! Shared vocabulary between the server, the widget and the CLI.
//!
//! - [`models`]: points, general feedback, rounds, POST drafts and PUT patches
//! - [`payloads`]: JSON bodies exchanged over `/api/feedback*`
//! - [`client`]: typed `reqwest` client for those routes
//! - [`utils`]: id and timestamp stamping, round date ordering
pub mod client;
pub mod models;
pub mod payloads;
pub mod utils;

pub use client::{ClientError, Endpoints, FeedbackClient};
pub use models::{
    FeedbackDraft, FeedbackPatch, FeedbackPoint, FeedbackRound, GeneralDraft, GeneralFeedback,
    OnPage, RoundStatus, filter_page, filter_rounds,
};

pub const POINT_ID_PREFIX: &str = "fb";
pub const GENERAL_ID_PREFIX: &str = "gf";
