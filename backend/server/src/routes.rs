use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
};
use feedback::{
    FeedbackDraft, FeedbackPatch, FeedbackPoint, GeneralDraft, GeneralFeedback,
    payloads::{Ack, Listing, RoundListing, Saved},
};
use tracing::info;

use crate::{
    error::{AppError, StorageContext},
    state::AppState,
    storage::StorageError,
    utils::{IdQuery, PageQuery, parse_body},
};

pub async fn list_feedback_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Listing<FeedbackPoint>>, AppError> {
    let feedback = state
        .storage
        .get_feedback(query.page())
        .await
        .or_fail("Failed to fetch feedback")?;

    Ok(Json(Listing::new(feedback)))
}

pub async fn create_feedback_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FeedbackDraft>, JsonRejection>,
) -> Result<Json<Saved<FeedbackPoint>>, AppError> {
    let point = parse_body(payload)?
        .stamp()
        .ok_or(AppError::MissingFields)?;

    let saved = state
        .storage
        .save_feedback(point)
        .await
        .or_fail("Failed to save feedback")?;

    info!("Saved feedback {} on {}", saved.id, saved.page);
    Ok(Json(Saved::new(saved)))
}

pub async fn update_feedback_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
    payload: Result<Json<FeedbackPatch>, JsonRejection>,
) -> Result<Json<Saved<FeedbackPoint>>, AppError> {
    let id = query.required()?;
    let patch = parse_body(payload)?;

    let updated = state
        .storage
        .update_feedback(id, patch)
        .await
        .or_fail("Failed to update feedback")?
        .ok_or(AppError::NotFound)?;

    Ok(Json(Saved::new(updated)))
}

pub async fn delete_feedback_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> Result<Json<Ack>, AppError> {
    let id = query.required()?;

    let deleted = state
        .storage
        .delete_feedback(id)
        .await
        .or_fail("Failed to delete feedback")?;

    if !deleted {
        return Err(AppError::NotFound);
    }

    info!("Deleted feedback {id}");
    Ok(Json(Ack { success: true }))
}

pub async fn list_rounds_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<RoundListing>, AppError> {
    let rounds = state
        .storage
        .get_rounds(query.page())
        .await
        .or_fail("Failed to fetch rounds")?;

    Ok(Json(RoundListing::new(rounds)))
}

pub async fn list_general_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Listing<GeneralFeedback>>, AppError> {
    let feedback = match state.storage.get_general_feedback(query.page()).await {
        Err(StorageError::Unsupported) => Vec::new(),
        result => result.or_fail("Failed to fetch general feedback")?,
    };

    Ok(Json(Listing::new(feedback)))
}

pub async fn create_general_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GeneralDraft>, JsonRejection>,
) -> Result<Json<Saved<GeneralFeedback>>, AppError> {
    let feedback = parse_body(payload)?
        .stamp()
        .ok_or(AppError::MissingFields)?;

    let saved = state
        .storage
        .save_general_feedback(feedback)
        .await
        .or_fail("Failed to save general feedback")?;

    info!("Saved general feedback {} on {}", saved.id, saved.page);
    Ok(Json(Saved::new(saved)))
}

pub async fn delete_general_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> Result<Json<Ack>, AppError> {
    let id = query.required()?;

    let deleted = state
        .storage
        .delete_general_feedback(id)
        .await
        .or_fail("Failed to delete general feedback")?;

    if !deleted {
        return Err(AppError::NotFound);
    }

    Ok(Json(Ack { success: true }))
}
