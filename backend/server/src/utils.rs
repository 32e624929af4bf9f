use axum::{Json, extract::rejection::JsonRejection};
use serde::Deserialize;
use tracing::warn;

use crate::error::AppError;

#[derive(Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    /// An empty `?page=` means no filter.
    pub fn page(&self) -> Option<&str> {
        self.page.as_deref().filter(|page| !page.is_empty())
    }
}

#[derive(Deserialize)]
pub struct IdQuery {
    id: Option<String>,
}

impl IdQuery {
    pub fn required(&self) -> Result<&str, AppError> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(AppError::MissingId)
    }
}

pub fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        warn!("Rejected body: {rejection}");
        AppError::MalformedPayload
    })
}
