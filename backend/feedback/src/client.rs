use reqwest::{Client, Response};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::{
    models::{FeedbackPatch, FeedbackPoint, FeedbackRound, GeneralFeedback},
    payloads::{ErrorBody, ListBody, RoundsBody, SavedBody},
};

pub const FEEDBACK_PATH: &str = "/api/feedback";
pub const ROUNDS_PATH: &str = "/api/feedback/rounds";
pub const GENERAL_PATH: &str = "/api/feedback/general";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server responded {status}: {message}")]
    Status { status: u16, message: String },
}

/// Absolute URLs of the three feedback routes.
#[derive(Clone, Debug)]
pub struct Endpoints {
    pub feedback: String,
    pub rounds: String,
    pub general: String,
}

impl Endpoints {
    pub fn new(origin: &str, feedback: &str, rounds: &str, general: &str) -> Self {
        let origin = origin.trim_end_matches('/');

        Self {
            feedback: join(origin, feedback),
            rounds: join(origin, rounds),
            general: join(origin, general),
        }
    }

    pub fn with_default_paths(origin: &str) -> Self {
        Self::new(origin, FEEDBACK_PATH, ROUNDS_PATH, GENERAL_PATH)
    }
}

fn join(origin: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }

    format!("{origin}/{}", path.trim_start_matches('/'))
}

#[derive(Serialize)]
struct PageQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<&'a str>,
}

#[derive(Serialize)]
struct IdQuery<'a> {
    id: &'a str,
}

#[derive(Clone)]
pub struct FeedbackClient {
    http: Client,
    endpoints: Endpoints,
}

impl FeedbackClient {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            http: Client::new(),
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub async fn list_points(&self, page: Option<&str>) -> Result<Vec<FeedbackPoint>, ClientError> {
        self.list(&self.endpoints.feedback, page).await
    }

    /// Returns the record the server stored, when it echoes one back.
    pub async fn create_point(
        &self,
        point: &FeedbackPoint,
    ) -> Result<Option<FeedbackPoint>, ClientError> {
        self.create(&self.endpoints.feedback, point).await
    }

    pub async fn update_point(
        &self,
        id: &str,
        patch: &FeedbackPatch,
    ) -> Result<Option<FeedbackPoint>, ClientError> {
        let response = self
            .http
            .put(&self.endpoints.feedback)
            .query(&IdQuery { id })
            .json(patch)
            .send()
            .await?;

        let body: SavedBody<FeedbackPoint> = check(response).await?.json().await?;
        Ok(body.into_record())
    }

    pub async fn delete_point(&self, id: &str) -> Result<(), ClientError> {
        self.delete(&self.endpoints.feedback, id).await
    }

    pub async fn list_rounds(&self, page: Option<&str>) -> Result<Vec<FeedbackRound>, ClientError> {
        let response = self
            .http
            .get(&self.endpoints.rounds)
            .query(&PageQuery { page })
            .send()
            .await?;

        let body: RoundsBody = check(response).await?.json().await?;
        Ok(body.rounds)
    }

    pub async fn list_general(
        &self,
        page: Option<&str>,
    ) -> Result<Vec<GeneralFeedback>, ClientError> {
        self.list(&self.endpoints.general, page).await
    }

    pub async fn create_general(
        &self,
        feedback: &GeneralFeedback,
    ) -> Result<Option<GeneralFeedback>, ClientError> {
        self.create(&self.endpoints.general, feedback).await
    }

    pub async fn delete_general(&self, id: &str) -> Result<(), ClientError> {
        self.delete(&self.endpoints.general, id).await
    }

    async fn list<T: DeserializeOwned>(
        &self,
        url: &str,
        page: Option<&str>,
    ) -> Result<Vec<T>, ClientError> {
        let response = self.http.get(url).query(&PageQuery { page }).send().await?;

        let body: ListBody<T> = check(response).await?.json().await?;
        Ok(body.into_items())
    }

    async fn create<T: Serialize + DeserializeOwned>(
        &self,
        url: &str,
        record: &T,
    ) -> Result<Option<T>, ClientError> {
        let response = self.http.post(url).json(record).send().await?;

        let body: SavedBody<T> = check(response).await?.json().await?;
        Ok(body.into_record())
    }

    async fn delete(&self, url: &str, id: &str) -> Result<(), ClientError> {
        let response = self.http.delete(url).query(&IdQuery { id }).send().await?;

        check(response).await?;
        Ok(())
    }
}

async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);

    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}
