//! # Blob Storage
//!
//! Object storage with a Vercel Blob style HTTP API.
//!
//! ## Layout
//!
//! - Points: a single blob `<feedback_prefix>-<unix millis>.json`, rewritten on every change
//! - Rounds: every blob whose pathname starts with `<rounds_prefix>`, one round each
//!
//! ## Caveats
//!
//! - Every save is read-modify-write of the whole list with no version check,
//!   two concurrent saves can drop one of them
//! - A write puts the new blob first, then deletes the older point blobs
//! - A failed download of the point blob reads as an empty list, so the next write
//!   replaces every stored point with only the new one
//! - General feedback is not stored here
use async_trait::async_trait;
use chrono::Utc;
use feedback::{
    FeedbackPatch, FeedbackPoint, FeedbackRound, filter_page, filter_rounds,
    utils::sort_newest_first,
};
use reqwest::{Client, Response, header::AUTHORIZATION};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use super::{FeedbackStore, StorageError, position_of};

const API_VERSION: &str = "7";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobObject {
    pub pathname: String,
    pub url: String,
    pub download_url: String,
}

/// Minimal object storage surface the adapter needs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>, StorageError>;

    async fn put(&self, pathname: &str, body: String) -> Result<BlobObject, StorageError>;

    async fn delete(&self, url: &str) -> Result<(), StorageError>;

    async fn fetch(&self, blob: &BlobObject) -> Result<String, StorageError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    blobs: Vec<BlobObject>,
    #[serde(default)]
    cursor: Option<String>,
    #[serde(default)]
    has_more: bool,
}

pub struct HttpBlobStore {
    http: Client,
    api_url: String,
    token: String,
}

impl HttpBlobStore {
    pub fn new(api_url: &str, token: &str) -> Self {
        Self {
            http: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

async fn ensure_success(response: Response) -> Result<Response, StorageError> {
    let status = response.status();
    if !status.is_success() {
        return Err(StorageError::BlobStatus(status.as_u16()));
    }

    Ok(response)
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>, StorageError> {
        let mut blobs = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(&self.api_url)
                .header(AUTHORIZATION, self.bearer())
                .header("x-api-version", API_VERSION)
                .query(&[("prefix", prefix)]);

            if let Some(cursor) = &cursor {
                request = request.query(&[("cursor", cursor)]);
            }

            let page: ListResponse = ensure_success(request.send().await?).await?.json().await?;
            blobs.extend(page.blobs);

            match page.cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }

        Ok(blobs)
    }

    async fn put(&self, pathname: &str, body: String) -> Result<BlobObject, StorageError> {
        let response = self
            .http
            .put(format!("{}/{pathname}", self.api_url))
            .header(AUTHORIZATION, self.bearer())
            .header("x-api-version", API_VERSION)
            .header("x-content-type", "application/json")
            .header("x-add-random-suffix", "0")
            .body(body)
            .send()
            .await?;

        Ok(ensure_success(response).await?.json().await?)
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let response = self
            .http
            .post(format!("{}/delete", self.api_url))
            .header(AUTHORIZATION, self.bearer())
            .header("x-api-version", API_VERSION)
            .json(&json!({ "urls": [url] }))
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }

    async fn fetch(&self, blob: &BlobObject) -> Result<String, StorageError> {
        let response = self.http.get(&blob.download_url).send().await?;

        Ok(ensure_success(response).await?.text().await?)
    }
}

pub struct BlobStorage<B> {
    store: B,
    feedback_prefix: String,
    rounds_prefix: String,
}

impl<B: BlobStore> BlobStorage<B> {
    pub fn new(store: B, feedback_prefix: &str, rounds_prefix: &str) -> Self {
        Self {
            store,
            feedback_prefix: feedback_prefix.to_string(),
            rounds_prefix: rounds_prefix.to_string(),
        }
    }

    /// Millisecond stamp of `<feedback_prefix>-<digits>.json`, `None` for anything else.
    fn feedback_stamp(&self, pathname: &str) -> Option<u64> {
        pathname
            .strip_prefix(self.feedback_prefix.as_str())?
            .strip_prefix('-')?
            .strip_suffix(".json")?
            .parse()
            .ok()
    }

    async fn feedback_blobs(&self) -> Result<Vec<BlobObject>, StorageError> {
        let blobs = self.store.list(&self.feedback_prefix).await?;

        Ok(blobs
            .into_iter()
            .filter(|blob| self.feedback_stamp(&blob.pathname).is_some())
            .collect())
    }

    async fn read_feedback(&self) -> Result<Vec<FeedbackPoint>, StorageError> {
        let blobs = self.feedback_blobs().await?;

        let Some(latest) = blobs
            .iter()
            .max_by_key(|blob| self.feedback_stamp(&blob.pathname))
        else {
            return Ok(Vec::new());
        };

        let parsed = self
            .store
            .fetch(latest)
            .await
            .and_then(|body| serde_json::from_str(&body).map_err(StorageError::from));

        match parsed {
            Ok(points) => Ok(points),
            Err(e) => {
                warn!("Failed to read feedback blob {}: {e}", latest.pathname);
                Ok(Vec::new())
            }
        }
    }

    async fn write_feedback(&self, points: &[FeedbackPoint]) -> Result<(), StorageError> {
        let pathname = format!("{}-{}.json", self.feedback_prefix, Utc::now().timestamp_millis());
        let written = self
            .store
            .put(&pathname, serde_json::to_string(points)?)
            .await?;

        for stale in self.feedback_blobs().await? {
            if stale.url != written.url {
                self.store.delete(&stale.url).await?;
            }
        }

        Ok(())
    }

    async fn read_rounds(&self) -> Result<Vec<FeedbackRound>, StorageError> {
        let blobs = self.store.list(&self.rounds_prefix).await?;
        let mut rounds: Vec<FeedbackRound> = Vec::new();

        for blob in blobs
            .iter()
            .filter(|blob| blob.pathname.starts_with(self.rounds_prefix.as_str()))
        {
            let parsed = self
                .store
                .fetch(blob)
                .await
                .and_then(|body| serde_json::from_str(&body).map_err(StorageError::from));

            match parsed {
                Ok(round) => rounds.push(round),
                Err(e) => error!("Failed to fetch round {}: {e}", blob.pathname),
            }
        }

        sort_newest_first(&mut rounds);
        Ok(rounds)
    }
}

#[async_trait]
impl<B: BlobStore> FeedbackStore for BlobStorage<B> {
    async fn get_feedback(&self, page: Option<&str>) -> Result<Vec<FeedbackPoint>, StorageError> {
        let all = self.read_feedback().await?;
        Ok(filter_page(all, page))
    }

    async fn save_feedback(&self, point: FeedbackPoint) -> Result<FeedbackPoint, StorageError> {
        let mut all = self.read_feedback().await?;

        all.push(point.clone());
        self.write_feedback(&all).await?;

        Ok(point)
    }

    async fn update_feedback(
        &self,
        id: &str,
        patch: FeedbackPatch,
    ) -> Result<Option<FeedbackPoint>, StorageError> {
        let mut all = self.read_feedback().await?;

        let Some(index) = position_of(&all, id, |p| p.id.as_str()) else {
            return Ok(None);
        };

        patch.apply(&mut all[index]);
        self.write_feedback(&all).await?;

        Ok(Some(all.swap_remove(index)))
    }

    async fn delete_feedback(&self, id: &str) -> Result<bool, StorageError> {
        let mut all = self.read_feedback().await?;

        let Some(index) = position_of(&all, id, |p| p.id.as_str()) else {
            return Ok(false);
        };

        all.remove(index);
        self.write_feedback(&all).await?;

        Ok(true)
    }

    async fn get_rounds(&self, page: Option<&str>) -> Result<Vec<FeedbackRound>, StorageError> {
        let rounds = self.read_rounds().await?;
        Ok(filter_rounds(rounds, page))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    };

    use axum::{
        Json, Router,
        extract::{Path as AxumPath, Query, State},
        http::{HeaderMap, StatusCode},
        routing::{get, post, put},
    };
    use feedback::GeneralFeedback;
    use serde_json::Value;
    use tokio::net::TcpListener;

    use super::*;

    /// Keeps blobs in a list; urls are `mem://<pathname>`.
    #[derive(Default)]
    struct MemoryBlobStore {
        blobs: Mutex<Vec<(BlobObject, String)>>,
        clock: AtomicU64,
    }

    impl MemoryBlobStore {
        fn insert(&self, pathname: &str, body: &str) {
            let object = BlobObject {
                pathname: pathname.to_string(),
                url: format!("mem://{pathname}"),
                download_url: format!("mem://{pathname}?download=1"),
            };
            self.blobs.lock().unwrap().push((object, body.to_string()));
        }

        fn pathnames(&self) -> Vec<String> {
            self.blobs
                .lock()
                .unwrap()
                .iter()
                .map(|(blob, _)| blob.pathname.clone())
                .collect()
        }
    }

    #[async_trait]
    impl BlobStore for MemoryBlobStore {
        async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>, StorageError> {
            Ok(self
                .blobs
                .lock()
                .unwrap()
                .iter()
                .filter(|(blob, _)| blob.pathname.starts_with(prefix))
                .map(|(blob, _)| blob.clone())
                .collect())
        }

        async fn put(&self, pathname: &str, body: String) -> Result<BlobObject, StorageError> {
            // Saves inside one millisecond would collide on the real clock.
            let tick = self.clock.fetch_add(1, Ordering::SeqCst);
            let (prefix, _) = pathname.rsplit_once('-').unwrap();
            let pathname = format!("{prefix}-{}.json", 1_700_000_000_000 + tick);

            self.insert(&pathname, &body);
            Ok(self.list(&pathname).await?.remove(0))
        }

        async fn delete(&self, url: &str) -> Result<(), StorageError> {
            self.blobs.lock().unwrap().retain(|(blob, _)| blob.url != url);
            Ok(())
        }

        async fn fetch(&self, blob: &BlobObject) -> Result<String, StorageError> {
            self.blobs
                .lock()
                .unwrap()
                .iter()
                .find(|(stored, _)| stored.download_url == blob.download_url)
                .map(|(_, body)| body.clone())
                .ok_or(StorageError::BlobStatus(404))
        }
    }

    fn storage() -> BlobStorage<MemoryBlobStore> {
        BlobStorage::new(
            MemoryBlobStore::default(),
            "point-feedback",
            "point-feedback-rounds",
        )
    }

    fn point(id: &str, page: &str) -> FeedbackPoint {
        FeedbackPoint {
            id: id.to_string(),
            x: 75.0,
            y: 300.0,
            comment: "hero image is blurry".to_string(),
            page: page.to_string(),
            timestamp: "2024-09-09T09:09:09.000Z".to_string(),
            resolved: Some(false),
            resolution: None,
        }
    }

    #[tokio::test]
    async fn test_save_then_fetch() {
        let storage = storage();
        storage.save_feedback(point("a", "/")).await.unwrap();
        storage.save_feedback(point("b", "/team")).await.unwrap();

        let team = storage.get_feedback(Some("/team")).await.unwrap();
        assert_eq!(team, vec![point("b", "/team")]);
    }

    #[tokio::test]
    async fn test_single_feedback_blob_survives() {
        let storage = storage();
        for id in ["a", "b", "c"] {
            storage.save_feedback(point(id, "/")).await.unwrap();
        }

        let feedback_blobs: Vec<String> = storage
            .store
            .pathnames()
            .into_iter()
            .filter(|name| !name.starts_with("point-feedback-rounds"))
            .collect();

        assert_eq!(feedback_blobs.len(), 1);
        assert_eq!(storage.get_feedback(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_round_blobs_not_mistaken_for_points() {
        let storage = storage();
        let round = json!({
            "id": "r1", "name": "Review", "date": "2024-08-01", "status": "active",
            "items": [point("x", "/"), point("y", "/team")]
        });
        storage
            .store
            .insert("point-feedback-rounds-r1.json", &round.to_string());

        assert!(storage.get_feedback(None).await.unwrap().is_empty());

        storage.save_feedback(point("a", "/")).await.unwrap();
        assert!(
            storage
                .store
                .pathnames()
                .contains(&"point-feedback-rounds-r1.json".to_string())
        );

        let rounds = storage.get_rounds(Some("/team")).await.unwrap();
        assert_eq!(rounds.len(), 1);
        assert_eq!(rounds[0].items.len(), 1);
        assert_eq!(rounds[0].items[0].id, "y");
    }

    #[tokio::test]
    async fn test_broken_round_skipped() {
        let storage = storage();
        storage
            .store
            .insert("point-feedback-rounds-bad.json", "<html>oops</html>");
        storage.store.insert(
            "point-feedback-rounds-good.json",
            &json!({ "id": "g", "name": "Good", "date": "2024-01-01", "status": "completed" })
                .to_string(),
        );

        let rounds = storage.get_rounds(None).await.unwrap();
        assert_eq!(rounds.len(), 1);
        assert_eq!(rounds[0].id, "g");
    }

    #[tokio::test]
    async fn test_update_delete_unknown() {
        let storage = storage();
        storage.save_feedback(point("a", "/")).await.unwrap();

        assert!(!storage.delete_feedback("missing").await.unwrap());
        assert!(
            storage
                .update_feedback("missing", FeedbackPatch::default())
                .await
                .unwrap()
                .is_none()
        );

        let resolved = storage
            .update_feedback("a", FeedbackPatch::resolve(None))
            .await
            .unwrap()
            .unwrap();
        assert!(resolved.is_resolved());
    }

    #[tokio::test]
    async fn test_general_feedback_unsupported() {
        let storage = storage();
        let general = GeneralFeedback {
            id: "g".to_string(),
            comment: "c".to_string(),
            page: "/".to_string(),
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
            resolved: None,
            resolution: None,
            author: None,
        };

        assert!(matches!(
            storage.save_general_feedback(general).await,
            Err(StorageError::Unsupported)
        ));
        assert!(matches!(
            storage.get_general_feedback(None).await,
            Err(StorageError::Unsupported)
        ));
    }

    /// Blob API over HTTP, one blob per list page. Bodies are kept by pathname.
    #[derive(Default)]
    struct FakeBlobApi {
        base: String,
        blobs: Vec<(String, String)>,
        paged_lists: usize,
        deletes: usize,
    }

    type SharedApi = Arc<Mutex<FakeBlobApi>>;

    #[derive(Deserialize)]
    struct ListParams {
        prefix: String,
        cursor: Option<usize>,
    }

    #[derive(Deserialize)]
    struct DeleteBody {
        urls: Vec<String>,
    }

    const TOKEN: &str = "blob-token";

    fn object(base: &str, pathname: &str) -> Value {
        json!({
            "pathname": pathname,
            "url": format!("{base}/files/{pathname}"),
            "downloadUrl": format!("{base}/files/{pathname}?download=1"),
        })
    }

    fn authorized(headers: &HeaderMap) -> bool {
        let bearer = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        let version = headers.get("x-api-version").and_then(|v| v.to_str().ok());

        bearer == Some(format!("Bearer {TOKEN}").as_str()) && version == Some(API_VERSION)
    }

    async fn list_blobs(
        State(api): State<SharedApi>,
        headers: HeaderMap,
        Query(params): Query<ListParams>,
    ) -> Result<Json<Value>, StatusCode> {
        if !authorized(&headers) {
            return Err(StatusCode::UNAUTHORIZED);
        }

        let mut api = api.lock().unwrap();
        let start = params.cursor.unwrap_or(0);
        if start > 0 {
            api.paged_lists += 1;
        }

        let matching: Vec<&String> = api
            .blobs
            .iter()
            .map(|(pathname, _)| pathname)
            .filter(|pathname| pathname.starts_with(&params.prefix))
            .collect();
        let page: Vec<Value> = matching
            .iter()
            .skip(start)
            .take(1)
            .map(|pathname| object(&api.base, pathname))
            .collect();
        let has_more = start + 1 < matching.len();

        Ok(Json(json!({
            "blobs": page,
            "cursor": has_more.then(|| (start + 1).to_string()),
            "hasMore": has_more,
        })))
    }

    async fn put_blob(
        State(api): State<SharedApi>,
        headers: HeaderMap,
        AxumPath(pathname): AxumPath<String>,
        body: String,
    ) -> Result<Json<Value>, StatusCode> {
        if !authorized(&headers) {
            return Err(StatusCode::UNAUTHORIZED);
        }

        let mut api = api.lock().unwrap();
        match api.blobs.iter_mut().find(|(existing, _)| *existing == pathname) {
            Some((_, stored)) => *stored = body,
            None => api.blobs.push((pathname.clone(), body)),
        }

        Ok(Json(object(&api.base, &pathname)))
    }

    async fn delete_blobs(
        State(api): State<SharedApi>,
        headers: HeaderMap,
        Json(body): Json<DeleteBody>,
    ) -> StatusCode {
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED;
        }

        let mut api = api.lock().unwrap();
        let base = api.base.clone();
        api.blobs
            .retain(|(pathname, _)| !body.urls.contains(&format!("{base}/files/{pathname}")));
        api.deletes += 1;

        StatusCode::OK
    }

    async fn download(
        State(api): State<SharedApi>,
        AxumPath(pathname): AxumPath<String>,
    ) -> Result<String, StatusCode> {
        api.lock()
            .unwrap()
            .blobs
            .iter()
            .find(|(existing, _)| *existing == pathname)
            .map(|(_, body)| body.clone())
            .ok_or(StatusCode::NOT_FOUND)
    }

    async fn spawn_blob_api() -> (String, SharedApi) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let api: SharedApi = Arc::new(Mutex::new(FakeBlobApi {
            base: base.clone(),
            ..FakeBlobApi::default()
        }));

        let router = Router::new()
            .route("/api", get(list_blobs))
            .route("/api/delete", post(delete_blobs))
            .route("/api/{pathname}", put(put_blob))
            .route("/files/{pathname}", get(download))
            .with_state(api.clone());

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        (format!("{base}/api"), api)
    }

    #[tokio::test]
    async fn test_http_store_against_blob_api() {
        let (api_url, api) = spawn_blob_api().await;
        let round = json!({
            "id": "r1", "name": "Launch", "date": "2024-08-01", "status": "completed",
            "items": [point("x", "/")]
        });
        api.lock()
            .unwrap()
            .blobs
            .push(("point-feedback-rounds-launch.json".to_string(), round.to_string()));

        let storage = BlobStorage::new(
            HttpBlobStore::new(&api_url, TOKEN),
            "point-feedback",
            "point-feedback-rounds",
        );

        storage.save_feedback(point("a", "/")).await.unwrap();
        storage.save_feedback(point("b", "/team")).await.unwrap();
        assert_eq!(storage.get_feedback(None).await.unwrap().len(), 2);

        assert!(storage.delete_feedback("a").await.unwrap());
        assert_eq!(
            storage.get_feedback(None).await.unwrap(),
            vec![point("b", "/team")]
        );

        let rounds = storage.get_rounds(None).await.unwrap();
        assert_eq!(rounds.len(), 1);
        assert_eq!(rounds[0].id, "r1");

        let api = api.lock().unwrap();
        let point_blobs = api
            .blobs
            .iter()
            .filter(|(pathname, _)| storage.feedback_stamp(pathname).is_some())
            .count();
        assert_eq!(point_blobs, 1);
        assert!(api.paged_lists > 0);
        assert!(api.deletes > 0);
    }

    #[tokio::test]
    async fn test_http_store_rejected_token() {
        let (api_url, _api) = spawn_blob_api().await;
        let store = HttpBlobStore::new(&api_url, "wrong-token");

        assert!(matches!(
            store.list("point-feedback").await,
            Err(StorageError::BlobStatus(401))
        ));
        assert!(matches!(
            store.put("point-feedback-1.json", "[]".to_string()).await,
            Err(StorageError::BlobStatus(401))
        ));
    }

    #[tokio::test]
    async fn test_http_store_missing_download() {
        let (api_url, _api) = spawn_blob_api().await;
        let store = HttpBlobStore::new(&api_url, TOKEN);
        let missing = BlobObject {
            pathname: "point-feedback-1.json".to_string(),
            url: format!("{api_url}/gone"),
            download_url: api_url.replace("/api", "/files/point-feedback-1.json"),
        };

        assert!(matches!(
            store.fetch(&missing).await,
            Err(StorageError::BlobStatus(404))
        ));
    }
}
