//! HTTP backend client
//!
//! Thin reqwest wrapper over the Medifast REST API. All paths live under
//! `/api`; a bearer token is attached when the session has one.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use shared::{Availability, Medication, PickupRecord, PickupRequest};

// ============================================================================
// Backend Trait
// ============================================================================

/// The backend surface the stores depend on.
///
/// [`HttpClient`] is the production implementation; tests substitute
/// in-process fakes.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Full medication catalog
    async fn medications(&self) -> ApiResult<Vec<Medication>>;

    /// All stock rows
    async fn availability(&self) -> ApiResult<Vec<Availability>>;

    /// Stock rows for one medication
    async fn availability_by_medication(&self, medication_id: i64)
    -> ApiResult<Vec<Availability>>;

    /// Atomic batch creation of pickup records
    async fn create_pickup_batch(
        &self,
        requests: &[PickupRequest],
    ) -> ApiResult<Vec<PickupRecord>>;
}

#[async_trait]
impl<T: Backend + ?Sized> Backend for std::sync::Arc<T> {
    async fn medications(&self) -> ApiResult<Vec<Medication>> {
        (**self).medications().await
    }

    async fn availability(&self) -> ApiResult<Vec<Availability>> {
        (**self).availability().await
    }

    async fn availability_by_medication(
        &self,
        medication_id: i64,
    ) -> ApiResult<Vec<Availability>> {
        (**self).availability_by_medication(medication_id).await
    }

    async fn create_pickup_batch(
        &self,
        requests: &[PickupRequest],
    ) -> ApiResult<Vec<PickupRecord>> {
        (**self).create_pickup_batch(requests).await
    }
}

// ============================================================================
// HttpClient
// ============================================================================

/// Network client for the Medifast REST API.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl HttpClient {
    /// Create a client from a configuration.
    pub fn new(config: &ClientConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_base: format!("{}/api", config.base_url.trim_end_matches('/')),
            token: config.token.clone(),
        }
    }

    /// Set the bearer token
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Current token, if any
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = format!("{}{}", self.api_base, path);
        let mut req = self.client.get(&url);

        if let Some(auth) = self.auth_header() {
            req = req.header(reqwest::header::AUTHORIZATION, auth);
        }

        let resp = req.send().await?;
        Self::handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let url = format!("{}{}", self.api_base, path);
        let mut req = self.client.post(&url).json(body);

        if let Some(auth) = self.auth_header() {
            req = req.header(reqwest::header::AUTHORIZATION, auth);
        }

        let resp = req.send().await?;
        Self::handle_response(resp).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = format!("{}{}", self.api_base, path);
        let mut req = self.client.post(&url);

        if let Some(auth) = self.auth_header() {
            req = req.header(reqwest::header::AUTHORIZATION, auth);
        }

        let resp = req.send().await?;
        Self::handle_response(resp).await
    }

    async fn put<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let url = format!("{}{}", self.api_base, path);
        let mut req = self.client.put(&url).json(body);

        if let Some(auth) = self.auth_header() {
            req = req.header(reqwest::header::AUTHORIZATION, auth);
        }

        let resp = req.send().await?;
        Self::handle_response(resp).await
    }

    /// Error bodies are `{"error": "..."}`; fall back to the raw text.
    fn error_message(text: String) -> String {
        serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
            .unwrap_or(text)
    }

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> ApiResult<T> {
        let status = resp.status();

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = Self::error_message(text);
            return match status {
                StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
                StatusCode::NOT_FOUND => Err(ApiError::NotFound(message)),
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    Err(ApiError::Validation(message))
                }
                _ => Err(ApiError::Internal(message)),
            };
        }

        resp.json().await.map_err(Into::into)
    }

    // ------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------

    /// `GET /medicamentos/:id`
    pub async fn medication(&self, id: i64) -> ApiResult<Medication> {
        self.get(&format!("/medicamentos/{}", id)).await
    }

    /// `GET /medicamentos/search` with optional name/kind/reference filters
    pub async fn search_medications(
        &self,
        name: &str,
        kind: &str,
        reference: &str,
    ) -> ApiResult<Vec<Medication>> {
        let mut params = Vec::new();
        if !name.is_empty() {
            params.push(("nombre", name));
        }
        if !kind.is_empty() {
            params.push(("tipo", kind));
        }
        if !reference.is_empty() {
            params.push(("referencia", reference));
        }

        let query: String = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        self.get(&format!("/medicamentos/search?{}", query)).await
    }

    // ------------------------------------------------------------------
    // Pickups (history views)
    // ------------------------------------------------------------------

    /// `GET /recolecciones`
    pub async fn pickups(&self) -> ApiResult<Vec<PickupRecord>> {
        self.get("/recolecciones").await
    }

    /// `GET /recolecciones/:id`
    pub async fn pickup(&self, id: i64) -> ApiResult<PickupRecord> {
        self.get(&format!("/recolecciones/{}", id)).await
    }

    /// `GET /recolecciones/usuario/:id`
    pub async fn pickups_by_user(&self, user_id: i64) -> ApiResult<Vec<PickupRecord>> {
        self.get(&format!("/recolecciones/usuario/{}", user_id)).await
    }

    /// `POST /recolecciones` - create a single pickup
    pub async fn create_pickup(&self, request: &PickupRequest) -> ApiResult<PickupRecord> {
        self.post("/recolecciones", request).await
    }

    /// `PUT /recolecciones/:id`
    pub async fn update_pickup(
        &self,
        id: i64,
        changes: &serde_json::Value,
    ) -> ApiResult<PickupRecord> {
        self.put(&format!("/recolecciones/{}", id), changes).await
    }

    /// `POST /recolecciones/:id/cancelar`
    pub async fn cancel_pickup(&self, id: i64) -> ApiResult<serde_json::Value> {
        self.post_empty(&format!("/recolecciones/{}/cancelar", id)).await
    }
}

#[async_trait]
impl Backend for HttpClient {
    async fn medications(&self) -> ApiResult<Vec<Medication>> {
        self.get("/medicamentos").await
    }

    async fn availability(&self) -> ApiResult<Vec<Availability>> {
        self.get("/disponibilidad").await
    }

    async fn availability_by_medication(
        &self,
        medication_id: i64,
    ) -> ApiResult<Vec<Availability>> {
        self.get(&format!("/disponibilidad/medicamento/{}", medication_id))
            .await
    }

    async fn create_pickup_batch(
        &self,
        requests: &[PickupRequest],
    ) -> ApiResult<Vec<PickupRecord>> {
        self.post("/recolecciones/batch", requests).await
    }
}
