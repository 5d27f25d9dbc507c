//! HTTP client for one ShotGrid site.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use notebridge_core::error::RemoteError;
use notebridge_core::remote::{FindQuery, ReviewSystem};
use notebridge_core::types::{EntityId, Record};

use crate::auth::{AccessTokenResponse, CachedToken, ScriptCredentials};
use crate::entity;
use crate::error::ShotgridError;

/// Content type selecting the `[field, relation, value]` filter syntax.
const ARRAY_FILTER_CONTENT_TYPE: &str = "application/vnd+shotgun.api3_array+json";

/// REST API v1 client authenticated as an API script.
pub struct ShotgridClient {
    client: reqwest::Client,
    base_url: String,
    credentials: ScriptCredentials,
    token: Mutex<Option<CachedToken>>,
}

impl ShotgridClient {
    /// * `site_url` - e.g. `https://studio.shotgunstudio.com`.
    pub fn new(site_url: &str, credentials: ScriptCredentials) -> Self {
        Self::with_client(reqwest::Client::new(), site_url, credentials)
    }

    pub fn with_client(
        client: reqwest::Client,
        site_url: &str,
        credentials: ScriptCredentials,
    ) -> Self {
        Self {
            client,
            base_url: format!("{}/api/v1", site_url.trim_end_matches('/')),
            credentials,
            token: Mutex::new(None),
        }
    }

    /// Search `entity_type` records.
    ///
    /// Sends `POST /entity/{collection}/_search` with array filters, one
    /// request per page, and returns every page's records.
    pub async fn search(
        &self,
        entity_type: &str,
        query: &FindQuery,
    ) -> Result<Vec<Record>, ShotgridError> {
        let url = format!("{}/entity/{}/_search", self.base_url, entity::collection(entity_type)?);
        let token = self.access_token().await?;

        let records = entity::collect_pages(query, |body| self.search_page(&url, &token, body)).await?;
        tracing::debug!(entity_type, count = records.len(), "ShotGrid search");
        Ok(records)
    }

    async fn search_page(&self, url: &str, token: &str, body: Value) -> Result<Vec<Record>, ShotgridError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, ARRAY_FILTER_CONTENT_TYPE)
            .header(reqwest::header::ACCEPT, "application/json")
            .body(body.to_string())
            .send()
            .await?;

        let envelope: Value = Self::parse_response(response).await?;
        entity::flatten_list(envelope)
    }

    /// Create a record via `POST /entity/{collection}`.
    pub async fn create_record(
        &self,
        entity_type: &str,
        data: &Record,
    ) -> Result<Record, ShotgridError> {
        let url = format!("{}/entity/{}", self.base_url, entity::collection(entity_type)?);
        let token = self.access_token().await?;

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(data)
            .send()
            .await?;

        let envelope: Value = Self::parse_response(response).await?;
        let record = entity::flatten(entity::data(envelope)?)?;
        tracing::debug!(entity_type, id = ?record.get("id"), "ShotGrid record created");
        Ok(record)
    }

    /// Update fields via `PUT /entity/{collection}/{id}`.
    pub async fn update_record(
        &self,
        entity_type: &str,
        id: EntityId,
        data: &Record,
    ) -> Result<Record, ShotgridError> {
        let url = format!("{}/entity/{}/{}", self.base_url, entity::collection(entity_type)?, id);
        let token = self.access_token().await?;

        let response = self
            .client
            .put(url)
            .bearer_auth(token)
            .json(data)
            .send()
            .await?;

        let envelope: Value = Self::parse_response(response).await?;
        entity::flatten(entity::data(envelope)?)
    }

    /// Current bearer token, exchanging the script credentials when the
    /// cached one is missing or about to expire.
    async fn access_token(&self) -> Result<String, ShotgridError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Instant::now())) {
            return Ok(token.value.clone());
        }

        let response = self
            .client
            .post(format!("{}/auth/access_token", self.base_url))
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&self.credentials.token_form())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ShotgridError::Auth(format!("{}: {body}", status.as_u16())));
        }

        let issued: AccessTokenResponse = response.json().await?;
        let token = CachedToken::issued(issued, Instant::now());
        let value = token.value.clone();
        *cached = Some(token);
        tracing::info!(script = %self.credentials.script_name, "ShotGrid access token refreshed");
        Ok(value)
    }

    // ---- private helpers ----

    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ShotgridError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ShotgridError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ShotgridError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ReviewSystem for ShotgridClient {
    async fn find(&self, entity_type: &str, query: FindQuery) -> Result<Vec<Record>, RemoteError> {
        Ok(self.search(entity_type, &query).await?)
    }

    async fn create(&self, entity_type: &str, data: Record) -> Result<Record, RemoteError> {
        Ok(self.create_record(entity_type, &data).await?)
    }

    async fn update(
        &self,
        entity_type: &str,
        id: EntityId,
        data: Record,
    ) -> Result<Record, RemoteError> {
        Ok(self.update_record(entity_type, id, &data).await?)
    }
}
