//! HTTP client for the cloud REST store.
//!
//! The store is consumed through a narrow surface: batched upserts keyed by
//! row id (`Prefer: resolution=merge-duplicates`) and equality/greater-than
//! filters in the query string. There is no RPC layer.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

use pocketledger_core::settings::Settings;
use pocketledger_core::sync::RemoteStore;
use pocketledger_core::time;
use pocketledger_core::transactions::Transaction;

use crate::error::{RemoteStoreError, Result};
use crate::types::{ApiErrorResponse, SettingsRow, TransactionRow};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;

#[derive(Debug, Clone)]
pub struct RemoteStoreClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

impl RemoteStoreClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            access_token: None,
        })
    }

    /// Attach the signed-in user's access token; without one, requests run
    /// under the anonymous key and the server's row policies reject them.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let api_key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| RemoteStoreError::auth("Invalid API key format"))?;
        headers.insert("apikey", api_key);

        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        let auth = HeaderValue::from_str(&format!("Bearer {bearer}"))
            .map_err(|_| RemoteStoreError::auth("Invalid access token format"))?;
        headers.insert(AUTHORIZATION, auth);
        Ok(headers)
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("[Sync] API response status: {status}");
            return;
        }
        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("[Sync] API response error ({status}): {preview}");
    }

    fn status_error(status: reqwest::StatusCode, body: &str) -> RemoteStoreError {
        if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(body) {
            return RemoteStoreError::api(
                status.as_u16(),
                format!("{}: {}", error.code, error.message),
            );
        }
        RemoteStoreError::api(status.as_u16(), format!("Request failed: {body}"))
    }

    /// Check the status of a write response; bodies are ignored on success.
    async fn ensure_success(response: reqwest::Response) -> Result<()> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::status_error(status, &body))
        }
    }

    async fn parse_rows<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);
        if !status.is_success() {
            return Err(Self::status_error(status, &body));
        }
        serde_json::from_str(&body).map_err(|e| {
            RemoteStoreError::api(status.as_u16(), format!("Failed to parse response: {e}"))
        })
    }

    async fn upsert_transaction_rows(&self, rows: Vec<TransactionRow>) -> Result<()> {
        let response = self
            .client
            .post(self.table_url("transactions"))
            .headers(self.headers()?)
            .header("Prefer", "resolution=merge-duplicates")
            .json(&rows)
            .send()
            .await?;
        Self::ensure_success(response).await
    }

    async fn select_transaction_rows(
        &self,
        query: &[(&str, String)],
    ) -> Result<Vec<TransactionRow>> {
        let response = self
            .client
            .get(self.table_url("transactions"))
            .headers(self.headers()?)
            .query(query)
            .send()
            .await?;
        Self::parse_rows(response).await
    }
}

#[async_trait]
impl RemoteStore for RemoteStoreClient {
    async fn upsert_transactions(
        &self,
        rows: Vec<Transaction>,
    ) -> pocketledger_core::Result<()> {
        let rows: Vec<TransactionRow> = rows.into_iter().map(TransactionRow::from).collect();
        self.upsert_transaction_rows(rows)
            .await
            .map_err(pocketledger_core::Error::from)
    }

    async fn select_transactions(
        &self,
        user_id: &str,
    ) -> pocketledger_core::Result<Vec<Transaction>> {
        let rows = self
            .select_transaction_rows(&[
                ("user_id", format!("eq.{user_id}")),
                ("deleted", "eq.false".to_string()),
                ("order", "date.desc".to_string()),
            ])
            .await
            .map_err(pocketledger_core::Error::from)?;
        Ok(rows.into_iter().map(TransactionRow::into_domain).collect())
    }

    async fn select_transactions_updated_after(
        &self,
        user_id: &str,
        cursor_millis: i64,
    ) -> pocketledger_core::Result<Vec<Transaction>> {
        let cursor = time::epoch_millis_to_rfc3339(cursor_millis).ok_or_else(|| {
            pocketledger_core::Error::from(RemoteStoreError::invalid_request(format!(
                "cursor {cursor_millis} is out of range"
            )))
        })?;
        // soft-deleted rows are included so deletions propagate
        let rows = self
            .select_transaction_rows(&[
                ("user_id", format!("eq.{user_id}")),
                ("updated_at", format!("gt.{cursor}")),
            ])
            .await
            .map_err(pocketledger_core::Error::from)?;
        Ok(rows.into_iter().map(TransactionRow::into_domain).collect())
    }

    async fn delete_transaction(&self, user_id: &str, id: &str) -> pocketledger_core::Result<()> {
        let run = async {
            let response = self
                .client
                .delete(self.table_url("transactions"))
                .headers(self.headers()?)
                .query(&[
                    ("user_id", format!("eq.{user_id}")),
                    ("id", format!("eq.{id}")),
                ])
                .send()
                .await?;
            Self::ensure_success(response).await
        };
        run.await.map_err(pocketledger_core::Error::from)
    }

    async fn get_settings(&self, user_id: &str) -> pocketledger_core::Result<Option<Value>> {
        let run = async {
            let response = self
                .client
                .get(self.table_url("settings"))
                .headers(self.headers()?)
                .query(&[
                    ("user_id", format!("eq.{user_id}")),
                    ("limit", "1".to_string()),
                ])
                .send()
                .await?;
            let mut rows: Vec<Value> = Self::parse_rows(response).await?;
            Ok::<_, RemoteStoreError>(if rows.is_empty() {
                None
            } else {
                Some(rows.swap_remove(0))
            })
        };
        run.await.map_err(pocketledger_core::Error::from)
    }

    async fn upsert_settings(&self, settings: Settings) -> pocketledger_core::Result<()> {
        let run = async {
            let rows = vec![SettingsRow::from(settings)];
            let response = self
                .client
                .post(self.table_url("settings"))
                .headers(self.headers()?)
                .header("Prefer", "resolution=merge-duplicates")
                .json(&rows)
                .send()
                .await?;
            Self::ensure_success(response).await
        };
        run.await.map_err(pocketledger_core::Error::from)
    }
}
