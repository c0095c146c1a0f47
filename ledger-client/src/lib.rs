//! # Ledger Client SDK
//!
//! A typed Rust client for the Ledger API.

use ledger_types::{AccountSummary, PaymentHistory, PaymentResponse, TransferRequest};
use reqwest::Client;
use serde::de::DeserializeOwned;

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid base URL: {0}")]
    InvalidUrl(String),
}

/// Ledger API client.
pub struct LedgerClient {
    base_url: String,
    http: Client,
}

impl LedgerClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Checks if the API is healthy. A halted ledger reports false.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let resp = self.http.get(self.url(&["health"])?).send().await?;
        Ok(resp.status().is_success())
    }

    /// Lists all accounts.
    pub async fn list_accounts(&self) -> Result<Vec<AccountSummary>, ClientError> {
        self.get(self.url(&["api", "accounts"])?).await
    }

    /// Transfers `amount` minor units from one account to another.
    pub async fn transfer(
        &self,
        from: &str,
        to: &str,
        amount: i64,
    ) -> Result<PaymentResponse, ClientError> {
        let req = TransferRequest {
            from: from.to_string(),
            to: to.to_string(),
            amount,
        };
        self.post(self.url(&["api", "transfers"])?, &req).await
    }

    /// Gets the payments sent and received by an account.
    pub async fn payments(&self, identifier: &str) -> Result<PaymentHistory, ClientError> {
        self.get(self.url(&["api", "accounts", identifier, "payments"])?)
            .await
    }

    /// Joins path segments onto the base URL, escaping each one.
    fn url(&self, segments: &[&str]) -> Result<reqwest::Url, ClientError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: reqwest::Url) -> Result<T, ClientError> {
        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        url: reqwest::Url,
        body: &B,
    ) -> Result<T, ClientError> {
        let resp = self.http.post(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or(body);
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}
