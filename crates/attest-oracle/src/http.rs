// HTTP transport to a remote oracle
//
// POST {address}/query with the query as JSON, expecting an AnswerEnvelope.
// POST {address}/sign with the filtered transaction, expecting a
// TransactionSignature. 403 on sign means the oracle refused.

use std::time::Duration;

use async_trait::async_trait;
use attest_error::{OracleError, OracleResult};
use attest_ledger::{FilteredTransaction, Query, TransactionSignature};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::client::{AnswerEnvelope, OracleTransport};

/// Oracle reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpOracleTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpOracleTransport {
    /// Create a transport for the oracle at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a transport whose requests give up after `timeout`
    pub fn with_request_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Endpoint URL for `path`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> OracleResult<R>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        debug!(url = %url, "Posting to oracle");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| OracleError::unreachable(format!("{}: {}", url, e)))?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            let reason = response
                .text()
                .await
                .unwrap_or_else(|_| "no reason given".to_string());
            return Err(OracleError::refused(reason));
        }
        if !status.is_success() {
            return Err(OracleError::unreachable(format!("{} answered {}", url, status)));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| OracleError::unreachable(format!("malformed response from {}: {}", url, e)))
    }
}

#[async_trait]
impl OracleTransport for HttpOracleTransport {
    async fn query(&self, query: &Query) -> OracleResult<AnswerEnvelope> {
        self.post("query", query).await
    }

    async fn sign(&self, view: &FilteredTransaction) -> OracleResult<TransactionSignature> {
        self.post("sign", view).await
    }
}
