//! Typhoon SDK client
//!
//! The privacy math (proofs, merkle membership, calldata construction) lives
//! entirely behind this boundary. The pipeline talks to a locally hosted SDK
//! sidecar over HTTP and treats every response as opaque. The SDK instance
//! is stateful: it is initialized with one record's secrets/nullifiers/pools
//! immediately before use, so calls must stay strictly serialized.

use async_trait::async_trait;
use serde_json::{json, Value};

#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    #[error("typhoon sdk unreachable at {url}: {reason}")]
    Unavailable { url: String, reason: String },

    #[error("sdk transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("sdk rejected {operation}: {message}")]
    Rejected {
        operation: &'static str,
        message: String,
    },

    #[error("sdk call `{operation}` timed out after {seconds}s")]
    Timeout {
        operation: &'static str,
        seconds: u64,
    },
}

/// The external SDK's call/return contract, the only surface the pipeline
/// depends on. Tests substitute a scripted implementation.
#[async_trait]
pub trait PrivacySdk: Send {
    /// Loads one record's privacy material into the SDK instance.
    async fn init(
        &mut self,
        secrets: &[String],
        nullifiers: &[String],
        pools: &[String],
    ) -> Result<(), SdkError>;

    /// Validates that the identifier is well-formed and resolvable without
    /// mutating chain state. The calldata itself is opaque to the pipeline.
    async fn get_withdraw_calldata(
        &mut self,
        identifier: &str,
        recipients: &[String],
    ) -> Result<Value, SdkError>;

    /// Executes the withdrawal; returns the transaction hash when the
    /// sidecar reports one.
    async fn withdraw(
        &mut self,
        identifier: &str,
        recipients: &[String],
    ) -> Result<Option<String>, SdkError>;
}

/// HTTP client for the Typhoon SDK sidecar.
pub struct TyphoonClient {
    http: reqwest::Client,
    base_url: String,
}

impl TyphoonClient {
    /// Connects and performs a reachability check so an unavailable SDK
    /// fails the run up front with a clear diagnostic instead of failing
    /// opaquely on the first record.
    pub async fn connect(base_url: &str) -> Result<Self, SdkError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::new();

        match http.get(format!("{}/health", base_url)).send().await {
            Ok(resp) if resp.status().is_success() => Ok(Self { http, base_url }),
            Ok(resp) => Err(SdkError::Unavailable {
                url: base_url,
                reason: format!("health check returned {}", resp.status()),
            }),
            Err(e) => Err(SdkError::Unavailable {
                url: base_url,
                reason: e.to_string(),
            }),
        }
    }

    async fn post(&self, operation: &'static str, body: Value) -> Result<Value, SdkError> {
        let resp = self
            .http
            .post(format!("{}/{}", self.base_url, operation))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SdkError::Rejected { operation, message });
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl PrivacySdk for TyphoonClient {
    async fn init(
        &mut self,
        secrets: &[String],
        nullifiers: &[String],
        pools: &[String],
    ) -> Result<(), SdkError> {
        self.post(
            "init",
            json!({
                "secrets": secrets,
                "nullifiers": nullifiers,
                "pools": pools,
            }),
        )
        .await?;
        Ok(())
    }

    async fn get_withdraw_calldata(
        &mut self,
        identifier: &str,
        recipients: &[String],
    ) -> Result<Value, SdkError> {
        self.post(
            "withdrawCalldata",
            json!({
                "identifier": identifier,
                "recipients": recipients,
            }),
        )
        .await
    }

    async fn withdraw(
        &mut self,
        identifier: &str,
        recipients: &[String],
    ) -> Result<Option<String>, SdkError> {
        let resp = self
            .post(
                "withdraw",
                json!({
                    "identifier": identifier,
                    "recipients": recipients,
                }),
            )
            .await?;
        Ok(resp
            .get("transactionHash")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}
