//! Record store accessor: pass-through to the identity/storage collaborator.
//!
//! One configured `StoreClient` is constructed at process start and shared by
//! every component (no ambient global). Rows are read and written verbatim;
//! all query semantics (filtering, ordering, row-level ownership) live in the
//! collaborator's table API. Ownership-checked mutations are expressed as a
//! single conditional write — the owner id sits in the write predicate — so
//! there is no read-then-write race window.

pub mod analyses;
pub mod auth;
pub mod events;
pub mod objects;
pub mod records;

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::config::StorageConfig;
use crate::error::KudosError;

pub use auth::Session;

const MAX_RESPONSE_BYTES: usize = 2 * 1024 * 1024; // 2MB

const SERVICE: &str = "storage";

/// Query floor for "all-time" record scans. Far enough back to predate any
/// real journal.
pub const EPOCH_FLOOR: &str = "2000-01-01";

pub struct StoreClient {
    client: Client,
    config: StorageConfig,
}

impl StoreClient {
    pub fn new(config: StorageConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(4)
            .build()
            .expect("failed to build HTTP client");

        Self { client, config }
    }

    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.config.base_url)
    }

    pub(crate) fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{endpoint}", self.config.base_url)
    }

    pub(crate) fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{bucket}/{path}", self.config.base_url)
    }

    pub(crate) fn public_object_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{bucket}/{path}",
            self.config.base_url
        )
    }

    /// Attach the collaborator's api key plus the session's bearer token
    /// (anon key when unauthenticated, e.g. sign-up/sign-in).
    pub(crate) fn authed(&self, req: RequestBuilder, session: Option<&Session>) -> RequestBuilder {
        let bearer = session
            .map(|s| s.access_token.as_str())
            .unwrap_or(&self.config.anon_key);
        req.header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {bearer}"))
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Send a request, triage the status, and return the capped body bytes.
    pub(crate) async fn send(&self, req: RequestBuilder) -> Result<Vec<u8>, KudosError> {
        let response = req.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(KudosError::RateLimited {
                service: SERVICE.to_string(),
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(KudosError::AuthFailed {
                service: SERVICE.to_string(),
                message: format!("{status}"),
            });
        }

        // Catch-all for any non-success status. Cap error body reads to
        // MAX_RESPONSE_BYTES to prevent memory exhaustion.
        if !status.is_success() {
            let error_bytes = response.bytes().await.unwrap_or_default();
            let truncated = &error_bytes[..error_bytes.len().min(MAX_RESPONSE_BYTES)];
            let text = String::from_utf8_lossy(truncated);
            return Err(KudosError::Upstream {
                service: SERVICE.to_string(),
                message: format!("{status}: {text}"),
                status: Some(status.as_u16()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| KudosError::Upstream {
            service: SERVICE.to_string(),
            message: format!("failed to read response body: {e}"),
            status: None,
        })?;

        if bytes.len() > MAX_RESPONSE_BYTES {
            return Err(KudosError::Upstream {
                service: SERVICE.to_string(),
                message: format!(
                    "response too large: {} bytes (max {})",
                    bytes.len(),
                    MAX_RESPONSE_BYTES
                ),
                status: None,
            });
        }

        Ok(bytes.to_vec())
    }

    /// Send a request and deserialize the JSON body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
    ) -> Result<T, KudosError> {
        let bytes = self.send(req).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| KudosError::SchemaParse(format!("failed to parse response: {e}")))
    }
}
