//! Thin authenticated REST client for the data platform workspace.
//!
//! Shared by the statement-execution warehouse, the Files API volume, the
//! Unity Catalog access probe and the SCIM identity lookup.

use crate::config::DatabricksSettings;
use crate::error::{AppError, AppResult};
use bytes::Bytes;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

#[derive(Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl PlatformClient {
    pub fn new(settings: &DatabricksSettings) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self::with_client(http, &settings.host, &settings.token))
    }

    pub fn with_client(http: reqwest::Client, host: &str, token: &str) -> Self {
        let host = host.trim().trim_end_matches('/');
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };
        Self {
            http,
            base_url,
            token: token.to_string(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> AppResult<T> {
        debug!("GET {}", path);
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;
        Ok(Self::check(response).await?.json::<T>().await?)
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        debug!("POST {}", path);
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json::<T>().await?)
    }

    pub async fn put_bytes(&self, path: &str, query: &[(&str, &str)], body: Bytes) -> AppResult<()> {
        debug!("PUT {} ({} bytes)", path, body.len());
        let response = self
            .http
            .put(self.url(path))
            .bearer_auth(&self.token)
            .query(query)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Turns non-2xx answers into `AppError::Platform` carrying the body verbatim.
    async fn check(response: reqwest::Response) -> AppResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(AppError::Platform {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_hosts_get_an_https_scheme() {
        let client = PlatformClient::with_client(
            reqwest::Client::new(),
            "dbc-7d305f7c-9def.cloud.databricks.com/",
            "token",
        );
        assert_eq!(
            client.url("/api/2.0/sql/statements/"),
            "https://dbc-7d305f7c-9def.cloud.databricks.com/api/2.0/sql/statements/"
        );

        let local = PlatformClient::with_client(reqwest::Client::new(), "http://localhost:9000", "t");
        assert_eq!(local.url("api/x"), "http://localhost:9000/api/x");
    }
}
