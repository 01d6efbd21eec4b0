//! HTTP client for the hosted backend platform.
//!
//! Two endpoint families are used: `rest/v1/rpc/{function}` for stored
//! procedures and `functions/v1/{name}` for hosted functions such as email.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::PlatformConfig;
use crate::{AppError, Result};

/// Thin authenticated client around [`reqwest::Client`].
#[derive(Clone)]
pub struct PlatformClient {
    http: Client,
    base_url: String,
    service_key: String,
}

impl PlatformClient {
    /// Build a client from platform configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the platform is not configured or the
    /// HTTP client cannot be built.
    pub fn new(config: &PlatformConfig) -> Result<Self> {
        if !config.is_configured() {
            return Err(AppError::Config("platform.url is not configured".into()));
        }
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| AppError::Config(format!("failed to build http client: {err}")))?;
        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_owned(),
            service_key: config.service_key.clone(),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Call a stored procedure and decode its JSON result.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Platform` on transport failure, a non-success
    /// status, or an undecodable body.
    pub async fn rpc<A, R>(&self, function: &str, args: &A) -> Result<R>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/rest/v1/rpc/{function}", self.base_url);
        debug!(%function, "calling platform rpc");
        self.post_json(&url, args).await
    }

    /// Invoke a hosted function, discarding any response body.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Platform` on transport failure or a non-success status.
    pub async fn invoke<A>(&self, name: &str, body: &A) -> Result<()>
    where
        A: Serialize + ?Sized,
    {
        let url = format!("{}/functions/v1/{name}", self.base_url);
        debug!(%name, "invoking platform function");
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(body)
            .send()
            .await?;
        ensure_success(&url, response).await.map(|_| ())
    }

    async fn post_json<A, R>(&self, url: &str, body: &A) -> Result<R>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(body)
            .send()
            .await?;
        let response = ensure_success(url, response).await?;
        response
            .json::<R>()
            .await
            .map_err(|err| AppError::Platform(format!("unexpected response from {url}: {err}")))
    }
}

async fn ensure_success(url: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Platform(describe_failure(url, status, &body)))
}

fn describe_failure(url: &str, status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("{url} returned {status}")
    } else {
        format!("{url} returned {status}: {body}")
    }
}
