use reqwest::header::CONTENT_TYPE;

use crate::analytics::BatchGetRequest;
use crate::auth::AccessToken;
use crate::config::ExportConfig;
use crate::error::Result;

/// Anything that can answer a `reports:batchGet` request with a raw json body.
#[allow(async_fn_in_trait)]
pub trait ReportSource {
    async fn batch_get(&self, request: &BatchGetRequest) -> Result<String>;
}

impl<T: ReportSource> ReportSource for &T {
    async fn batch_get(&self, request: &BatchGetRequest) -> Result<String> {
        (**self).batch_get(request).await
    }
}

/// Authenticated handle on the reporting API. Make one per process and reuse it.
#[derive(Debug)]
pub struct AnalyticsClient {
    http: reqwest::Client,
    endpoint: String,
    token: AccessToken,
}

impl AnalyticsClient {
    pub fn new(endpoint: impl Into<String>, token: AccessToken) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            token,
        }
    }

    /// Loads the credential named in the config and checks its scopes before any request goes out.
    pub fn connect(config: &ExportConfig) -> Result<Self> {
        let token = AccessToken::load(&config.credential_path, &config.scopes)?;
        Ok(Self::new(config.endpoint.clone(), token))
    }
}

impl ReportSource for AnalyticsClient {
    async fn batch_get(&self, request: &BatchGetRequest) -> Result<String> {
        let body = serde_json::to_string(request)?;
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.token.secret())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.text().await?)
    }
}
