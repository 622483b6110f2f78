use std::time::Duration;

use serde::Deserialize;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Ambient metadata service reachable from managed runtimes.
pub const DEFAULT_METADATA_ENDPOINT: &str = "http://metadata.google.internal";

/// Thin HTTP client for the instance metadata service, used to resolve the
/// owning project and ambient credentials when none are configured.
#[derive(Debug, Clone)]
pub struct MetadataClient {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub expires_in: u64,
    pub token_type: String,
}

impl MetadataClient {
    /// Create a client for the given metadata endpoint.
    pub fn new(endpoint: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build metadata client");
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Resolve the owning project id.
    pub async fn project_id(&self) -> Result<String, String> {
        let url = format!("{}/computeMetadata/v1/project/project-id", self.endpoint);
        let response = self
            .client
            .get(url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|error| format!("failed to query metadata service: {error}"))?
            .error_for_status()
            .map_err(|error| format!("metadata service rejected project lookup: {error}"))?;

        response
            .text()
            .await
            .map_err(|error| format!("failed to read project id: {error}"))
    }

    /// Fetch an access token for the default service account.
    pub async fn access_token(&self) -> Result<AccessToken, String> {
        let url = format!(
            "{}/computeMetadata/v1/instance/service-accounts/default/token",
            self.endpoint
        );
        let response = self
            .client
            .get(url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|error| format!("failed to query metadata service: {error}"))?
            .error_for_status()
            .map_err(|error| format!("metadata service rejected token lookup: {error}"))?;

        response
            .json()
            .await
            .map_err(|error| format!("failed to decode access token: {error}"))
    }
}
