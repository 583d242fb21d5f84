//! ARM Client
//!
//! Main client for Resource Manager, combining authentication, HTTP and the
//! generic resource operations every service client is built from.

use super::auth::AzureCredentials;
use super::http::{ArmHttpClient, ArmResponse};
use super::pager::Pager;
use super::poller::Poller;
use crate::resourceids::ResourceId;
use anyhow::{anyhow, bail, Context, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Public-cloud Resource Manager endpoint
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// How long-running operations are polled when the service gives no hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(60 * 60),
        }
    }
}

/// Main ARM client
#[derive(Clone, Debug)]
pub struct ArmClient {
    pub credentials: AzureCredentials,
    pub http: ArmHttpClient,
    endpoint: Url,
    pub subscription_id: String,
    pub poll_settings: PollSettings,
}

impl ArmClient {
    /// Create a client against the public cloud, credentials from the environment
    pub fn new(subscription_id: &str) -> Result<Self> {
        let credentials =
            AzureCredentials::from_env().context("Failed to initialize Azure credentials")?;
        Self::with_endpoint(DEFAULT_ENDPOINT, credentials, subscription_id)
    }

    /// Create a client against a specific Resource Manager endpoint
    pub fn with_endpoint(
        endpoint: &str,
        credentials: AzureCredentials,
        subscription_id: &str,
    ) -> Result<Self> {
        let mut endpoint =
            Url::parse(endpoint).with_context(|| format!("Invalid endpoint: {}", endpoint))?;
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        Ok(Self {
            credentials,
            http: ArmHttpClient::new()?,
            endpoint,
            subscription_id: subscription_id.to_string(),
            poll_settings: PollSettings::default(),
        })
    }

    pub fn with_poll_settings(mut self, poll_settings: PollSettings) -> Self {
        self.poll_settings = poll_settings;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// ID of the client's subscription
    pub fn subscription(&self) -> crate::resourceids::SubscriptionId {
        crate::resourceids::SubscriptionId::new(&self.subscription_id)
    }

    /// ID of a resource group in the client's subscription
    pub fn resource_group(&self, name: &str) -> crate::resourceids::ResourceGroupId {
        crate::resourceids::ResourceGroupId::new(&self.subscription_id, name)
    }

    /// Absolute URL for a resource path, with `api-version` appended
    pub fn url_for(&self, path: &str, api_version: &str) -> Result<String> {
        self.url_from_segments(path.split('/').filter(|s| !s.is_empty()), api_version)
    }

    /// Absolute URL for a resource ID plus optional trailing segments such as
    /// an action or a child collection. Every segment is percent-encoded.
    pub fn resource_url(
        &self,
        id: &impl ResourceId,
        suffix: &[&str],
        api_version: &str,
    ) -> Result<String> {
        let segments = id.path_segments();
        self.url_from_segments(segments.into_iter().chain(suffix.iter().copied()), api_version)
    }

    fn url_from_segments<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
        api_version: &str,
    ) -> Result<String> {
        let segments: Vec<&str> = segments.into_iter().collect();
        if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            bail!("Invalid resource path segment {:?} in {}", bad, segments.join("/"));
        }

        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Endpoint cannot carry a path: {}", self.endpoint))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url.to_string())
    }

    /// Send an authenticated request to an absolute URL
    pub async fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<ArmResponse> {
        let token = self.credentials.get_token().await?;
        self.http.send(method, url, &token, body).await
    }

    /// GET a resource and decode it
    pub async fn get<T: DeserializeOwned>(&self, id: &impl ResourceId, api_version: &str) -> Result<T> {
        let url = self.resource_url(id, &[], api_version)?;
        let response = self.send(Method::GET, &url, None).await?;
        serde_json::from_value(response.body).context("failure responding to request: decoding resource")
    }

    /// PUT a resource; the returned poller tracks provisioning
    pub async fn put<B: Serialize>(
        &self,
        id: &impl ResourceId,
        api_version: &str,
        body: &B,
    ) -> Result<Poller> {
        self.mutate(Method::PUT, id, api_version, Some(body)).await
    }

    /// PATCH a resource; the returned poller tracks provisioning
    pub async fn patch<B: Serialize>(
        &self,
        id: &impl ResourceId,
        api_version: &str,
        body: &B,
    ) -> Result<Poller> {
        self.mutate(Method::PATCH, id, api_version, Some(body)).await
    }

    /// DELETE a resource
    pub async fn delete(&self, id: &impl ResourceId, api_version: &str) -> Result<Poller> {
        self.mutate::<Value>(Method::DELETE, id, api_version, None).await
    }

    /// POST an action such as `start` or `listTestKeys` on a resource
    pub async fn post_action<B: Serialize>(
        &self,
        id: &impl ResourceId,
        action: &str,
        api_version: &str,
        body: Option<&B>,
    ) -> Result<Poller> {
        let resource_url = self.resource_url(id, &[], api_version)?;
        let url = self.resource_url(id, &[action], api_version)?;
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .context("failure preparing request: encoding body")?;

        tracing::info!("POST {} on {}", action, id.id());
        let response = self.send(Method::POST, &url, body.as_ref()).await?;
        Ok(Poller::from_response(self.clone(), &Method::POST, response, &resource_url))
    }

    /// List a child collection of `scope`, e.g. `secrets` under a profile
    pub fn list<T: DeserializeOwned>(
        &self,
        scope: &impl ResourceId,
        collection: &str,
        api_version: &str,
    ) -> Result<Pager<T>> {
        let collection: Vec<&str> = collection.split('/').filter(|s| !s.is_empty()).collect();
        let url = self.resource_url(scope, &collection, api_version)?;
        Ok(Pager::new(self.clone(), url))
    }

    async fn mutate<B: Serialize>(
        &self,
        method: Method,
        id: &impl ResourceId,
        api_version: &str,
        body: Option<&B>,
    ) -> Result<Poller> {
        let url = self.resource_url(id, &[], api_version)?;
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .context("failure preparing request: encoding body")?;

        tracing::info!("{} {}", method, id.id());
        let response = self.send(method.clone(), &url, body.as_ref()).await?;
        Ok(Poller::from_response(self.clone(), &method, response, &url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resourceids::ResourceGroupId;

    fn client(endpoint: &str) -> ArmClient {
        let creds = AzureCredentials::from_static_token("t").unwrap();
        ArmClient::with_endpoint(endpoint, creds, "sub-1").unwrap()
    }

    #[test]
    fn test_url_for_appends_api_version() {
        let client = client(DEFAULT_ENDPOINT);
        let url = client
            .url_for("/subscriptions/sub-1/resourceGroups/rg", "2024-02-01")
            .unwrap();
        assert_eq!(
            url,
            "https://management.azure.com/subscriptions/sub-1/resourceGroups/rg?api-version=2024-02-01"
        );
    }

    #[test]
    fn test_endpoint_with_path_prefix() {
        let client = client("http://127.0.0.1:8080/arm");
        let url = client.url_for("/subscriptions/s", "1").unwrap();
        assert_eq!(url, "http://127.0.0.1:8080/arm/subscriptions/s?api-version=1");
    }

    #[test]
    fn test_resource_url_escapes_values() {
        let client = client(DEFAULT_ENDPOINT);
        let base = "https://management.azure.com/subscriptions/s/resourceGroups/rg/providers/Microsoft.Cdn/profiles/prof/secrets";

        let secret = |name: &str| crate::services::cdn::SecretId::new("s", "rg", "prof", name);
        assert_eq!(
            client.resource_url(&secret("a#b"), &[], "1").unwrap(),
            format!("{}/a%23b?api-version=1", base)
        );
        assert_eq!(
            client.resource_url(&secret("a?x=1"), &[], "1").unwrap(),
            format!("{}/a%3Fx=1?api-version=1", base)
        );
        assert_eq!(
            client.resource_url(&secret("50%off"), &[], "1").unwrap(),
            format!("{}/50%25off?api-version=1", base)
        );
        assert_eq!(
            client.resource_url(&secret("a/b"), &["start"], "1").unwrap(),
            format!("{}/a%2Fb/start?api-version=1", base)
        );
    }

    #[test]
    fn test_dot_segments_rejected() {
        let client = client(DEFAULT_ENDPOINT);
        let secret = crate::services::cdn::SecretId::new("s", "rg", "prof", "..");
        assert!(client.resource_url(&secret, &[], "1").is_err());
        assert!(client.url_for("/subscriptions/s/../x", "1").is_err());
        assert!(client
            .resource_url(&client.resource_group(""), &[], "1")
            .is_err());
    }

    #[test]
    fn test_invalid_endpoint() {
        let creds = AzureCredentials::from_static_token("t").unwrap();
        assert!(ArmClient::with_endpoint("not a url", creds, "s").is_err());
    }

    #[test]
    fn test_scope_helpers() {
        let client = client(DEFAULT_ENDPOINT);
        assert_eq!(client.subscription().id(), "/subscriptions/sub-1");
        assert_eq!(
            client.resource_group("rg"),
            ResourceGroupId::new("sub-1", "rg")
        );
        assert_eq!(client.poll_settings, PollSettings::default());
    }
}
