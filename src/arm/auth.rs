//! Azure Authentication
//!
//! Resolves a bearer token for the Resource Manager audience from, in order:
//! a pre-issued token (`AZURE_ACCESS_TOKEN`), a service principal secret
//! (`AZURE_TENANT_ID` / `AZURE_CLIENT_ID` / `AZURE_CLIENT_SECRET`), or the
//! Azure CLI. The last two are `azure_identity` credentials.

use anyhow::{Context, Result};
use azure_core::credentials::{Secret, TokenCredential};
use azure_identity::{AzureCliCredential, ClientSecretCredential};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Scope requested for ARM tokens
pub const ARM_SCOPE: &str = "https://management.azure.com/.default";

/// Token expiry buffer - refresh tokens this much before they actually expire
/// This prevents using tokens that are about to expire during a request
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL if we can't determine expiry (conservative: 30 minutes)
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Where tokens come from
#[derive(Clone)]
enum TokenSource {
    /// A token issued elsewhere; never refreshed
    Static(String),
    ClientSecret {
        tenant_id: String,
        client_id: String,
        credential: Arc<dyn TokenCredential>,
    },
    AzureCli(Arc<dyn TokenCredential>),
}

impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Security: never print secrets
        match self {
            Self::Static(_) => f.write_str("Static(***)"),
            Self::ClientSecret {
                tenant_id,
                client_id,
                ..
            } => f
                .debug_struct("ClientSecret")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .finish_non_exhaustive(),
            Self::AzureCli(_) => f.write_str("AzureCli"),
        }
    }
}

/// Azure credentials holder with token caching
#[derive(Clone, Debug)]
pub struct AzureCredentials {
    source: TokenSource,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone, Debug)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    /// Check if this cached token is still valid
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

impl AzureCredentials {
    /// Pick a token source from the environment
    pub fn from_env() -> Result<Self> {
        if let Ok(token) = std::env::var("AZURE_ACCESS_TOKEN") {
            if !token.trim().is_empty() {
                tracing::debug!("Using access token from AZURE_ACCESS_TOKEN");
                return Self::from_static_token(token.trim());
            }
        }

        let tenant = std::env::var("AZURE_TENANT_ID").ok();
        let client = std::env::var("AZURE_CLIENT_ID").ok();
        let secret = std::env::var("AZURE_CLIENT_SECRET").ok();
        if let (Some(tenant_id), Some(client_id), Some(client_secret)) = (tenant, client, secret) {
            tracing::debug!("Using service principal {} in tenant {}", client_id, tenant_id);
            return Self::from_client_secret(&tenant_id, &client_id, &client_secret);
        }

        tracing::debug!("Falling back to Azure CLI credentials");
        Self::from_azure_cli()
    }

    /// Use a token obtained elsewhere
    pub fn from_static_token(token: &str) -> Result<Self> {
        Ok(Self::with_source(TokenSource::Static(token.to_string())))
    }

    /// Use a service principal secret
    pub fn from_client_secret(tenant_id: &str, client_id: &str, client_secret: &str) -> Result<Self> {
        if !is_valid_tenant(tenant_id) {
            return Err(anyhow::anyhow!("Invalid tenant ID format: {:?}", tenant_id));
        }
        let credential = ClientSecretCredential::new(
            tenant_id,
            client_id.to_string(),
            Secret::new(client_secret.to_string()),
            None,
        )
        .context("Failed to create client secret credential")?;

        Ok(Self::with_source(TokenSource::ClientSecret {
            tenant_id: tenant_id.to_string(),
            client_id: client_id.to_string(),
            credential,
        }))
    }

    /// Use whatever account `az login` signed in
    pub fn from_azure_cli() -> Result<Self> {
        let credential =
            AzureCliCredential::new(None).context("Failed to create Azure CLI credential")?;
        Ok(Self::with_source(TokenSource::AzureCli(credential)))
    }

    fn with_source(source: TokenSource) -> Self {
        Self {
            source,
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Get an access token for API calls
    /// Security: Checks token expiry before returning cached token
    pub async fn get_token(&self) -> Result<String> {
        let credential = match &self.source {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::ClientSecret { credential, .. } => credential,
            TokenSource::AzureCli(credential) => credential,
        };

        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let access = credential.get_token(&[ARM_SCOPE], None).await.map_err(|e| {
            anyhow::anyhow!(
                "Failed to get an ARM token ({}). Run 'az login' or set AZURE_ACCESS_TOKEN",
                e
            )
        })?;

        let remaining = access.expires_on - azure_core::time::OffsetDateTime::now_utc();
        let ttl = ttl_from_seconds(remaining.whole_seconds());
        let token = access.token.secret().to_string();
        let expires_at = Instant::now() + ttl.saturating_sub(TOKEN_EXPIRY_BUFFER);

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token.clone(),
                expires_at,
            });
        }

        tracing::debug!(
            "New token cached, expires in ~{} minutes",
            ttl.saturating_sub(TOKEN_EXPIRY_BUFFER).as_secs() / 60
        );

        Ok(token)
    }

    /// Force refresh the token
    pub async fn refresh_token(&self) -> Result<String> {
        {
            let mut cache = self.token_cache.write().await;
            *cache = None;
        }

        self.get_token().await
    }
}

/// Expiry reported by the credential, falling back when it is already past
fn ttl_from_seconds(seconds: i64) -> Duration {
    u64::try_from(seconds)
        .ok()
        .filter(|s| *s > 0)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TOKEN_TTL)
}

/// Tenant IDs are GUIDs or verified domain names
fn is_valid_tenant(tenant: &str) -> bool {
    !tenant.is_empty()
        && tenant.len() <= 253
        && tenant
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}
