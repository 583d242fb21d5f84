use super::ids::{ProfileId, SecretId};
use super::models::Secret;
use crate::arm::client::ArmClient;
use crate::arm::pager::{Pager, Predicate};
use crate::arm::poller::Poller;
use anyhow::{Context, Result};

pub const API_VERSION: &str = "2024-02-01";

/// Operations on the secrets of a CDN profile
#[derive(Clone, Debug)]
pub struct SecretsClient {
    client: ArmClient,
}

impl SecretsClient {
    pub fn new(client: ArmClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, id: &SecretId) -> Result<Secret> {
        self.client
            .get(id, API_VERSION)
            .await
            .context("cdn.SecretsClient#Get")
    }

    /// Start creating (or replacing) a secret
    pub async fn create(&self, id: &SecretId, secret: &Secret) -> Result<Poller> {
        self.client
            .put(id, API_VERSION, secret)
            .await
            .context("cdn.SecretsClient#Create")
    }

    /// Create a secret and wait for provisioning to finish
    pub async fn create_then_poll(&self, id: &SecretId, secret: &Secret) -> Result<Option<Secret>> {
        let mut poller = self.create(id, secret).await?;
        poller
            .wait()
            .await
            .context("cdn.SecretsClient#Create: polling after Create")?;
        poller.result_as()
    }

    pub async fn delete(&self, id: &SecretId) -> Result<Poller> {
        self.client
            .delete(id, API_VERSION)
            .await
            .context("cdn.SecretsClient#Delete")
    }

    pub async fn delete_then_poll(&self, id: &SecretId) -> Result<()> {
        let mut poller = self.delete(id).await?;
        poller
            .wait()
            .await
            .context("cdn.SecretsClient#Delete: polling after Delete")
    }

    pub fn list_by_profile(&self, id: &ProfileId) -> Result<Pager<Secret>> {
        self.client
            .list(id, "secrets", API_VERSION)
            .context("cdn.SecretsClient#ListByProfile")
    }

    /// Every secret on the profile, all pages
    pub async fn list_by_profile_complete(&self, id: &ProfileId) -> Result<Vec<Secret>> {
        self.list_by_profile(id)?
            .collect_all()
            .await
            .context("cdn.SecretsClient#ListByProfile")
    }

    pub async fn list_by_profile_complete_matching_predicate<P: Predicate<Secret>>(
        &self,
        id: &ProfileId,
        predicate: P,
    ) -> Result<Vec<Secret>> {
        self.list_by_profile(id)?
            .collect_matching(predicate)
            .await
            .context("cdn.SecretsClient#ListByProfile")
    }
}
