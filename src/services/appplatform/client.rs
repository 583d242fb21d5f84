use super::constants::TestKeyType;
use super::ids::*;
use super::models::*;
use crate::arm::client::ArmClient;
use crate::arm::pager::Pager;
use crate::arm::poller::Poller;
use crate::resourceids::ResourceGroupId;
use anyhow::{Context, Result};
use serde_json::Value;

pub const API_VERSION: &str = "2024-01-01-preview";

/// Operations on Spring Apps services and their child resources
#[derive(Clone, Debug)]
pub struct AppPlatformClient {
    client: ArmClient,
}

impl AppPlatformClient {
    pub fn new(client: ArmClient) -> Self {
        Self { client }
    }

    // =========================================================================
    // Services
    // =========================================================================

    pub async fn get_service(&self, id: &SpringId) -> Result<ServiceResource> {
        self.client
            .get(id, API_VERSION)
            .await
            .context("appplatform.AppPlatformClient#ServicesGet")
    }

    pub fn list_services_by_resource_group(&self, id: &ResourceGroupId) -> Result<Pager<ServiceResource>> {
        self.client
            .list(id, "providers/Microsoft.AppPlatform/spring", API_VERSION)
            .context("appplatform.AppPlatformClient#ServicesList")
    }

    pub async fn list_test_keys(&self, id: &SpringId) -> Result<TestKeys> {
        let poller = self
            .client
            .post_action::<Value>(id, "listTestKeys", API_VERSION, None)
            .await
            .context("appplatform.AppPlatformClient#ServicesListTestKeys")?;
        test_keys(&poller)
    }

    pub async fn regenerate_test_key(&self, id: &SpringId, key_type: TestKeyType) -> Result<TestKeys> {
        let payload = RegenerateTestKeyRequestPayload { key_type };
        let poller = self
            .client
            .post_action(id, "regenerateTestKey", API_VERSION, Some(&payload))
            .await
            .context("appplatform.AppPlatformClient#ServicesRegenerateTestKey")?;
        test_keys(&poller)
    }

    // =========================================================================
    // Apps
    // =========================================================================

    pub async fn get_app(&self, id: &AppId) -> Result<AppResource> {
        self.client
            .get(id, API_VERSION)
            .await
            .context("appplatform.AppPlatformClient#AppsGet")
    }

    pub fn list_apps(&self, id: &SpringId) -> Result<Pager<AppResource>> {
        self.client
            .list(id, "apps", API_VERSION)
            .context("appplatform.AppPlatformClient#AppsList")
    }

    pub async fn create_or_update_app(&self, id: &AppId, app: &AppResource) -> Result<Poller> {
        self.client
            .put(id, API_VERSION, app)
            .await
            .context("appplatform.AppPlatformClient#AppsCreateOrUpdate")
    }

    pub async fn create_or_update_app_then_poll(
        &self,
        id: &AppId,
        app: &AppResource,
    ) -> Result<Option<AppResource>> {
        let poller = self.create_or_update_app(id, app).await?;
        wait_for(poller, "appplatform.AppPlatformClient#AppsCreateOrUpdate").await
    }

    pub async fn delete_app(&self, id: &AppId) -> Result<Poller> {
        self.client
            .delete(id, API_VERSION)
            .await
            .context("appplatform.AppPlatformClient#AppsDelete")
    }

    pub async fn delete_app_then_poll(&self, id: &AppId) -> Result<()> {
        let poller = self.delete_app(id).await?;
        wait_for::<Value>(poller, "appplatform.AppPlatformClient#AppsDelete").await?;
        Ok(())
    }

    // =========================================================================
    // Deployments
    // =========================================================================

    pub async fn get_deployment(&self, id: &DeploymentId) -> Result<DeploymentResource> {
        self.client
            .get(id, API_VERSION)
            .await
            .context("appplatform.AppPlatformClient#DeploymentsGet")
    }

    pub fn list_deployments(&self, id: &AppId) -> Result<Pager<DeploymentResource>> {
        self.client
            .list(id, "deployments", API_VERSION)
            .context("appplatform.AppPlatformClient#DeploymentsList")
    }

    pub async fn start_deployment(&self, id: &DeploymentId) -> Result<Poller> {
        self.client
            .post_action::<Value>(id, "start", API_VERSION, None)
            .await
            .context("appplatform.AppPlatformClient#DeploymentsStart")
    }

    pub async fn start_deployment_then_poll(&self, id: &DeploymentId) -> Result<()> {
        let poller = self.start_deployment(id).await?;
        wait_for::<Value>(poller, "appplatform.AppPlatformClient#DeploymentsStart").await?;
        Ok(())
    }

    pub async fn stop_deployment(&self, id: &DeploymentId) -> Result<Poller> {
        self.client
            .post_action::<Value>(id, "stop", API_VERSION, None)
            .await
            .context("appplatform.AppPlatformClient#DeploymentsStop")
    }

    pub async fn stop_deployment_then_poll(&self, id: &DeploymentId) -> Result<()> {
        let poller = self.stop_deployment(id).await?;
        wait_for::<Value>(poller, "appplatform.AppPlatformClient#DeploymentsStop").await?;
        Ok(())
    }

    // =========================================================================
    // Storages
    // =========================================================================

    pub async fn get_storage(&self, id: &StorageId) -> Result<StorageResource> {
        self.client
            .get(id, API_VERSION)
            .await
            .context("appplatform.AppPlatformClient#StoragesGet")
    }

    pub fn list_storages(&self, id: &SpringId) -> Result<Pager<StorageResource>> {
        self.client
            .list(id, "storages", API_VERSION)
            .context("appplatform.AppPlatformClient#StoragesList")
    }

    pub async fn create_or_update_storage(
        &self,
        id: &StorageId,
        storage: &StorageResource,
    ) -> Result<Poller> {
        self.client
            .put(id, API_VERSION, storage)
            .await
            .context("appplatform.AppPlatformClient#StoragesCreateOrUpdate")
    }

    pub async fn delete_storage(&self, id: &StorageId) -> Result<Poller> {
        self.client
            .delete(id, API_VERSION)
            .await
            .context("appplatform.AppPlatformClient#StoragesDelete")
    }

    // =========================================================================
    // Certificates
    // =========================================================================

    pub async fn get_certificate(&self, id: &CertificateId) -> Result<CertificateResource> {
        self.client
            .get(id, API_VERSION)
            .await
            .context("appplatform.AppPlatformClient#CertificatesGet")
    }

    pub fn list_certificates(&self, id: &SpringId) -> Result<Pager<CertificateResource>> {
        self.client
            .list(id, "certificates", API_VERSION)
            .context("appplatform.AppPlatformClient#CertificatesList")
    }

    pub async fn create_or_update_certificate(
        &self,
        id: &CertificateId,
        certificate: &CertificateResource,
    ) -> Result<Poller> {
        self.client
            .put(id, API_VERSION, certificate)
            .await
            .context("appplatform.AppPlatformClient#CertificatesCreateOrUpdate")
    }

    pub async fn delete_certificate(&self, id: &CertificateId) -> Result<Poller> {
        self.client
            .delete(id, API_VERSION)
            .await
            .context("appplatform.AppPlatformClient#CertificatesDelete")
    }

    // =========================================================================
    // Customized accelerators
    // =========================================================================

    pub async fn get_customized_accelerator(
        &self,
        id: &CustomizedAcceleratorId,
    ) -> Result<CustomizedAcceleratorResource> {
        self.client
            .get(id, API_VERSION)
            .await
            .context("appplatform.AppPlatformClient#CustomizedAcceleratorsGet")
    }

    pub fn list_customized_accelerators(
        &self,
        id: &ApplicationAcceleratorId,
    ) -> Result<Pager<CustomizedAcceleratorResource>> {
        self.client
            .list(id, "customizedAccelerators", API_VERSION)
            .context("appplatform.AppPlatformClient#CustomizedAcceleratorsList")
    }

    pub async fn create_or_update_customized_accelerator(
        &self,
        id: &CustomizedAcceleratorId,
        accelerator: &CustomizedAcceleratorResource,
    ) -> Result<Poller> {
        self.client
            .put(id, API_VERSION, accelerator)
            .await
            .context("appplatform.AppPlatformClient#CustomizedAcceleratorsCreateOrUpdate")
    }

    // =========================================================================
    // Gateways
    // =========================================================================

    pub async fn get_gateway(&self, id: &GatewayId) -> Result<GatewayResource> {
        self.client
            .get(id, API_VERSION)
            .await
            .context("appplatform.AppPlatformClient#GatewaysGet")
    }

    pub async fn create_or_update_gateway(
        &self,
        id: &GatewayId,
        gateway: &GatewayResource,
    ) -> Result<Poller> {
        self.client
            .put(id, API_VERSION, gateway)
            .await
            .context("appplatform.AppPlatformClient#GatewaysCreateOrUpdate")
    }
}

async fn wait_for<T: serde::de::DeserializeOwned>(
    mut poller: Poller,
    operation: &'static str,
) -> Result<Option<T>> {
    poller
        .wait()
        .await
        .with_context(|| format!("{}: polling for completion", operation))?;
    poller.result_as()
}

fn test_keys(poller: &Poller) -> Result<TestKeys> {
    poller
        .result_as::<TestKeys>()?
        .ok_or_else(|| anyhow::anyhow!("no test keys in response"))
}
