crate::resource_id! {
    /// A Spring Apps service instance
    pub struct SpringId("Spring") under "Microsoft.AppPlatform" {
        "spring" => spring_name,
    }
}

crate::resource_id! {
    pub struct AppId("App") under "Microsoft.AppPlatform" {
        "spring" => spring_name,
        "apps" => app_name,
    }
}

crate::resource_id! {
    pub struct DeploymentId("Deployment") under "Microsoft.AppPlatform" {
        "spring" => spring_name,
        "apps" => app_name,
        "deployments" => deployment_name,
    }
}

crate::resource_id! {
    pub struct StorageId("Storage") under "Microsoft.AppPlatform" {
        "spring" => spring_name,
        "storages" => storage_name,
    }
}

crate::resource_id! {
    pub struct CertificateId("Certificate") under "Microsoft.AppPlatform" {
        "spring" => spring_name,
        "certificates" => certificate_name,
    }
}

crate::resource_id! {
    pub struct ApplicationAcceleratorId("Application Accelerator") under "Microsoft.AppPlatform" {
        "spring" => spring_name,
        "applicationAccelerators" => application_accelerator_name,
    }
}

crate::resource_id! {
    pub struct CustomizedAcceleratorId("Customized Accelerator") under "Microsoft.AppPlatform" {
        "spring" => spring_name,
        "applicationAccelerators" => application_accelerator_name,
        "customizedAccelerators" => customized_accelerator_name,
    }
}

crate::resource_id! {
    pub struct GatewayId("Gateway") under "Microsoft.AppPlatform" {
        "spring" => spring_name,
        "gateways" => gateway_name,
    }
}

impl AppId {
    pub fn spring(&self) -> SpringId {
        SpringId::new(&self.subscription_id, &self.resource_group_name, &self.spring_name)
    }

    pub fn deployment(&self, deployment_name: impl Into<String>) -> DeploymentId {
        DeploymentId::new(
            &self.subscription_id,
            &self.resource_group_name,
            &self.spring_name,
            &self.app_name,
            deployment_name,
        )
    }
}

impl DeploymentId {
    pub fn app(&self) -> AppId {
        AppId::new(
            &self.subscription_id,
            &self.resource_group_name,
            &self.spring_name,
            &self.app_name,
        )
    }
}

impl SpringId {
    pub fn app(&self, app_name: impl Into<String>) -> AppId {
        AppId::new(
            &self.subscription_id,
            &self.resource_group_name,
            &self.spring_name,
            app_name,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resourceids::{IdError, ResourceId};

    const DEPLOYMENT: &str = "/subscriptions/12345678-1234-9876-4563-123456789012/resourceGroups/example-resource-group/providers/Microsoft.AppPlatform/spring/springValue/apps/appValue/deployments/deploymentValue";

    #[test]
    fn test_deployment_id() {
        let id = DeploymentId::parse(DEPLOYMENT).unwrap();
        assert_eq!(id.spring_name, "springValue");
        assert_eq!(id.app_name, "appValue");
        assert_eq!(id.deployment_name, "deploymentValue");
        assert_eq!(id.app().deployment("deploymentValue"), id);
        assert_eq!(id.app().spring().app("appValue"), id.app());
    }

    #[test]
    fn test_missing_deployment_name() {
        let input = DEPLOYMENT.trim_end_matches("/deploymentValue");
        let err = DeploymentId::parse(input).unwrap_err();
        match err {
            IdError::MissingSegment {
                segment, position, ..
            } => {
                assert_eq!(segment, "deployment_name");
                assert_eq!(position, 11);
            },
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_customized_accelerator_id() {
        let id = CustomizedAcceleratorId::new("sub", "rg", "spring1", "default", "acc1");
        let formatted = id.id();
        assert_eq!(
            formatted,
            "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.AppPlatform/spring/spring1/applicationAccelerators/default/customizedAccelerators/acc1"
        );
        assert_eq!(CustomizedAcceleratorId::parse(&formatted).unwrap(), id);
        assert!(CustomizedAcceleratorId::validate(&formatted.to_lowercase()).is_err());
        assert_eq!(
            CustomizedAcceleratorId::parse_insensitively(&formatted.replace("applicationAccelerators", "applicationaccelerators"))
                .unwrap(),
            id
        );
    }

    #[test]
    fn test_describe_gateway() {
        let id = GatewayId::new("sub", "rg", "spring1", "default");
        let described = id.describe();
        assert!(described.starts_with("Gateway ("));
        assert!(described.contains("Gateway Name: \"default\""));
    }
}
