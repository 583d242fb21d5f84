crate::open_enum! {
    /// Provisioning state of a Spring Apps service instance
    pub enum ProvisioningState {
        Creating = "Creating",
        Deleted = "Deleted",
        Deleting = "Deleting",
        Failed = "Failed",
        MoveFailed = "MoveFailed",
        Moved = "Moved",
        Moving = "Moving",
        Starting = "Starting",
        Stopping = "Stopping",
        Succeeded = "Succeeded",
        Updating = "Updating",
    }
}

crate::open_enum! {
    pub enum PowerState {
        Running = "Running",
        Stopped = "Stopped",
    }
}

crate::open_enum! {
    pub enum AppResourceProvisioningState {
        Creating = "Creating",
        Deleting = "Deleting",
        Failed = "Failed",
        Succeeded = "Succeeded",
        Updating = "Updating",
    }
}

crate::open_enum! {
    /// Deployments are never reported as deleting
    pub enum DeploymentResourceProvisioningState {
        Creating = "Creating",
        Failed = "Failed",
        Succeeded = "Succeeded",
        Updating = "Updating",
    }
}

crate::open_enum! {
    pub enum DeploymentResourceStatus {
        Running = "Running",
        Stopped = "Stopped",
    }
}

crate::open_enum! {
    pub enum CertificateResourceProvisioningState {
        Creating = "Creating",
        Deleting = "Deleting",
        Failed = "Failed",
        Succeeded = "Succeeded",
        Updating = "Updating",
    }
}

crate::open_enum! {
    pub enum CustomizedAcceleratorProvisioningState {
        Canceled = "Canceled",
        Creating = "Creating",
        Deleting = "Deleting",
        Failed = "Failed",
        Succeeded = "Succeeded",
        Updating = "Updating",
    }
}

crate::open_enum! {
    pub enum GatewayProvisioningState {
        Creating = "Creating",
        Deleting = "Deleting",
        Failed = "Failed",
        Succeeded = "Succeeded",
        Updating = "Updating",
    }
}

crate::open_enum! {
    pub enum HttpSchemeType {
        Http = "HTTP",
        Https = "HTTPS",
    }
}

crate::open_enum! {
    pub enum KeyVaultCertificateAutoSync {
        Disabled = "Disabled",
        Enabled = "Enabled",
    }
}

crate::open_enum! {
    pub enum CustomizedAcceleratorType {
        Accelerator = "Accelerator",
        Fragment = "Fragment",
    }
}

crate::open_enum! {
    pub enum SessionAffinity {
        Cookie = "Cookie",
        None = "None",
    }
}

crate::open_enum! {
    pub enum TestKeyType {
        Primary = "Primary",
        Secondary = "Secondary",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(HttpSchemeType::parse("https"), HttpSchemeType::Https);
        assert_eq!(HttpSchemeType::Https.as_str(), "HTTPS");
        assert_eq!(SessionAffinity::parse("NONE"), SessionAffinity::None);
        assert_eq!(ProvisioningState::parse("movefailed"), ProvisioningState::MoveFailed);
    }

    #[test]
    fn test_deployment_state_has_no_deleting() {
        let state = DeploymentResourceProvisioningState::parse("Deleting");
        assert!(!state.is_known());
        assert_eq!(state.as_str(), "Deleting");
        assert!(AppResourceProvisioningState::parse("Deleting").is_known());
    }

    #[test]
    fn test_only_accelerators_report_canceled() {
        assert_eq!(
            CustomizedAcceleratorProvisioningState::parse("canceled"),
            CustomizedAcceleratorProvisioningState::Canceled
        );
        assert!(!GatewayProvisioningState::parse("Canceled").is_known());
    }

    #[test]
    fn test_serde_uses_canonical_spelling() {
        let parsed: TestKeyType = serde_json::from_str(r#""secondary""#).unwrap();
        assert_eq!(parsed, TestKeyType::Secondary);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), r#""Secondary""#);
        assert_eq!(
            KeyVaultCertificateAutoSync::POSSIBLE_VALUES,
            &["Disabled", "Enabled"]
        );
    }
}
