use serde::{Deserialize, Serialize};

crate::open_enum! {
    /// Provisioning state of a Front Door resource
    pub enum AfdProvisioningState {
        Creating = "Creating",
        Deleting = "Deleting",
        Failed = "Failed",
        Succeeded = "Succeeded",
        Updating = "Updating",
    }
}

crate::open_enum! {
    pub enum DeploymentStatus {
        Failed = "Failed",
        InProgress = "InProgress",
        NotStarted = "NotStarted",
        Succeeded = "Succeeded",
    }
}

/// Reference to another ARM resource by ID
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ResourceReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<SecretProperties>,
}

crate::impl_arm_resource!(Secret);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_status: Option<DeploymentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<SecretParameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<AfdProvisioningState>,
}

crate::polymorphic! {
    /// What kind of secret is stored, keyed on `type`
    pub enum SecretParameters tagged "type" {
        UrlSigningKey(UrlSigningKeyParameters) = "UrlSigningKey",
        ManagedCertificate(ManagedCertificateParameters) = "ManagedCertificate",
        CustomerCertificate(CustomerCertificateParameters) = "CustomerCertificate",
        AzureFirstPartyManagedCertificate(AzureFirstPartyManagedCertificateParameters) = "AzureFirstPartyManagedCertificate",
    }
}

/// Key used to sign URLs, read from Key Vault
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlSigningKeyParameters {
    pub key_id: String,
    pub secret_source: ResourceReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_version: Option<String>,
}

/// Certificate issued and rotated by the service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedCertificateParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

/// Bring-your-own certificate stored in Key Vault
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCertificateParameters {
    pub secret_source: ResourceReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_latest_version: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_authority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_alternative_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbprint: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureFirstPartyManagedCertificateParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_source: Option<ResourceReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_authority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_alternative_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbprint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polymorphic::{decode, DecodeError};
    use serde_json::json;

    #[test]
    fn test_secret_decodes_known_parameters() {
        let secret: Secret = serde_json::from_value(json!({
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Cdn/profiles/p/secrets/s1",
            "name": "s1",
            "type": "Microsoft.Cdn/profiles/secrets",
            "properties": {
                "provisioningState": "Succeeded",
                "deploymentStatus": "NotStarted",
                "profileName": "p",
                "parameters": {
                    "type": "customercertificate",
                    "secretSource": {"id": "/kv/cert"},
                    "useLatestVersion": true,
                    "subjectAlternativeNames": ["a.example.com"]
                }
            }
        }))
        .unwrap();

        let props = secret.properties.unwrap();
        assert_eq!(props.provisioning_state, Some(AfdProvisioningState::Succeeded));
        assert_eq!(props.deployment_status, Some(DeploymentStatus::NotStarted));
        match props.parameters.unwrap() {
            SecretParameters::CustomerCertificate(cert) => {
                assert_eq!(cert.secret_source, ResourceReference::new("/kv/cert"));
                assert_eq!(cert.use_latest_version, Some(true));
            },
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_parameters_encode_with_discriminator() {
        let params = SecretParameters::from(UrlSigningKeyParameters {
            key_id: "key1".to_string(),
            secret_source: ResourceReference::new("/kv/secret"),
            secret_version: None,
        });
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"type": "UrlSigningKey", "keyId": "key1", "secretSource": {"id": "/kv/secret"}})
        );

        let managed = SecretParameters::ManagedCertificate(ManagedCertificateParameters::default());
        assert_eq!(
            serde_json::to_value(&managed).unwrap(),
            json!({"type": "ManagedCertificate"})
        );
    }

    #[test]
    fn test_unknown_parameters_survive_round_trip() {
        let body = json!({"type": "FutureSecretKind", "vaultUri": "https://kv", "rotation": {"days": 30}});
        let params: SecretParameters = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(params.discriminator(), "FutureSecretKind");
        assert!(matches!(params, SecretParameters::Raw(_)));
        assert_eq!(serde_json::to_value(&params).unwrap(), body);
    }

    #[test]
    fn test_parameters_without_type_are_rejected() {
        let err = decode::<SecretParameters>(br#"{"keyId": "k"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MissingDiscriminator { field: "type", .. }));
        assert!(decode::<SecretParameters>(b"null").unwrap().is_none());
    }

    #[test]
    fn test_unknown_enum_values_preserved() {
        let props: SecretProperties =
            serde_json::from_value(json!({"provisioningState": "Migrating"})).unwrap();
        assert_eq!(
            props.provisioning_state,
            Some(AfdProvisioningState::Other("Migrating".to_string()))
        );
        assert_eq!(
            serde_json::to_value(&props).unwrap(),
            json!({"provisioningState": "Migrating"})
        );
    }
}
