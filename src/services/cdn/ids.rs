crate::resource_id! {
    /// A CDN or Front Door profile
    pub struct ProfileId("Profile") under "Microsoft.Cdn" {
        "profiles" => profile_name,
    }
}

crate::resource_id! {
    /// A secret stored on a profile
    pub struct SecretId("Secret") under "Microsoft.Cdn" {
        "profiles" => profile_name,
        "secrets" => secret_name,
    }
}

impl SecretId {
    /// The profile this secret belongs to
    pub fn profile(&self) -> ProfileId {
        ProfileId::new(
            &self.subscription_id,
            &self.resource_group_name,
            &self.profile_name,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resourceids::ResourceId;

    const SECRET: &str = "/subscriptions/12345678-1234-9876-4563-123456789012/resourceGroups/example-resource-group/providers/Microsoft.Cdn/profiles/profileValue/secrets/secretValue";

    #[test]
    fn test_secret_id_round_trip() {
        let id = SecretId::parse(SECRET).unwrap();
        assert_eq!(id.profile_name, "profileValue");
        assert_eq!(id.secret_name, "secretValue");
        assert_eq!(id.id(), SECRET);
        assert_eq!(id.to_string(), SECRET);
    }

    #[test]
    fn test_secret_id_insensitive() {
        let shouted = SECRET
            .replace("resourceGroups", "RESOURCEGROUPS")
            .replace("Microsoft.Cdn", "microsoft.cdn")
            .replace("/secrets/", "/SeCrEtS/");
        assert!(SecretId::parse(&shouted).is_err());

        let id = SecretId::parse_insensitively(&shouted).unwrap();
        assert_eq!(id.id(), SECRET);
    }

    #[test]
    fn test_profile_id_rejects_secret_id() {
        let err = ProfileId::parse(SECRET).unwrap_err();
        assert!(err.to_string().contains("unexpected trailing segments"));
    }

    #[test]
    fn test_parent_profile() {
        let id = SecretId::new("sub", "rg", "prof", "sec");
        assert_eq!(
            id.profile().id(),
            "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Cdn/profiles/prof"
        );
    }
}
