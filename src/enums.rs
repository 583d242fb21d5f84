//! Open Enumerations
//!
//! ARM APIs grow new enum values without bumping anything the client can
//! see, so every string-backed enum here is "open": the known values get
//! their own variants and anything else is kept verbatim in `Other`.
//!
//! Parsing is ASCII case-insensitive and always succeeds. Serialization
//! writes the canonical spelling for known values and the original string
//! for unknown ones.

/// Declare an open, string-backed enumeration.
///
/// ```ignore
/// armkit::open_enum! {
///     /// Power state of a service
///     pub enum PowerState {
///         Running = "Running",
///         Stopped = "Stopped",
///     }
/// }
///
/// assert_eq!(PowerState::parse("running"), PowerState::Running);
/// assert_eq!(PowerState::parse("Paused"), PowerState::Other("Paused".to_string()));
/// ```
#[macro_export]
macro_rules! open_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $literal:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// A value this client doesn't know about, kept as received
            Other(::std::string::String),
        }

        impl $name {
            /// Every value known to this client, in canonical spelling
            pub const POSSIBLE_VALUES: &'static [&'static str] = &[$($literal),+];

            /// Parse case-insensitively; unknown input is preserved verbatim
            pub fn parse(input: &str) -> Self {
                $(
                    if input.eq_ignore_ascii_case($literal) {
                        return Self::$variant;
                    }
                )+
                Self::Other(input.to_string())
            }

            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $literal, )+
                    Self::Other(value) => value.as_str(),
                }
            }

            pub fn is_known(&self) -> bool {
                !matches!(self, Self::Other(_))
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ::std::convert::Infallible;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                Ok(Self::parse(s))
            }
        }

        impl ::std::convert::From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::parse(value)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let decoded = <::std::string::String as ::serde::Deserialize>::deserialize(deserializer)?;
                Ok(Self::parse(&decoded))
            }
        }
    };
}

crate::open_enum! {
    /// Status of an ARM long-running operation, as reported by the
    /// `Azure-AsyncOperation` endpoint or a resource's `provisioningState`
    pub enum OperationStatus {
        InProgress = "InProgress",
        Accepted = "Accepted",
        Running = "Running",
        Creating = "Creating",
        Updating = "Updating",
        Deleting = "Deleting",
        Succeeded = "Succeeded",
        Failed = "Failed",
        Canceled = "Canceled",
        Cancelled = "Cancelled",
    }
}

impl OperationStatus {
    /// Terminal states end polling
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed | Self::Canceled | Self::Cancelled
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(OperationStatus::parse("succeeded"), OperationStatus::Succeeded);
        assert_eq!(OperationStatus::parse("INPROGRESS"), OperationStatus::InProgress);
        assert_eq!(OperationStatus::parse("Failed"), OperationStatus::Failed);
    }

    #[test]
    fn test_unknown_value_is_preserved() {
        let status = OperationStatus::parse("Provisioning");
        assert_eq!(status, OperationStatus::Other("Provisioning".to_string()));
        assert_eq!(status.as_str(), "Provisioning");
        assert!(!status.is_known());
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_serde_uses_canonical_spelling() {
        let status: OperationStatus = serde_json::from_str("\"canceled\"").unwrap();
        assert_eq!(status, OperationStatus::Canceled);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"Canceled\"");

        let unknown: OperationStatus = serde_json::from_str("\"Paused\"").unwrap();
        assert_eq!(serde_json::to_string(&unknown).unwrap(), "\"Paused\"");
    }

    #[test]
    fn test_terminal_states() {
        assert!(OperationStatus::Succeeded.is_terminal());
        assert!(OperationStatus::Cancelled.is_terminal());
        assert!(!OperationStatus::Accepted.is_terminal());
        assert!(OperationStatus::Succeeded.is_success());
        assert!(!OperationStatus::Failed.is_success());
    }

    #[test]
    fn test_possible_values_lists_known_variants() {
        assert!(OperationStatus::POSSIBLE_VALUES.contains(&"InProgress"));
        assert_eq!(OperationStatus::POSSIBLE_VALUES.len(), 10);
        assert_eq!("Running".parse::<OperationStatus>().unwrap(), OperationStatus::Running);
    }
}
