//! Resource IDs
//!
//! An ARM resource ID is a path built from a fixed template of segments:
//!
//! ```text
//! /subscriptions/{subscription_id}/resourceGroups/{resource_group_name}/providers/Microsoft.Cdn/profiles/{profile_name}
//! ```
//!
//! Each ID type lists its template once ([`ResourceId::SEGMENTS`]) and the
//! generic [`parse_id`] / [`format_id`] functions do the rest. Most ID types
//! are declared with [`resource_id!`](crate::resource_id!).
//!
//! Strict parsing is for user input. [`parse_id_insensitively`] also
//! accepts static segments in any case and should only be used for IDs the
//! API itself returned.

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// One segment of a resource ID template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// Fixed text such as `resourceGroups`
    Static {
        name: &'static str,
        value: &'static str,
    },
    /// Resource provider namespace such as `Microsoft.Cdn`
    Provider {
        name: &'static str,
        value: &'static str,
    },
    Subscription {
        name: &'static str,
    },
    ResourceGroup {
        name: &'static str,
    },
    /// A name chosen by the user
    UserSpecified {
        name: &'static str,
    },
}

impl Segment {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Static { name, .. }
            | Self::Provider { name, .. }
            | Self::Subscription { name }
            | Self::ResourceGroup { name }
            | Self::UserSpecified { name } => name,
        }
    }

    /// Fixed text for static/provider segments
    pub fn fixed_value(&self) -> Option<&'static str> {
        match self {
            Self::Static { value, .. } | Self::Provider { value, .. } => Some(value),
            _ => None,
        }
    }

    fn expectation(&self) -> String {
        match self {
            Self::Static { value, .. } => format!("the static segment {:?}", value),
            Self::Provider { value, .. } => format!("the resource provider {:?}", value),
            Self::Subscription { .. } => "a subscription ID".to_string(),
            Self::ResourceGroup { .. } => "a resource group name".to_string(),
            Self::UserSpecified { name } => format!("a value for {:?}", name),
        }
    }
}

/// Errors from parsing a resource ID
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("parsing {description} ID: the input was empty")]
    Empty { description: &'static str },

    #[error(
        "parsing {description} ID {input:?}: the segment {segment:?} at position {position} was missing or didn't match (expected {expected})"
    )]
    MissingSegment {
        description: &'static str,
        input: String,
        segment: &'static str,
        position: usize,
        expected: String,
    },

    #[error("parsing {description} ID {input:?}: unexpected trailing segments {extra:?}")]
    UnexpectedSegments {
        description: &'static str,
        input: String,
        extra: String,
    },

    #[error(
        "parsing {description} ID {input:?}: {value:?} is not a valid value for the segment {segment:?}"
    )]
    InvalidSegmentValue {
        description: &'static str,
        input: String,
        segment: &'static str,
        value: String,
    },

    #[error("parsed {description} ID has no value for segment {segment:?}")]
    UnknownSegment {
        description: &'static str,
        segment: &'static str,
    },
}

/// Values extracted by the parser, keyed by segment name
#[derive(Debug, Clone, Default)]
pub struct ParsedId {
    description: &'static str,
    values: HashMap<&'static str, String>,
}

impl ParsedId {
    pub fn get(&self, segment: &'static str) -> Result<&str, IdError> {
        self.values
            .get(segment)
            .map(String::as_str)
            .ok_or(IdError::UnknownSegment {
                description: self.description,
                segment,
            })
    }
}

/// A typed resource ID with a fixed segment template
pub trait ResourceId: Sized {
    /// Human name used in errors, e.g. `"Secret"`
    const DESCRIPTION: &'static str;
    const SEGMENTS: &'static [Segment];

    fn from_parsed(parsed: &ParsedId) -> Result<Self, IdError>;

    /// Values of the non-fixed segments, in template order
    fn values(&self) -> Vec<&str>;

    /// The canonical path for this ID
    fn id(&self) -> String {
        format_id(self)
    }

    /// Every segment of the path, fixed text and values alike, unescaped
    fn path_segments(&self) -> Vec<&str> {
        let mut values = self.values().into_iter();
        Self::SEGMENTS
            .iter()
            .map(|segment| match segment.fixed_value() {
                Some(fixed) => fixed,
                None => values.next().unwrap_or_default(),
            })
            .collect()
    }
}

/// Whether `value` can stand as one path segment without changing the URL
pub fn is_valid_segment_value(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && !value
            .chars()
            .any(|c| c.is_control() || matches!(c, '?' | '#' | '%' | '\\'))
}

/// Parse `input` strictly
pub fn parse_id<T: ResourceId>(input: &str) -> Result<T, IdError> {
    let parsed = parse_segments(T::DESCRIPTION, T::SEGMENTS, input, false)?;
    T::from_parsed(&parsed)
}

/// Parse `input` ignoring the case of static segments
pub fn parse_id_insensitively<T: ResourceId>(input: &str) -> Result<T, IdError> {
    let parsed = parse_segments(T::DESCRIPTION, T::SEGMENTS, input, true)?;
    T::from_parsed(&parsed)
}

/// Check that `input` is a valid ID of type `T`
pub fn validate_id<T: ResourceId>(input: &str) -> Result<(), IdError> {
    parse_id::<T>(input).map(|_| ())
}

/// Interpolate the ID's values into its template
pub fn format_id<T: ResourceId>(id: &T) -> String {
    let mut values = id.values().into_iter();
    let mut out = String::new();
    for segment in T::SEGMENTS {
        out.push('/');
        match segment.fixed_value() {
            Some(fixed) => out.push_str(fixed),
            None => out.push_str(values.next().unwrap_or_default()),
        }
    }
    out
}

/// Multi-line human readable rendering of an ID's values
pub fn describe_id<T: ResourceId>(id: &T) -> String {
    let values = id.values();
    let components: Vec<String> = T::SEGMENTS
        .iter()
        .filter(|s| s.fixed_value().is_none())
        .zip(values)
        .map(|(segment, value)| format!("{}: {:?}", humanize(segment.name()), value))
        .collect();
    format!("{} ({})", T::DESCRIPTION, components.join("\n"))
}

/// `resource_group_name` -> `Resource Group Name`
fn humanize(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_segments(
    description: &'static str,
    segments: &'static [Segment],
    input: &str,
    insensitive: bool,
) -> Result<ParsedId, IdError> {
    if input.trim().is_empty() {
        return Err(IdError::Empty { description });
    }

    let trimmed = input.strip_prefix('/').unwrap_or(input);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    let components: Vec<&str> = trimmed.split('/').collect();

    let mut values = HashMap::new();
    for (position, segment) in segments.iter().enumerate() {
        let missing = || IdError::MissingSegment {
            description,
            input: input.to_string(),
            segment: segment.name(),
            position,
            expected: segment.expectation(),
        };

        let component = components.get(position).copied().ok_or_else(missing)?;

        match segment.fixed_value() {
            Some(fixed) => {
                let matches = if insensitive {
                    component.eq_ignore_ascii_case(fixed)
                } else {
                    component == fixed
                };
                if !matches {
                    return Err(missing());
                }
                values.insert(segment.name(), fixed.to_string());
            },
            None => {
                if component.is_empty() {
                    return Err(missing());
                }
                if !is_valid_segment_value(component) {
                    return Err(IdError::InvalidSegmentValue {
                        description,
                        input: input.to_string(),
                        segment: segment.name(),
                        value: component.to_string(),
                    });
                }
                values.insert(segment.name(), component.to_string());
            },
        }
    }

    if components.len() > segments.len() {
        return Err(IdError::UnexpectedSegments {
            description,
            input: input.to_string(),
            extra: components[segments.len()..].join("/"),
        });
    }

    Ok(ParsedId {
        description,
        values,
    })
}

/// Declare an ID under `/subscriptions/{}/resourceGroups/{}/providers/{namespace}`.
///
/// ```ignore
/// armkit::resource_id! {
///     /// A CDN profile secret
///     pub struct SecretId("Secret") under "Microsoft.Cdn" {
///         "profiles" => profile_name,
///         "secrets" => secret_name,
///     }
/// }
/// ```
#[macro_export]
macro_rules! resource_id {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident($description:literal) under $provider:literal {
            $( $collection:literal => $field:ident ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        $vis struct $name {
            pub subscription_id: ::std::string::String,
            pub resource_group_name: ::std::string::String,
            $( pub $field: ::std::string::String, )+
        }

        impl $name {
            pub fn new(
                subscription_id: impl Into<::std::string::String>,
                resource_group_name: impl Into<::std::string::String>,
                $( $field: impl Into<::std::string::String>, )+
            ) -> Self {
                Self {
                    subscription_id: subscription_id.into(),
                    resource_group_name: resource_group_name.into(),
                    $( $field: $field.into(), )+
                }
            }

            /// Parse strictly; use for user input
            pub fn parse(input: &str) -> ::std::result::Result<Self, $crate::resourceids::IdError> {
                $crate::resourceids::parse_id(input)
            }

            /// Parse ignoring case of static segments; use for API responses
            pub fn parse_insensitively(input: &str) -> ::std::result::Result<Self, $crate::resourceids::IdError> {
                $crate::resourceids::parse_id_insensitively(input)
            }

            pub fn validate(input: &str) -> ::std::result::Result<(), $crate::resourceids::IdError> {
                $crate::resourceids::validate_id::<Self>(input)
            }

            pub fn describe(&self) -> ::std::string::String {
                $crate::resourceids::describe_id(self)
            }
        }

        impl $crate::resourceids::ResourceId for $name {
            const DESCRIPTION: &'static str = $description;
            const SEGMENTS: &'static [$crate::resourceids::Segment] = &[
                $crate::resourceids::Segment::Static { name: "staticSubscriptions", value: "subscriptions" },
                $crate::resourceids::Segment::Subscription { name: "subscription_id" },
                $crate::resourceids::Segment::Static { name: "staticResourceGroups", value: "resourceGroups" },
                $crate::resourceids::Segment::ResourceGroup { name: "resource_group_name" },
                $crate::resourceids::Segment::Static { name: "staticProviders", value: "providers" },
                $crate::resourceids::Segment::Provider { name: "staticProvider", value: $provider },
                $(
                    $crate::resourceids::Segment::Static { name: $collection, value: $collection },
                    $crate::resourceids::Segment::UserSpecified { name: stringify!($field) },
                )+
            ];

            fn from_parsed(
                parsed: &$crate::resourceids::ParsedId,
            ) -> ::std::result::Result<Self, $crate::resourceids::IdError> {
                Ok(Self {
                    subscription_id: parsed.get("subscription_id")?.to_string(),
                    resource_group_name: parsed.get("resource_group_name")?.to_string(),
                    $( $field: parsed.get(stringify!($field))?.to_string(), )+
                })
            }

            fn values(&self) -> ::std::vec::Vec<&str> {
                vec![
                    self.subscription_id.as_str(),
                    self.resource_group_name.as_str(),
                    $( self.$field.as_str(), )+
                ]
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&$crate::resourceids::format_id(self))
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::resourceids::IdError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                $crate::resourceids::parse_id(s)
            }
        }
    };
}

/// `/subscriptions/{subscription_id}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    pub subscription_id: String,
}

impl SubscriptionId {
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
        }
    }
}

impl ResourceId for SubscriptionId {
    const DESCRIPTION: &'static str = "Subscription";
    const SEGMENTS: &'static [Segment] = &[
        Segment::Static {
            name: "staticSubscriptions",
            value: "subscriptions",
        },
        Segment::Subscription {
            name: "subscription_id",
        },
    ];

    fn from_parsed(parsed: &ParsedId) -> Result<Self, IdError> {
        Ok(Self::new(parsed.get("subscription_id")?))
    }

    fn values(&self) -> Vec<&str> {
        vec![self.subscription_id.as_str()]
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_id(self))
    }
}

/// `/subscriptions/{subscription_id}/resourceGroups/{resource_group_name}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceGroupId {
    pub subscription_id: String,
    pub resource_group_name: String,
}

impl ResourceGroupId {
    pub fn new(subscription_id: impl Into<String>, resource_group_name: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
        }
    }
}

impl ResourceId for ResourceGroupId {
    const DESCRIPTION: &'static str = "Resource Group";
    const SEGMENTS: &'static [Segment] = &[
        Segment::Static {
            name: "staticSubscriptions",
            value: "subscriptions",
        },
        Segment::Subscription {
            name: "subscription_id",
        },
        Segment::Static {
            name: "staticResourceGroups",
            value: "resourceGroups",
        },
        Segment::ResourceGroup {
            name: "resource_group_name",
        },
    ];

    fn from_parsed(parsed: &ParsedId) -> Result<Self, IdError> {
        Ok(Self::new(
            parsed.get("subscription_id")?,
            parsed.get("resource_group_name")?,
        ))
    }

    fn values(&self) -> Vec<&str> {
        vec![
            self.subscription_id.as_str(),
            self.resource_group_name.as_str(),
        ]
    }
}

impl fmt::Display for ResourceGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_id(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::resource_id! {
        struct WidgetId("Widget") under "Microsoft.Example" {
            "gadgets" => gadget_name,
            "widgets" => widget_name,
        }
    }

    const WIDGET: &str = "/subscriptions/12345678-1234-9876-4563-123456789012/resourceGroups/example-rg/providers/Microsoft.Example/gadgets/g1/widgets/w1";

    #[test]
    fn test_format_interpolates_template() {
        let id = WidgetId::new("12345678-1234-9876-4563-123456789012", "example-rg", "g1", "w1");
        assert_eq!(id.to_string(), WIDGET);
        assert_eq!(id.id(), WIDGET);
    }

    #[test]
    fn test_parse_strict() {
        let id = WidgetId::parse(WIDGET).unwrap();
        assert_eq!(id.resource_group_name, "example-rg");
        assert_eq!(id.gadget_name, "g1");
        assert_eq!(id.widget_name, "w1");
    }

    #[test]
    fn test_strict_parse_rejects_wrong_case() {
        let input = WIDGET.replace("resourceGroups", "resourcegroups");
        let err = WidgetId::parse(&input).unwrap_err();
        match err {
            IdError::MissingSegment {
                segment, position, ..
            } => {
                assert_eq!(segment, "staticResourceGroups");
                assert_eq!(position, 2);
            },
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_insensitive_parse_normalises_static_segments() {
        let input = WIDGET
            .replace("resourceGroups", "RESOURCEGROUPS")
            .replace("Microsoft.Example", "microsoft.example")
            .replace("widgets", "Widgets");
        let id = WidgetId::parse_insensitively(&input).unwrap();
        assert_eq!(id.to_string(), WIDGET);
    }

    #[test]
    fn test_missing_segment_is_named() {
        let input = "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Example/gadgets/g1";
        let err = WidgetId::parse(input).unwrap_err();
        assert!(matches!(
            err,
            IdError::MissingSegment { segment: "widgets", position: 8, .. }
        ));
        assert!(err.to_string().contains("\"widgets\""));
    }

    #[test]
    fn test_empty_value_is_missing() {
        let input = "/subscriptions/sub/resourceGroups//providers/Microsoft.Example/gadgets/g1/widgets/w1";
        let err = WidgetId::parse(input).unwrap_err();
        assert!(matches!(
            err,
            IdError::MissingSegment { segment: "resource_group_name", .. }
        ));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(
            WidgetId::parse("").unwrap_err(),
            IdError::Empty { description: "Widget" }
        );
    }

    #[test]
    fn test_trailing_segments_rejected() {
        let input = format!("{}/extra/bits", WIDGET);
        let err = WidgetId::parse(&input).unwrap_err();
        assert!(matches!(err, IdError::UnexpectedSegments { ref extra, .. } if extra == "extra/bits"));
    }

    #[test]
    fn test_leading_and_trailing_slash_tolerated() {
        assert!(WidgetId::validate(WIDGET.trim_start_matches('/')).is_ok());
        assert!(WidgetId::validate(&format!("{}/", WIDGET)).is_ok());
    }

    #[test]
    fn test_describe() {
        let id = WidgetId::new("sub", "rg", "g1", "w1");
        let described = id.describe();
        assert!(described.starts_with("Widget ("));
        assert!(described.contains("Resource Group Name: \"rg\""));
        assert!(described.contains("Widget Name: \"w1\""));
    }

    #[test]
    fn test_subscription_and_resource_group_ids() {
        let sub: SubscriptionId = parse_id("/subscriptions/abc").unwrap();
        assert_eq!(sub, SubscriptionId::new("abc"));
        assert_eq!(sub.to_string(), "/subscriptions/abc");

        let rg: ResourceGroupId = parse_id("/subscriptions/abc/resourceGroups/rg1").unwrap();
        assert_eq!(rg.resource_group_name, "rg1");
        assert_eq!(rg.to_string(), "/subscriptions/abc/resourceGroups/rg1");

        assert!(parse_id::<ResourceGroupId>("/subscriptions/abc").is_err());
    }

    #[test]
    fn test_url_syntax_in_values_rejected() {
        for bad in ["..", ".", "a#b", "a?x=1", "50%off", "a\\b"] {
            let input = WIDGET.replace("/widgets/w1", &format!("/widgets/{}", bad));
            match WidgetId::parse(&input) {
                Err(IdError::InvalidSegmentValue { segment, value, .. }) => {
                    assert_eq!(segment, "widget_name");
                    assert_eq!(value, bad);
                },
                other => panic!("expected InvalidSegmentValue for {:?}, got {:?}", bad, other),
            }
        }

        let input = WIDGET.replace("example-rg", "..");
        assert!(matches!(
            WidgetId::parse_insensitively(&input),
            Err(IdError::InvalidSegmentValue { segment: "resource_group_name", .. })
        ));
    }

    #[test]
    fn test_dotted_names_allowed() {
        let input = WIDGET.replace("/widgets/w1", "/widgets/my.widget..v2");
        assert_eq!(WidgetId::parse(&input).unwrap().widget_name, "my.widget..v2");
    }

    #[test]
    fn test_path_segments() {
        let id = WidgetId::new("sub", "rg", "g/1", "w1");
        assert_eq!(
            id.path_segments(),
            vec![
                "subscriptions",
                "sub",
                "resourceGroups",
                "rg",
                "providers",
                "Microsoft.Example",
                "gadgets",
                "g/1",
                "widgets",
                "w1"
            ]
        );
    }
}
