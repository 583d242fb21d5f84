//! Polymorphic Payloads
//!
//! Several ARM models carry a field whose string value picks the shape of
//! the rest of the object (`type`, `authType`, `storageType`,
//! `responseCacheType`, ...). Each such union is declared with
//! [`polymorphic!`](crate::polymorphic!), which produces an enum with one
//! variant per known shape plus a `Raw` fallback, and a [`Registry`] mapping
//! discriminator values to decode functions.
//!
//! Decoding rules:
//! - empty input or `null` is "no value", not an error
//! - the discriminator is matched case-insensitively
//! - an unknown discriminator decodes to `Raw`, keeping every field
//! - an object without a string discriminator is a [`DecodeError`]
//!
//! Encoding always re-injects the discriminator, since the concrete
//! structs don't store it.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Decode function stored in a [`Registry`]
pub type DecodeFn<T> = fn(Value) -> Result<T, serde_json::Error>;

/// Errors raised while decoding a polymorphic payload
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unmarshaling {type_name}: {source}")]
    Malformed {
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("unmarshaling {type_name}: expected a JSON object, got {found}")]
    NotAnObject {
        type_name: &'static str,
        found: &'static str,
    },

    #[error("unmarshaling {type_name}: discriminator field {field:?} is missing or not a string")]
    MissingDiscriminator {
        type_name: &'static str,
        field: &'static str,
    },

    #[error("unmarshaling {type_name} with {field} {discriminator:?}: {source}")]
    Variant {
        type_name: &'static str,
        field: &'static str,
        discriminator: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Discriminator → decode function lookup for one polymorphic type
pub struct Registry<T> {
    variants: HashMap<String, (&'static str, DecodeFn<T>)>,
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            variants: HashMap::new(),
        }
    }

    /// Register a variant under its canonical discriminator value
    pub fn register(mut self, discriminator: &'static str, decode: DecodeFn<T>) -> Self {
        self.variants
            .insert(discriminator.to_ascii_lowercase(), (discriminator, decode));
        self
    }

    /// Look up the decode function for a discriminator (case-insensitive)
    pub fn lookup(&self, discriminator: &str) -> Option<DecodeFn<T>> {
        self.variants
            .get(&discriminator.to_ascii_lowercase())
            .map(|(_, decode)| *decode)
    }

    /// Canonical discriminator values, sorted
    pub fn known_discriminators(&self) -> Vec<&'static str> {
        let mut known: Vec<&'static str> = self.variants.values().map(|(name, _)| *name).collect();
        known.sort_unstable();
        known
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A union whose variant is picked by a discriminator field
pub trait Polymorphic: Sized + 'static {
    /// Type name used in error messages
    const TYPE_NAME: &'static str;
    /// JSON field holding the discriminator
    const DISCRIMINATOR: &'static str;

    fn registry() -> &'static Registry<Self>;

    /// Wrap an unrecognised payload
    fn from_raw(raw: RawPayload) -> Self;

    /// Encode with the discriminator injected
    fn to_value(&self) -> Result<Value, serde_json::Error>;
}

/// Payload whose discriminator this client doesn't recognise
#[derive(Debug, Clone, PartialEq)]
pub struct RawPayload {
    discriminator: String,
    fields: Map<String, Value>,
}

impl RawPayload {
    pub fn new(discriminator: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            discriminator: discriminator.into(),
            fields,
        }
    }

    /// The discriminator exactly as received
    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    /// Every field of the original object, discriminator included
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Re-encode, making sure `field` carries the original discriminator
    pub fn to_value(&self, field: &str) -> Value {
        let mut fields = self.fields.clone();
        fields.insert(field.to_string(), Value::String(self.discriminator.clone()));
        Value::Object(fields)
    }
}

/// Decode raw bytes into `T`; empty input and `null` yield `None`
pub fn decode<T: Polymorphic>(bytes: &[u8]) -> Result<Option<T>, DecodeError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let value: Value = serde_json::from_slice(bytes).map_err(|source| DecodeError::Malformed {
        type_name: T::TYPE_NAME,
        source,
    })?;
    decode_value(value)
}

/// Decode an already-parsed JSON value into `T`
pub fn decode_value<T: Polymorphic>(value: Value) -> Result<Option<T>, DecodeError> {
    let fields = match value {
        Value::Null => return Ok(None),
        Value::Object(fields) => fields,
        other => {
            return Err(DecodeError::NotAnObject {
                type_name: T::TYPE_NAME,
                found: json_kind(&other),
            })
        },
    };

    let Some(discriminator) = fields.get(T::DISCRIMINATOR).and_then(Value::as_str) else {
        return Err(DecodeError::MissingDiscriminator {
            type_name: T::TYPE_NAME,
            field: T::DISCRIMINATOR,
        });
    };
    let discriminator = discriminator.to_string();

    match T::registry().lookup(&discriminator) {
        Some(decode) => {
            decode(Value::Object(fields))
                .map(Some)
                .map_err(|source| DecodeError::Variant {
                    type_name: T::TYPE_NAME,
                    field: T::DISCRIMINATOR,
                    discriminator,
                    source,
                })
        },
        None => {
            tracing::debug!(
                "{}: unknown {} {:?}, keeping raw payload",
                T::TYPE_NAME,
                T::DISCRIMINATOR,
                discriminator
            );
            Ok(Some(T::from_raw(RawPayload::new(discriminator, fields))))
        },
    }
}

/// Encode a concrete variant and force the discriminator to `literal`
pub fn encode_variant<V: Serialize>(
    variant: &V,
    field: &str,
    literal: &str,
) -> Result<Value, serde_json::Error> {
    let mut fields = match serde_json::to_value(variant)? {
        Value::Object(fields) => fields,
        Value::Null => Map::new(),
        other => {
            return Err(serde::ser::Error::custom(format!(
                "expected {} variant to encode as an object, got {}",
                literal,
                json_kind(&other)
            )))
        },
    };
    fields.insert(field.to_string(), Value::String(literal.to_string()));
    Ok(Value::Object(fields))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Declare a polymorphic union.
///
/// ```ignore
/// armkit::polymorphic! {
///     /// How a repository is authenticated
///     pub enum AuthSetting tagged "authType" {
///         Public(PublicSetting) = "Public",
///         BasicAuth(BasicAuthSetting) = "BasicAuth",
///     }
/// }
/// ```
///
/// Generates the enum (plus a `Raw` variant), its [`Polymorphic`] impl with
/// a lazily built [`Registry`], serde impls and `From` conversions.
#[macro_export]
macro_rules! polymorphic {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident tagged $field:literal {
            $( $(#[$vmeta:meta])* $variant:ident($inner:ty) = $literal:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant($inner), )+
            /// A variant this client doesn't know, kept verbatim
            Raw($crate::polymorphic::RawPayload),
        }

        impl $name {
            /// Discriminator value this payload encodes with
            pub fn discriminator(&self) -> &str {
                match self {
                    $( Self::$variant(_) => $literal, )+
                    Self::Raw(raw) => raw.discriminator(),
                }
            }
        }

        impl $crate::polymorphic::Polymorphic for $name {
            const TYPE_NAME: &'static str = stringify!($name);
            const DISCRIMINATOR: &'static str = $field;

            fn registry() -> &'static $crate::polymorphic::Registry<Self> {
                static REGISTRY: ::std::sync::OnceLock<$crate::polymorphic::Registry<$name>> =
                    ::std::sync::OnceLock::new();
                REGISTRY.get_or_init(|| {
                    $crate::polymorphic::Registry::<$name>::new()
                        $(
                            .register($literal, |value| {
                                ::serde_json::from_value::<$inner>(value).map($name::$variant)
                            })
                        )+
                })
            }

            fn from_raw(raw: $crate::polymorphic::RawPayload) -> Self {
                Self::Raw(raw)
            }

            fn to_value(&self) -> ::std::result::Result<::serde_json::Value, ::serde_json::Error> {
                match self {
                    $( Self::$variant(inner) => $crate::polymorphic::encode_variant(inner, $field, $literal), )+
                    Self::Raw(raw) => Ok(raw.to_value($field)),
                }
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                let value = $crate::polymorphic::Polymorphic::to_value(self)
                    .map_err(<S::Error as ::serde::ser::Error>::custom)?;
                ::serde::Serialize::serialize(&value, serializer)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let value = <::serde_json::Value as ::serde::Deserialize>::deserialize(deserializer)?;
                $crate::polymorphic::decode_value::<Self>(value)
                    .map_err(<D::Error as ::serde::de::Error>::custom)?
                    .ok_or_else(|| {
                        <D::Error as ::serde::de::Error>::custom(concat!(
                            "expected a value for ",
                            stringify!($name)
                        ))
                    })
            }
        }

        $(
            impl ::std::convert::From<$inner> for $name {
                fn from(value: $inner) -> Self {
                    Self::$variant(value)
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    #[serde(rename_all = "camelCase")]
    struct Circle {
        radius: f64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    #[serde(rename_all = "camelCase")]
    struct Rectangle {
        width: f64,
        height: f64,
    }

    crate::polymorphic! {
        enum Shape tagged "kind" {
            Circle(Circle) = "Circle",
            Rectangle(Rectangle) = "Rectangle",
        }
    }

    /// Decodes any union, as generic callers such as service clients do
    fn decode_all<T: Polymorphic>(values: Vec<Value>) -> Result<Vec<T>, DecodeError> {
        values
            .into_iter()
            .filter_map(|value| decode_value::<T>(value).transpose())
            .collect()
    }

    #[test]
    fn test_generic_decode_over_registry() {
        let shapes: Vec<Shape> = decode_all(vec![
            json!({"kind": "Circle", "radius": 1.0}),
            Value::Null,
            json!({"kind": "Triangle"}),
        ])
        .unwrap();
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].discriminator(), "Circle");
        assert_eq!(shapes[1].discriminator(), "Triangle");
    }

    #[test]
    fn test_empty_and_null_are_no_value() {
        assert!(decode::<Shape>(b"").unwrap().is_none());
        assert!(decode::<Shape>(b"  \n").unwrap().is_none());
        assert!(decode::<Shape>(b"null").unwrap().is_none());
    }

    #[test]
    fn test_known_discriminator_is_case_insensitive() {
        let shape = decode::<Shape>(br#"{"kind": "circle", "radius": 2.5}"#)
            .unwrap()
            .unwrap();
        assert_eq!(shape, Shape::Circle(Circle { radius: 2.5 }));
        assert_eq!(shape.discriminator(), "Circle");
    }

    #[test]
    fn test_encode_injects_discriminator() {
        let shape = Shape::from(Rectangle {
            width: 1.0,
            height: 2.0,
        });
        let value = serde_json::to_value(&shape).unwrap();
        assert_eq!(value, json!({"kind": "Rectangle", "width": 1.0, "height": 2.0}));
    }

    #[test]
    fn test_unknown_discriminator_round_trips() {
        let input = json!({"kind": "Hexagon", "side": 3, "label": {"text": "hi"}});
        let shape: Shape = serde_json::from_value(input.clone()).unwrap();

        match &shape {
            Shape::Raw(raw) => {
                assert_eq!(raw.discriminator(), "Hexagon");
                assert_eq!(raw.get("side"), Some(&json!(3)));
            },
            other => panic!("expected raw payload, got {:?}", other),
        }

        assert_eq!(serde_json::to_value(&shape).unwrap(), input);
    }

    #[test]
    fn test_missing_discriminator_is_an_error() {
        let err = decode::<Shape>(br#"{"radius": 1.0}"#).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MissingDiscriminator { field: "kind", .. }
        ));

        let err = decode::<Shape>(br#"{"kind": 7}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MissingDiscriminator { .. }));
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        let err = decode::<Shape>(b"{not json").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { type_name: "Shape", .. }));

        let err = decode::<Shape>(b"[1, 2]").unwrap_err();
        assert!(matches!(err, DecodeError::NotAnObject { found: "an array", .. }));
    }

    #[test]
    fn test_variant_shape_mismatch_names_discriminator() {
        let err = decode::<Shape>(br#"{"kind": "Circle", "radius": "big"}"#).unwrap_err();
        assert!(err.to_string().contains("Shape"));
        assert!(err.to_string().contains("\"Circle\""));
    }

    #[test]
    fn test_registry_lists_known_discriminators() {
        assert_eq!(
            Shape::registry().known_discriminators(),
            vec!["Circle", "Rectangle"]
        );
        assert!(Shape::registry().lookup("RECTANGLE").is_some());
        assert!(Shape::registry().lookup("Triangle").is_none());
    }

    #[test]
    fn test_optional_field_accepts_null() {
        #[derive(Debug, Deserialize)]
        struct Holder {
            shape: Option<Shape>,
        }

        let holder: Holder = serde_json::from_value(json!({"shape": null})).unwrap();
        assert!(holder.shape.is_none());
    }
}
