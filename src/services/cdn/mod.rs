//! CDN / Front Door profile secrets (`Microsoft.Cdn`, api-version 2024-02-01)

mod client;
mod ids;
mod models;

pub use client::{SecretsClient, API_VERSION};
pub use ids::{ProfileId, SecretId};
pub use models::*;
