//! Spring Apps (`Microsoft.AppPlatform`, api-version 2024-01-01-preview)
//!
//! Services, apps, deployments, storages, certificates, customized
//! accelerators and gateways.

mod client;
pub mod constants;
mod ids;
pub mod models;

pub use client::{AppPlatformClient, API_VERSION};
pub use constants::*;
pub use ids::*;
pub use models::*;
