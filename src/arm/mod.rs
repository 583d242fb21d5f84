//! Azure Resource Manager interaction module
//!
//! The transport layer every service client is built on: authentication,
//! HTTP, the generic resource operations, list pagination and
//! long-running-operation polling.
//!
//! # Module Structure
//!
//! - [`auth`] - Azure credentials with token caching
//! - [`client`] - Main ARM client for making API requests
//! - [`http`] - HTTP utilities and ARM error decoding
//! - [`pager`] - `nextLink` pagination
//! - [`poller`] - Long-running operation polling
//!
//! # Example
//!
//! ```ignore
//! use armkit::arm::client::ArmClient;
//! use armkit::services::cdn::{ProfileId, SecretsClient};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = ArmClient::new("00000000-0000-0000-0000-000000000000")?;
//!     let profile = ProfileId::new(&client.subscription_id, "rg", "my-profile");
//!     let secrets = SecretsClient::new(client).list_by_profile_complete(&profile).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod pager;
pub mod poller;
