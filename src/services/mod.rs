//! Per-API models and clients
//!
//! Each service pins one api-version and is a thin layer of typed IDs,
//! models and operations over [`ArmClient`](crate::arm::client::ArmClient).

pub mod appplatform;
pub mod cdn;
