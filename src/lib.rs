//! armkit - Azure Resource Manager client kit
//!
//! Typed clients for the CDN secrets and App Platform (Spring Apps)
//! resource-manager APIs, built on a small set of shared pieces:
//!
//! - [`resourceids`] - typed resource IDs with strict and insensitive parsing
//! - [`enums`] - open string enums that keep unknown values
//! - [`polymorphic`] - discriminated unions with a raw fallback
//! - [`arm`] - credentials, transport, paging and long-running operations
//! - [`services`] - the per-API models and clients

pub mod enums;
pub mod polymorphic;
pub mod resourceids;

pub mod arm;
pub mod config;
pub mod services;

pub use arm::client::ArmClient;
pub use arm::pager::{Pager, Predicate, ResourcePredicate};
pub use arm::poller::{LroError, Poller};
pub use resourceids::{IdError, ResourceId};
