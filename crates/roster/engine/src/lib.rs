//! Profile reconciliation engine and whitelist projection.
//!
//! The engine consumes submission events from a chat channel, classifies
//! each candidate profile (accept, reject, update, duplicate conflict),
//! mutates the backing table stores accordingly, and re-projects the
//! authoritative allow-list on every mutating event. External collaborators
//! (identity resolver, member directory, chat gateway, whitelist publisher)
//! sit behind async traits and are injected at construction.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod commands;
mod config;
mod error;
mod reconcile;
mod stores;
#[cfg(test)]
mod testutil;
mod traits;
mod types;
mod whitelist;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use reconcile::{Disposition, ReconciliationEngine};
pub use stores::{fields, tables, ProfileStores};
pub use traits::{ChatGateway, MemberDirectory};
pub use types::{MessageId, Submission, SubmissionEvent, UserId};
pub use whitelist::{project, PublishError, WhitelistEntry, WhitelistPublisher};
