//! Service layer around the reconciliation engine.
//!
//! Hosts the parts the chat-platform integration plugs into: the event hook
//! registry, file-based service configuration, telemetry setup, and stock
//! whitelist publishers. The gateway connection itself lives outside this
//! workspace.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod config;
mod error;
mod hooks;
mod publish;
pub mod telemetry;

pub use config::ServiceConfig;
pub use error::{ServiceError, ServiceResult};
pub use hooks::{EventHook, EventKind, HookContext, HookRegistry};
pub use publish::{FilePublisher, NullPublisher};
