//! Profile submission parsing and player-identity resolution.
//!
//! A raw chat submission is parsed against a [`ProfileSchema`] into a
//! [`Candidate`] record, then the candidate's `ign` handle is resolved
//! through an [`IdentityResolver`] into a stable canonical identifier and
//! display name. Completeness is a pure function of the candidate and its
//! resolution and is recomputed on every reconciliation pass.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod resolver;
mod schema;

pub use resolver::{
    is_valid_handle, is_valid_uuid, IdentityResolver, MojangResolver, Resolution, ResolverError,
};
pub use schema::{Candidate, ProfileSchema};
