//! HTTP clients and wire types.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` talks to the backend that owns profiles, patients and sessions;
//! `bridge` talks to this crate's own session bridge. Both share `types`.

pub mod api;
pub mod bridge;
pub mod types;
