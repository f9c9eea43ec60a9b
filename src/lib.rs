//! TEA ID authentication and session lifecycle.
//!
//! ARCHITECTURE
//! ============
//! - `store`: client-side auth state (login, register, logout, resolution).
//! - `guard` and `access`: pure route and role decisions over that state.
//! - `routes`, `services`, `db`: the session bridge server.
//! - `identity` and `net`: clients for the identity provider, the backend API
//!   and the bridge.

pub mod access;
pub mod config;
pub mod db;
pub mod guard;
pub mod identity;
pub mod net;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
