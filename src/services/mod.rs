//! Bridge-side services.
//!
//! ARCHITECTURE
//! ============
//! Service modules own persistence so route handlers can stay focused on
//! cookie handling and protocol translation.

pub mod session;
