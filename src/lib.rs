//! catalog-migrate - Catalog schema upgrade to v2.0.0
//!
//! Rewrites an existing catalog database in place so the v2 server can
//! read it.

pub mod cli;
pub mod config;
pub mod error;
pub mod migrations;
pub mod models;
pub mod store;
