//! Annotation service: per-user rectangle annotations behind bearer-token auth.
//!
//! SYSTEM CONTEXT
//! ==============
//! The binary in `main.rs` wires configuration, optional Postgres
//! persistence and the router together. The library half exists so other
//! workspace crates can mount the real router in their end-to-end tests.

pub mod db;
pub mod routes;
pub mod services;
pub mod state;
