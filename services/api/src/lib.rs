//! services/api/src/lib.rs
//!
//! The HTTP service for Classmate AI: filesystem and LLM adapters plus the
//! axum web layer. The `api` binary wires these together.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
