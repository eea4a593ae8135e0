//! services/relay/src/lib.rs
//!
//! Same-origin relay between the browser and the CareerHub backend.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
