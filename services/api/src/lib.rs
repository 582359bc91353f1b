//! services/api/src/lib.rs
//!
//! The HTTP service for the reading tracker. The binaries in `src/bin` are
//! thin wrappers around this library.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
