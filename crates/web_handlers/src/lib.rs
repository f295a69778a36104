//! # Web Handlers for the Campsite Tracker Web Application
//!
//! This crate provides the HTTP entry point that runs a poll cycle on request.

/// Response bodies returned by the poll endpoint
mod poll_types;
pub use poll_types::*;

/// Handlers for the poll and health endpoints
mod poll_handlers;
pub use poll_handlers::*;
