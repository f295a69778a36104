//! # Campground Scan
//!
//! This crate provides the polling engine behind the campsite tracker: it fetches
//! availability from a reservation source, reduces it to stays matching the
//! user's criteria, and decides when a match or a repeated failure is worth an SMS.

/// Types for campground scan operations
mod scan_types;
pub use scan_types::*;

/// Matching raw availability against user criteria
pub mod criteria;
pub use criteria::filter_to_criteria;

/// Notification dedup and error escalation state
mod run_state;
pub use run_state::*;

/// The reservation source abstraction
mod source;
pub use source::*;

/// Poll cycle orchestration
mod executor;
pub use executor::*;

/// Text tables for logs and messages
pub mod table;

/// SMS transport abstraction
mod sms_service;
pub use sms_service::*;

/// recreation.gov source adapter
mod rec_gov_client;
pub use rec_gov_client::*;

/// ReserveCalifornia source adapter
mod reserve_california_client;
pub use reserve_california_client::*;
