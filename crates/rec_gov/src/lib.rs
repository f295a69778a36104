//! # RecGov
//!
//! This crate provides a client for the Rec.gov RIDB API, which is used to turn a
//! campground name into the numeric facility id the availability endpoints expect.

/// Search for campgrounds given a query string on the Rec.gov API.
mod facility_search;
pub use facility_search::*;
