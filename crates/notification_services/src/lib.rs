//! # Notification Services
//!
//! This crate provides the AWS SNS transport used to text availability and
//! error notifications to the user.

/// SNS-backed implementation of the scan engine's SMS service.
pub mod service;

pub use service::{NotificationService, format_phone_number};
