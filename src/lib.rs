//! Swarmdeck API Library
//!
//! This library provides the core functionality for the Swarmdeck
//! coordination API: domain logic, coordination services, repositories,
//! and infrastructure components.

pub mod api;
pub mod coordination;
pub mod domain;
pub mod infrastructure;
