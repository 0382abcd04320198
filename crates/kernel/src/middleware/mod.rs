//! HTTP middleware components.
//!
//! Provides the network-origin access filter.

pub mod access;

pub use access::{AccessPolicy, enforce_access};
