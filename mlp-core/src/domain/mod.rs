//! Core domain types
//!
//! These types describe what a caller asks the platform to run and what the
//! platform reports back. They are shared by the SDK (to build manifests and
//! interpret responses) and the CLI (to render them).

pub mod cluster;
pub mod job;
pub mod resource;
