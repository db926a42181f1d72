//! ML Platform Core
//!
//! Core types for the ML platform SDK and CLI.
//!
//! This crate contains:
//! - Domain types: job specifications, identities, states and cluster summaries
//! - DTOs: the `batch/v1` Job manifest we submit and the Job object we read back
//!
//! Nothing in here talks to the cluster. I/O lives in `mlp-client`.

pub mod domain;
pub mod dto;
