//! Data Transfer Objects for the orchestration API
//!
//! Serde representations of the Kubernetes documents exchanged with
//! `kubectl`: the manifest we apply and the object we get back.

pub mod manifest;
pub mod object;
