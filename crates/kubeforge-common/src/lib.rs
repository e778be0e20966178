//! # kubeforge-common
//!
//! Shared types, error definitions, configuration models, and constants
//! used across the entire Kubeforge workspace.
//!
//! This crate is the leaf of the dependency graph — it depends on no other
//! internal crate and provides the normalized build-configuration model that
//! the parsers produce and the heuristics and manifest generator consume.

pub mod config;
pub mod constants;
pub mod error;
pub mod probe;
pub mod sizing;
pub mod types;
