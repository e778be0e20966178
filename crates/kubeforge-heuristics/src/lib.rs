//! # kubeforge-heuristics
//!
//! Sizing and health-check heuristics applied between parsing and manifest
//! generation. Both components consume only the normalized [`BuildConfig`]
//! and never fail: absent or malformed hints fall back to category defaults.
//!
//! [`BuildConfig`]: kubeforge_common::types::BuildConfig

pub mod probes;
pub mod resources;
