//! # kubeforge-parser
//!
//! Format parsers that normalize heterogeneous build/compose syntax into the
//! shared configuration model.
//!
//! Handles:
//! - **dockerfile**: Line-oriented Dockerfile parsing with graceful
//!   degradation on malformed instructions.
//! - **compose**: docker-compose YAML parsing into per-service configs plus
//!   global volume/network declarations.
//! - **apptype**: Base-image signature matching for application categories.
//! - **graph**: Service dependency graph and startup-order resolution.

pub mod apptype;
pub mod compose;
pub mod dockerfile;
pub mod graph;
