//! # kubeforge-manifest
//!
//! Kubernetes manifest generation and validation.
//!
//! Handles:
//! - **objects**: Typed resource model (Deployment, Service, ConfigMap,
//!   PersistentVolumeClaim, Ingress) and the generic [`ManifestObject`].
//! - **generator**: Conditional emission of a coherent manifest set from one
//!   or more normalized build configurations.
//! - **serializer**: Multi-document YAML rendering.
//! - **validator**: Structural completeness and best-practice checks.
//!
//! [`ManifestObject`]: objects::ManifestObject

pub mod generator;
pub mod objects;
pub mod serializer;
pub mod validator;
