//! Resource sizing model in Kubernetes quantity syntax.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A CPU/memory pair in canonical quantity syntax (`500m`, `512Mi`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceQuantity {
    /// CPU quantity with millicpu suffix.
    pub cpu: String,
    /// Memory quantity with mebibyte suffix.
    pub memory: String,
}

impl ResourceQuantity {
    /// Builds a quantity from raw millicpu and mebibyte values.
    #[must_use]
    pub fn from_millis(cpu_millis: u32, memory_mi: u32) -> Self {
        Self {
            cpu: format!("{cpu_millis}m"),
            memory: format!("{memory_mi}Mi"),
        }
    }
}

impl fmt::Display for ResourceQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cpu={} memory={}", self.cpu, self.memory)
    }
}

/// Estimated requests and limits for one workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Scheduling requests.
    pub requests: ResourceQuantity,
    /// Hard limits.
    pub limits: ResourceQuantity,
}
