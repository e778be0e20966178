//! Output conventions applied to every generated manifest set.

use serde::{Deserialize, Serialize};

/// Target-cluster conventions for generated objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Namespace written into object metadata.
    pub namespace: String,
    /// Suffix appended to the service name to form the ingress host.
    pub ingress_host_suffix: String,
    /// Replica count when neither options nor descriptor declare one.
    pub default_replicas: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            namespace: "default".into(),
            ingress_host_suffix: "local".into(),
            default_replicas: crate::constants::DEFAULT_REPLICAS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_default_namespace() {
        let config = OutputConfig::default();
        assert_eq!(config.namespace, "default");
        assert_eq!(config.default_replicas, 1);
    }
}
