//! Typed Kubernetes resource model and the generic manifest object.
//!
//! The typed structs serialize in the cluster API's camelCase shape and are
//! converted into [`ManifestObject`] values at the generator boundary, so
//! the validator and serializer operate on a uniform representation that
//! also accepts externally supplied documents.

use std::collections::BTreeMap;

use kubeforge_common::error::Result;
use kubeforge_common::probe::Probe;
use kubeforge_common::sizing::ResourceQuantity;
use serde::{Deserialize, Serialize};

/// Standard object metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Resource name.
    pub name: String,
    /// Resource namespace.
    pub namespace: String,
    /// Labels.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// Creates metadata with the standard managed-by label.
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        let name = name.into();
        let mut labels = BTreeMap::new();
        let _ = labels.insert("app".to_string(), name.clone());
        let _ = labels.insert(
            "app.kubernetes.io/managed-by".to_string(),
            kubeforge_common::constants::MANAGED_BY.to_string(),
        );
        Self {
            name,
            namespace: namespace.into(),
            labels,
        }
    }

    /// Adds a label.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.labels.insert(key.into(), value.into());
        self
    }
}

/// Label selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    /// Exact-match labels.
    pub match_labels: BTreeMap<String, String>,
}

/// Workload controller object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    /// API version.
    pub api_version: String,
    /// Kind.
    pub kind: String,
    /// Metadata.
    pub metadata: ObjectMeta,
    /// Spec.
    pub spec: DeploymentSpec,
}

/// Deployment spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
    /// Replica count.
    pub replicas: u32,
    /// Pod selector; must be matched by the template labels.
    pub selector: LabelSelector,
    /// Pod template.
    pub template: PodTemplateSpec,
}

/// Pod template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodTemplateSpec {
    /// Template metadata (labels only).
    pub metadata: PodMeta,
    /// Pod spec.
    pub spec: PodSpec,
}

/// Pod template metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodMeta {
    /// Labels.
    pub labels: BTreeMap<String, String>,
}

/// Pod spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    /// Containers.
    pub containers: Vec<Container>,
    /// Pod volumes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<PodVolume>,
}

/// Container spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// Container name.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Entrypoint override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    /// Arguments to the entrypoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    /// Environment sources.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env_from: Vec<EnvFromSource>,
    /// Exposed container ports.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ContainerPort>,
    /// Resource requirements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
    /// Liveness probe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liveness_probe: Option<Probe>,
    /// Readiness probe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness_probe: Option<Probe>,
    /// Startup probe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup_probe: Option<Probe>,
    /// Volume mounts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
    /// Working directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    /// Security context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_context: Option<SecurityContext>,
}

/// Environment source reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvFromSource {
    /// ConfigMap reference.
    pub config_map_ref: ConfigMapEnvSource,
}

/// ConfigMap environment source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMapEnvSource {
    /// ConfigMap name.
    pub name: String,
}

/// Container port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    /// Port number.
    pub container_port: u16,
    /// Protocol (`TCP` or `UDP`).
    pub protocol: String,
}

/// Resource requests and limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequirements {
    /// Scheduling requests.
    pub requests: ResourceQuantity,
    /// Hard limits.
    pub limits: ResourceQuantity,
}

/// Container security context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityContext {
    /// Whether the container must run as a non-root user.
    pub run_as_non_root: bool,
}

/// Volume mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    /// Pod volume name.
    pub name: String,
    /// Mount path inside the container.
    pub mount_path: String,
    /// Read-only mount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
}

/// Pod volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodVolume {
    /// Volume name.
    pub name: String,
    /// Persistent volume claim source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_volume_claim: Option<PvcVolumeSource>,
    /// Host path source (bind mounts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_path: Option<HostPathVolumeSource>,
}

/// Persistent volume claim source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PvcVolumeSource {
    /// Claim name.
    pub claim_name: String,
}

/// Host path source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostPathVolumeSource {
    /// Host path.
    pub path: String,
}

/// Network service object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// API version.
    pub api_version: String,
    /// Kind.
    pub kind: String,
    /// Metadata.
    pub metadata: ObjectMeta,
    /// Spec.
    pub spec: ServiceSpec,
}

/// Service spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    /// Pod selector.
    pub selector: BTreeMap<String, String>,
    /// Exposed ports, mirroring the config's declarations verbatim.
    pub ports: Vec<ServicePort>,
}

/// Service port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    /// Service port number.
    pub port: u16,
    /// Target container port.
    pub target_port: u16,
    /// Protocol (`TCP` or `UDP`).
    pub protocol: String,
}

/// Configuration map object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMap {
    /// API version.
    pub api_version: String,
    /// Kind.
    pub kind: String,
    /// Metadata.
    pub metadata: ObjectMeta,
    /// Opaque key/value configuration data (not secret data).
    pub data: BTreeMap<String, String>,
}

/// Persistent volume claim object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaim {
    /// API version.
    pub api_version: String,
    /// Kind.
    pub kind: String,
    /// Metadata.
    pub metadata: ObjectMeta,
    /// Spec.
    pub spec: PvcSpec,
}

/// Persistent volume claim spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PvcSpec {
    /// Access modes.
    pub access_modes: Vec<String>,
    /// Storage resource requests.
    pub resources: PvcResources,
}

/// Persistent volume claim resource requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PvcResources {
    /// Requested quantities.
    pub requests: PvcStorageRequest,
}

/// Storage request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PvcStorageRequest {
    /// Storage quantity.
    pub storage: String,
}

/// Ingress route object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingress {
    /// API version.
    pub api_version: String,
    /// Kind.
    pub kind: String,
    /// Metadata.
    pub metadata: ObjectMeta,
    /// Spec.
    pub spec: IngressSpec,
}

/// Ingress spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressSpec {
    /// Routing rules.
    pub rules: Vec<IngressRule>,
}

/// One ingress routing rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressRule {
    /// Hostname this rule applies to.
    pub host: String,
    /// HTTP paths.
    pub http: HttpIngressRuleValue,
}

/// HTTP rule value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpIngressRuleValue {
    /// Path list.
    pub paths: Vec<HttpIngressPath>,
}

/// One HTTP ingress path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpIngressPath {
    /// URL path.
    pub path: String,
    /// Path match type.
    pub path_type: String,
    /// Backend.
    pub backend: IngressBackend,
}

/// Ingress backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressBackend {
    /// Backing service.
    pub service: IngressServiceBackend,
}

/// Ingress service backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressServiceBackend {
    /// Service name.
    pub name: String,
    /// Service port.
    pub port: ServiceBackendPort,
}

/// Service backend port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBackendPort {
    /// Port number.
    pub number: u16,
}

/// One generated (or externally loaded) manifest document.
///
/// Held as untyped YAML so the validator can reason about missing fields in
/// arbitrary documents; generated objects are well-formed by construction
/// and immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestObject(serde_yaml::Value);

impl ManifestObject {
    /// Converts a typed resource into a manifest object.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented as YAML.
    pub fn from_typed<T: serde::Serialize>(resource: &T) -> Result<Self> {
        Ok(Self(serde_yaml::to_value(resource)?))
    }

    /// Wraps an already-parsed YAML document.
    #[must_use]
    pub const fn from_value(value: serde_yaml::Value) -> Self {
        Self(value)
    }

    /// The object's `kind`, if present.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.0.get("kind").and_then(serde_yaml::Value::as_str)
    }

    /// The object's `apiVersion`, if present.
    #[must_use]
    pub fn api_version(&self) -> Option<&str> {
        self.0.get("apiVersion").and_then(serde_yaml::Value::as_str)
    }

    /// The object's `metadata.name`, if present.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.0
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(serde_yaml::Value::as_str)
    }

    /// The underlying YAML value.
    #[must_use]
    pub const fn as_value(&self) -> &serde_yaml::Value {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_meta_carries_standard_labels() {
        let meta = ObjectMeta::new("web", "default");
        assert_eq!(meta.labels.get("app").map(String::as_str), Some("web"));
        assert_eq!(
            meta.labels
                .get("app.kubernetes.io/managed-by")
                .map(String::as_str),
            Some("kubeforge")
        );
    }

    #[test]
    fn manifest_object_accessors() {
        let deployment = Deployment {
            api_version: "apps/v1".into(),
            kind: "Deployment".into(),
            metadata: ObjectMeta::new("web", "default"),
            spec: DeploymentSpec {
                replicas: 1,
                selector: LabelSelector {
                    match_labels: BTreeMap::new(),
                },
                template: PodTemplateSpec {
                    metadata: PodMeta {
                        labels: BTreeMap::new(),
                    },
                    spec: PodSpec {
                        containers: Vec::new(),
                        volumes: Vec::new(),
                    },
                },
            },
        };
        let object = ManifestObject::from_typed(&deployment).expect("convert");
        assert_eq!(object.kind(), Some("Deployment"));
        assert_eq!(object.api_version(), Some("apps/v1"));
        assert_eq!(object.name(), Some("web"));
    }

    #[test]
    fn camel_case_serialization() {
        let port = ContainerPort {
            container_port: 8080,
            protocol: "TCP".into(),
        };
        let value = serde_yaml::to_value(&port).expect("serialize");
        assert!(value.get("containerPort").is_some());
        assert!(value.get("container_port").is_none());
    }
}
