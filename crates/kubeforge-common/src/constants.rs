//! Workspace-wide constants and Kubernetes conventions.

/// Image tag assumed when a reference omits one.
pub const DEFAULT_IMAGE_TAG: &str = "latest";

/// Conventional HTTP health endpoint probed for web-serving workloads.
pub const DEFAULT_HEALTH_PATH: &str = "/healthz";

/// API version for Deployment objects.
pub const API_VERSION_APPS: &str = "apps/v1";

/// API version for core objects (Service, ConfigMap, PersistentVolumeClaim).
pub const API_VERSION_CORE: &str = "v1";

/// API version for Ingress objects.
pub const API_VERSION_NETWORKING: &str = "networking.k8s.io/v1";

/// Value of the `app.kubernetes.io/managed-by` label on generated objects.
pub const MANAGED_BY: &str = "kubeforge";

/// YAML document separator between serialized manifest objects.
pub const DOCUMENT_SEPARATOR: &str = "---";

/// Storage request attached to generated PersistentVolumeClaims.
pub const DEFAULT_PVC_STORAGE: &str = "1Gi";

/// Replica count used when neither the options nor the descriptor set one.
pub const DEFAULT_REPLICAS: u32 = 1;

/// Application name used in CLI output.
pub const APP_NAME: &str = "kubeforge";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "kforge";
