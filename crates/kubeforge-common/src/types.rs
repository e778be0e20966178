//! Normalized build-configuration model shared across the workspace.
//!
//! Both descriptor parsers (Dockerfile and docker-compose) reduce their
//! heterogeneous input syntax to [`BuildConfig`]; everything downstream
//! (resource estimation, probe synthesis, manifest generation) consumes only
//! this model. Values are created once by a parser and read-only thereafter.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Inferred application category, driving resource, probe, and routing
/// heuristics downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppType {
    /// Node.js runtime.
    Node,
    /// Python runtime.
    Python,
    /// Go runtime.
    Golang,
    /// JVM-based runtime (slow cold starts, heavy memory defaults).
    Java,
    /// Web server / reverse proxy family (nginx, httpd, ...).
    Webserver,
    /// Redis-compatible key-value store.
    Redis,
    /// PostgreSQL database.
    Postgres,
    /// MySQL-compatible database.
    Mysql,
    /// MongoDB document store.
    Mongo,
    /// No base-image signature matched.
    #[default]
    Generic,
}

impl AppType {
    /// Whether this category speaks a raw wire protocol rather than HTTP.
    ///
    /// Data stores get TCP probes instead of HTTP probes and never receive
    /// an ingress route, regardless of exposed ports.
    #[must_use]
    pub const fn is_data_store(self) -> bool {
        matches!(self, Self::Redis | Self::Postgres | Self::Mysql | Self::Mongo)
    }

    /// Whether this category is expected to serve HTTP on its exposed ports.
    #[must_use]
    pub const fn is_http_serving(self) -> bool {
        !self.is_data_store()
    }
}

impl fmt::Display for AppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Node => "node",
            Self::Python => "python",
            Self::Golang => "golang",
            Self::Java => "java",
            Self::Webserver => "webserver",
            Self::Redis => "redis",
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Mongo => "mongo",
            Self::Generic => "generic",
        };
        write!(f, "{name}")
    }
}

/// Network protocol of an exposed port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// TCP (the default for all declaration syntaxes).
    #[default]
    Tcp,
    /// UDP.
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
        }
    }
}

/// One network port the containerized process listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    /// Container port number.
    pub port: u16,
    /// Wire protocol.
    pub protocol: Protocol,
}

impl PortSpec {
    /// Creates a TCP port spec.
    #[must_use]
    pub const fn tcp(port: u16) -> Self {
        Self {
            port,
            protocol: Protocol::Tcp,
        }
    }
}

/// How a volume declaration is backed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeKind {
    /// A named (or anonymous) managed volume.
    #[serde(rename = "volume")]
    Named,
    /// A host-path bind mount.
    Bind,
}

/// A normalized volume declaration.
///
/// A bare target path is a [`VolumeKind::Named`] volume with no source; a
/// `host:container[:ro]` declaration is a [`VolumeKind::Bind`] mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeRef {
    /// Backing kind.
    pub kind: VolumeKind,
    /// Volume name or host path; `None` for anonymous volumes.
    pub source: Option<String>,
    /// Mount path inside the container.
    pub target: String,
    /// Whether the mount is read-only (`:ro` suffix).
    pub read_only: bool,
}

impl VolumeRef {
    /// Creates an anonymous named volume mounted at `target`.
    #[must_use]
    pub fn anonymous(target: impl Into<String>) -> Self {
        Self {
            kind: VolumeKind::Named,
            source: None,
            target: target.into(),
            read_only: false,
        }
    }
}

/// Operator-declared liveness hint from a `HEALTHCHECK` instruction or a
/// compose `healthcheck` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthcheckHint {
    /// Shell command to run inside the container.
    pub command: String,
    /// Interval between checks (duration string, e.g. `30s`).
    pub interval: String,
    /// Per-check timeout (duration string).
    pub timeout: String,
    /// Consecutive failures before the container is considered unhealthy.
    pub retries: u32,
}

impl Default for HealthcheckHint {
    fn default() -> Self {
        Self {
            command: String::new(),
            interval: "30s".into(),
            timeout: "5s".into(),
            retries: 3,
        }
    }
}

/// Resource limits declared in a compose `deploy.resources.limits` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployResources {
    /// Fractional CPU count (e.g. `"0.5"`).
    pub cpus: Option<String>,
    /// Memory quantity in compose syntax (e.g. `"512M"`) or bare bytes.
    pub memory: Option<String>,
}

/// Deploy-time hints present only for composition-parsed services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployHints {
    /// Requested replica count.
    pub replicas: Option<u32>,
    /// Declared resource limits, used verbatim by the estimator.
    pub resources: Option<DeployResources>,
}

/// One stage of a multi-stage build descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRef {
    /// Stage alias from `AS <name>`, when declared.
    pub name: Option<String>,
}

/// The normalized result of parsing one build descriptor or one composition
/// service entry.
///
/// Every field has a documented default, so a parse failure on any single
/// instruction is represented by the default rather than an error channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Runtime image repository (without tag).
    pub base_image: String,
    /// Runtime image tag; `latest` when omitted.
    pub base_tag: String,
    /// Ports the process listens on, in declaration order.
    pub exposed_ports: Vec<PortSpec>,
    /// Declared environment variables; last declaration wins.
    pub env_vars: BTreeMap<String, String>,
    /// Normalized volume declarations.
    pub volumes: Vec<VolumeRef>,
    /// Process working directory.
    pub workdir: Option<String>,
    /// Run-as identity.
    pub user: Option<String>,
    /// Exec-form entrypoint; shell form is normalized by the parser.
    pub entrypoint: Option<Vec<String>>,
    /// Exec-form command; shell form is normalized by the parser.
    pub cmd: Option<Vec<String>>,
    /// Operator-declared liveness hint.
    pub healthcheck: Option<HealthcheckHint>,
    /// Inferred application category; never unset.
    pub app_type: AppType,
    /// Stage records for multi-stage descriptors; the rest of the config
    /// reflects the last stage only.
    pub stages: Vec<StageRef>,
    /// Free-form metadata propagated to generated objects.
    pub labels: BTreeMap<String, String>,
    /// Joined RUN instructions, kept to verify continuation handling.
    pub run_instructions: Vec<String>,
    /// Deploy-time hints; present only for composition-parsed services.
    pub deploy: Option<DeployHints>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            base_image: String::new(),
            base_tag: crate::constants::DEFAULT_IMAGE_TAG.into(),
            exposed_ports: Vec::new(),
            env_vars: BTreeMap::new(),
            volumes: Vec::new(),
            workdir: None,
            user: None,
            entrypoint: None,
            cmd: None,
            healthcheck: None,
            app_type: AppType::Generic,
            stages: Vec::new(),
            labels: BTreeMap::new(),
            run_instructions: Vec::new(),
            deploy: None,
        }
    }
}

impl BuildConfig {
    /// Full image reference, `repository:tag`.
    #[must_use]
    pub fn image_ref(&self) -> String {
        format!("{}:{}", self.base_image, self.base_tag)
    }

    /// First declared port, if any.
    #[must_use]
    pub fn first_port(&self) -> Option<u16> {
        self.exposed_ports.first().map(|p| p.port)
    }
}

/// One service of a composition document: a [`BuildConfig`] with its name
/// and declared dependencies attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name (unique within the document).
    pub name: String,
    /// Names of services this one depends on.
    pub depends_on: Vec<String>,
    /// Normalized per-service build configuration.
    pub build: BuildConfig,
}

/// The normalized result of parsing one multi-service composition document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionConfig {
    /// Services in document declaration order.
    pub services: Vec<ServiceConfig>,
    /// Top-level named volume declarations.
    pub global_volumes: Vec<String>,
    /// Top-level network declarations.
    pub global_networks: Vec<String>,
}

impl CompositionConfig {
    /// Looks up a service by name.
    #[must_use]
    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.iter().find(|s| s.name == name)
    }
}
