//! Health probe model in Kubernetes camelCase shape.
//!
//! These types serialize directly into the generated Deployment's container
//! spec, so the serde layout mirrors the cluster API rather than internal
//! naming conventions.

use serde::{Deserialize, Serialize};

/// The action a probe performs.
///
/// Serializes externally tagged, producing the Kubernetes probe shape
/// (`httpGet: {...}`, `tcpSocket: {...}`, `exec: {...}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProbeAction {
    /// HTTP GET against a path on a container port.
    #[serde(rename_all = "camelCase")]
    HttpGet {
        /// Request path.
        path: String,
        /// Container port.
        port: u16,
    },
    /// TCP connection attempt against a container port.
    #[serde(rename_all = "camelCase")]
    TcpSocket {
        /// Container port.
        port: u16,
    },
    /// Command executed inside the container; exit 0 means healthy.
    Exec {
        /// Exec-form command.
        command: Vec<String>,
    },
}

/// One liveness, readiness, or startup probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Probe {
    /// Probe action, flattened into the Kubernetes shape.
    #[serde(flatten)]
    pub action: ProbeAction,
    /// Seconds to wait before the first check.
    pub initial_delay_seconds: u32,
    /// Seconds between checks.
    pub period_seconds: u32,
    /// Per-check timeout in seconds.
    pub timeout_seconds: u32,
    /// Consecutive failures before the probe is considered failed.
    pub failure_threshold: u32,
}

impl Probe {
    /// Container port this probe targets, if it is network-based.
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        match self.action {
            ProbeAction::HttpGet { port, .. } | ProbeAction::TcpSocket { port } => Some(port),
            ProbeAction::Exec { .. } => None,
        }
    }
}

/// The full probe set synthesized for one workload.
///
/// The startup probe is always present; liveness and readiness are as well,
/// so a generated workload is never left without a health signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeSet {
    /// Liveness probe.
    pub liveness: Probe,
    /// Readiness probe.
    pub readiness: Probe,
    /// Startup probe with a category-dependent failure threshold.
    pub startup: Probe,
}
