//! Health probe synthesis.
//!
//! Priority order: an operator-declared health check becomes an exec probe;
//! otherwise HTTP-serving categories get an HTTP probe and data stores a TCP
//! probe against the first declared port; with no ports at all a trivial
//! always-succeeding exec probe keeps the workload from running without a
//! liveness signal. A startup probe is always synthesized.

use kubeforge_common::constants::DEFAULT_HEALTH_PATH;
use kubeforge_common::probe::{Probe, ProbeAction, ProbeSet};
use kubeforge_common::types::{AppType, BuildConfig};

/// Startup failure threshold for JVM workloads, tolerating slow cold starts.
const STARTUP_THRESHOLD_JVM: u32 = 30;

/// Startup failure threshold for everything else.
const STARTUP_THRESHOLD_DEFAULT: u32 = 12;

/// Synthesizes the full probe set for one workload. Never fails.
#[must_use]
pub fn synthesize(config: &BuildConfig) -> ProbeSet {
    let action = probe_action(config);
    let (period, timeout, threshold) = config.healthcheck.as_ref().map_or((10, 5, 3), |hint| {
        (
            parse_seconds(&hint.interval).unwrap_or(30),
            parse_seconds(&hint.timeout).unwrap_or(5),
            hint.retries,
        )
    });

    let startup_threshold = if config.app_type == AppType::Java {
        STARTUP_THRESHOLD_JVM
    } else {
        STARTUP_THRESHOLD_DEFAULT
    };

    ProbeSet {
        liveness: Probe {
            action: action.clone(),
            initial_delay_seconds: 10,
            period_seconds: period,
            timeout_seconds: timeout,
            failure_threshold: threshold,
        },
        readiness: Probe {
            action: action.clone(),
            initial_delay_seconds: 5,
            period_seconds: period,
            timeout_seconds: timeout,
            failure_threshold: threshold,
        },
        startup: Probe {
            action,
            initial_delay_seconds: 0,
            period_seconds: 10,
            timeout_seconds: timeout,
            failure_threshold: startup_threshold,
        },
    }
}

fn probe_action(config: &BuildConfig) -> ProbeAction {
    if let Some(hint) = &config.healthcheck {
        return ProbeAction::Exec {
            command: vec!["/bin/sh".into(), "-c".into(), hint.command.clone()],
        };
    }

    match config.first_port() {
        Some(port) if config.app_type.is_data_store() => ProbeAction::TcpSocket { port },
        Some(port) => ProbeAction::HttpGet {
            path: DEFAULT_HEALTH_PATH.into(),
            port,
        },
        None => ProbeAction::Exec {
            command: vec!["/bin/sh".into(), "-c".into(), "true".into()],
        },
    }
}

/// Parses a duration string (`30s`, `1m`, `500ms`) into whole seconds.
fn parse_seconds(value: &str) -> Option<u32> {
    let trimmed = value.trim();
    if let Some(millis) = trimmed.strip_suffix("ms") {
        return millis.parse::<u32>().ok().map(|ms| (ms / 1000).max(1));
    }
    if let Some(seconds) = trimmed.strip_suffix('s') {
        return seconds.parse().ok();
    }
    if let Some(minutes) = trimmed.strip_suffix('m') {
        return minutes.parse::<u32>().ok().map(|m| m * 60);
    }
    trimmed.parse().ok()
}
