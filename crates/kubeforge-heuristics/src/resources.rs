//! Resource sizing estimation.
//!
//! Sizing comes from three sources, in priority order: compose
//! `deploy.resources.limits` (used verbatim after normalization), the
//! category default table, and a CPU scaling factor for services that
//! multiplex many ports. The estimator never fails; malformed hints fall
//! back to the category defaults.

use kubeforge_common::sizing::{ResourceQuantity, ResourceSpec};
use kubeforge_common::types::{AppType, BuildConfig};

/// Default sizing for one category, in millicpu and mebibytes.
struct CategoryDefaults {
    cpu_request: u32,
    cpu_limit: u32,
    memory_request: u32,
    memory_limit: u32,
}

const fn defaults_for(app_type: AppType) -> CategoryDefaults {
    match app_type {
        // JVM workloads need headroom for heap and JIT warm-up.
        AppType::Java => CategoryDefaults {
            cpu_request: 500,
            cpu_limit: 1000,
            memory_request: 512,
            memory_limit: 1024,
        },
        AppType::Postgres => CategoryDefaults {
            cpu_request: 250,
            cpu_limit: 1000,
            memory_request: 256,
            memory_limit: 1024,
        },
        AppType::Golang => CategoryDefaults {
            cpu_request: 50,
            cpu_limit: 250,
            memory_request: 64,
            memory_limit: 256,
        },
        AppType::Webserver => CategoryDefaults {
            cpu_request: 50,
            cpu_limit: 250,
            memory_request: 64,
            memory_limit: 128,
        },
        AppType::Node
        | AppType::Python
        | AppType::Redis
        | AppType::Mysql
        | AppType::Mongo
        | AppType::Generic => CategoryDefaults {
            cpu_request: 100,
            cpu_limit: 500,
            memory_request: 128,
            memory_limit: 512,
        },
    }
}

/// Estimates resource requests and limits for one workload.
///
/// Declared `deploy.resources.limits` override the defaults dimension by
/// dimension: the supplied dimension is normalized and used verbatim with a
/// request of half the limit, while a missing dimension keeps the category
/// default. Without an override, the category defaults apply and the CPU
/// limit scales with port count (more than two exposed ports raises it
/// monotonically).
#[must_use]
pub fn estimate(config: &BuildConfig) -> ResourceSpec {
    let defaults = defaults_for(config.app_type);

    let declared = config.deploy.as_ref().and_then(|d| d.resources.as_ref());
    let cpu_override = declared
        .and_then(|r| r.cpus.as_deref())
        .and_then(parse_cpu_quantity);
    let memory_override = declared
        .and_then(|r| r.memory.as_deref())
        .and_then(parse_memory_quantity);

    let (cpu_request, cpu_limit) = cpu_override.map_or_else(
        || {
            let limit = scale_cpu_for_ports(defaults.cpu_limit, config.exposed_ports.len());
            (defaults.cpu_request, limit)
        },
        |limit| (limit / 2, limit),
    );
    let (memory_request, memory_limit) = memory_override.map_or(
        (defaults.memory_request, defaults.memory_limit),
        |limit| (limit / 2, limit),
    );

    tracing::debug!(
        app_type = %config.app_type,
        cpu_limit,
        memory_limit,
        "estimated resources"
    );

    ResourceSpec {
        requests: ResourceQuantity::from_millis(cpu_request, memory_request),
        limits: ResourceQuantity::from_millis(cpu_limit, memory_limit),
    }
}

/// Scales the base CPU limit for connection-multiplexing services.
///
/// Up to two ports keep the base limit; beyond that the factor grows by a
/// quarter per additional port, starting at 1.5 for three ports.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn scale_cpu_for_ports(base_millis: u32, port_count: usize) -> u32 {
    if port_count <= 2 {
        return base_millis;
    }
    let factor = 0.25f64.mul_add(port_count as f64 - 3.0, 1.5);
    (f64::from(base_millis) * factor).round() as u32
}

/// Parses a compose fractional CPU count (`"0.5"`, `"2"`) into millicpu.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_cpu_quantity(value: &str) -> Option<u32> {
    let trimmed = value.trim();
    let cpus: f64 = match trimmed.parse() {
        Ok(v) => v,
        Err(_) => {
            tracing::warn!(value, "unparseable cpu limit, using category default");
            return None;
        }
    };
    if !cpus.is_finite() || cpus <= 0.0 {
        tracing::warn!(value, "non-positive cpu limit, using category default");
        return None;
    }
    Some((cpus * 1000.0).round() as u32)
}

/// Parses a compose memory quantity (`"512M"`, `"1G"`, `"256Mi"`, or bare
/// bytes) into mebibytes.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_memory_quantity(value: &str) -> Option<u32> {
    let trimmed = value.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(trimmed.len());
    let (number, suffix) = trimmed.split_at(digits_end);

    let amount: f64 = match number.parse() {
        Ok(v) => v,
        Err(_) => {
            tracing::warn!(value, "unparseable memory limit, using category default");
            return None;
        }
    };
    if !amount.is_finite() || amount <= 0.0 {
        tracing::warn!(value, "non-positive memory limit, using category default");
        return None;
    }

    let mebibytes = match suffix.to_ascii_lowercase().as_str() {
        "" | "b" => amount / (1024.0 * 1024.0),
        "k" | "kb" | "ki" => amount / 1024.0,
        "m" | "mb" | "mi" => amount,
        "g" | "gb" | "gi" => amount * 1024.0,
        _ => {
            tracing::warn!(value, "unknown memory suffix, using category default");
            return None;
        }
    };
    Some((mebibytes.round() as u32).max(1))
}

#[cfg(test)]
mod tests {
    use kubeforge_common::types::{DeployHints, DeployResources, PortSpec};

    use super::*;

    fn config_with(app_type: AppType, ports: usize) -> BuildConfig {
        BuildConfig {
            app_type,
            exposed_ports: (0..ports)
                .map(|i| PortSpec::tcp(u16::try_from(8080 + i).unwrap_or(8080)))
                .collect(),
            ..BuildConfig::default()
        }
    }

    fn config_with_limits(cpus: Option<&str>, memory: Option<&str>) -> BuildConfig {
        BuildConfig {
            app_type: AppType::Node,
            deploy: Some(DeployHints {
                replicas: None,
                resources: Some(DeployResources {
                    cpus: cpus.map(ToString::to_string),
                    memory: memory.map(ToString::to_string),
                }),
            }),
            ..BuildConfig::default()
        }
    }

    #[test]
    fn node_app_gets_light_defaults() {
        let spec = estimate(&config_with(AppType::Node, 1));
        assert_eq!(spec.requests.cpu, "100m");
        assert_eq!(spec.requests.memory, "128Mi");
        assert_eq!(spec.limits.cpu, "500m");
        assert_eq!(spec.limits.memory, "512Mi");
    }

    #[test]
    fn java_app_gets_heavy_defaults() {
        let spec = estimate(&config_with(AppType::Java, 0));
        assert_eq!(spec.limits.cpu, "1000m");
        assert_eq!(spec.limits.memory, "1024Mi");
    }

    #[test]
    fn many_ports_scale_the_cpu_limit() {
        let spec = estimate(&config_with(AppType::Generic, 3));
        assert_eq!(spec.limits.cpu, "750m");
    }

    #[test]
    fn cpu_limit_is_monotonic_in_port_count() {
        let parse_millis = |spec: &ResourceSpec| {
            spec.limits
                .cpu
                .trim_end_matches('m')
                .parse::<u32>()
                .expect("millicpu")
        };
        let mut previous = 0;
        for ports in 0..=6 {
            let millis = parse_millis(&estimate(&config_with(AppType::Generic, ports)));
            assert!(millis >= previous, "{ports} ports: {millis} < {previous}");
            previous = millis;
        }
    }

    #[test]
    fn deploy_limits_are_normalized_and_used_verbatim() {
        let spec = estimate(&config_with_limits(Some("0.5"), Some("512M")));
        assert_eq!(spec.limits.cpu, "500m");
        assert_eq!(spec.limits.memory, "512Mi");
        assert_eq!(spec.requests.cpu, "250m");
        assert_eq!(spec.requests.memory, "256Mi");
    }

    #[test]
    fn gigabyte_and_byte_quantities_normalize_to_mebibytes() {
        let spec = estimate(&config_with_limits(None, Some("1G")));
        assert_eq!(spec.limits.memory, "1024Mi");

        let spec = estimate(&config_with_limits(None, Some("536870912")));
        assert_eq!(spec.limits.memory, "512Mi");
    }

    // Assumption: a partial override keeps the category default for the
    // unsupplied dimension.
    #[test]
    fn partial_override_keeps_default_for_other_dimension() {
        let spec = estimate(&config_with_limits(Some("2"), None));
        assert_eq!(spec.limits.cpu, "2000m");
        assert_eq!(spec.requests.cpu, "1000m");
        assert_eq!(spec.limits.memory, "512Mi");
        assert_eq!(spec.requests.memory, "128Mi");
    }

    #[test]
    fn malformed_override_falls_back_to_defaults() {
        let spec = estimate(&config_with_limits(Some("lots"), Some("many")));
        assert_eq!(spec.limits.cpu, "500m");
        assert_eq!(spec.limits.memory, "512Mi");
        assert_eq!(spec.requests.cpu, "100m");
    }
}
