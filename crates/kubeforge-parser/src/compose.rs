//! docker-compose document parser producing a [`CompositionConfig`].
//!
//! The only hard failure is structurally broken YAML; individual service
//! fields that cannot be understood degrade to their defaults with a warning,
//! matching the build-descriptor parser's behavior.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use kubeforge_common::error::{KubeforgeError, Result};
use kubeforge_common::types::{
    BuildConfig, CompositionConfig, DeployHints, DeployResources, HealthcheckHint, PortSpec,
    Protocol, ServiceConfig, VolumeKind, VolumeRef,
};
use serde::Deserialize;

use crate::{apptype, dockerfile};

/// Parses docker-compose YAML into a normalized composition configuration.
///
/// Services are enumerated in document order; service names are unique by
/// virtue of being YAML mapping keys.
///
/// # Errors
///
/// Returns an error only if the document is not structurally valid YAML.
pub fn parse(input: &str) -> Result<CompositionConfig> {
    tracing::info!("parsing composition document");
    let raw: RawCompose = serde_yaml::from_str(input)?;

    let mut services = Vec::new();
    for (key, value) in raw.services {
        let Some(name) = key.as_str().map(ToString::to_string) else {
            tracing::warn!("skipping service with non-string name");
            continue;
        };
        let raw_service: RawService = match serde_yaml::from_value(value) {
            Ok(svc) => svc,
            Err(err) => {
                tracing::warn!(service = %name, %err, "malformed service entry, using defaults");
                RawService::default()
            }
        };
        services.push(normalize_service(name, raw_service));
    }

    Ok(CompositionConfig {
        services,
        global_volumes: mapping_keys(&raw.volumes),
        global_networks: mapping_keys(&raw.networks),
    })
}

/// Reads a compose file from disk and parses it.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid YAML.
pub fn parse_file(path: &Path) -> Result<CompositionConfig> {
    let input = fs::read_to_string(path).map_err(|source| KubeforgeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&input)
}

fn mapping_keys(mapping: &serde_yaml::Mapping) -> Vec<String> {
    mapping
        .keys()
        .filter_map(|k| k.as_str().map(ToString::to_string))
        .collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCompose {
    services: serde_yaml::Mapping,
    volumes: serde_yaml::Mapping,
    networks: serde_yaml::Mapping,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawService {
    image: Lenient<Option<String>>,
    ports: Lenient<Vec<RawPort>>,
    environment: Lenient<Option<RawKeyValues>>,
    volumes: Lenient<Vec<RawVolume>>,
    depends_on: Lenient<Option<RawDependsOn>>,
    deploy: Lenient<Option<RawDeploy>>,
    command: Lenient<Option<RawCommand>>,
    entrypoint: Lenient<Option<RawCommand>>,
    user: Lenient<Option<String>>,
    working_dir: Lenient<Option<String>>,
    labels: Lenient<Option<RawKeyValues>>,
    healthcheck: Lenient<Option<RawHealthcheck>>,
}

/// A service field that degrades on its own: content that does not match
/// the expected shape falls back to the field default instead of failing
/// the whole service entry.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Valid(T),
    Invalid(serde_yaml::Value),
}

impl<T: Default> Default for Lenient<T> {
    fn default() -> Self {
        Self::Valid(T::default())
    }
}

impl<T: Default> Lenient<T> {
    fn resolve(self, service: &str, field: &str) -> T {
        match self {
            Self::Valid(value) => value,
            Self::Invalid(value) => {
                tracing::warn!(service, field, ?value, "malformed field, using default");
                T::default()
            }
        }
    }
}

/// A YAML scalar coerced to its string representation.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl RawScalar {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Integer(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

/// Environment/labels in either list (`KEY=value`) or map syntax.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawKeyValues {
    List(Vec<String>),
    Map(BTreeMap<String, RawScalar>),
}

impl RawKeyValues {
    fn into_map(self) -> BTreeMap<String, String> {
        match self {
            Self::List(entries) => entries
                .into_iter()
                .filter_map(|entry| {
                    entry
                        .split_once('=')
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                })
                .collect(),
            Self::Map(map) => map
                .into_iter()
                .map(|(k, v)| (k, v.into_string()))
                .collect(),
        }
    }
}

/// Port in scalar (`3000`, `"80:80"`, `"53:53/udp"`) or long-map syntax.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPort {
    Number(u16),
    Text(String),
    Long {
        target: u16,
        #[serde(default)]
        protocol: Option<String>,
    },
}

impl RawPort {
    fn into_port_spec(self) -> Option<PortSpec> {
        match self {
            Self::Number(port) => Some(PortSpec::tcp(port)),
            Self::Text(text) => parse_port_shorthand(&text),
            Self::Long { target, protocol } => Some(PortSpec {
                port: target,
                protocol: protocol
                    .filter(|p| p.eq_ignore_ascii_case("udp"))
                    .map_or(Protocol::Tcp, |_| Protocol::Udp),
            }),
        }
    }
}

/// Parses `"[host:]container[/proto]"`; the container port is the segment
/// after the last colon.
fn parse_port_shorthand(text: &str) -> Option<PortSpec> {
    let (ports, proto) = text.split_once('/').unwrap_or((text, "tcp"));
    let container = ports.rsplit(':').next().unwrap_or(ports);
    let Ok(port) = container.parse::<u16>() else {
        tracing::warn!(entry = text, "skipping unparseable port entry");
        return None;
    };
    let protocol = if proto.eq_ignore_ascii_case("udp") {
        Protocol::Udp
    } else {
        Protocol::Tcp
    };
    Some(PortSpec { port, protocol })
}

/// Volume in short string or long-map syntax.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawVolume {
    Text(String),
    Long {
        #[serde(rename = "type", default)]
        kind: Option<String>,
        #[serde(default)]
        source: Option<String>,
        target: String,
        #[serde(default)]
        read_only: bool,
    },
}

impl RawVolume {
    fn into_volume_ref(self) -> Option<VolumeRef> {
        match self {
            Self::Text(text) => parse_volume_shorthand(&text),
            Self::Long {
                kind,
                source,
                target,
                read_only,
            } => {
                let kind = match kind.as_deref() {
                    Some("bind") => VolumeKind::Bind,
                    _ => VolumeKind::Named,
                };
                Some(VolumeRef {
                    kind,
                    source,
                    target,
                    read_only,
                })
            }
        }
    }
}

/// Parses short volume syntax: a bare target path, `name:/path[:ro]`, or
/// `./host:/path[:ro]`. A source containing a path separator is a bind
/// mount; a bare name is a managed volume.
fn parse_volume_shorthand(text: &str) -> Option<VolumeRef> {
    let parts: Vec<&str> = text.split(':').collect();
    match parts.as_slice() {
        [target] if !target.is_empty() => Some(VolumeRef::anonymous(*target)),
        [source, target] | [source, target, _] => {
            let read_only = matches!(parts.get(2), Some(&"ro"));
            let kind = if source.contains('/') || source.starts_with('.') {
                VolumeKind::Bind
            } else {
                VolumeKind::Named
            };
            Some(VolumeRef {
                kind,
                source: Some((*source).to_string()),
                target: (*target).to_string(),
                read_only,
            })
        }
        _ => {
            tracing::warn!(entry = text, "skipping unparseable volume entry");
            None
        }
    }
}

/// depends_on in list or map (per-dependency condition) syntax.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDependsOn {
    List(Vec<String>),
    Map(serde_yaml::Mapping),
}

impl RawDependsOn {
    fn into_names(self) -> Vec<String> {
        match self {
            Self::List(names) => names,
            Self::Map(mapping) => mapping_keys(&mapping),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDeploy {
    replicas: Option<u32>,
    resources: Option<RawDeployResources>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDeployResources {
    limits: Option<RawLimits>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLimits {
    cpus: Option<RawScalar>,
    memory: Option<RawScalar>,
}

/// command/entrypoint in string (shell) or list (exec) syntax.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCommand {
    Text(String),
    List(Vec<String>),
}

impl RawCommand {
    /// Normalizes shell form to exec form, like the build-descriptor parser.
    fn into_exec_form(self) -> Vec<String> {
        match self {
            Self::Text(text) => vec!["/bin/sh".into(), "-c".into(), text],
            Self::List(parts) => parts,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawHealthcheck {
    test: Option<RawCommand>,
    interval: Option<String>,
    timeout: Option<String>,
    retries: Option<u32>,
    disable: bool,
}

impl RawHealthcheck {
    fn into_hint(self) -> Option<HealthcheckHint> {
        if self.disable {
            return None;
        }
        let command = match self.test? {
            RawCommand::Text(text) => text,
            RawCommand::List(parts) => parts
                .into_iter()
                .filter(|p| p != "CMD" && p != "CMD-SHELL")
                .collect::<Vec<_>>()
                .join(" "),
        };
        if command.is_empty() {
            return None;
        }
        let mut hint = HealthcheckHint {
            command,
            ..HealthcheckHint::default()
        };
        if let Some(interval) = self.interval {
            hint.interval = interval;
        }
        if let Some(timeout) = self.timeout {
            hint.timeout = timeout;
        }
        if let Some(retries) = self.retries {
            hint.retries = retries;
        }
        Some(hint)
    }
}

fn normalize_service(name: String, raw: RawService) -> ServiceConfig {
    let mut build = BuildConfig::default();

    if let Some(image) = raw.image.resolve(&name, "image") {
        let (image, tag) = dockerfile::split_image_ref(&image);
        build.app_type = apptype::infer(&image);
        build.base_image = image;
        build.base_tag = tag;
    } else {
        tracing::warn!(service = %name, "service has no image reference");
    }

    build.exposed_ports = raw
        .ports
        .resolve(&name, "ports")
        .into_iter()
        .filter_map(RawPort::into_port_spec)
        .collect();
    build.env_vars = raw
        .environment
        .resolve(&name, "environment")
        .map(RawKeyValues::into_map)
        .unwrap_or_default();
    build.volumes = raw
        .volumes
        .resolve(&name, "volumes")
        .into_iter()
        .filter_map(RawVolume::into_volume_ref)
        .collect();
    build.labels = raw
        .labels
        .resolve(&name, "labels")
        .map(RawKeyValues::into_map)
        .unwrap_or_default();
    build.user = raw.user.resolve(&name, "user");
    build.workdir = raw.working_dir.resolve(&name, "working_dir");
    build.cmd = raw.command.resolve(&name, "command").map(RawCommand::into_exec_form);
    build.entrypoint = raw
        .entrypoint
        .resolve(&name, "entrypoint")
        .map(RawCommand::into_exec_form);
    build.healthcheck = raw
        .healthcheck
        .resolve(&name, "healthcheck")
        .and_then(RawHealthcheck::into_hint);
    build.deploy = raw.deploy.resolve(&name, "deploy").map(|deploy| DeployHints {
        replicas: deploy.replicas,
        resources: deploy.resources.and_then(|r| r.limits).map(|limits| {
            DeployResources {
                cpus: limits.cpus.map(RawScalar::into_string),
                memory: limits.memory.map(RawScalar::into_string),
            }
        }),
    });

    ServiceConfig {
        depends_on: raw
            .depends_on
            .resolve(&name, "depends_on")
            .map(RawDependsOn::into_names)
            .unwrap_or_default(),
        name,
        build,
    }
}
