//! Manifest set generation.
//!
//! Fans the estimator and probe synthesizer into a coherent object set per
//! workload, in a fixed kind order: Deployment, then Service, ConfigMap,
//! PersistentVolumeClaim, and Ingress, each emitted only when the build
//! configuration calls for it.

use std::collections::BTreeMap;

use kubeforge_common::config::OutputConfig;
use kubeforge_common::constants::{
    API_VERSION_APPS, API_VERSION_CORE, API_VERSION_NETWORKING, DEFAULT_PVC_STORAGE, MANAGED_BY,
};
use kubeforge_common::error::Result;
use kubeforge_common::probe::ProbeSet;
use kubeforge_common::sizing::ResourceSpec;
use kubeforge_common::types::{BuildConfig, CompositionConfig, VolumeKind};

use crate::objects::{
    ConfigMap, ConfigMapEnvSource, Container, ContainerPort, Deployment, DeploymentSpec,
    EnvFromSource, HostPathVolumeSource, HttpIngressPath, HttpIngressRuleValue, Ingress,
    IngressBackend, IngressRule, IngressServiceBackend, IngressSpec, LabelSelector,
    ManifestObject, ObjectMeta, PersistentVolumeClaim, PodMeta, PodSpec, PodTemplateSpec,
    PodVolume, PvcResources, PvcSpec, PvcStorageRequest, PvcVolumeSource, ResourceRequirements,
    SecurityContext, Service, ServiceBackendPort, ServicePort, ServiceSpec, VolumeMount,
};

/// Per-invocation generation parameters.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Workload name, used for object names and the `app` label.
    pub name: String,
    /// Namespace override; falls back to the output configuration.
    pub namespace: Option<String>,
    /// Replica override; falls back to deploy hints, then the output default.
    pub replicas: Option<u32>,
}

impl GenerateOptions {
    /// Creates options for a named workload with no overrides.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            replicas: None,
        }
    }
}

/// Generates the manifest set for one workload under default output
/// conventions.
///
/// # Errors
///
/// Returns an error if a generated object cannot be represented as YAML.
pub fn generate(config: &BuildConfig, options: &GenerateOptions) -> Result<Vec<ManifestObject>> {
    generate_with(config, options, &OutputConfig::default())
}

/// Generates the manifest set for one workload.
///
/// # Errors
///
/// Returns an error if a generated object cannot be represented as YAML.
pub fn generate_with(
    config: &BuildConfig,
    options: &GenerateOptions,
    output: &OutputConfig,
) -> Result<Vec<ManifestObject>> {
    let name = options.name.as_str();
    let namespace = options
        .namespace
        .clone()
        .unwrap_or_else(|| output.namespace.clone());
    let replicas = options
        .replicas
        .or_else(|| config.deploy.as_ref().and_then(|d| d.replicas))
        .unwrap_or(output.default_replicas);

    tracing::info!(name, app_type = %config.app_type, replicas, "generating manifest set");

    let resources = kubeforge_heuristics::resources::estimate(config);
    let probes = kubeforge_heuristics::probes::synthesize(config);

    let mut objects = Vec::with_capacity(5);
    objects.push(ManifestObject::from_typed(&deployment(
        config, name, &namespace, replicas, resources, probes,
    ))?);

    if !config.exposed_ports.is_empty() {
        objects.push(ManifestObject::from_typed(&service(
            config, name, &namespace,
        ))?);
    }
    if !config.env_vars.is_empty() {
        objects.push(ManifestObject::from_typed(&config_map(
            config, name, &namespace,
        ))?);
    }
    if !config.volumes.is_empty() {
        objects.push(ManifestObject::from_typed(&claim(name, &namespace))?);
    }
    if !config.exposed_ports.is_empty() && config.app_type.is_http_serving() {
        objects.push(ManifestObject::from_typed(&ingress(
            config, name, &namespace, output,
        ))?);
    } else if config.app_type.is_data_store() {
        tracing::debug!(name, "data store workload, no ingress emitted");
    }

    Ok(objects)
}

/// Generates the concatenated manifest set for a whole composition, one
/// workload at a time in document declaration order.
///
/// Dangling `depends_on` references are logged and skipped; cluster DNS
/// resolves service names regardless of emission order.
///
/// # Errors
///
/// Returns an error if a generated object cannot be represented as YAML.
pub fn generate_from_composition(
    composition: &CompositionConfig,
    output: &OutputConfig,
) -> Result<Vec<ManifestObject>> {
    let mut objects = Vec::new();
    for svc in &composition.services {
        for dep in &svc.depends_on {
            if composition.service(dep).is_none() {
                tracing::warn!(service = %svc.name, dependency = %dep, "depends_on references an undeclared service");
            }
        }
        let options = GenerateOptions::new(&svc.name);
        objects.extend(generate_with(&svc.build, &options, output)?);
    }
    Ok(objects)
}

fn workload_labels(config: &BuildConfig, name: &str) -> BTreeMap<String, String> {
    let mut labels = config.labels.clone();
    let _ = labels.insert("app".to_string(), name.to_string());
    let _ = labels.insert(
        "app.kubernetes.io/managed-by".to_string(),
        MANAGED_BY.to_string(),
    );
    labels
}

fn selector_labels(name: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    let _ = labels.insert("app".to_string(), name.to_string());
    labels
}

fn container_ports(config: &BuildConfig) -> Vec<ContainerPort> {
    config
        .exposed_ports
        .iter()
        .map(|p| ContainerPort {
            container_port: p.port,
            protocol: p.protocol.to_string().to_ascii_uppercase(),
        })
        .collect()
}

/// Whether the declared run-as identity rules out root.
fn runs_as_non_root(config: &BuildConfig) -> bool {
    config.user.as_deref().is_some_and(|user| {
        let identity = user.split(':').next().unwrap_or(user);
        !identity.is_empty() && identity != "root" && identity != "0"
    })
}

fn deployment(
    config: &BuildConfig,
    name: &str,
    namespace: &str,
    replicas: u32,
    resources: ResourceSpec,
    probes: ProbeSet,
) -> Deployment {
    let labels = workload_labels(config, name);

    let volume_mounts: Vec<VolumeMount> = config
        .volumes
        .iter()
        .enumerate()
        .map(|(i, vol)| VolumeMount {
            name: format!("vol-{i}"),
            mount_path: vol.target.clone(),
            read_only: vol.read_only.then_some(true),
        })
        .collect();

    let pod_volumes: Vec<PodVolume> = config
        .volumes
        .iter()
        .enumerate()
        .map(|(i, vol)| match vol.kind {
            VolumeKind::Named => PodVolume {
                name: format!("vol-{i}"),
                persistent_volume_claim: Some(PvcVolumeSource {
                    claim_name: format!("{name}-data"),
                }),
                host_path: None,
            },
            VolumeKind::Bind => PodVolume {
                name: format!("vol-{i}"),
                persistent_volume_claim: None,
                host_path: Some(HostPathVolumeSource {
                    path: vol.source.clone().unwrap_or_else(|| vol.target.clone()),
                }),
            },
        })
        .collect();

    let env_from = if config.env_vars.is_empty() {
        Vec::new()
    } else {
        vec![EnvFromSource {
            config_map_ref: ConfigMapEnvSource {
                name: format!("{name}-config"),
            },
        }]
    };

    let container = Container {
        name: name.to_string(),
        image: config.image_ref(),
        command: config.entrypoint.clone(),
        args: config.cmd.clone(),
        env_from,
        ports: container_ports(config),
        resources: Some(ResourceRequirements {
            requests: resources.requests,
            limits: resources.limits,
        }),
        liveness_probe: Some(probes.liveness),
        readiness_probe: Some(probes.readiness),
        startup_probe: Some(probes.startup),
        volume_mounts,
        working_dir: config.workdir.clone(),
        security_context: runs_as_non_root(config)
            .then_some(SecurityContext { run_as_non_root: true }),
    };

    let mut metadata = ObjectMeta::new(name, namespace);
    metadata.labels = labels.clone();

    Deployment {
        api_version: API_VERSION_APPS.into(),
        kind: "Deployment".into(),
        metadata,
        spec: DeploymentSpec {
            replicas,
            selector: LabelSelector {
                match_labels: selector_labels(name),
            },
            template: PodTemplateSpec {
                metadata: PodMeta { labels },
                spec: PodSpec {
                    containers: vec![container],
                    volumes: pod_volumes,
                },
            },
        },
    }
}

fn service(config: &BuildConfig, name: &str, namespace: &str) -> Service {
    Service {
        api_version: API_VERSION_CORE.into(),
        kind: "Service".into(),
        metadata: ObjectMeta::new(name, namespace),
        spec: ServiceSpec {
            selector: selector_labels(name),
            ports: config
                .exposed_ports
                .iter()
                .map(|p| ServicePort {
                    port: p.port,
                    target_port: p.port,
                    protocol: p.protocol.to_string().to_ascii_uppercase(),
                })
                .collect(),
        },
    }
}

fn config_map(config: &BuildConfig, name: &str, namespace: &str) -> ConfigMap {
    ConfigMap {
        api_version: API_VERSION_CORE.into(),
        kind: "ConfigMap".into(),
        metadata: ObjectMeta::new(format!("{name}-config"), namespace)
            .with_label("app", name),
        data: config.env_vars.clone(),
    }
}

fn claim(name: &str, namespace: &str) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        api_version: API_VERSION_CORE.into(),
        kind: "PersistentVolumeClaim".into(),
        metadata: ObjectMeta::new(format!("{name}-data"), namespace).with_label("app", name),
        spec: PvcSpec {
            access_modes: vec!["ReadWriteOnce".into()],
            resources: PvcResources {
                requests: PvcStorageRequest {
                    storage: DEFAULT_PVC_STORAGE.into(),
                },
            },
        },
    }
}

fn ingress(config: &BuildConfig, name: &str, namespace: &str, output: &OutputConfig) -> Ingress {
    // is_http_serving was checked by the caller, so first_port is present.
    let port = config.first_port().unwrap_or_default();
    Ingress {
        api_version: API_VERSION_NETWORKING.into(),
        kind: "Ingress".into(),
        metadata: ObjectMeta::new(name, namespace),
        spec: IngressSpec {
            rules: vec![IngressRule {
                host: format!("{name}.{}", output.ingress_host_suffix),
                http: HttpIngressRuleValue {
                    paths: vec![HttpIngressPath {
                        path: "/".into(),
                        path_type: "Prefix".into(),
                        backend: IngressBackend {
                            service: IngressServiceBackend {
                                name: name.to_string(),
                                port: ServiceBackendPort { number: port },
                            },
                        },
                    }],
                },
            }],
        },
    }
}

#[cfg(test)]
mod tests {
    use kubeforge_common::types::{
        AppType, DeployHints, PortSpec, ServiceConfig, VolumeRef,
    };

    use super::*;

    fn web_config() -> BuildConfig {
        let mut env = BTreeMap::new();
        let _ = env.insert("NODE_ENV".to_string(), "production".to_string());
        BuildConfig {
            base_image: "node".into(),
            base_tag: "20-alpine".into(),
            app_type: AppType::Node,
            exposed_ports: vec![PortSpec::tcp(3000)],
            env_vars: env,
            user: Some("node".into()),
            ..BuildConfig::default()
        }
    }

    fn kinds(objects: &[ManifestObject]) -> Vec<&str> {
        objects.iter().filter_map(ManifestObject::kind).collect()
    }

    #[test]
    fn web_app_gets_deployment_service_configmap_ingress() {
        let objects =
            generate(&web_config(), &GenerateOptions::new("web")).expect("generate");
        assert_eq!(
            kinds(&objects),
            vec!["Deployment", "Service", "ConfigMap", "Ingress"]
        );
    }

    #[test]
    fn data_store_gets_pvc_but_no_ingress() {
        let config = BuildConfig {
            base_image: "postgres".into(),
            base_tag: "16".into(),
            app_type: AppType::Postgres,
            exposed_ports: vec![PortSpec::tcp(5432)],
            volumes: vec![VolumeRef::anonymous("/var/lib/postgresql/data")],
            ..BuildConfig::default()
        };
        let objects = generate(&config, &GenerateOptions::new("db")).expect("generate");
        let kinds = kinds(&objects);
        assert!(kinds.contains(&"PersistentVolumeClaim"));
        assert!(!kinds.contains(&"Ingress"));
    }

    #[test]
    fn portless_config_emits_only_a_deployment() {
        let config = BuildConfig {
            base_image: "busybox".into(),
            ..BuildConfig::default()
        };
        let objects = generate(&config, &GenerateOptions::new("job")).expect("generate");
        assert_eq!(kinds(&objects), vec!["Deployment"]);
    }

    #[test]
    fn service_mirrors_exposed_ports_in_order() {
        let config = BuildConfig {
            base_image: "bind9".into(),
            exposed_ports: vec![
                PortSpec {
                    port: 53,
                    protocol: kubeforge_common::types::Protocol::Udp,
                },
                PortSpec::tcp(53),
                PortSpec::tcp(953),
            ],
            ..BuildConfig::default()
        };
        let objects = generate(&config, &GenerateOptions::new("dns")).expect("generate");
        let svc = objects
            .iter()
            .find(|o| o.kind() == Some("Service"))
            .expect("service");
        let ports = svc
            .as_value()
            .get("spec")
            .and_then(|s| s.get("ports"))
            .and_then(serde_yaml::Value::as_sequence)
            .expect("ports");
        assert_eq!(ports.len(), 3);
        assert_eq!(
            ports[0].get("protocol").and_then(serde_yaml::Value::as_str),
            Some("UDP")
        );
        assert_eq!(
            ports[1].get("port").and_then(serde_yaml::Value::as_u64),
            Some(53)
        );
        assert_eq!(
            ports[2].get("port").and_then(serde_yaml::Value::as_u64),
            Some(953)
        );
    }

    #[test]
    fn env_vars_flow_through_a_configmap() {
        let objects =
            generate(&web_config(), &GenerateOptions::new("web")).expect("generate");
        let cm = objects
            .iter()
            .find(|o| o.kind() == Some("ConfigMap"))
            .expect("configmap");
        assert_eq!(cm.name(), Some("web-config"));
        assert_eq!(
            cm.as_value()
                .get("data")
                .and_then(|d| d.get("NODE_ENV"))
                .and_then(serde_yaml::Value::as_str),
            Some("production")
        );

        let deployment = &objects[0];
        let env_from = deployment
            .as_value()
            .get("spec")
            .and_then(|s| s.get("template"))
            .and_then(|t| t.get("spec"))
            .and_then(|s| s.get("containers"))
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("envFrom"))
            .expect("envFrom");
        assert_eq!(
            env_from
                .get(0)
                .and_then(|e| e.get("configMapRef"))
                .and_then(|r| r.get("name"))
                .and_then(serde_yaml::Value::as_str),
            Some("web-config")
        );
    }

    #[test]
    fn non_root_user_sets_security_context() {
        let objects =
            generate(&web_config(), &GenerateOptions::new("web")).expect("generate");
        let sc = objects[0]
            .as_value()
            .get("spec")
            .and_then(|s| s.get("template"))
            .and_then(|t| t.get("spec"))
            .and_then(|s| s.get("containers"))
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("securityContext"))
            .expect("securityContext");
        assert_eq!(
            sc.get("runAsNonRoot").and_then(serde_yaml::Value::as_bool),
            Some(true)
        );
    }

    #[test]
    fn root_user_gets_no_security_context() {
        let mut config = web_config();
        config.user = Some("root".into());
        let objects = generate(&config, &GenerateOptions::new("web")).expect("generate");
        let container = objects[0]
            .as_value()
            .get("spec")
            .and_then(|s| s.get("template"))
            .and_then(|t| t.get("spec"))
            .and_then(|s| s.get("containers"))
            .and_then(|c| c.get(0))
            .expect("container");
        assert!(container.get("securityContext").is_none());
    }

    #[test]
    fn replica_precedence_is_options_then_deploy_then_default() {
        let mut config = web_config();
        config.deploy = Some(DeployHints {
            replicas: Some(3),
            resources: None,
        });

        let from_deploy =
            generate(&config, &GenerateOptions::new("web")).expect("generate");
        assert_eq!(
            from_deploy[0]
                .as_value()
                .get("spec")
                .and_then(|s| s.get("replicas"))
                .and_then(serde_yaml::Value::as_u64),
            Some(3)
        );

        let options = GenerateOptions {
            name: "web".into(),
            namespace: None,
            replicas: Some(5),
        };
        let from_options = generate(&config, &options).expect("generate");
        assert_eq!(
            from_options[0]
                .as_value()
                .get("spec")
                .and_then(|s| s.get("replicas"))
                .and_then(serde_yaml::Value::as_u64),
            Some(5)
        );

        let plain = generate(&web_config(), &GenerateOptions::new("web")).expect("generate");
        assert_eq!(
            plain[0]
                .as_value()
                .get("spec")
                .and_then(|s| s.get("replicas"))
                .and_then(serde_yaml::Value::as_u64),
            Some(1)
        );
    }

    #[test]
    fn selector_is_matched_by_template_labels() {
        let objects =
            generate(&web_config(), &GenerateOptions::new("web")).expect("generate");
        let spec = objects[0].as_value().get("spec").expect("spec");
        let selector = spec
            .get("selector")
            .and_then(|s| s.get("matchLabels"))
            .and_then(serde_yaml::Value::as_mapping)
            .expect("matchLabels");
        let template_labels = spec
            .get("template")
            .and_then(|t| t.get("metadata"))
            .and_then(|m| m.get("labels"))
            .and_then(serde_yaml::Value::as_mapping)
            .expect("template labels");
        for (key, value) in selector {
            assert_eq!(template_labels.get(key), Some(value));
        }
    }

    #[test]
    fn bind_volumes_become_host_paths() {
        let config = BuildConfig {
            base_image: "nginx".into(),
            app_type: AppType::Webserver,
            volumes: vec![VolumeRef {
                kind: VolumeKind::Bind,
                source: Some("./site".into()),
                target: "/usr/share/nginx/html".into(),
                read_only: true,
            }],
            ..BuildConfig::default()
        };
        let objects = generate(&config, &GenerateOptions::new("web")).expect("generate");
        let volumes = objects[0]
            .as_value()
            .get("spec")
            .and_then(|s| s.get("template"))
            .and_then(|t| t.get("spec"))
            .and_then(|s| s.get("volumes"))
            .expect("volumes");
        assert_eq!(
            volumes
                .get(0)
                .and_then(|v| v.get("hostPath"))
                .and_then(|h| h.get("path"))
                .and_then(serde_yaml::Value::as_str),
            Some("./site")
        );
        let mounts = objects[0]
            .as_value()
            .get("spec")
            .and_then(|s| s.get("template"))
            .and_then(|t| t.get("spec"))
            .and_then(|s| s.get("containers"))
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("volumeMounts"))
            .expect("mounts");
        assert_eq!(
            mounts
                .get(0)
                .and_then(|m| m.get("readOnly"))
                .and_then(serde_yaml::Value::as_bool),
            Some(true)
        );
    }

    #[test]
    fn composition_concatenates_per_service_sets_in_order() {
        let composition = CompositionConfig {
            services: vec![
                ServiceConfig {
                    name: "web".into(),
                    depends_on: vec!["db".into()],
                    build: web_config(),
                },
                ServiceConfig {
                    name: "db".into(),
                    depends_on: Vec::new(),
                    build: BuildConfig {
                        base_image: "postgres".into(),
                        app_type: AppType::Postgres,
                        exposed_ports: vec![PortSpec::tcp(5432)],
                        ..BuildConfig::default()
                    },
                },
            ],
            ..CompositionConfig::default()
        };
        let objects = generate_from_composition(&composition, &OutputConfig::default())
            .expect("generate");
        let deployments: Vec<&str> = objects
            .iter()
            .filter(|o| o.kind() == Some("Deployment"))
            .filter_map(ManifestObject::name)
            .collect();
        assert_eq!(deployments, vec!["web", "db"]);
    }

    #[test]
    fn unknown_depends_on_is_not_fatal() {
        let composition = CompositionConfig {
            services: vec![ServiceConfig {
                name: "web".into(),
                depends_on: vec!["missing".into()],
                build: web_config(),
            }],
            ..CompositionConfig::default()
        };
        let objects = generate_from_composition(&composition, &OutputConfig::default())
            .expect("generate");
        assert!(!objects.is_empty());
    }

    #[test]
    fn entrypoint_and_cmd_map_to_command_and_args() {
        let mut config = web_config();
        config.entrypoint = Some(vec!["node".into()]);
        config.cmd = Some(vec!["server.js".into()]);
        let objects = generate(&config, &GenerateOptions::new("web")).expect("generate");
        let container = objects[0]
            .as_value()
            .get("spec")
            .and_then(|s| s.get("template"))
            .and_then(|t| t.get("spec"))
            .and_then(|s| s.get("containers"))
            .and_then(|c| c.get(0))
            .expect("container");
        assert_eq!(
            container
                .get("command")
                .and_then(|c| c.get(0))
                .and_then(serde_yaml::Value::as_str),
            Some("node")
        );
        assert_eq!(
            container
                .get("args")
                .and_then(|a| a.get(0))
                .and_then(serde_yaml::Value::as_str),
            Some("server.js")
        );
    }
}
