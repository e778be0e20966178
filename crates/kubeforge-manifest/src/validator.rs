//! Structural manifest validation.
//!
//! Purely structural checks over [`ManifestObject`] values, so externally
//! loaded documents validate the same way as generated ones. Missing
//! identity fields and broken selectors are errors; missing best-practice
//! fields (resources, probes, security context) are warnings.

use serde_yaml::Value;

use crate::objects::ManifestObject;

/// Validation outcome for one manifest object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Object name, or `<unnamed>` when metadata carries none.
    pub name: String,
    /// Object kind, or `<unknown>` when absent.
    pub kind: String,
    /// Whether the object passed without errors (warnings allowed).
    pub valid: bool,
    /// Structural errors.
    pub errors: Vec<String>,
    /// Best-practice warnings.
    pub warnings: Vec<String>,
}

/// Aggregated outcome across a whole manifest set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationSummary {
    /// Whether every object passed without errors.
    pub valid: bool,
    /// Per-object reports, in input order.
    pub reports: Vec<ValidationReport>,
}

impl ValidationSummary {
    /// Total error count across all reports.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.reports.iter().map(|r| r.errors.len()).sum()
    }

    /// Total warning count across all reports.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.reports.iter().map(|r| r.warnings.len()).sum()
    }
}

/// Validates one manifest object.
#[must_use]
pub fn validate(object: &ManifestObject) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    match object.api_version() {
        None => errors.push("missing apiVersion".to_string()),
        Some("") => errors.push("empty apiVersion".to_string()),
        Some(_) => {}
    }
    match object.kind() {
        None => errors.push("missing kind".to_string()),
        Some("") => errors.push("empty kind".to_string()),
        Some(_) => {}
    }

    if object.kind() == Some("Deployment") {
        check_deployment(object.as_value(), &mut errors, &mut warnings);
    }

    let report = ValidationReport {
        name: object.name().unwrap_or("<unnamed>").to_string(),
        kind: object.kind().unwrap_or("<unknown>").to_string(),
        valid: errors.is_empty(),
        errors,
        warnings,
    };
    if !report.valid {
        tracing::warn!(name = %report.name, kind = %report.kind, errors = report.errors.len(), "manifest failed validation");
    }
    report
}

/// Validates a whole manifest set; always reports across the full list.
#[must_use]
pub fn validate_all(objects: &[ManifestObject]) -> ValidationSummary {
    let reports: Vec<ValidationReport> = objects.iter().map(validate).collect();
    ValidationSummary {
        valid: reports.iter().all(|r| r.valid),
        reports,
    }
}

fn check_deployment(value: &Value, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    let spec = value.get("spec");

    let selector = spec
        .and_then(|s| s.get("selector"))
        .and_then(|s| s.get("matchLabels"))
        .and_then(Value::as_mapping);
    let template_labels = spec
        .and_then(|s| s.get("template"))
        .and_then(|t| t.get("metadata"))
        .and_then(|m| m.get("labels"))
        .and_then(Value::as_mapping);
    match (selector, template_labels) {
        (Some(selector), Some(labels)) => {
            for (key, expected) in selector {
                if labels.get(key) != Some(expected) {
                    let key = key.as_str().unwrap_or("<non-string>");
                    errors.push(format!("selector label `{key}` not matched by template labels"));
                }
            }
        }
        (Some(_), None) => {
            errors.push("selector present but template has no labels".to_string());
        }
        (None, _) => errors.push("missing spec.selector.matchLabels".to_string()),
    }

    let containers = spec
        .and_then(|s| s.get("template"))
        .and_then(|t| t.get("spec"))
        .and_then(|s| s.get("containers"))
        .and_then(Value::as_sequence);
    let Some(containers) = containers else {
        errors.push("missing pod template containers".to_string());
        return;
    };

    for container in containers {
        let name = container
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("<unnamed>");

        let resources = container.get("resources");
        if resources.and_then(|r| r.get("requests")).is_none() {
            warnings.push(format!("container `{name}` has no resource requests"));
        }
        if resources.and_then(|r| r.get("limits")).is_none() {
            warnings.push(format!("container `{name}` has no resource limits"));
        }
        if container.get("livenessProbe").is_none() {
            warnings.push(format!("container `{name}` has no liveness probe"));
        }
        if container.get("readinessProbe").is_none() {
            warnings.push(format!("container `{name}` has no readiness probe"));
        }
        let non_root = container
            .get("securityContext")
            .and_then(|sc| sc.get("runAsNonRoot"))
            .and_then(Value::as_bool);
        if non_root != Some(true) {
            warnings.push(format!("container `{name}` does not enforce runAsNonRoot"));
        }
    }
}
