//! Line-oriented Dockerfile parser producing a normalized [`BuildConfig`].
//!
//! This parser never fails on malformed input: every field has a documented
//! default and an instruction that cannot be understood leaves its field at
//! that default, logged at warn level. A best-effort first-pass manifest is
//! more useful than a hard failure on a harmless descriptor quirk.

use std::fs;
use std::path::Path;

use kubeforge_common::error::{KubeforgeError, Result};
use kubeforge_common::types::{
    BuildConfig, HealthcheckHint, PortSpec, Protocol, StageRef, VolumeRef,
};

use crate::apptype;

/// Parses Dockerfile text into a normalized build configuration.
///
/// Malformed instructions degrade to field defaults; this function never
/// fails. Parsing the same text twice yields identical results.
#[must_use]
pub fn parse(input: &str) -> BuildConfig {
    tracing::info!("parsing build descriptor");
    let mut config = BuildConfig::default();

    for instruction in logical_instructions(input) {
        let (keyword, rest) = match instruction.split_once(char::is_whitespace) {
            Some((kw, rest)) => (kw, rest.trim()),
            None => (instruction.as_str(), ""),
        };
        apply_instruction(&mut config, keyword, rest);
    }

    config
}

/// Reads a Dockerfile from disk and parses it.
///
/// # Errors
///
/// Returns an error only if the file cannot be read; the parse itself
/// cannot fail.
pub fn parse_file(path: &Path) -> Result<BuildConfig> {
    let input = fs::read_to_string(path).map_err(|source| KubeforgeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse(&input))
}

/// Splits raw text into logical instructions, joining trailing-backslash
/// continuation lines and discarding blank lines and `#` comments.
fn logical_instructions(input: &str) -> Vec<String> {
    let mut instructions = Vec::new();
    let mut current = String::new();

    for line in input.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some(stripped) = trimmed.strip_suffix('\\') {
            current.push_str(stripped.trim_end());
            current.push(' ');
            continue;
        }
        current.push_str(trimmed);
        instructions.push(std::mem::take(&mut current));
    }
    if !current.is_empty() {
        // Dangling continuation at end of input; keep what we have.
        instructions.push(current.trim_end().to_string());
    }

    instructions
}

fn apply_instruction(config: &mut BuildConfig, keyword: &str, rest: &str) {
    match keyword {
        "FROM" => apply_from(config, rest),
        "EXPOSE" => apply_expose(config, rest),
        "ENV" => apply_env(config, rest),
        "VOLUME" => apply_volume(config, rest),
        "WORKDIR" => config.workdir = Some(rest.to_string()),
        "USER" => config.user = Some(rest.to_string()),
        "ENTRYPOINT" => config.entrypoint = Some(parse_exec_form(rest)),
        "CMD" => config.cmd = Some(parse_exec_form(rest)),
        "HEALTHCHECK" => config.healthcheck = parse_healthcheck(rest),
        "LABEL" => apply_label(config, rest),
        "RUN" => config.run_instructions.push(rest.to_string()),
        // COPY, ADD, ARG, and friends carry no deployment-relevant signal.
        _ => {}
    }
}

fn apply_from(config: &mut BuildConfig, rest: &str) {
    let mut tokens = rest.split_whitespace().filter(|t| !t.starts_with("--"));
    let Some(image_ref) = tokens.next() else {
        tracing::warn!("FROM instruction without an image reference");
        return;
    };

    let stage_name = match (tokens.next(), tokens.next()) {
        (Some(kw), Some(name)) if kw.eq_ignore_ascii_case("as") => Some(name.to_string()),
        _ => None,
    };

    // A later stage supersedes the previous one entirely: the final config
    // reflects the last stage, while stage records keep accumulating.
    if !config.stages.is_empty() {
        reset_stage_fields(config);
    }
    config.stages.push(StageRef { name: stage_name });

    let (image, tag) = split_image_ref(image_ref);
    config.app_type = apptype::infer(&image);
    config.base_image = image;
    config.base_tag = tag;
}

fn reset_stage_fields(config: &mut BuildConfig) {
    config.exposed_ports.clear();
    config.env_vars.clear();
    config.volumes.clear();
    config.workdir = None;
    config.user = None;
    config.entrypoint = None;
    config.cmd = None;
    config.healthcheck = None;
    config.run_instructions.clear();
}

/// Splits `repository[:tag]`, looking for the tag separator only after the
/// last path segment so registry host ports survive.
///
/// The tag defaults to `latest` when omitted. Shared with the composition
/// parser, which faces the same image-reference syntax.
#[must_use]
pub fn split_image_ref(image_ref: &str) -> (String, String) {
    let tag_start = image_ref.rfind('/').map_or(0, |idx| idx + 1);
    match image_ref[tag_start..].split_once(':') {
        Some((name, tag)) if !tag.is_empty() => (
            format!("{}{name}", &image_ref[..tag_start]),
            tag.to_string(),
        ),
        _ => (
            image_ref.to_string(),
            kubeforge_common::constants::DEFAULT_IMAGE_TAG.to_string(),
        ),
    }
}

fn apply_expose(config: &mut BuildConfig, rest: &str) {
    for entry in rest.split_whitespace() {
        let (port_part, proto_part) = entry.split_once('/').unwrap_or((entry, "tcp"));
        let Ok(port) = port_part.parse::<u16>() else {
            tracing::warn!(entry, "skipping unparseable EXPOSE entry");
            continue;
        };
        let protocol = if proto_part.eq_ignore_ascii_case("udp") {
            Protocol::Udp
        } else {
            Protocol::Tcp
        };
        config.exposed_ports.push(PortSpec { port, protocol });
    }
}

fn apply_env(config: &mut BuildConfig, rest: &str) {
    let tokens = quoted_split(rest);
    let pair_form = tokens.first().is_some_and(|t| t.contains('='));

    if pair_form {
        for token in tokens {
            if let Some((key, value)) = token.split_once('=') {
                let _ = config
                    .env_vars
                    .insert(key.to_string(), strip_quotes(value).to_string());
            } else {
                tracing::warn!(token, "skipping ENV token without '='");
            }
        }
    } else if let Some((key, value)) = rest.split_once(char::is_whitespace) {
        let _ = config
            .env_vars
            .insert(key.to_string(), strip_quotes(value.trim()).to_string());
    } else if !rest.is_empty() {
        tracing::warn!(rest, "skipping ENV instruction without a value");
    }
}

fn apply_volume(config: &mut BuildConfig, rest: &str) {
    let trimmed = rest.trim();
    if trimmed.starts_with('[') {
        match serde_json::from_str::<Vec<String>>(trimmed) {
            Ok(targets) => {
                for target in targets {
                    config.volumes.push(VolumeRef::anonymous(target));
                }
            }
            Err(err) => tracing::warn!(%err, "skipping malformed VOLUME array"),
        }
        return;
    }
    for target in trimmed.split_whitespace() {
        config.volumes.push(VolumeRef::anonymous(target));
    }
}

/// Parses ENTRYPOINT/CMD content: JSON exec form stays as-is, shell form is
/// normalized to exec form via `/bin/sh -c`.
fn parse_exec_form(rest: &str) -> Vec<String> {
    let trimmed = rest.trim();
    if trimmed.starts_with('[') {
        if let Ok(parts) = serde_json::from_str::<Vec<String>>(trimmed) {
            return parts;
        }
        tracing::warn!(rest, "malformed exec-form array, treating as shell form");
    }
    vec!["/bin/sh".into(), "-c".into(), trimmed.to_string()]
}

fn parse_healthcheck(rest: &str) -> Option<HealthcheckHint> {
    let trimmed = rest.trim();
    if trimmed.eq_ignore_ascii_case("NONE") {
        return None;
    }

    let mut hint = HealthcheckHint::default();
    let mut remaining = trimmed;

    while let Some(flag_rest) = remaining.strip_prefix("--") {
        let (flag, rest_after) = match flag_rest.split_once(char::is_whitespace) {
            Some((flag, rest_after)) => (flag, rest_after.trim_start()),
            None => (flag_rest, ""),
        };
        if let Some((name, value)) = flag.split_once('=') {
            match name {
                "interval" => hint.interval = value.to_string(),
                "timeout" => hint.timeout = value.to_string(),
                "retries" => match value.parse() {
                    Ok(retries) => hint.retries = retries,
                    Err(_) => tracing::warn!(value, "unparseable retries, keeping default"),
                },
                "start-period" => {}
                other => tracing::warn!(flag = other, "unknown HEALTHCHECK flag"),
            }
        }
        remaining = rest_after;
    }

    match remaining.split_once(char::is_whitespace) {
        Some((kw, command)) if kw == "CMD" => {
            hint.command = command.trim().to_string();
            Some(hint)
        }
        _ => {
            tracing::warn!("malformed HEALTHCHECK instruction, ignoring");
            None
        }
    }
}

fn apply_label(config: &mut BuildConfig, rest: &str) {
    for token in quoted_split(rest) {
        if let Some((key, value)) = token.split_once('=') {
            let _ = config
                .labels
                .insert(strip_quotes(key).to_string(), strip_quotes(value).to_string());
        }
    }
}

/// Splits on whitespace while keeping double-quoted segments intact.
fn quoted_split(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use kubeforge_common::types::{AppType, VolumeKind};

    use super::*;

    #[test]
    fn parses_base_image_and_tag() {
        let config = parse("FROM node:20-alpine\nEXPOSE 3000");
        assert_eq!(config.base_image, "node");
        assert_eq!(config.base_tag, "20-alpine");
        assert_eq!(config.app_type, AppType::Node);
    }

    #[test]
    fn defaults_tag_to_latest() {
        let config = parse("FROM nginx");
        assert_eq!(config.base_tag, "latest");
        assert_eq!(config.app_type, AppType::Webserver);
    }

    #[test]
    fn registry_port_is_not_mistaken_for_a_tag() {
        let config = parse("FROM registry.example.com:5000/backend");
        assert_eq!(config.base_image, "registry.example.com:5000/backend");
        assert_eq!(config.base_tag, "latest");
    }

    #[test]
    fn parses_exposed_ports() {
        let config = parse("FROM nginx\nEXPOSE 80 443");
        assert_eq!(config.exposed_ports.len(), 2);
        assert_eq!(config.exposed_ports[0].port, 80);
        assert_eq!(config.exposed_ports[1].port, 443);
        assert_eq!(config.exposed_ports[0].protocol, Protocol::Tcp);
    }

    #[test]
    fn parses_udp_port_suffix() {
        let config = parse("FROM generic\nEXPOSE 53/udp 53/tcp");
        assert_eq!(config.exposed_ports[0].protocol, Protocol::Udp);
        assert_eq!(config.exposed_ports[1].protocol, Protocol::Tcp);
    }

    #[test]
    fn skips_unparseable_ports_without_failing() {
        let config = parse("FROM nginx\nEXPOSE http 8080");
        assert_eq!(config.exposed_ports.len(), 1);
        assert_eq!(config.exposed_ports[0].port, 8080);
    }

    #[test]
    fn parses_env_key_value_pairs() {
        let config = parse("FROM node\nENV NODE_ENV=production PORT=3000");
        assert_eq!(config.env_vars.get("NODE_ENV").map(String::as_str), Some("production"));
        assert_eq!(config.env_vars.get("PORT").map(String::as_str), Some("3000"));
    }

    #[test]
    fn parses_env_key_space_value_form() {
        let config = parse("FROM node\nENV MY_VAR hello world");
        assert_eq!(config.env_vars.get("MY_VAR").map(String::as_str), Some("hello world"));
    }

    #[test]
    fn env_last_declaration_wins() {
        let config = parse("FROM node\nENV A=1\nENV A=2");
        assert_eq!(config.env_vars.get("A").map(String::as_str), Some("2"));
    }

    #[test]
    fn parses_volume_instruction() {
        let config = parse("FROM node\nVOLUME /data /logs");
        assert_eq!(config.volumes.len(), 2);
        assert_eq!(config.volumes[0].kind, VolumeKind::Named);
        assert_eq!(config.volumes[0].target, "/data");
    }

    #[test]
    fn parses_volume_array_form() {
        let config = parse("FROM node\nVOLUME [\"/var/lib/data\"]");
        assert_eq!(config.volumes.len(), 1);
        assert_eq!(config.volumes[0].target, "/var/lib/data");
    }

    #[test]
    fn parses_workdir_and_user() {
        let config = parse("FROM node\nWORKDIR /opt/app\nUSER appuser");
        assert_eq!(config.workdir.as_deref(), Some("/opt/app"));
        assert_eq!(config.user.as_deref(), Some("appuser"));
    }

    #[test]
    fn parses_cmd_exec_form() {
        let config = parse(r#"FROM node
CMD ["node", "index.js"]"#);
        assert_eq!(config.cmd, Some(vec!["node".to_string(), "index.js".to_string()]));
    }

    #[test]
    fn normalizes_shell_form_cmd_to_exec_form() {
        let config = parse("FROM node\nCMD node index.js");
        assert_eq!(
            config.cmd,
            Some(vec!["/bin/sh".to_string(), "-c".to_string(), "node index.js".to_string()])
        );
    }

    #[test]
    fn parses_healthcheck_instruction() {
        let config = parse(
            "FROM node\nHEALTHCHECK --interval=30s --timeout=5s CMD curl -f http://localhost/",
        );
        let hc = config.healthcheck.expect("healthcheck should exist");
        assert_eq!(hc.interval, "30s");
        assert_eq!(hc.timeout, "5s");
        assert_eq!(hc.command, "curl -f http://localhost/");
    }

    #[test]
    fn healthcheck_none_clears_the_hint() {
        let config = parse("FROM node\nHEALTHCHECK NONE");
        assert!(config.healthcheck.is_none());
    }

    #[test]
    fn malformed_healthcheck_degrades_to_none() {
        let config = parse("FROM node\nHEALTHCHECK --interval=30s");
        assert!(config.healthcheck.is_none());
        // The rest of the document still parses.
        assert_eq!(config.base_image, "node");
    }

    #[test]
    fn infers_app_type_from_base_image() {
        assert_eq!(parse("FROM node:20").app_type, AppType::Node);
        assert_eq!(parse("FROM python:3.12").app_type, AppType::Python);
        assert_eq!(parse("FROM golang:1.22").app_type, AppType::Golang);
        assert_eq!(parse("FROM nginx:latest").app_type, AppType::Webserver);
        assert_eq!(parse("FROM eclipse-temurin:21").app_type, AppType::Java);
        assert_eq!(parse("FROM scratch").app_type, AppType::Generic);
    }

    #[test]
    fn records_multi_stage_builds() {
        let config = parse(
            "FROM node:20 AS builder\nRUN npm build\nFROM node:20-alpine\nCOPY --from=builder /app /app",
        );
        assert_eq!(config.stages.len(), 2);
        assert_eq!(config.stages[0].name.as_deref(), Some("builder"));
        assert!(config.stages[1].name.is_none());
        assert_eq!(config.base_tag, "20-alpine");
    }

    #[test]
    fn later_stage_supersedes_earlier_configuration() {
        let config = parse(
            "FROM golang:1.22 AS build\nENV BUILD_ONLY=1\nEXPOSE 9999\nFROM nginx\nEXPOSE 80",
        );
        assert_eq!(config.app_type, AppType::Webserver);
        assert_eq!(config.exposed_ports.len(), 1);
        assert_eq!(config.exposed_ports[0].port, 80);
        assert!(config.env_vars.is_empty());
    }

    #[test]
    fn joins_continuation_lines() {
        let config = parse("FROM node\nRUN apt-get update && \\\n    apt-get install -y curl");
        assert_eq!(config.run_instructions.len(), 1);
        assert!(config.run_instructions[0].contains("apt-get install"));
    }

    #[test]
    fn parses_labels() {
        let config = parse("FROM node\nLABEL team=platform tier=\"backend\"");
        assert_eq!(config.labels.get("team").map(String::as_str), Some("platform"));
        assert_eq!(config.labels.get("tier").map(String::as_str), Some("backend"));
    }

    #[test]
    fn keywords_are_case_sensitive() {
        let config = parse("from node\nexpose 3000");
        assert!(config.base_image.is_empty());
        assert!(config.exposed_ports.is_empty());
    }

    #[test]
    fn parsing_is_idempotent() {
        let input = "FROM node:20-alpine\nEXPOSE 3000\nENV A=1 B=2\nVOLUME /data\nUSER node";
        assert_eq!(parse(input), parse(input));
    }

    #[test]
    fn parse_file_reads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Dockerfile");
        std::fs::write(&path, "FROM redis:7\nEXPOSE 6379").expect("write");

        let config = parse_file(&path).expect("should parse");
        assert_eq!(config.app_type, AppType::Redis);
        assert_eq!(config.first_port(), Some(6379));
    }

    #[test]
    fn parse_file_reports_missing_path() {
        let result = parse_file(Path::new("/nonexistent/Dockerfile"));
        assert!(result.is_err());
    }
}
