//! `kforge validate` — Validate an existing multi-document manifest file.

use std::path::PathBuf;

use clap::Args;
use kubeforge_manifest::objects::ManifestObject;
use kubeforge_manifest::validator;
use serde::Deserialize;

/// Arguments for the `validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the multi-document manifest file.
    pub file: PathBuf,
}

/// Executes the `validate` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a document is not valid
/// YAML, or any object fails validation with hard errors.
pub fn execute(args: ValidateArgs) -> anyhow::Result<()> {
    let input = &args.file;
    tracing::info!(path = %input.display(), "validating manifest file");

    if !input.exists() {
        anyhow::bail!("file not found: {}", input.display());
    }

    let text = std::fs::read_to_string(input)?;
    let objects = parse_documents(&text)?;
    if objects.is_empty() {
        anyhow::bail!("no manifest documents found in {}", input.display());
    }

    let summary = validator::validate_all(&objects);
    println!("{}", crate::output::format_summary(&summary));

    if !summary.valid {
        anyhow::bail!(
            "{} error(s) across {} object(s)",
            summary.error_count(),
            summary.reports.len()
        );
    }
    Ok(())
}

/// Splits a multi-document YAML stream into manifest objects, skipping
/// empty documents.
fn parse_documents(text: &str) -> anyhow::Result<Vec<ManifestObject>> {
    let mut objects = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = serde_yaml::Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }
        objects.push(ManifestObject::from_value(value));
    }
    Ok(objects)
}
