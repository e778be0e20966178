//! `kforge convert` — Translate a Dockerfile into a Kubernetes manifest set.

use std::path::{Path, PathBuf};

use clap::Args;
use kubeforge_manifest::generator::{self, GenerateOptions};
use kubeforge_manifest::serializer;
use kubeforge_manifest::validator;

/// Arguments for the `convert` subcommand.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Path to the build descriptor.
    #[arg(default_value = "Dockerfile")]
    pub file: PathBuf,

    /// Workload name; defaults to the descriptor's directory name.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Namespace written into generated object metadata.
    #[arg(long)]
    pub namespace: Option<String>,

    /// Replica count override.
    #[arg(long)]
    pub replicas: Option<u32>,

    /// Write output to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip the validation report.
    #[arg(long)]
    pub no_validate: bool,
}

/// Executes the `convert` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the output not written.
pub fn execute(args: ConvertArgs) -> anyhow::Result<()> {
    let input = &args.file;
    tracing::info!(path = %input.display(), "converting build descriptor");

    if !input.exists() {
        anyhow::bail!("file not found: {}", input.display());
    }

    let config = kubeforge_parser::dockerfile::parse_file(input)?;
    let options = GenerateOptions {
        name: args
            .name
            .clone()
            .unwrap_or_else(|| workload_name_from(input)),
        namespace: args.namespace.clone(),
        replicas: args.replicas,
    };

    let objects = generator::generate(&config, &options)?;
    let yaml = serializer::to_yaml(&objects)?;

    if let Some(ref out_path) = args.output {
        std::fs::write(out_path, &yaml)?;
        println!("Converted {} -> {}", input.display(), out_path.display());
        println!("Objects: {}", objects.len());
    } else {
        print!("{yaml}");
    }

    if !args.no_validate {
        let summary = validator::validate_all(&objects);
        println!("{}", crate::output::format_summary(&summary));
    }

    Ok(())
}

/// Derives a workload name from the descriptor's parent directory,
/// sanitized to lowercase alphanumerics and dashes.
fn workload_name_from(path: &Path) -> String {
    let derived = path
        .canonicalize()
        .ok()
        .and_then(|p| p.parent().and_then(Path::file_name).map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_default();
    let sanitized: String = derived
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let sanitized = sanitized.trim_matches('-').to_string();
    if sanitized.is_empty() {
        "app".to_string()
    } else {
        sanitized
    }
}
