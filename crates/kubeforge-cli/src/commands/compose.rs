//! `kforge compose` — Translate a docker-compose manifest into a Kubernetes
//! manifest set.

use std::path::PathBuf;

use clap::Args;
use kubeforge_common::config::OutputConfig;
use kubeforge_manifest::{generator, serializer, validator};
use kubeforge_parser::graph::DependencyGraph;

/// Arguments for the `compose` subcommand.
#[derive(Args, Debug)]
pub struct ComposeArgs {
    /// Path to the composition manifest.
    #[arg(default_value = "docker-compose.yml")]
    pub file: PathBuf,

    /// Namespace written into generated object metadata.
    #[arg(long)]
    pub namespace: Option<String>,

    /// Write output to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip the validation report.
    #[arg(long)]
    pub no_validate: bool,
}

/// Executes the `compose` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the YAML is structurally
/// broken, or the output cannot be written.
pub fn execute(args: ComposeArgs) -> anyhow::Result<()> {
    let input = &args.file;
    tracing::info!(path = %input.display(), "converting composition");

    if !input.exists() {
        anyhow::bail!("file not found: {}", input.display());
    }

    let composition = kubeforge_parser::compose::parse_file(input)?;
    let mut output_config = OutputConfig::default();
    if let Some(ref namespace) = args.namespace {
        output_config.namespace.clone_from(namespace);
    }

    let objects = generator::generate_from_composition(&composition, &output_config)?;
    let yaml = serializer::to_yaml(&objects)?;

    if let Some(ref out_path) = args.output {
        std::fs::write(out_path, &yaml)?;
        println!("Converted {} -> {}", input.display(), out_path.display());
        println!("Services: {}", composition.services.len());
        println!("Objects: {}", objects.len());
    } else {
        print!("{yaml}");
    }

    // Startup order is a hint; emission order stays declaration order.
    let graph = DependencyGraph::from_composition(&composition);
    match graph.resolve_order() {
        Ok(order) if order.len() > 1 => {
            println!("Startup order: {}", order.join(" -> "));
        }
        Ok(_) => {}
        Err(err) => tracing::warn!(%err, "skipping startup-order hint"),
    }
    for dangling in graph.dangling_references() {
        println!("Warning: unresolved depends_on: {dangling}");
    }

    if !args.no_validate {
        let summary = validator::validate_all(&objects);
        println!("{}", crate::output::format_summary(&summary));
    }

    Ok(())
}
