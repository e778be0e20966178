//! # kforge — Kubeforge CLI
//!
//! Translates container-build descriptors (Dockerfiles, docker-compose
//! manifests) into a validated Kubernetes manifest set.

mod commands;
mod output;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
        )
        .init();

    let cli = Cli::parse();
    commands::execute(cli)
}
