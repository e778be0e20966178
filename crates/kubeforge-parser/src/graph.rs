//! Service dependency graph built from `depends_on` declarations.
//!
//! Manifest emission always follows document declaration order; this graph
//! exists to surface dangling references, detect cycles, and compute a
//! dependency-first startup order for operator reporting.

use std::collections::HashMap;

use kubeforge_common::error::{KubeforgeError, Result};
use kubeforge_common::types::CompositionConfig;

/// A dependency graph over composition services.
#[derive(Debug)]
pub struct DependencyGraph {
    graph: petgraph::Graph<String, ()>,
    /// `depends_on` entries that reference no declared service.
    dangling: Vec<String>,
}

impl DependencyGraph {
    /// Builds the graph from a parsed composition.
    ///
    /// Edges point from dependency to dependent so that topological sort
    /// yields dependencies first. References to undeclared services are
    /// recorded rather than rejected.
    #[must_use]
    pub fn from_composition(composition: &CompositionConfig) -> Self {
        let mut graph = petgraph::Graph::new();
        let mut dangling = Vec::new();

        let indices: HashMap<&str, petgraph::graph::NodeIndex> = composition
            .services
            .iter()
            .map(|svc| (svc.name.as_str(), graph.add_node(svc.name.clone())))
            .collect();

        for service in &composition.services {
            for dep in &service.depends_on {
                match (indices.get(dep.as_str()), indices.get(service.name.as_str())) {
                    (Some(&dep_idx), Some(&svc_idx)) => {
                        let _ = graph.add_edge(dep_idx, svc_idx, ());
                    }
                    _ => {
                        tracing::warn!(
                            service = %service.name,
                            dependency = %dep,
                            "depends_on references an undeclared service"
                        );
                        dangling.push(format!("{} -> {dep}", service.name));
                    }
                }
            }
        }

        Self { graph, dangling }
    }

    /// `depends_on` entries that reference no declared service, as
    /// `service -> dependency` strings.
    #[must_use]
    pub fn dangling_references(&self) -> &[String] {
        &self.dangling
    }

    /// Returns a dependency-first startup order.
    ///
    /// # Errors
    ///
    /// Returns an error if the declarations form a cycle.
    pub fn resolve_order(&self) -> Result<Vec<String>> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .iter()
                .filter_map(|&idx| self.graph.node_weight(idx).cloned())
                .collect()),
            Err(_cycle) => Err(KubeforgeError::Config {
                message: "cyclic depends_on declarations in composition".into(),
            }),
        }
    }
}
