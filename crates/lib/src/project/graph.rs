//! Parent/child ancestry graph for a batch of projects.
//!
//! Nodes are batch indices. An edge runs from a child to its parent whenever
//! the parent reference resolves to another project in the same batch. The
//! graph yields a descendants-first processing order, so that plugin
//! references recorded by children are already known when their ancestor is
//! processed.

use std::collections::HashMap;
use std::path::PathBuf;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;

use crate::coord::VersionlessKey;

use super::Project;

#[derive(Debug, Error)]
pub enum GraphError {
  /// A parent chain loops back on itself.
  #[error("circular parent chain involving {}", pom.display())]
  Cycle { pom: PathBuf },
}

/// Ancestry relations between the projects of one batch.
pub struct AncestryGraph {
  graph: DiGraph<usize, ()>,
  nodes: Vec<NodeIndex>,
  poms: Vec<PathBuf>,
}

impl AncestryGraph {
  pub fn from_projects(projects: &[Project]) -> Self {
    let mut graph = DiGraph::new();
    let nodes: Vec<NodeIndex> = (0..projects.len()).map(|idx| graph.add_node(idx)).collect();

    // First project wins when a key appears twice in the batch.
    let mut by_key: HashMap<VersionlessKey, usize> = HashMap::new();
    for (idx, project) in projects.iter().enumerate() {
      by_key.entry(project.versionless_key()).or_insert(idx);
    }

    for (idx, project) in projects.iter().enumerate() {
      if let Some(parent) = project.parent()
        && let Some(&parent_idx) = by_key.get(&parent.versionless())
      {
        graph.add_edge(nodes[idx], nodes[parent_idx], ());
      }
    }

    Self {
      graph,
      nodes,
      poms: projects.iter().map(|p| p.pom().to_path_buf()).collect(),
    }
  }

  /// Descendants-first order over the batch.
  ///
  /// # Errors
  ///
  /// Returns `Cycle` naming one project on the loop when parent references
  /// are circular.
  pub fn processing_order(&self) -> Result<Vec<usize>, GraphError> {
    let sorted = toposort(&self.graph, None).map_err(|cycle| GraphError::Cycle {
      pom: self.poms[self.graph[cycle.node_id()]].clone(),
    })?;
    Ok(sorted.into_iter().map(|n| self.graph[n]).collect())
  }
}
