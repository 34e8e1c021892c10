//! Conversion pipeline: load → reduce → assemble → export.
//!
//! Reduction runs per route with no shared state; assembly sees the complete
//! set of reductions before assigning node IDs. Every fatal condition is
//! raised before the first artifact is written.

use std::fmt;

use crate::config::ConvertConfig;
use crate::error::{ConvertError, ConvertResult};
use crate::export::{self, ArtifactPaths};
use crate::hypergraph::{self, Hypergraph};
use crate::loader::{self, InputFormat};
use crate::reduce;
use crate::route::RouteTree;

/// Counts and destinations of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub nodes: usize,
    pub edges: usize,
    pub incidence_pairs: usize,
    pub artifacts: ArtifactPaths,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "nodes: {} edges(routes): {} incidence pairs: {}",
            self.nodes, self.edges, self.incidence_pairs
        )?;
        let saved: Vec<String> = self
            .artifacts
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        write!(f, "Saved: {}", saved.join(", "))
    }
}

/// Reduce and assemble already-loaded routes.
pub fn convert_routes(trees: &[RouteTree], parallel: bool) -> ConvertResult<Hypergraph> {
    let reductions = reduce::reduce_all(trees, parallel)?;
    Ok(hypergraph::assemble(&reductions))
}

/// Convert raw route text into a hypergraph.
///
/// `source_name` only labels the [`ConvertError::NoRoutes`] diagnostic.
pub fn convert_text(
    text: &str,
    format: InputFormat,
    parallel: bool,
    source_name: &str,
) -> ConvertResult<Hypergraph> {
    let trees = loader::load_routes(text, format)?;
    if trees.is_empty() {
        return Err(ConvertError::NoRoutes {
            source_name: source_name.to_string(),
        });
    }
    tracing::debug!(routes = trees.len(), %format, "loaded routes");
    convert_routes(&trees, parallel)
}

/// Run a full conversion described by `config` and write all artifacts.
pub fn run(config: &ConvertConfig) -> ConvertResult<RunSummary> {
    let artifacts = config.artifact_paths();
    artifacts.ensure_distinct(Some(config.input.as_path()))?;

    let trees = loader::load_routes_from_path(&config.input, config.input_format)?;
    if trees.is_empty() {
        return Err(ConvertError::NoRoutes {
            source_name: config.input.display().to_string(),
        });
    }

    let hg = convert_routes(&trees, config.parallel)?;
    export::write_artifacts(&hg, &artifacts, config.bundle_format)?;

    let summary = RunSummary {
        nodes: hg.node_count(),
        edges: hg.edge_count(),
        incidence_pairs: hg.incidence.len(),
        artifacts,
    };
    tracing::info!(
        input = %config.input.display(),
        nodes = summary.nodes,
        edges = summary.edges,
        incidence_pairs = summary.incidence_pairs,
        bundle = %summary.artifacts.bundle.display(),
        "converted routes to hypergraph"
    );
    Ok(summary)
}
