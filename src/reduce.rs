//! Route reducer: one pass over a route tree.
//!
//! The walk is depth-first with an explicit work stack, branching on the node
//! kind:
//! - molecule nodes contribute their identifier (if any) and are descended into
//! - reaction nodes are counted and descended into; they carry no identifier
//! - unknown nodes are descended into and contribute nothing
//!
//! A per-traversal visited marker turns a revisited arena slot into
//! [`ReduceError::CycleDetected`] instead of looping forever.

use std::collections::BTreeSet;

use rayon::prelude::*;

use crate::error::ReduceError;
use crate::route::{MoleculeLabel, NodeKind, RouteTree};

/// Result of reducing one route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteReduction {
    /// Distinct molecule identifiers reachable in the route, sorted.
    pub molecules: BTreeSet<String>,
    /// Number of reaction nodes encountered.
    pub reaction_count: usize,
    /// Label of the root node, present only when the root is a molecule.
    pub root: Option<MoleculeLabel>,
}

/// Reduce a single route. `route` is its position in the input, used for errors.
pub fn reduce_route(tree: &RouteTree, route: usize) -> Result<RouteReduction, ReduceError> {
    let mut molecules = BTreeSet::new();
    let mut reaction_count = 0usize;
    let mut visited = vec![false; tree.len()];
    let mut stack = vec![tree.root()];

    while let Some(idx) = stack.pop() {
        let Some(node) = tree.node(idx) else {
            continue;
        };
        if std::mem::replace(&mut visited[idx], true) {
            return Err(ReduceError::CycleDetected { route, node: idx });
        }

        match node.kind() {
            NodeKind::Molecule(label) => {
                if let Some(smiles) = label.smiles() {
                    molecules.insert(smiles.to_string());
                }
            }
            NodeKind::Reaction => reaction_count += 1,
            NodeKind::Unknown => {}
        }

        // Reverse so children are visited in input order.
        stack.extend(node.children().iter().rev().copied());
    }

    let root = match tree.root_node().kind() {
        NodeKind::Molecule(label) => Some(label.clone()),
        _ => None,
    };

    Ok(RouteReduction {
        molecules,
        reaction_count,
        root,
    })
}

/// Reduce every route, returning results in input order.
///
/// Routes are independent, so with `parallel` set they are reduced on the
/// rayon pool; the indexed collect keeps the output order identical to the
/// sequential path.
pub fn reduce_all(trees: &[RouteTree], parallel: bool) -> Result<Vec<RouteReduction>, ReduceError> {
    if parallel {
        trees
            .par_iter()
            .enumerate()
            .map(|(idx, tree)| reduce_route(tree, idx))
            .collect()
    } else {
        trees
            .iter()
            .enumerate()
            .map(|(idx, tree)| reduce_route(tree, idx))
            .collect()
    }
}
