//! Hypergraph assembler: per-route reductions to a global incidence structure.
//!
//! Each route becomes one hyperedge whose ID is its input position. Molecule
//! identifiers from all routes are unioned and sorted lexicographically, so
//! node IDs depend only on the set of identifiers and never on arrival order.
//! The incidence list is stored as two parallel rows, `(node_id, edge_id)`,
//! ordered by edge and then by identifier within an edge.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::reduce::RouteReduction;

/// Per-route metadata, derived from the route's root node only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMeta {
    /// Hyperedge ID (zero-based route position).
    pub edge_id: u64,
    /// Display name: root name, else root identifier, else `route_<edge_id>`.
    pub edge_name: String,
    /// Root identifier, or empty when the root is not a usable molecule.
    pub target: String,
    /// Reaction nodes encountered anywhere in the route.
    pub reaction_count: u64,
}

impl RouteMeta {
    /// Apply the edge naming policy to one reduced route.
    pub fn from_reduction(edge_id: usize, reduction: &RouteReduction) -> Self {
        let (name, target) = match &reduction.root {
            Some(label) => (
                label.name().or(label.smiles()).map(str::to_string),
                label.smiles().unwrap_or_default().to_string(),
            ),
            None => (None, String::new()),
        };

        Self {
            edge_id: edge_id as u64,
            edge_name: name.unwrap_or_else(|| fallback_edge_name(edge_id as u64)),
            target,
            reaction_count: reduction.reaction_count as u64,
        }
    }
}

/// Synthetic edge name for routes whose root cannot name them.
pub fn fallback_edge_name(edge_id: u64) -> String {
    format!("route_{edge_id}")
}

/// Bipartite incidence list as two equal-length rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incidence {
    /// Molecule (node) ID of each pair.
    pub node_ids: Vec<u64>,
    /// Route (hyperedge) ID of each pair.
    pub edge_ids: Vec<u64>,
}

impl Incidence {
    pub fn len(&self) -> usize {
        self.node_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty()
    }

    /// Iterate `(node_id, edge_id)` pairs in storage order.
    pub fn pairs(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.node_ids
            .iter()
            .copied()
            .zip(self.edge_ids.iter().copied())
    }

    fn push(&mut self, node_id: u64, edge_id: u64) {
        self.node_ids.push(node_id);
        self.edge_ids.push(edge_id);
    }
}

/// A denormalized incidence row: the pair joined with node and edge tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncidenceRow<'a> {
    pub node_id: u64,
    pub smiles: &'a str,
    pub edge_id: u64,
    pub edge_name: &'a str,
    pub target_smiles: &'a str,
}

/// The assembled per-route hypergraph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hypergraph {
    /// Incidence pairs, grouped by edge in input order.
    pub incidence: Incidence,
    /// Global identifier table: `id_to_mol[node_id]` is the identifier string.
    pub id_to_mol: Vec<String>,
    /// One metadata record per route, indexed by edge ID.
    pub routes: Vec<RouteMeta>,
}

impl Hypergraph {
    pub fn node_count(&self) -> usize {
        self.id_to_mol.len()
    }

    pub fn edge_count(&self) -> usize {
        self.routes.len()
    }

    /// Look up the node ID for an identifier string.
    pub fn node_id(&self, smiles: &str) -> Option<u64> {
        self.id_to_mol
            .binary_search_by(|probe| probe.as_str().cmp(smiles))
            .ok()
            .map(|idx| idx as u64)
    }

    /// Number of molecules in each hyperedge, indexed by edge ID.
    pub fn edge_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.edge_count()];
        for &edge_id in &self.incidence.edge_ids {
            if let Some(size) = sizes.get_mut(edge_id as usize) {
                *size += 1;
            }
        }
        sizes
    }

    /// Join each incidence pair with the node and edge tables.
    ///
    /// Out-of-range IDs join to empty strings, so a malformed bundle can
    /// still be inspected.
    pub fn incidence_rows(&self) -> impl Iterator<Item = IncidenceRow<'_>> + '_ {
        self.incidence.pairs().map(move |(node_id, edge_id)| {
            let meta = self.routes.get(edge_id as usize);
            IncidenceRow {
                node_id,
                smiles: self
                    .id_to_mol
                    .get(node_id as usize)
                    .map(String::as_str)
                    .unwrap_or(""),
                edge_id,
                edge_name: meta.map(|m| m.edge_name.as_str()).unwrap_or(""),
                target_smiles: meta.map(|m| m.target.as_str()).unwrap_or(""),
            }
        })
    }

    /// Check the mutual consistency of the three members.
    ///
    /// Returns a description of the first violation found.
    pub fn check_consistency(&self) -> Result<(), String> {
        if self.incidence.node_ids.len() != self.incidence.edge_ids.len() {
            return Err(format!(
                "incidence rows differ in length: {} node IDs, {} edge IDs",
                self.incidence.node_ids.len(),
                self.incidence.edge_ids.len()
            ));
        }
        if self.id_to_mol.windows(2).any(|w| w[0] >= w[1]) {
            return Err("identifier table is not strictly sorted".into());
        }
        for (idx, meta) in self.routes.iter().enumerate() {
            if meta.edge_id != idx as u64 {
                return Err(format!("route {idx} carries edge_id {}", meta.edge_id));
            }
        }

        let mut seen = BTreeSet::new();
        for (node_id, edge_id) in self.incidence.pairs() {
            if node_id as usize >= self.node_count() {
                return Err(format!("node ID {node_id} out of range"));
            }
            if edge_id as usize >= self.edge_count() {
                return Err(format!("edge ID {edge_id} out of range"));
            }
            if !seen.insert((edge_id, node_id)) {
                return Err(format!("duplicate incidence pair ({node_id}, {edge_id})"));
            }
        }
        Ok(())
    }
}

/// Assemble the hypergraph from per-route reductions, in input order.
///
/// Phase one folds every route's molecule set into the sorted global table;
/// phase two emits incidence pairs and metadata route by route.
pub fn assemble(reductions: &[RouteReduction]) -> Hypergraph {
    let id_to_mol: Vec<String> = reductions
        .iter()
        .flat_map(|r| r.molecules.iter())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .cloned()
        .collect();

    let mut incidence = Incidence::default();
    let mut routes = Vec::with_capacity(reductions.len());

    for (edge_id, reduction) in reductions.iter().enumerate() {
        for smiles in &reduction.molecules {
            // Every identifier is in the table by construction.
            if let Ok(node_id) = id_to_mol.binary_search(smiles) {
                incidence.push(node_id as u64, edge_id as u64);
            }
        }
        routes.push(RouteMeta::from_reduction(edge_id, reduction));
    }

    tracing::debug!(
        nodes = id_to_mol.len(),
        edges = routes.len(),
        incidence = incidence.len(),
        "assembled hypergraph"
    );

    Hypergraph {
        incidence,
        id_to_mol,
        routes,
    }
}
