//! Export types and artifact writers for an assembled hypergraph.
//!
//! A run produces four mutually consistent artifacts:
//! - a bundle ([`HypergraphBundle`]) holding the incidence rows, identifier table
//!   and route metadata, encoded with bincode or JSON
//! - `nodes` CSV: `node_id,smiles`
//! - `edges` CSV: `edge_id,edge_name,target,reaction_count`
//! - `incidence` CSV: `node_id,smiles,edge_id,edge_name,target_smiles`, a join of the other three
//!
//! [`write_artifacts`] renders all four in memory first and only then touches
//! the filesystem, staging through `*.tmp` siblings so a failed run leaves no
//! partial set behind.

use std::fmt;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::hypergraph::{Hypergraph, Incidence, RouteMeta};

/// Current bundle layout version.
pub const BUNDLE_VERSION: u32 = 1;

/// Serialized form of a [`Hypergraph`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HypergraphBundle {
    /// Bundle layout version.
    pub version: u32,
    /// Row 0: node IDs; row 1: edge IDs. Equal length.
    pub hyperedge_index: [Vec<u64>; 2],
    /// Identifier string per node ID.
    pub id_to_mol: Vec<String>,
    /// Metadata per edge ID.
    pub routes: Vec<RouteMeta>,
}

impl From<&Hypergraph> for HypergraphBundle {
    fn from(hg: &Hypergraph) -> Self {
        Self {
            version: BUNDLE_VERSION,
            hyperedge_index: [hg.incidence.node_ids.clone(), hg.incidence.edge_ids.clone()],
            id_to_mol: hg.id_to_mol.clone(),
            routes: hg.routes.clone(),
        }
    }
}

impl HypergraphBundle {
    /// Convert back to a hypergraph, validating consistency.
    pub fn into_hypergraph(self) -> Result<Hypergraph, ExportError> {
        if self.version != BUNDLE_VERSION {
            return Err(ExportError::Inconsistent {
                message: format!(
                    "unsupported bundle version {} (expected {BUNDLE_VERSION})",
                    self.version
                ),
            });
        }
        let [node_ids, edge_ids] = self.hyperedge_index;
        let hg = Hypergraph {
            incidence: Incidence { node_ids, edge_ids },
            id_to_mol: self.id_to_mol,
            routes: self.routes,
        };
        hg.check_consistency()
            .map_err(|message| ExportError::Inconsistent { message })?;
        Ok(hg)
    }
}

/// Encoding used for the bundle artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleFormat {
    #[default]
    Bincode,
    Json,
}

impl BundleFormat {
    /// File extension used for default bundle paths.
    pub fn extension(self) -> &'static str {
        match self {
            BundleFormat::Bincode => "bin",
            BundleFormat::Json => "json",
        }
    }

    /// Guess the format from a path's extension; anything but `.json` is bincode.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => BundleFormat::Json,
            _ => BundleFormat::Bincode,
        }
    }
}

impl fmt::Display for BundleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleFormat::Bincode => write!(f, "bincode"),
            BundleFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for BundleFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bincode" | "bin" => Ok(BundleFormat::Bincode),
            "json" => Ok(BundleFormat::Json),
            other => Err(format!(
                "unknown bundle format \"{other}\" (expected bincode or json)"
            )),
        }
    }
}

/// Encode a hypergraph as bundle bytes.
pub fn encode_bundle(hg: &Hypergraph, format: BundleFormat) -> Result<Vec<u8>, ExportError> {
    let bundle = HypergraphBundle::from(hg);
    match format {
        BundleFormat::Bincode => {
            bincode::serialize(&bundle).map_err(|e| ExportError::Serialization {
                message: format!("failed to encode bincode bundle: {e}"),
            })
        }
        BundleFormat::Json => {
            let mut bytes =
                serde_json::to_vec_pretty(&bundle).map_err(|e| ExportError::Serialization {
                    message: format!("failed to encode JSON bundle: {e}"),
                })?;
            bytes.push(b'\n');
            Ok(bytes)
        }
    }
}

/// Decode bundle bytes and validate the result.
pub fn decode_bundle(bytes: &[u8], format: BundleFormat) -> Result<Hypergraph, ExportError> {
    let bundle: HypergraphBundle = match format {
        BundleFormat::Bincode => {
            bincode::deserialize(bytes).map_err(|e| ExportError::Serialization {
                message: format!("failed to decode bincode bundle: {e}"),
            })?
        }
        BundleFormat::Json => {
            serde_json::from_slice(bytes).map_err(|e| ExportError::Serialization {
                message: format!("failed to decode JSON bundle: {e}"),
            })?
        }
    };
    bundle.into_hypergraph()
}

/// Read and decode a bundle file. Without an explicit format, the extension decides.
pub fn read_bundle(path: &Path, format: Option<BundleFormat>) -> Result<Hypergraph, ExportError> {
    let bytes = std::fs::read(path).map_err(|e| ExportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    decode_bundle(&bytes, format.unwrap_or_else(|| BundleFormat::from_path(path)))
}

// ---------------------------------------------------------------------------
// CSV views
// ---------------------------------------------------------------------------

fn csv_field(value: &str) -> std::borrow::Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\"")).into()
    } else {
        value.into()
    }
}

/// `node_id,smiles`, one row per node ID.
pub fn render_nodes_csv(hg: &Hypergraph) -> String {
    let mut out = String::from("node_id,smiles\n");
    for (id, smiles) in hg.id_to_mol.iter().enumerate() {
        let _ = writeln!(out, "{id},{}", csv_field(smiles));
    }
    out
}

/// `edge_id,edge_name,target,reaction_count`, one row per route.
pub fn render_edges_csv(hg: &Hypergraph) -> String {
    let mut out = String::from("edge_id,edge_name,target,reaction_count\n");
    for meta in &hg.routes {
        let _ = writeln!(
            out,
            "{},{},{},{}",
            meta.edge_id,
            csv_field(&meta.edge_name),
            csv_field(&meta.target),
            meta.reaction_count
        );
    }
    out
}

/// `node_id,smiles,edge_id,edge_name,target_smiles`, one row per incidence pair.
pub fn render_incidence_csv(hg: &Hypergraph) -> String {
    let mut out = String::from("node_id,smiles,edge_id,edge_name,target_smiles\n");
    for row in hg.incidence_rows() {
        let _ = writeln!(
            out,
            "{},{},{},{},{}",
            row.node_id,
            csv_field(row.smiles),
            row.edge_id,
            csv_field(row.edge_name),
            csv_field(row.target_smiles)
        );
    }
    out
}

// ---------------------------------------------------------------------------
// Artifact writing
// ---------------------------------------------------------------------------

/// Destination paths for the four artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub bundle: PathBuf,
    pub nodes_csv: PathBuf,
    pub edges_csv: PathBuf,
    pub incidence_csv: PathBuf,
}

impl ArtifactPaths {
    /// Default artifact names for an input stem, inside `dir`.
    pub fn for_stem(dir: &Path, stem: &str, format: BundleFormat) -> Self {
        Self {
            bundle: dir.join(format!("{stem}_hypergraph_per_route.{}", format.extension())),
            nodes_csv: dir.join(format!("{stem}_route_nodes.csv")),
            edges_csv: dir.join(format!("{stem}_route_edges.csv")),
            incidence_csv: dir.join(format!("{stem}_route_incidence.csv")),
        }
    }

    /// Artifact labels paired with their paths, in [`ArtifactPaths::iter`] order.
    fn labeled(&self) -> [(&'static str, &Path); 4] {
        [
            ("bundle", self.bundle.as_path()),
            ("incidence CSV", self.incidence_csv.as_path()),
            ("nodes CSV", self.nodes_csv.as_path()),
            ("edges CSV", self.edges_csv.as_path()),
        ]
    }

    /// Reject path sets where two artifacts (or their staging files, or the
    /// input) would share a file.
    pub fn ensure_distinct(&self, input: Option<&Path>) -> Result<(), ExportError> {
        let mut claimed: Vec<(&'static str, PathBuf)> = Vec::with_capacity(9);
        if let Some(input) = input {
            claimed.push(("input", input.to_path_buf()));
        }
        for (label, path) in self.labeled() {
            for candidate in [path.to_path_buf(), tmp_path(path)] {
                if let Some((first, _)) = claimed.iter().find(|(_, p)| *p == candidate) {
                    return Err(ExportError::PathClash {
                        path: candidate.display().to_string(),
                        first: *first,
                        second: label,
                    });
                }
            }
            claimed.push((label, path.to_path_buf()));
            claimed.push((label, tmp_path(path)));
        }
        Ok(())
    }

    /// All four paths, bundle first.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.labeled().into_iter().map(|(_, path)| path)
    }
}

/// Render all artifacts, then write them so that either all four land or none do.
pub fn write_artifacts(
    hg: &Hypergraph,
    paths: &ArtifactPaths,
    format: BundleFormat,
) -> Result<(), ExportError> {
    paths.ensure_distinct(None)?;
    let staged: Vec<(&Path, Vec<u8>)> = vec![
        (paths.bundle.as_path(), encode_bundle(hg, format)?),
        (paths.incidence_csv.as_path(), render_incidence_csv(hg).into_bytes()),
        (paths.nodes_csv.as_path(), render_nodes_csv(hg).into_bytes()),
        (paths.edges_csv.as_path(), render_edges_csv(hg).into_bytes()),
    ];

    let mut written: Vec<PathBuf> = Vec::with_capacity(staged.len());
    let result = stage_all(&staged, &mut written).and_then(|()| commit_all(&staged));
    if result.is_err() {
        for tmp in &written {
            let _ = std::fs::remove_file(tmp);
        }
    }
    result
}

fn stage_all(staged: &[(&Path, Vec<u8>)], written: &mut Vec<PathBuf>) -> Result<(), ExportError> {
    for (path, bytes) in staged {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ExportError::Io {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        let tmp = tmp_path(path);
        std::fs::write(&tmp, bytes).map_err(|e| ExportError::Io {
            path: tmp.display().to_string(),
            source: e,
        })?;
        written.push(tmp);
    }
    Ok(())
}

fn commit_all(staged: &[(&Path, Vec<u8>)]) -> Result<(), ExportError> {
    for (path, _) in staged {
        std::fs::rename(tmp_path(path), path).map_err(|e| ExportError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
