//! Run configuration, persisted as TOML.
//!
//! Only the input path is required. Artifact paths that are not given default
//! to `<stem>_hypergraph_per_route.<ext>`, `<stem>_route_incidence.csv`,
//! `<stem>_route_nodes.csv` and `<stem>_route_edges.csv`, placed in `out_dir`
//! or next to the input.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::export::{ArtifactPaths, BundleFormat};
use crate::loader::InputFormat;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Configuration for one conversion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Route document to read.
    pub input: PathBuf,
    /// Directory for defaulted artifact paths.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes_csv: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edges_csv: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incidence_csv: Option<PathBuf>,
    /// How to interpret the input text.
    #[serde(default)]
    pub input_format: InputFormat,
    /// Encoding of the bundle artifact.
    #[serde(default)]
    pub bundle_format: BundleFormat,
    /// Reduce routes on the rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_parallel() -> bool {
    true
}

impl ConvertConfig {
    /// A config for `input` with every other field defaulted.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            out_dir: None,
            bundle: None,
            nodes_csv: None,
            edges_csv: None,
            incidence_csv: None,
            input_format: InputFormat::default(),
            bundle_format: BundleFormat::default(),
            parallel: default_parallel(),
        }
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Resolve the four artifact paths, filling in defaults.
    pub fn artifact_paths(&self) -> ArtifactPaths {
        let dir = self
            .out_dir
            .clone()
            .or_else(|| {
                self.input
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(Path::to_path_buf)
            })
            .unwrap_or_else(|| PathBuf::from("."));
        let stem = self
            .input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("routes");

        let defaults = ArtifactPaths::for_stem(&dir, stem, self.bundle_format);
        ArtifactPaths {
            bundle: self.bundle.clone().unwrap_or(defaults.bundle),
            nodes_csv: self.nodes_csv.clone().unwrap_or(defaults.nodes_csv),
            edges_csv: self.edges_csv.clone().unwrap_or(defaults.edges_csv),
            incidence_csv: self.incidence_csv.clone().unwrap_or(defaults.incidence_csv),
        }
    }
}
