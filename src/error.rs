//! Rich diagnostic error types for the route-hypergraph converter.
//!
//! Each stage of the pipeline defines its own error type with miette `#[diagnostic]`
//! derives, providing error codes, help text, and source chains so users know
//! exactly which input or output caused the run to abort.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for a conversion run.
///
/// Each variant wraps a stage-specific error, preserving the full diagnostic
/// chain through to the user. `NoRoutes` is kept separate from load errors:
/// an input that parses but carries no routes is a usage error, not a parse error.
#[derive(Debug, Error, Diagnostic)]
pub enum ConvertError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Reduce(#[from] ReduceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("no routes loaded from {source_name}")]
    #[diagnostic(
        code(route_hg::no_routes),
        help(
            "The input parsed successfully but contained no route objects. \
             Check that the file holds a route object, a list of route objects, \
             or one route object per line."
        )
    )]
    NoRoutes { source_name: String },
}

// ---------------------------------------------------------------------------
// Load errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error("failed to read input: {path}")]
    #[diagnostic(
        code(route_hg::load::read),
        help("Check that the input file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed route document at line {line}, column {column}: {message}")]
    #[diagnostic(
        code(route_hg::load::parse),
        help(
            "The input is not valid JSON. If the file holds one route per line, \
             make sure every non-blank line is a complete JSON object, or pass \
             `--format jsonl` to get the offending line reported."
        )
    )]
    Parse {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("unrecognized route document: top-level value is {found}")]
    #[diagnostic(
        code(route_hg::load::unsupported_shape),
        help("The top-level JSON value must be a route object or a list of route objects.")
    )]
    UnsupportedShape { found: String },
}

// ---------------------------------------------------------------------------
// Tree errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum TreeError {
    #[error("node {parent} references child {child}, but the tree has {len} nodes")]
    #[diagnostic(
        code(route_hg::tree::child_out_of_bounds),
        help("Every child index must refer to a node in the same arena.")
    )]
    ChildOutOfBounds {
        parent: usize,
        child: usize,
        len: usize,
    },

    #[error("root index {root} is out of bounds for a tree of {len} nodes")]
    #[diagnostic(
        code(route_hg::tree::root_out_of_bounds),
        help("The root index must refer to a node in the arena.")
    )]
    RootOutOfBounds { root: usize, len: usize },
}

// ---------------------------------------------------------------------------
// Reduce errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ReduceError {
    #[error("route {route}: node {node} was reached twice during traversal")]
    #[diagnostic(
        code(route_hg::reduce::cycle),
        help(
            "Route trees must not share or revisit nodes. \
             Check the construction of this route for a cycle or a shared subtree."
        )
    )]
    CycleDetected { route: usize, node: usize },
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ExportError {
    #[error("I/O error on {path}: {source}")]
    #[diagnostic(
        code(route_hg::export::io),
        help(
            "A filesystem operation failed. Check that the output directory exists, \
             has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(route_hg::export::serde),
        help(
            "Failed to encode or decode the hypergraph bundle. \
             Check that the bundle file was written by this tool and with the same format."
        )
    )]
    Serialization { message: String },

    #[error("inconsistent hypergraph bundle: {message}")]
    #[diagnostic(
        code(route_hg::export::inconsistent),
        help("The bundle's incidence list, identifier table, and route metadata disagree.")
    )]
    Inconsistent { message: String },

    #[error("output path {path} is used for both the {first} and the {second}")]
    #[diagnostic(
        code(route_hg::export::path_clash),
        help(
            "Every artifact needs its own file, distinct from the input. \
             Check the --bundle, --nodes-csv, --edges-csv and --incidence-csv values."
        )
    )]
    PathClash {
        path: String,
        first: &'static str,
        second: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(route_hg::config::read),
        help("Ensure the config file exists and is valid TOML.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(
        code(route_hg::config::parse),
        help("Check the TOML syntax and field names in the config file.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(route_hg::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for functions returning conversion results.
pub type ConvertResult<T> = std::result::Result<T, ConvertError>;
