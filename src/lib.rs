// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # route-hypergraph
//!
//! Converts synthesis route trees (nested molecule and reaction nodes) into a
//! per-route hypergraph: every route is one hyperedge connecting all molecule
//! nodes that appear anywhere in it.
//!
//! ## Architecture
//!
//! - **Loader** (`loader`): single object, object list, or JSON Lines input
//! - **Route trees** (`route`): arena-backed nodes tagged Molecule / Reaction / Unknown
//! - **Reducer** (`reduce`): one iterative pass per route; molecule set + reaction count
//! - **Assembler** (`hypergraph`): sorted global identifier table, incidence rows, route metadata
//! - **Export** (`export`): bincode/JSON bundle plus nodes, edges and incidence CSV views
//! - **Pipeline** (`pipeline`): end-to-end run driven by a [`config::ConvertConfig`]
//!
//! ## Library usage
//!
//! ```
//! use route_hypergraph::loader::InputFormat;
//! use route_hypergraph::pipeline::convert_text;
//!
//! let text = r#"{"type": "mol", "smiles": "CCO", "children": [
//!     {"type": "reaction", "children": [{"type": "mol", "smiles": "CC"}]}
//! ]}"#;
//! let hg = convert_text(text, InputFormat::Auto, false, "inline").unwrap();
//! assert_eq!(hg.id_to_mol, vec!["CC", "CCO"]);
//! assert_eq!(hg.routes[0].reaction_count, 1);
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod hypergraph;
pub mod loader;
pub mod pipeline;
pub mod reduce;
pub mod route;
