//! Route trees: arena-backed, tagged representation of one synthesis route.
//!
//! A route arrives as nested JSON objects (`type`, `smiles`, `name`, `children`).
//! It is converted once, at ingestion, into a [`RouteTree`]: a flat arena of
//! [`RouteNode`]s addressed by index. Each node carries only the fields that
//! are meaningful for its [`NodeKind`]:
//!
//! - **Molecule** (`type == "mol"`): a [`MoleculeLabel`] with the usable `smiles` and `name`
//! - **Reaction** (`type == "reaction"`): nothing but children; its own `smiles`,
//!   `metadata.smiles` and `rsmi` fields are never copied out of the input
//! - **Unknown** (any other or missing `type`): nothing but children
//!
//! Non-object entries in a `children` list carry no information and are dropped here.

use serde_json::{Map, Value};

use crate::error::TreeError;

/// Index of a node inside its [`RouteTree`] arena.
pub type NodeIndex = usize;

/// Identifier fields of a molecule node, normalized at construction.
///
/// `smiles` is kept only when it is a non-empty string; `name` only when it is
/// non-blank, and is stored trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoleculeLabel {
    smiles: Option<String>,
    name: Option<String>,
}

impl MoleculeLabel {
    /// Build a label, discarding empty identifiers and blank names.
    pub fn new(smiles: Option<&str>, name: Option<&str>) -> Self {
        Self {
            smiles: smiles.filter(|s| !s.is_empty()).map(str::to_string),
            name: name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        }
    }

    /// The molecule identifier string, if usable.
    pub fn smiles(&self) -> Option<&str> {
        self.smiles.as_deref()
    }

    /// The trimmed display name, if usable.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Type discriminant of a route node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Molecule(MoleculeLabel),
    Reaction,
    Unknown,
}

impl NodeKind {
    fn from_object(obj: &Map<String, Value>) -> Self {
        match obj.get("type").and_then(Value::as_str) {
            Some("mol") => NodeKind::Molecule(MoleculeLabel::new(
                obj.get("smiles").and_then(Value::as_str),
                obj.get("name").and_then(Value::as_str),
            )),
            Some("reaction") => NodeKind::Reaction,
            _ => NodeKind::Unknown,
        }
    }
}

/// One node in a route arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteNode {
    kind: NodeKind,
    children: Vec<NodeIndex>,
}

impl RouteNode {
    pub fn new(kind: NodeKind, children: Vec<NodeIndex>) -> Self {
        Self { kind, children }
    }

    pub fn molecule(label: MoleculeLabel, children: Vec<NodeIndex>) -> Self {
        Self::new(NodeKind::Molecule(label), children)
    }

    pub fn reaction(children: Vec<NodeIndex>) -> Self {
        Self::new(NodeKind::Reaction, children)
    }

    pub fn unknown(children: Vec<NodeIndex>) -> Self {
        Self::new(NodeKind::Unknown, children)
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Child indices, in input order.
    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }
}

/// A single route, stored as an arena of nodes plus a root index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTree {
    nodes: Vec<RouteNode>,
    root: NodeIndex,
}

impl RouteTree {
    /// Build a tree from a JSON route object without recursion.
    ///
    /// Children are assigned arena slots when their parent is visited, so every
    /// node's child list keeps the input order.
    pub fn from_object(root: &Map<String, Value>) -> Self {
        let mut nodes = vec![RouteNode::unknown(Vec::new())];
        let mut pending: Vec<(&Map<String, Value>, NodeIndex)> = vec![(root, 0)];

        while let Some((obj, slot)) = pending.pop() {
            let mut children = Vec::new();
            for child in child_objects(obj) {
                let idx = nodes.len();
                nodes.push(RouteNode::unknown(Vec::new()));
                children.push(idx);
                pending.push((child, idx));
            }
            nodes[slot] = RouteNode::new(NodeKind::from_object(obj), children);
        }

        Self { nodes, root: 0 }
    }

    /// Build a tree from an explicit arena, validating every index.
    ///
    /// Index validity is checked here; sharing and cycles are caught by the
    /// reducer's visited guard.
    pub fn from_nodes(nodes: Vec<RouteNode>, root: NodeIndex) -> Result<Self, TreeError> {
        let len = nodes.len();
        if root >= len {
            return Err(TreeError::RootOutOfBounds { root, len });
        }
        for (parent, node) in nodes.iter().enumerate() {
            if let Some(&child) = node.children.iter().find(|&&c| c >= len) {
                return Err(TreeError::ChildOutOfBounds { parent, child, len });
            }
        }
        Ok(Self { nodes, root })
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn root_node(&self) -> &RouteNode {
        &self.nodes[self.root]
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&RouteNode> {
        self.nodes.get(idx)
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Object-shaped entries of a node's `children` list.
///
/// A missing or non-list `children` field yields nothing.
fn child_objects(obj: &Map<String, Value>) -> impl Iterator<Item = &Map<String, Value>> {
    obj.get("children")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}
