//! The tree spec: a flat, post-order descriptor of one structure's shape.
//!
//! A [`TreeSpec`] is a list of [`Node`]s in post-order: every node comes after
//! all of its descendants and the root comes last. Replaying the list as a
//! stack machine (leaves push, containers pop `arity` items and push one)
//! rebuilds the structure; see [`TreeSpec::unflatten`] and
//! [`TreeSpec::render`].
//!
//! Specs are immutable and cheap to clone. The traversal lives behind an
//! `Arc`, so clones share it and may be read from any thread.
//!
//! ```rust
//! use treespec::{Kind, TreeSpec};
//!
//! let spec = TreeSpec::tuple([TreeSpec::leaf(), TreeSpec::none(), TreeSpec::leaf()]);
//!
//! let kinds: Vec<Kind> = spec.traversal().iter().map(|node| node.kind).collect();
//! assert_eq!(kinds, [Kind::Leaf, Kind::None, Kind::Leaf, Kind::Sequence]);
//! assert_eq!(spec.num_leaves(), 2);
//! assert_eq!(spec.num_nodes(), 4);
//! ```

use crate::map::Key;
use crate::{RecordType, Registration, TreeValue};
use std::fmt;
use std::sync::Arc;

/// The structural category of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Leaf,
    None,
    /// Immutable ordered container (tuple).
    Sequence,
    /// Fixed-field record whose aux data is its [`RecordType`].
    NamedRecord,
    /// Dict whose aux data is the ordered key list.
    OrderedMapping,
    /// Mutable ordered container (list).
    MutableSequence,
    /// Registered extension type.
    Custom,
}

impl Kind {
    /// Stable integer tag used by the portable encoding.
    #[must_use]
    pub const fn tag(self) -> i64 {
        match self {
            Kind::Leaf => 0,
            Kind::None => 1,
            Kind::Sequence => 2,
            Kind::NamedRecord => 3,
            Kind::OrderedMapping => 4,
            Kind::MutableSequence => 5,
            Kind::Custom => 6,
        }
    }

    #[must_use]
    pub const fn from_tag(tag: i64) -> Option<Kind> {
        match tag {
            0 => Some(Kind::Leaf),
            1 => Some(Kind::None),
            2 => Some(Kind::Sequence),
            3 => Some(Kind::NamedRecord),
            4 => Some(Kind::OrderedMapping),
            5 => Some(Kind::MutableSequence),
            6 => Some(Kind::Custom),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Leaf => "Leaf",
            Kind::None => "None",
            Kind::Sequence => "Sequence",
            Kind::NamedRecord => "NamedRecord",
            Kind::OrderedMapping => "OrderedMapping",
            Kind::MutableSequence => "MutableSequence",
            Kind::Custom => "Custom",
        };
        f.write_str(name)
    }
}

/// Kind-dependent auxiliary data needed to rebuild a node, other than its
/// children.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeData {
    /// Keys of an [`Kind::OrderedMapping`] node, one per child.
    Keys(Vec<Key>),
    /// Type of a [`Kind::NamedRecord`] node.
    Record(Arc<RecordType>),
    /// Opaque payload produced by a custom decompose function.
    Custom(TreeValue),
}

/// One entry of a [`TreeSpec`] traversal.
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: Kind,
    pub arity: usize,
    pub data: Option<NodeData>,
    pub registration: Option<Arc<Registration>>,
    pub num_leaves: usize,
    pub num_nodes: usize,
}

impl Node {
    pub(crate) fn leaf() -> Self {
        Node {
            kind: Kind::Leaf,
            arity: 0,
            data: None,
            registration: None,
            num_leaves: 1,
            num_nodes: 1,
        }
    }

    pub(crate) fn none() -> Self {
        Node {
            kind: Kind::None,
            arity: 0,
            data: None,
            registration: None,
            num_leaves: 0,
            num_nodes: 1,
        }
    }
}

/// Structural equality. Leaf and node counts are derivable from the rest and
/// are not compared.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        let same_registration = match (&self.registration, &other.registration) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        self.kind == other.kind
            && self.arity == other.arity
            && self.data == other.data
            && same_registration
    }
}

/// A flat, post-order descriptor of one structure's shape.
///
/// Built by [`flatten`](crate::flatten), by [`TreeSpec::decode`], or by
/// composing the constructors below. There is no mutation API.
#[derive(Clone)]
pub struct TreeSpec {
    traversal: Arc<[Node]>,
}

impl TreeSpec {
    /// Wraps a traversal that already satisfies every invariant.
    pub(crate) fn from_traversal(traversal: Vec<Node>) -> Self {
        TreeSpec {
            traversal: traversal.into(),
        }
    }

    /// The spec of a bare leaf.
    #[must_use]
    pub fn leaf() -> Self {
        Self::from_traversal(vec![Node::leaf()])
    }

    /// The spec of a bare `none`.
    #[must_use]
    pub fn none() -> Self {
        Self::from_traversal(vec![Node::none()])
    }

    /// Composes child specs into a tuple spec.
    pub fn tuple(children: impl IntoIterator<Item = TreeSpec>) -> Self {
        Self::compose(Kind::Sequence, children)
    }

    /// Composes child specs into a list spec.
    pub fn list(children: impl IntoIterator<Item = TreeSpec>) -> Self {
        Self::compose(Kind::MutableSequence, children)
    }

    fn compose(kind: Kind, children: impl IntoIterator<Item = TreeSpec>) -> Self {
        let mut traversal = Vec::new();
        let mut arity = 0;
        let mut num_leaves = 0;
        for child in children {
            arity += 1;
            num_leaves += child.num_leaves();
            traversal.extend(child.traversal.iter().cloned());
        }
        let num_nodes = traversal.len() + 1;
        traversal.push(Node {
            kind,
            arity,
            data: None,
            registration: None,
            num_leaves,
            num_nodes,
        });
        Self::from_traversal(traversal)
    }

    /// The nodes in post-order; the root is last.
    #[must_use]
    pub fn traversal(&self) -> &[Node] {
        &self.traversal
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> &Node {
        // Every constructor produces at least one node
        &self.traversal[self.traversal.len() - 1]
    }

    /// Total leaves the spec consumes on reconstruction.
    #[must_use]
    pub fn num_leaves(&self) -> usize {
        self.root().num_leaves
    }

    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.traversal.len()
    }

    /// Kind of the root node.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.root().kind
    }

    /// Returns `true` if the whole spec is a single leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.traversal.len() == 1 && self.kind() == Kind::Leaf
    }
}

impl PartialEq for TreeSpec {
    fn eq(&self, other: &Self) -> bool {
        self.traversal.len() == other.traversal.len()
            && self
                .traversal
                .iter()
                .zip(other.traversal.iter())
                .all(|(a, b)| a == b)
    }
}

impl fmt::Debug for TreeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Ok(text) => f.write_str(&text),
            Err(_) => f
                .debug_struct("TreeSpec")
                .field("traversal", &self.traversal)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Registration;

    fn custom_node(registration: &Arc<Registration>) -> Node {
        Node {
            kind: Kind::Custom,
            arity: 0,
            data: None,
            registration: Some(Arc::clone(registration)),
            num_leaves: 0,
            num_nodes: 1,
        }
    }

    #[test]
    fn test_kind_tags_round_trip() {
        for tag in 0..7 {
            assert_eq!(Kind::from_tag(tag).map(Kind::tag), Some(tag));
        }
        assert_eq!(Kind::from_tag(7), None);
        assert_eq!(Kind::from_tag(-1), None);
    }

    #[test]
    fn test_compose_counts() {
        let inner = TreeSpec::list([TreeSpec::leaf(), TreeSpec::leaf()]);
        let spec = TreeSpec::tuple([inner, TreeSpec::none(), TreeSpec::leaf()]);
        assert_eq!(spec.num_leaves(), 3);
        assert_eq!(spec.num_nodes(), 6);
        assert_eq!(spec.root().arity, 3);
        assert_eq!(spec.kind(), Kind::Sequence);
        assert!(!spec.is_leaf());
        assert!(TreeSpec::leaf().is_leaf());
    }

    #[test]
    fn test_empty_compose() {
        let spec = TreeSpec::tuple(Vec::new());
        assert_eq!(spec.num_leaves(), 0);
        assert_eq!(spec.num_nodes(), 1);
    }

    #[test]
    fn test_equality_ignores_counts() {
        let mut skewed = Node::leaf();
        skewed.num_leaves = 7;
        skewed.num_nodes = 9;
        assert_eq!(TreeSpec::from_traversal(vec![skewed]), TreeSpec::leaf());
    }

    #[test]
    fn test_equality_checks_kind_arity_and_data() {
        assert_ne!(TreeSpec::leaf(), TreeSpec::none());
        assert_ne!(
            TreeSpec::tuple([TreeSpec::leaf()]),
            TreeSpec::list([TreeSpec::leaf()])
        );
        assert_ne!(
            TreeSpec::tuple([TreeSpec::leaf()]),
            TreeSpec::tuple([TreeSpec::leaf(), TreeSpec::leaf()])
        );

        let keyed = |key: &str| {
            TreeSpec::from_traversal(vec![
                Node::leaf(),
                Node {
                    kind: Kind::OrderedMapping,
                    arity: 1,
                    data: Some(NodeData::Keys(vec![Key::from(key)])),
                    registration: None,
                    num_leaves: 1,
                    num_nodes: 2,
                },
            ])
        };
        assert_eq!(keyed("a"), keyed("a"));
        assert_ne!(keyed("a"), keyed("b"));
    }

    #[test]
    fn test_equality_compares_registration_identity() {
        let make = || {
            Arc::new(Registration::new(
                "Unit",
                |_| Ok((None, vec![])),
                |_, _| Ok(TreeValue::None),
            ))
        };
        let first = make();
        let second = make();

        let a = TreeSpec::from_traversal(vec![custom_node(&first)]);
        let b = TreeSpec::from_traversal(vec![custom_node(&first)]);
        let c = TreeSpec::from_traversal(vec![custom_node(&second)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
