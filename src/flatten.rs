//! The flatten pass: splitting a [`TreeValue`] into leaves and a [`TreeSpec`].
//!
//! Values are visited depth first, left to right. Children are emitted before
//! their parent, so the traversal comes out in post-order and the leaves in
//! the order reconstruction will consume them.
//!
//! ## Usage
//!
//! Most users should use [`flatten`](crate::flatten) from the crate root:
//!
//! ```rust
//! use treespec::{flatten, tree, Registry, TreeValue};
//!
//! let registry = Registry::new();
//! let (leaves, spec) = flatten(&tree!((1, [2, 3], none)), &registry).unwrap();
//!
//! assert_eq!(leaves, vec![TreeValue::from(1), 2.into(), 3.into()]);
//! assert_eq!(spec.to_string(), "Spec((*, [*, *], none))");
//! ```

use crate::{
    Error, FlattenOptions, Kind, Node, NodeData, Registration, Registry, Result, TreeSpec,
    TreeValue,
};
use std::sync::Arc;

/// Walks one value and accumulates its leaves and post-order traversal.
pub struct Flattener<'a> {
    registry: &'a Registry,
    options: FlattenOptions,
    leaves: Vec<TreeValue>,
    traversal: Vec<Node>,
}

impl<'a> Flattener<'a> {
    pub fn new(registry: &'a Registry, options: FlattenOptions) -> Self {
        Flattener {
            registry,
            options,
            leaves: Vec::new(),
            traversal: Vec::new(),
        }
    }

    /// Flattens `value`, consuming the flattener.
    ///
    /// # Errors
    ///
    /// Propagates any error from a custom decompose function.
    pub fn flatten(mut self, value: &TreeValue) -> Result<(Vec<TreeValue>, TreeSpec)> {
        self.visit(value)?;
        Ok((self.leaves, TreeSpec::from_traversal(self.traversal)))
    }

    fn visit(&mut self, value: &TreeValue) -> Result<()> {
        let start_leaves = self.leaves.len();
        let start_nodes = self.traversal.len();

        let (kind, registration) = if self.options.none_is_leaf && value.is_none() {
            (Kind::Leaf, None)
        } else {
            self.registry.classify(value)
        };

        let (arity, data) = match (kind, value) {
            (Kind::Leaf, _) => {
                self.leaves.push(value.clone());
                (0, None)
            }
            (Kind::None, _) => (0, None),
            (Kind::Sequence, TreeValue::Tuple(items))
            | (Kind::MutableSequence, TreeValue::List(items)) => {
                self.visit_all(items)?;
                (items.len(), None)
            }
            (Kind::NamedRecord, TreeValue::Record(record)) => {
                self.visit_all(&record.values)?;
                (
                    record.values.len(),
                    Some(NodeData::Record(Arc::clone(&record.ty))),
                )
            }
            (Kind::OrderedMapping, TreeValue::Dict(map)) => {
                let mut entries: Vec<_> = map.iter().collect();
                if self.options.sort_keys {
                    entries.sort_by(|a, b| a.0.cmp(b.0));
                }
                let mut keys = Vec::with_capacity(entries.len());
                for (key, child) in entries {
                    self.visit(child)?;
                    keys.push(key.clone());
                }
                (keys.len(), Some(NodeData::Keys(keys)))
            }
            (Kind::Custom, _) => {
                let registration = registration
                    .as_ref()
                    .ok_or_else(|| Error::unknown_registration(&value.to_string()))?;
                self.visit_custom(registration, value)?
            }
            (kind, _) => {
                return Err(Error::custom(format!(
                    "value {} was classified as {} but has another shape",
                    value, kind
                )))
            }
        };

        self.traversal.push(Node {
            kind,
            arity,
            data,
            registration,
            num_leaves: self.leaves.len() - start_leaves,
            num_nodes: self.traversal.len() - start_nodes + 1,
        });
        Ok(())
    }

    fn visit_all(&mut self, items: &[TreeValue]) -> Result<()> {
        for item in items {
            self.visit(item)?;
        }
        Ok(())
    }

    fn visit_custom(
        &mut self,
        registration: &Registration,
        value: &TreeValue,
    ) -> Result<(usize, Option<NodeData>)> {
        let (data, children) = registration.decompose(value)?;
        self.visit_all(&children)?;
        // A `none` payload is the same as no payload
        let data = data.filter(|d| !d.is_none()).map(NodeData::Custom);
        Ok((children.len(), data))
    }
}
