//! Reconstruction: replaying a [`TreeSpec`] over a fresh leaf sequence.
//!
//! The spec is walked left to right as a stack machine. Leaves pull the next
//! value from the leaf sequence, `none` pushes [`TreeValue::None`], and every
//! container pops its `arity` children (in their original order) and pushes
//! the rebuilt value. Nothing is reordered except by a mapping's stored key
//! list.
//!
//! ```rust
//! use treespec::{flatten, tree, Registry};
//!
//! let registry = Registry::new();
//! let (_, spec) = flatten(&tree!({"a": [1, 2], "b": none}), &registry).unwrap();
//!
//! let rebuilt = spec.unflatten(vec![10.into(), 20.into()]).unwrap();
//! assert_eq!(rebuilt, tree!({"a": [10, 20], "b": none}));
//! ```

use crate::{Error, Kind, Node, NodeData, Result, TreeMap, TreeSpec, TreeValue};

impl TreeSpec {
    /// Rebuilds a structure of this shape from `leaves`.
    ///
    /// # Errors
    ///
    /// - [`Error::ExhaustedLeaves`] if a leaf node is reached with no leaves left
    /// - [`Error::TooManyLeaves`] if leaves remain after the walk
    /// - [`Error::MalformedSpec`] if the traversal underflows or does not end on
    ///   a single root
    /// - [`Error::AuxMismatch`] if a key or field list disagrees with arity
    /// - [`Error::UnknownRegistration`] if a custom node lost its registration
    /// - any error returned by a custom recompose function, unchanged
    pub fn unflatten<I>(&self, leaves: I) -> Result<TreeValue>
    where
        I: IntoIterator<Item = TreeValue>,
    {
        let mut leaves = leaves.into_iter();
        let mut agenda: Vec<TreeValue> = Vec::with_capacity(4);
        let mut consumed = 0;

        for node in self.traversal() {
            if agenda.len() < node.arity {
                return Err(Error::MalformedSpec(format!(
                    "too few elements for {} node; expected {}, found {}",
                    node.kind,
                    node.arity,
                    agenda.len()
                )));
            }
            match node.kind {
                Kind::Leaf | Kind::None if node.arity != 0 => {
                    return Err(Error::MalformedSpec(format!(
                        "{} node with arity {}",
                        node.kind, node.arity
                    )));
                }
                Kind::Leaf => {
                    let leaf = leaves.next().ok_or(Error::ExhaustedLeaves {
                        expected: self.num_leaves(),
                        got: consumed,
                    })?;
                    consumed += 1;
                    agenda.push(leaf);
                }
                Kind::None => agenda.push(TreeValue::None),
                _ => {
                    let children = agenda.split_off(agenda.len() - node.arity);
                    agenda.push(make_node(node, children)?);
                }
            }
        }

        if leaves.next().is_some() {
            return Err(Error::TooManyLeaves {
                expected: self.num_leaves(),
            });
        }
        match (agenda.pop(), agenda.is_empty()) {
            (Some(root), true) => Ok(root),
            _ => Err(Error::malformed_spec(
                "tree spec traversal did not yield a singleton",
            )),
        }
    }
}

/// Builds one container node from its children, dispatched on kind.
fn make_node(node: &Node, children: Vec<TreeValue>) -> Result<TreeValue> {
    match (node.kind, &node.data) {
        (Kind::Sequence, _) => Ok(TreeValue::Tuple(children)),
        (Kind::MutableSequence, _) => Ok(TreeValue::List(children)),
        (Kind::NamedRecord, Some(NodeData::Record(ty))) => ty.instantiate(children),
        (Kind::OrderedMapping, Some(NodeData::Keys(keys))) => {
            if keys.len() != children.len() {
                return Err(Error::aux_mismatch(
                    Kind::OrderedMapping,
                    children.len(),
                    keys.len(),
                ));
            }
            let map: TreeMap = keys.iter().cloned().zip(children).collect();
            if map.len() != node.arity {
                return Err(Error::malformed_spec("duplicate keys in mapping node"));
            }
            Ok(TreeValue::Dict(map))
        }
        (Kind::Custom, data) => {
            let registration = node
                .registration
                .as_ref()
                .ok_or_else(|| Error::unknown_registration("custom node without registration"))?;
            let data = match data {
                Some(NodeData::Custom(value)) => Some(value),
                _ => None,
            };
            registration.recompose(data, children)
        }
        (kind, _) => Err(Error::MalformedSpec(format!(
            "{} node is missing its aux data",
            kind
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Key;
    use crate::{RecordType, Registration};
    use std::sync::Arc;

    fn container(kind: Kind, arity: usize, data: Option<NodeData>) -> Node {
        Node {
            kind,
            arity,
            data,
            registration: None,
            num_leaves: 0,
            num_nodes: 1,
        }
    }

    #[test]
    fn test_none_consumes_no_leaf() {
        let spec = TreeSpec::tuple([TreeSpec::none(), TreeSpec::leaf()]);
        let value = spec.unflatten(vec![TreeValue::from(5)]).unwrap();
        assert_eq!(value, TreeValue::Tuple(vec![TreeValue::None, 5.into()]));
    }

    #[test]
    fn test_leaf_count_mismatch() {
        let spec = TreeSpec::list([TreeSpec::leaf(), TreeSpec::leaf(), TreeSpec::leaf()]);
        let two: Vec<TreeValue> = vec![1.into(), 2.into()];
        let four: Vec<TreeValue> = vec![1.into(), 2.into(), 3.into(), 4.into()];

        assert_eq!(
            spec.unflatten(two).unwrap_err(),
            Error::ExhaustedLeaves {
                expected: 3,
                got: 2
            }
        );
        assert_eq!(
            spec.unflatten(four).unwrap_err(),
            Error::TooManyLeaves { expected: 3 }
        );
    }

    #[test]
    fn test_underflow_is_malformed() {
        let spec = TreeSpec::from_traversal(vec![
            Node::leaf(),
            container(Kind::Sequence, 2, None),
        ]);
        let err = spec.unflatten(vec![TreeValue::from(1)]).unwrap_err();
        assert!(matches!(err, Error::MalformedSpec(_)));
    }

    #[test]
    fn test_non_singleton_is_malformed() {
        let spec = TreeSpec::from_traversal(vec![Node::leaf(), Node::leaf()]);
        let err = spec.unflatten(vec![1.into(), 2.into()]).unwrap_err();
        assert!(matches!(err, Error::MalformedSpec(_)));
    }

    #[test]
    fn test_mapping_key_count_mismatch() {
        let spec = TreeSpec::from_traversal(vec![
            Node::leaf(),
            container(
                Kind::OrderedMapping,
                1,
                Some(NodeData::Keys(vec![Key::from("a"), Key::from("b")])),
            ),
        ]);
        let err = spec.unflatten(vec![TreeValue::from(1)]).unwrap_err();
        assert_eq!(err, Error::aux_mismatch(Kind::OrderedMapping, 1, 2));
    }

    #[test]
    fn test_mapping_keeps_stored_key_order() {
        let spec = TreeSpec::from_traversal(vec![
            Node::leaf(),
            Node::leaf(),
            container(
                Kind::OrderedMapping,
                2,
                Some(NodeData::Keys(vec![Key::from("z"), Key::from("a")])),
            ),
        ]);
        let value = spec.unflatten(vec![1.into(), 2.into()]).unwrap();
        let keys: Vec<_> = value.as_dict().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec![Key::from("z"), Key::from("a")]);
    }

    #[test]
    fn test_record_rebuilt_from_type() {
        let ty = Arc::new(RecordType::new("Point", ["x", "y"]));
        let spec = TreeSpec::from_traversal(vec![
            Node::leaf(),
            Node::leaf(),
            container(Kind::NamedRecord, 2, Some(NodeData::Record(ty))),
        ]);
        let value = spec.unflatten(vec![1.into(), 2.into()]).unwrap();
        let record = value.as_record().unwrap();
        assert_eq!(record.get("x"), Some(&TreeValue::from(1)));
        assert_eq!(record.get("y"), Some(&TreeValue::from(2)));
    }

    #[test]
    fn test_custom_without_registration() {
        let spec = TreeSpec::from_traversal(vec![container(Kind::Custom, 0, None)]);
        let err = spec.unflatten(Vec::new()).unwrap_err();
        assert!(matches!(err, Error::UnknownRegistration(_)));
    }

    #[test]
    fn test_custom_recompose_receives_data() {
        let registration = Arc::new(Registration::new(
            "Tagged",
            |_| Ok((None, vec![])),
            |data, children| {
                let mut items = vec![data.cloned().unwrap_or_default()];
                items.extend(children);
                Ok(TreeValue::Tuple(items))
            },
        ));
        let mut node = container(
            Kind::Custom,
            1,
            Some(NodeData::Custom(TreeValue::from("tag"))),
        );
        node.registration = Some(registration);
        let spec = TreeSpec::from_traversal(vec![Node::leaf(), node]);

        let value = spec.unflatten(vec![TreeValue::from(1)]).unwrap();
        assert_eq!(value, TreeValue::Tuple(vec!["tag".into(), 1.into()]));
    }
}
