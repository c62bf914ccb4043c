//! Canonical text rendering of a [`TreeSpec`].
//!
//! Rendering runs the same post-order stack machine as reconstruction, with
//! text fragments on the stack instead of values. See the
//! [`format`](crate::format) module for the per-kind forms.
//!
//! ```rust
//! use treespec::{flatten, tree, Registry};
//!
//! let registry = Registry::new();
//! let (_, spec) = flatten(&tree!({"a": [1, 2], "b": none}), &registry).unwrap();
//! assert_eq!(spec.render().unwrap(), "Spec({'a': [*, *], 'b': none})");
//! assert_eq!(spec.to_string(), "Spec({'a': [*, *], 'b': none})");
//! ```

use crate::registry::CustomRender;
use crate::{Error, Kind, Node, NodeData, Result, TreeSpec};
use std::fmt;

const LEAF: &str = "*";
const NONE: &str = "none";

impl TreeSpec {
    /// Renders the shape as `Spec(<root>)`, leaves shown as `*`.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedSpec`] if the traversal underflows or does not end on
    ///   a single root
    /// - [`Error::AuxMismatch`] if a key or field list disagrees with arity
    /// - [`Error::UnknownRegistration`] if a custom node lost its registration
    /// - any error returned by a custom renderer, unchanged
    pub fn render(&self) -> Result<String> {
        let mut agenda: Vec<String> = Vec::with_capacity(4);
        for node in self.traversal() {
            if agenda.len() < node.arity {
                return Err(Error::MalformedSpec(format!(
                    "too few elements for {} node; expected {}, found {}",
                    node.kind,
                    node.arity,
                    agenda.len()
                )));
            }
            let children = agenda.split_off(agenda.len() - node.arity);
            agenda.push(render_node(node, &children)?);
        }
        match (agenda.pop(), agenda.is_empty()) {
            (Some(root), true) => Ok(format!("Spec({})", root)),
            _ => Err(Error::malformed_spec(
                "tree spec traversal did not yield a singleton",
            )),
        }
    }
}

fn render_node(node: &Node, children: &[String]) -> Result<String> {
    let representation = match (node.kind, &node.data) {
        (Kind::Leaf, _) => LEAF.to_string(),
        (Kind::None, _) => NONE.to_string(),
        (Kind::Sequence, _) => {
            // One-element tuples keep a trailing separator
            if children.len() == 1 {
                format!("({},)", children[0])
            } else {
                format!("({})", children.join(", "))
            }
        }
        (Kind::MutableSequence, _) => format!("[{}]", children.join(", ")),
        (Kind::OrderedMapping, Some(NodeData::Keys(keys))) => {
            if keys.len() != node.arity {
                return Err(Error::aux_mismatch(
                    Kind::OrderedMapping,
                    node.arity,
                    keys.len(),
                ));
            }
            let entries: Vec<String> = keys
                .iter()
                .zip(children)
                .map(|(key, child)| format!("{}: {}", key, child))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
        (Kind::NamedRecord, Some(NodeData::Record(ty))) => {
            if ty.fields().len() != node.arity {
                return Err(Error::aux_mismatch(
                    Kind::NamedRecord,
                    node.arity,
                    ty.fields().len(),
                ));
            }
            let fields: Vec<String> = ty
                .fields()
                .iter()
                .zip(children)
                .map(|(field, child)| format!("{}={}", field, child))
                .collect();
            format!("{}({})", ty.name(), fields.join(", "))
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
            let custom = CustomRender {
                name: registration.name(),
                arity: node.arity,
                data,
                children,
            };
            match registration.render(&custom) {
                Some(rendered) => rendered?,
                None => {
                    let data = data.map(|d| format!("[{}]", d)).unwrap_or_default();
                    format!("{}{}({})", registration.name(), data, children.join(", "))
                }
            }
        }
        (kind, _) => {
            return Err(Error::MalformedSpec(format!(
                "{} node is missing its aux data",
                kind
            )))
        }
    };
    Ok(representation)
}

impl fmt::Display for TreeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Ok(text) => f.write_str(&text),
            Err(err) => write!(f, "<invalid tree spec: {}>", err),
        }
    }
}
