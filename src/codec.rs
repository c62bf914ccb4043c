//! Portable encoding of a [`TreeSpec`].
//!
//! [`TreeSpec::encode`] turns a spec into a plain [`TreeValue`]: a list with
//! one 6-field tuple per node, in traversal order:
//!
//! ```text
//! (kind-tag, arity, aux | none, registration-name | none, num_leaves, num_nodes)
//! ```
//!
//! [`TreeSpec::decode`] reads it back against a [`Registry`], validating every
//! record and recomputing the leaf and node counts instead of trusting them.
//!
//! Because the encoded form is an ordinary `TreeValue`, any serde format can
//! carry it. `TreeSpec` implements `Serialize`, and [`TreeSpecSeed`] provides
//! the matching `DeserializeSeed`, which needs the registry to resolve custom
//! types.
//!
//! Custom aux values are stored in a tagged form: strings, numbers, booleans
//! and `none` stay as they are, everything else becomes a list headed by a
//! tag (`"tuple"`, `"list"`, `"dict"`, `"record"`, `"date"`, `"bigint"`). This
//! survives formats with a single sequence type and string-only map keys. A
//! [`CustomValue`](crate::CustomValue) inside aux data has no portable form;
//! it is kept by [`TreeSpec::encode`] but serializing the spec fails.
//!
//! ```rust
//! use serde::de::DeserializeSeed;
//! use treespec::{flatten, tree, Registry, TreeSpec, TreeSpecSeed};
//!
//! let registry = Registry::new();
//! let (_, spec) = flatten(&tree!({"a": [1, 2], "b": none}), &registry).unwrap();
//!
//! let decoded = TreeSpec::decode(&spec.encode(), &registry).unwrap();
//! assert_eq!(decoded, spec);
//!
//! let json = serde_json::to_string(&spec).unwrap();
//! let mut de = serde_json::Deserializer::from_str(&json);
//! let from_json = TreeSpecSeed::new(&registry).deserialize(&mut de).unwrap();
//! assert_eq!(from_json, spec);
//! ```

use crate::map::Key;
use crate::{
    Error, Kind, Node, NodeData, Number, Record, RecordType, Registration, Registry, Result,
    TreeMap, TreeSpec, TreeValue,
};
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use serde::de::{DeserializeSeed, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::sync::Arc;

const RECORD_FIELDS: usize = 6;

const TAG_TUPLE: &str = "tuple";
const TAG_LIST: &str = "list";
const TAG_DICT: &str = "dict";
const TAG_RECORD: &str = "record";
const TAG_DATE: &str = "date";
const TAG_BIGINT: &str = "bigint";

impl TreeSpec {
    /// Encodes the spec as a list of 6-field node records.
    #[must_use]
    pub fn encode(&self) -> TreeValue {
        TreeValue::List(self.traversal().iter().map(encode_node).collect())
    }

    /// Decodes a spec produced by [`TreeSpec::encode`].
    ///
    /// Custom nodes are resolved by registration name in `registry`.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedEncoding`] if the input is not a non-empty sequence
    ///   of 6-field records, a kind tag is unknown, aux or registration
    ///   presence does not fit the kind, a count is not a non-negative integer
    ///   or disagrees with the recomputed one, or the records do not form a
    ///   single post-order tree
    /// - [`Error::AuxMismatch`] if a key or field list disagrees with arity
    /// - [`Error::UnknownRegistration`] naming a custom type missing from `registry`
    pub fn decode(encoded: &TreeValue, registry: &Registry) -> Result<TreeSpec> {
        let records = encoded
            .as_sequence()
            .ok_or_else(|| Error::malformed_encoding("expected a sequence of node records"))?;
        if records.is_empty() {
            return Err(Error::malformed_encoding("empty traversal"));
        }

        let mut traversal = Vec::with_capacity(records.len());
        // (num_leaves, num_nodes) of every subtree still waiting for a parent
        let mut pending: Vec<(usize, usize)> = Vec::new();

        for (index, record) in records.iter().enumerate() {
            let node = decode_node(index, record, registry)?;

            if pending.len() < node.arity {
                return Err(Error::MalformedEncoding(format!(
                    "node {} needs {} children but only {} precede it",
                    index,
                    node.arity,
                    pending.len()
                )));
            }
            let children = pending.split_off(pending.len() - node.arity);
            let expected_leaves = match node.kind {
                Kind::Leaf => 1,
                _ => children.iter().map(|c| c.0).sum(),
            };
            let expected_nodes = 1 + children.iter().map(|c| c.1).sum::<usize>();
            if node.num_leaves != expected_leaves || node.num_nodes != expected_nodes {
                return Err(Error::MalformedEncoding(format!(
                    "node {} claims {} leaves and {} nodes, subtree has {} and {}",
                    index, node.num_leaves, node.num_nodes, expected_leaves, expected_nodes
                )));
            }
            pending.push((node.num_leaves, node.num_nodes));
            traversal.push(node);
        }

        if pending.len() != 1 {
            return Err(Error::MalformedEncoding(format!(
                "traversal yields {} roots, expected 1",
                pending.len()
            )));
        }
        Ok(TreeSpec::from_traversal(traversal))
    }
}

fn encode_node(node: &Node) -> TreeValue {
    let data = match &node.data {
        None => TreeValue::None,
        Some(NodeData::Keys(keys)) => {
            TreeValue::List(keys.iter().cloned().map(TreeValue::from).collect())
        }
        Some(NodeData::Record(ty)) => TreeValue::Tuple(vec![
            TreeValue::from(ty.name()),
            TreeValue::List(ty.fields().iter().map(|f| TreeValue::from(f.as_str())).collect()),
        ]),
        Some(NodeData::Custom(value)) => encode_aux(value),
    };
    let registration = node
        .registration
        .as_ref()
        .map_or(TreeValue::None, |r| TreeValue::from(r.name()));

    TreeValue::Tuple(vec![
        TreeValue::from(node.kind.tag()),
        TreeValue::from(node.arity),
        data,
        registration,
        TreeValue::from(node.num_leaves),
        TreeValue::from(node.num_nodes),
    ])
}

fn decode_node(index: usize, record: &TreeValue, registry: &Registry) -> Result<Node> {
    let fields = record.as_sequence().ok_or_else(|| {
        Error::MalformedEncoding(format!("node {} is not a record: {}", index, record))
    })?;
    if fields.len() != RECORD_FIELDS {
        return Err(Error::MalformedEncoding(format!(
            "node {} has {} fields, expected {}",
            index,
            fields.len(),
            RECORD_FIELDS
        )));
    }

    let kind = integer(&fields[0])
        .and_then(Kind::from_tag)
        .ok_or_else(|| {
            Error::MalformedEncoding(format!("node {} has unknown kind tag {}", index, fields[0]))
        })?;
    let arity = decode_count(index, "arity", &fields[1])?;
    if matches!(kind, Kind::Leaf | Kind::None) && arity != 0 {
        return Err(Error::MalformedEncoding(format!(
            "{} node {} has arity {}",
            kind, index, arity
        )));
    }
    let data = decode_data(index, kind, arity, &fields[2])?;
    let registration = decode_registration(index, kind, &fields[3], registry)?;

    Ok(Node {
        kind,
        arity,
        data,
        registration,
        num_leaves: decode_count(index, "leaf count", &fields[4])?,
        num_nodes: decode_count(index, "node count", &fields[5])?,
    })
}

/// Only integer numbers count; `2.0` is not a valid arity.
fn integer(value: &TreeValue) -> Option<i64> {
    match value {
        TreeValue::Number(Number::Integer(n)) => Some(*n),
        _ => None,
    }
}

fn decode_count(index: usize, what: &str, value: &TreeValue) -> Result<usize> {
    integer(value)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| {
            Error::MalformedEncoding(format!("node {} has invalid {} {}", index, what, value))
        })
}

fn decode_data(
    index: usize,
    kind: Kind,
    arity: usize,
    aux: &TreeValue,
) -> Result<Option<NodeData>> {
    match kind {
        Kind::Leaf | Kind::None | Kind::Sequence | Kind::MutableSequence => {
            if aux.is_none() {
                Ok(None)
            } else {
                Err(Error::MalformedEncoding(format!(
                    "{} node {} carries aux data {}",
                    kind, index, aux
                )))
            }
        }
        Kind::OrderedMapping => {
            let items = aux.as_sequence().ok_or_else(|| {
                Error::MalformedEncoding(format!("mapping node {} has no key list", index))
            })?;
            let keys = items
                .iter()
                .map(|item| {
                    Key::from_value(item).ok_or_else(|| {
                        Error::MalformedEncoding(format!(
                            "mapping node {} has invalid key {}",
                            index, item
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            if keys.len() != arity {
                return Err(Error::aux_mismatch(kind, arity, keys.len()));
            }
            let mut seen = HashSet::with_capacity(keys.len());
            if let Some(duplicate) = keys.iter().find(|key| !seen.insert(*key)) {
                return Err(Error::MalformedEncoding(format!(
                    "mapping node {} repeats key {}",
                    index, duplicate
                )));
            }
            Ok(Some(NodeData::Keys(keys)))
        }
        Kind::NamedRecord => {
            let ty = decode_record_type(aux).ok_or_else(|| {
                Error::MalformedEncoding(format!("record node {} has invalid type {}", index, aux))
            })?;
            if ty.fields().len() != arity {
                return Err(Error::aux_mismatch(kind, arity, ty.fields().len()));
            }
            Ok(Some(NodeData::Record(Arc::new(ty))))
        }
        Kind::Custom if aux.is_none() => Ok(None),
        Kind::Custom => Ok(Some(NodeData::Custom(decode_aux(index, aux)?))),
    }
}

fn decode_record_type(aux: &TreeValue) -> Option<RecordType> {
    match aux.as_sequence()? {
        [name, fields] => record_type(name, fields),
        _ => None,
    }
}

fn record_type(name: &TreeValue, fields: &TreeValue) -> Option<RecordType> {
    let fields = fields
        .as_sequence()?
        .iter()
        .map(|f| f.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()?;
    Some(RecordType::new(name.as_str()?, fields))
}

fn tagged(tag: &str, rest: impl IntoIterator<Item = TreeValue>) -> TreeValue {
    TreeValue::List(std::iter::once(TreeValue::from(tag)).chain(rest).collect())
}

/// Converts a custom aux value to its tagged portable form.
fn encode_aux(value: &TreeValue) -> TreeValue {
    match value {
        TreeValue::None
        | TreeValue::Bool(_)
        | TreeValue::Number(_)
        | TreeValue::String(_)
        | TreeValue::Custom(_) => value.clone(),
        TreeValue::Date(dt) => tagged(TAG_DATE, [TreeValue::from(dt.to_rfc3339())]),
        TreeValue::BigInt(n) => tagged(TAG_BIGINT, [TreeValue::from(n.to_string())]),
        TreeValue::Tuple(items) => tagged(TAG_TUPLE, items.iter().map(encode_aux)),
        TreeValue::List(items) => tagged(TAG_LIST, items.iter().map(encode_aux)),
        TreeValue::Dict(map) => tagged(
            TAG_DICT,
            map.iter()
                .map(|(k, v)| TreeValue::List(vec![TreeValue::from(k.clone()), encode_aux(v)])),
        ),
        TreeValue::Record(record) => {
            let fields = record.ty.fields().iter().map(|f| TreeValue::from(f.as_str()));
            let header = [
                TreeValue::from(record.ty.name()),
                TreeValue::List(fields.collect()),
            ];
            tagged(
                TAG_RECORD,
                header.into_iter().chain(record.values.iter().map(encode_aux)),
            )
        }
    }
}

fn invalid_aux(index: usize, value: &TreeValue) -> Error {
    Error::MalformedEncoding(format!("custom node {} has invalid aux data {}", index, value))
}

/// Inverse of [`encode_aux`].
fn decode_aux(index: usize, value: &TreeValue) -> Result<TreeValue> {
    let items = match value {
        TreeValue::Tuple(items) | TreeValue::List(items) => items,
        TreeValue::Dict(_) | TreeValue::Record(_) | TreeValue::Date(_) | TreeValue::BigInt(_) => {
            return Err(invalid_aux(index, value))
        }
        _ => return Ok(value.clone()),
    };
    let (tag, rest) = match items.split_first() {
        Some((TreeValue::String(tag), rest)) => (tag.as_str(), rest),
        _ => return Err(invalid_aux(index, value)),
    };
    let decode_all = |items: &[TreeValue]| {
        items
            .iter()
            .map(|item| decode_aux(index, item))
            .collect::<Result<Vec<_>>>()
    };

    let decoded = match (tag, rest) {
        (TAG_TUPLE, items) => TreeValue::Tuple(decode_all(items)?),
        (TAG_LIST, items) => TreeValue::List(decode_all(items)?),
        (TAG_DICT, entries) => {
            let mut map = TreeMap::with_capacity(entries.len());
            for entry in entries {
                let (key, item) = match entry.as_sequence() {
                    Some([key, item]) => (key, item),
                    _ => return Err(invalid_aux(index, entry)),
                };
                let key = Key::from_value(key).ok_or_else(|| invalid_aux(index, entry))?;
                map.insert(key, decode_aux(index, item)?);
            }
            TreeValue::Dict(map)
        }
        (TAG_RECORD, [name, fields, values @ ..]) => {
            let ty = record_type(name, fields).ok_or_else(|| invalid_aux(index, value))?;
            TreeValue::Record(Record::new(Arc::new(ty), decode_all(values)?))
        }
        (TAG_DATE, [TreeValue::String(text)]) => DateTime::parse_from_rfc3339(text)
            .map(|dt| TreeValue::Date(dt.with_timezone(&Utc)))
            .map_err(|_| invalid_aux(index, value))?,
        (TAG_BIGINT, [TreeValue::String(text)]) => text
            .parse::<BigInt>()
            .map(TreeValue::BigInt)
            .map_err(|_| invalid_aux(index, value))?,
        _ => return Err(invalid_aux(index, value)),
    };
    Ok(decoded)
}

fn decode_registration(
    index: usize,
    kind: Kind,
    value: &TreeValue,
    registry: &Registry,
) -> Result<Option<Arc<Registration>>> {
    match (kind, value) {
        (Kind::Custom, TreeValue::String(name)) => registry
            .lookup(name)
            .cloned()
            .map(Some)
            .ok_or_else(|| Error::unknown_registration(name)),
        (Kind::Custom, other) => Err(Error::UnknownRegistration(other.to_string())),
        (_, TreeValue::None) => Ok(None),
        (kind, other) => Err(Error::MalformedEncoding(format!(
            "{} node {} names registration {}",
            kind, index, other
        ))),
    }
}

impl Serialize for TreeSpec {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.encode().serialize(serializer)
    }
}

/// `DeserializeSeed` for [`TreeSpec`], resolving custom types in a registry.
#[derive(Clone, Copy, Debug)]
pub struct TreeSpecSeed<'a> {
    registry: &'a Registry,
}

impl<'a> TreeSpecSeed<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        TreeSpecSeed { registry }
    }
}

impl<'de, 'a> DeserializeSeed<'de> for TreeSpecSeed<'a> {
    type Value = TreeSpec;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error as _;

        let encoded = TreeValue::deserialize(deserializer)?;
        TreeSpec::decode(&encoded, self.registry).map_err(D::Error::custom)
    }
}
