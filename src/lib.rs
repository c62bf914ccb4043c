//! # treespec
//!
//! Flat, shape-only descriptors for nested tree structures.
//!
//! ## What is a tree spec?
//!
//! A nested value built from tuples, lists, dicts, named records, `none` and
//! user-registered container types splits into two parts:
//!
//! - its **leaves**, the scalar values in depth-first, left-to-right order
//! - its **spec**, a post-order list of nodes describing the shape alone
//!
//! The spec can later rebuild an equivalent structure from a fresh leaf
//! sequence, compare shapes, render a canonical text form, and travel through
//! any serde format.
//!
//! ## Key Features
//!
//! - **Exact reconstruction**: container kinds, order and mapping keys are preserved
//! - **Stack-machine decoding**: rebuilding and rendering are a single linear
//!   scan, no recursion over the spec
//! - **Open registry**: custom container types plug in through an explicit
//!   [`Registry`] of [`Registration`]s
//! - **Portable**: a spec encodes to a list of 6-field records and decodes
//!   with full validation
//!
//! ## Quick Start
//!
//! ```rust
//! use treespec::{flatten, tree, Registry, TreeValue};
//!
//! let registry = Registry::new();
//! let value = tree!({"a": [1, 2], "b": none});
//!
//! let (leaves, spec) = flatten(&value, &registry).unwrap();
//! assert_eq!(leaves, vec![TreeValue::from(1), TreeValue::from(2)]);
//! assert_eq!(spec.to_string(), "Spec({'a': [*, *], 'b': none})");
//!
//! // Same shape, new leaves
//! let doubled: Vec<TreeValue> = leaves
//!     .iter()
//!     .map(|leaf| TreeValue::from(leaf.as_i64().unwrap() * 2))
//!     .collect();
//! let rebuilt = spec.unflatten(doubled).unwrap();
//! assert_eq!(rebuilt, tree!({"a": [2, 4], "b": none}));
//! ```
//!
//! ### Custom Container Types
//!
//! ```rust
//! use treespec::{flatten, CustomNode, CustomValue, Error, Registration, Registry, TreeValue};
//!
//! #[derive(Debug, PartialEq)]
//! struct Pair(TreeValue, TreeValue);
//!
//! impl CustomNode for Pair {
//!     const TYPE_NAME: &'static str = "Pair";
//! }
//!
//! let mut registry = Registry::new();
//! registry
//!     .register(Registration::of::<Pair, _, _>(
//!         |pair| Ok((None, vec![pair.0.clone(), pair.1.clone()])),
//!         |_, children| match <[TreeValue; 2]>::try_from(children) {
//!             Ok([first, second]) => Ok(Pair(first, second)),
//!             Err(children) => Err(Error::custom(format!(
//!                 "Pair expects 2 children, got {}",
//!                 children.len()
//!             ))),
//!         },
//!     ))
//!     .unwrap();
//!
//! let value = TreeValue::Custom(CustomValue::new(Pair(1.into(), 2.into())));
//! let (leaves, spec) = flatten(&value, &registry).unwrap();
//! assert_eq!(spec.to_string(), "Spec(Pair(*, *))");
//! assert_eq!(spec.unflatten(leaves).unwrap(), value);
//! ```
//!
//! ## Performance Characteristics
//!
//! - **Flatten**: O(n) in the number of nodes, recursive over the input value
//! - **Unflatten / render / decode**: O(n), iterative; the working stack holds
//!   only subtrees still waiting for their parent
//! - **Sharing**: a spec's traversal sits behind an `Arc`, so clones are cheap
//!   and specs may be read from many threads at once
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Every failure is a typed [`Error`]; no partial results
//! - Inputs are never modified by a failed operation
//!
//! ## Format Specification
//!
//! The canonical text and portable record forms are documented in [`format`].

pub mod codec;
pub mod error;
pub mod flatten;
pub mod format;
pub mod macros;
pub mod map;
pub mod options;
pub mod registry;
pub mod render;
pub mod treespec;
pub mod unflatten;
pub mod value;

pub use codec::TreeSpecSeed;
pub use error::{Error, Result};
pub use flatten::Flattener;
pub use map::{Key, TreeMap};
pub use options::FlattenOptions;
pub use registry::{CustomRender, Registration, Registry};
pub use treespec::{Kind, Node, NodeData, TreeSpec};
pub use value::{CustomNode, CustomValue, Number, Record, RecordType, TreeValue};

/// Splits a value into its leaves and its [`TreeSpec`].
///
/// Uses default [`FlattenOptions`]: `none` is a childless node and mapping
/// keys are stored sorted.
///
/// # Examples
///
/// ```rust
/// use treespec::{flatten, tree, Registry};
///
/// let (leaves, spec) = flatten(&tree!((1, "two")), &Registry::new()).unwrap();
/// assert_eq!(leaves.len(), 2);
/// assert_eq!(spec.num_nodes(), 3);
/// ```
///
/// # Errors
///
/// Returns any error raised by a custom decompose function.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn flatten(value: &TreeValue, registry: &Registry) -> Result<(Vec<TreeValue>, TreeSpec)> {
    flatten_with_options(value, registry, FlattenOptions::default())
}

/// Splits a value into its leaves and its [`TreeSpec`] with custom options.
///
/// # Errors
///
/// Returns any error raised by a custom decompose function.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn flatten_with_options(
    value: &TreeValue,
    registry: &Registry,
    options: FlattenOptions,
) -> Result<(Vec<TreeValue>, TreeSpec)> {
    Flattener::new(registry, options).flatten(value)
}

/// Rebuilds a structure from a spec and a leaf sequence.
///
/// Equivalent to [`TreeSpec::unflatten`].
///
/// # Examples
///
/// ```rust
/// use treespec::{tree, unflatten, TreeSpec, TreeValue};
///
/// let spec = TreeSpec::tuple([TreeSpec::leaf(), TreeSpec::none()]);
/// let value = unflatten(&spec, vec![TreeValue::from("x")]).unwrap();
/// assert_eq!(value, tree!(("x", none)));
/// ```
///
/// # Errors
///
/// See [`TreeSpec::unflatten`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn unflatten<I>(spec: &TreeSpec, leaves: I) -> Result<TreeValue>
where
    I: IntoIterator<Item = TreeValue>,
{
    spec.unflatten(leaves)
}
