//! Tree spec formats
//!
//! This module documents the two external forms of a
//! [`TreeSpec`](crate::TreeSpec): the canonical text produced by
//! [`render`](crate::TreeSpec::render) and the portable record list produced
//! by [`encode`](crate::TreeSpec::encode).
//!
//! # Traversal
//!
//! A spec is a post-order list of nodes. Reading it left to right as a stack
//! machine, `Leaf` and `None` push one item and every other node pops `arity`
//! items and pushes one. A valid spec never underflows and ends with exactly
//! one item, its root, which is always the last node.
//!
//! ```text
//! {'a': [*, *], 'b': none}
//!
//! #  kind             arity  aux         leaves  nodes
//! 0  Leaf             0      -           1       1
//! 1  Leaf             0      -           1       1
//! 2  MutableSequence  2      -           2       3
//! 3  None             0      -           0       1
//! 4  OrderedMapping   2      ['a', 'b']  2       5
//! ```
//!
//! # Canonical Text
//!
//! | Kind | Form | Example |
//! |------|------|---------|
//! | Leaf | `*` | `*` |
//! | None | `none` | `none` |
//! | Sequence | `(a, b)`; one child keeps a trailing comma | `(*,)` |
//! | MutableSequence | `[a, b]` | `[*, none]` |
//! | OrderedMapping | `{key: a}` in stored key order | `{'a': *, 1: *}` |
//! | NamedRecord | `Name(field=a)` in declared field order | `Point(x=*, y=*)` |
//! | Custom | registration renderer, else `Name[aux](a, b)` | `Pair(*, *)` |
//!
//! String keys are single-quoted with `\` and `'` escaped; integer keys are
//! bare. The custom `[aux]` part is omitted when the node has no aux data and
//! otherwise shows the aux value's `Display` form.
//!
//! The whole rendering is wrapped in `Spec(...)`:
//!
//! ```text
//! Spec({'a': [*, *], 'b': none})
//! ```
//!
//! # Portable Encoding
//!
//! One 6-field record per node, in traversal order:
//!
//! ```text
//! (kind-tag, arity, aux | none, registration-name | none, num_leaves, num_nodes)
//! ```
//!
//! | Kind | Tag | Aux | Registration |
//! |------|-----|-----|--------------|
//! | Leaf | 0 | none | none |
//! | None | 1 | none | none |
//! | Sequence | 2 | none | none |
//! | NamedRecord | 3 | `(name, [field, ...])` | none |
//! | OrderedMapping | 4 | `[key, ...]`, one per child | none |
//! | MutableSequence | 5 | none | none |
//! | Custom | 6 | tagged aux value or none | type name |
//!
//! The record list is an ordinary tree value, so any serde format can carry
//! it. In JSON the example above becomes:
//!
//! ```text
//! [[0,0,null,null,1,1],[0,0,null,null,1,1],[5,2,null,null,2,3],
//!  [1,0,null,null,0,1],[4,2,["a","b"],null,2,5]]
//! ```
//!
//! Custom aux values keep strings, numbers, booleans and `none` as they are.
//! Every other value becomes a list whose first element names its type:
//!
//! | Value | Encoded |
//! |-------|---------|
//! | tuple | `["tuple", item, ...]` |
//! | list | `["list", item, ...]` |
//! | dict | `["dict", [key, value], ...]` |
//! | record | `["record", name, [field, ...], value, ...]` |
//! | date | `["date", rfc3339-text]` |
//! | big integer | `["bigint", decimal-text]` |
//!
//! Items are encoded the same way, recursively.
//!
//! Decoding rejects anything that is not a non-empty list of 6-field
//! records, unknown tags, aux or registration values that do not fit the kind,
//! key or field lists whose length differs from the arity, repeated mapping
//! keys, counts that are not integers or disagree with the subtree they
//! describe, and aux lists with an unknown tag. Custom records are resolved by
//! name in the registry given to the decoder.
//!
//! # Limitations
//!
//! - **Custom aux data** must itself be plain data (no custom values) to pass
//!   through a serde format; serializing a spec that holds one fails
//! - **Mapping keys** are integers or strings

// This module contains only documentation; no implementation code
