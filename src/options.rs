//! Configuration options for flattening.
//!
//! ## Examples
//!
//! ```rust
//! use treespec::{flatten_with_options, tree, FlattenOptions, Registry};
//!
//! let registry = Registry::new();
//! let value = tree!([1, none]);
//!
//! // `none` becomes an ordinary leaf
//! let options = FlattenOptions::new().with_none_is_leaf(true);
//! let (leaves, spec) = flatten_with_options(&value, &registry, options).unwrap();
//! assert_eq!(leaves.len(), 2);
//! assert_eq!(spec.to_string(), "Spec([*, *])");
//! ```

/// Configuration options for [`flatten_with_options`](crate::flatten_with_options).
///
/// # Examples
///
/// ```rust
/// use treespec::FlattenOptions;
///
/// let options = FlattenOptions::new();
/// assert!(!options.none_is_leaf);
/// assert!(options.sort_keys);
///
/// let options = FlattenOptions::new()
///     .with_none_is_leaf(true)
///     .with_sort_keys(false);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlattenOptions {
    /// Treat `none` as a leaf instead of a childless node.
    pub none_is_leaf: bool,
    /// Store mapping keys in sorted order rather than insertion order.
    pub sort_keys: bool,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        FlattenOptions {
            none_is_leaf: false,
            sort_keys: true,
        }
    }
}

impl FlattenOptions {
    /// Creates default options (`none` is a node, keys sorted).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether `none` values are leaves.
    ///
    /// When set, a `none` is passed through the leaf sequence like any other
    /// scalar and the spec records a leaf in its place.
    #[must_use]
    pub fn with_none_is_leaf(mut self, none_is_leaf: bool) -> Self {
        self.none_is_leaf = none_is_leaf;
        self
    }

    /// Sets whether mapping keys are sorted.
    #[must_use]
    pub fn with_sort_keys(mut self, sort_keys: bool) -> Self {
        self.sort_keys = sort_keys;
        self
    }
}
