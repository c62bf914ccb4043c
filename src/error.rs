//! Error types for flattening, reconstruction, rendering and decoding.
//!
//! Every error is deterministic and fatal to the single operation that raised
//! it. The [`TreeSpec`](crate::TreeSpec) or leaf sequence involved is never
//! modified, and no partial result is returned.
//!
//! ## Error Categories
//!
//! - **Malformed specs**: the post-order stack machine ran out of items or did
//!   not end on a single root
//! - **Leaf-count mismatches**: too few or too many leaves for reconstruction
//! - **Aux mismatches**: a key list or record field list disagrees with arity
//! - **Registry failures**: unknown or duplicate custom registrations
//! - **Encoding errors**: the portable form is not a list of 6-field records
//!
//! ## Examples
//!
//! ```rust
//! use treespec::{flatten, tree, Error, Registry};
//!
//! let registry = Registry::new();
//! let (_, spec) = flatten(&tree!([1, 2, 3]), &registry).unwrap();
//!
//! let err = spec.unflatten(vec![1.into(), 2.into()]).unwrap_err();
//! assert!(matches!(err, Error::ExhaustedLeaves { expected: 3, got: 2 }));
//! ```

use std::fmt;
use thiserror::Error;

use crate::Kind;

/// Represents all possible errors raised by this crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The spec violates its post-order invariant
    #[error("Malformed tree spec: {0}")]
    MalformedSpec(String),

    /// A leaf node was reached after the leaf sequence ran dry
    #[error("Too few leaves for tree spec; expected {expected}, got {got}")]
    ExhaustedLeaves { expected: usize, got: usize },

    /// Leaves remained after the whole traversal was replayed
    #[error("Too many leaves for tree spec; expected {expected}")]
    TooManyLeaves { expected: usize },

    /// Key or field count disagrees with the node's arity
    #[error("{kind} node has {found} keys or fields but arity {expected}")]
    AuxMismatch {
        kind: Kind,
        expected: usize,
        found: usize,
    },

    /// A custom node's registration cannot be resolved
    #[error("Unknown custom type in tree spec: {0}")]
    UnknownRegistration(String),

    /// The portable form violates the fixed record shape
    #[error("Malformed encoded tree spec: {0}")]
    MalformedEncoding(String),

    /// A custom type name was registered twice
    #[error("Tree node type {0} is already registered")]
    DuplicateRegistration(String),

    /// Error raised by a user-supplied decompose, recompose or render function
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a malformed-spec error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use treespec::Error;
    ///
    /// let err = Error::malformed_spec("traversal did not yield a singleton");
    /// assert!(err.to_string().contains("singleton"));
    /// ```
    pub fn malformed_spec(msg: &str) -> Self {
        Error::MalformedSpec(msg.to_string())
    }

    /// Creates a malformed-encoding error.
    pub fn malformed_encoding(msg: &str) -> Self {
        Error::MalformedEncoding(msg.to_string())
    }

    /// Creates an aux mismatch error for a node of the given kind.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use treespec::{Error, Kind};
    ///
    /// let err = Error::aux_mismatch(Kind::OrderedMapping, 2, 3);
    /// assert!(err.to_string().contains("3 keys"));
    /// ```
    pub fn aux_mismatch(kind: Kind, expected: usize, found: usize) -> Self {
        Error::AuxMismatch {
            kind,
            expected,
            found,
        }
    }

    /// Creates an unknown-registration error naming the unresolved type.
    pub fn unknown_registration(name: &str) -> Self {
        Error::UnknownRegistration(name.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// Intended for user callbacks that need to reject their input.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use treespec::Error;
    ///
    /// let err = Error::custom("pair expects two children");
    /// assert!(err.to_string().contains("two children"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
