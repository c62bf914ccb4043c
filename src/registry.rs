//! Kind registry for custom container types.
//!
//! A [`Registry`] is an explicit table mapping type names to
//! [`Registration`]s. It is passed by reference to every operation that needs
//! to resolve a custom type ([`flatten`](crate::flatten) and
//! [`TreeSpec::decode`](crate::TreeSpec::decode)); there is no process-wide
//! registry. Registering requires `&mut Registry`, so registration can never
//! race with a lookup.
//!
//! Registries do not layer. Separate `Registry` values act as separate
//! namespaces, and a lookup only ever consults the registry it is called on.
//!
//! Classification order for a value:
//!
//! 1. `none` is [`Kind::None`], tuples, lists and dicts are their built-in kinds
//! 2. records and custom values are looked up by type name; a hit is [`Kind::Custom`]
//! 3. records that miss but carry one value per field are [`Kind::NamedRecord`]
//! 4. everything else is a [`Kind::Leaf`]
//!
//! ## Examples
//!
//! ```rust
//! use treespec::{CustomNode, CustomValue, Kind, Registration, Registry, TreeValue};
//!
//! #[derive(Debug, PartialEq)]
//! struct Pair(TreeValue, TreeValue);
//!
//! impl CustomNode for Pair {
//!     const TYPE_NAME: &'static str = "Pair";
//! }
//!
//! let value = TreeValue::Custom(CustomValue::new(Pair(1.into(), 2.into())));
//!
//! let mut registry = Registry::new();
//! assert_eq!(registry.classify(&value).0, Kind::Leaf);
//!
//! registry
//!     .register(Registration::of::<Pair, _, _>(
//!         |pair| Ok((None, vec![pair.0.clone(), pair.1.clone()])),
//!         |_, mut children| {
//!             let second = children.pop().unwrap_or_default();
//!             let first = children.pop().unwrap_or_default();
//!             Ok(Pair(first, second))
//!         },
//!     ))
//!     .unwrap();
//! assert_eq!(registry.classify(&value).0, Kind::Custom);
//! ```

use crate::map::Key;
use crate::{CustomNode, CustomValue, Error, Kind, Result, TreeValue};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

type DecomposeFn = dyn Fn(&TreeValue) -> Result<(Option<TreeValue>, Vec<TreeValue>)> + Send + Sync;
type RecomposeFn = dyn Fn(Option<&TreeValue>, Vec<TreeValue>) -> Result<TreeValue> + Send + Sync;
type RenderFn = dyn Fn(&CustomRender<'_>) -> Result<String> + Send + Sync;

/// Everything a custom renderer gets to see for one node.
///
/// `children` are the already rendered child fragments, in order.
#[derive(Debug, Clone, Copy)]
pub struct CustomRender<'a> {
    pub name: &'a str,
    pub arity: usize,
    pub data: Option<&'a TreeValue>,
    pub children: &'a [String],
}

impl<'a> CustomRender<'a> {
    /// Interprets the aux data as a key list, one key per child.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Custom`] if the aux data is missing or holds something
    /// other than integer or string keys, and [`Error::AuxMismatch`] if the
    /// key count differs from the arity.
    pub fn keys(&self) -> Result<Vec<Key>> {
        let items = self
            .data
            .and_then(TreeValue::as_sequence)
            .ok_or_else(|| Error::custom(format!("{} node has no key list", self.name)))?;
        let keys = items
            .iter()
            .map(|item| {
                Key::from_value(item)
                    .ok_or_else(|| Error::custom(format!("{} is not a valid key", item)))
            })
            .collect::<Result<Vec<_>>>()?;
        if keys.len() != self.arity {
            return Err(Error::aux_mismatch(Kind::Custom, self.arity, keys.len()));
        }
        Ok(keys)
    }
}

/// A registry entry binding a custom type name to its decompose, recompose and
/// (optionally) render functions.
///
/// Nodes refer to their registration through an `Arc`, and two nodes have the
/// same registration only when both point at the same entry.
pub struct Registration {
    name: String,
    decompose: Box<DecomposeFn>,
    recompose: Box<RecomposeFn>,
    render: Option<Box<RenderFn>>,
}

impl Registration {
    /// Creates a registration over raw tree values.
    ///
    /// `decompose` returns the optional aux data and the ordered children;
    /// `recompose` receives the same aux data and the rebuilt children.
    pub fn new<D, R>(name: impl Into<String>, decompose: D, recompose: R) -> Self
    where
        D: Fn(&TreeValue) -> Result<(Option<TreeValue>, Vec<TreeValue>)> + Send + Sync + 'static,
        R: Fn(Option<&TreeValue>, Vec<TreeValue>) -> Result<TreeValue> + Send + Sync + 'static,
    {
        Registration {
            name: name.into(),
            decompose: Box::new(decompose),
            recompose: Box::new(recompose),
            render: None,
        }
    }

    /// Creates a registration for a [`CustomNode`] type under its
    /// [`TYPE_NAME`](CustomNode::TYPE_NAME).
    ///
    /// The callbacks work on `T` directly; values of any other type are
    /// rejected with [`Error::Custom`].
    pub fn of<T, D, R>(decompose: D, recompose: R) -> Self
    where
        T: CustomNode,
        D: Fn(&T) -> Result<(Option<TreeValue>, Vec<TreeValue>)> + Send + Sync + 'static,
        R: Fn(Option<&TreeValue>, Vec<TreeValue>) -> Result<T> + Send + Sync + 'static,
    {
        Registration::new(
            T::TYPE_NAME,
            move |value| {
                let node = value
                    .as_custom()
                    .and_then(CustomValue::downcast_ref::<T>)
                    .ok_or_else(|| {
                        Error::custom(format!("expected {}, found {}", T::TYPE_NAME, value))
                    })?;
                decompose(node)
            },
            move |data, children| {
                recompose(data, children).map(|node| TreeValue::Custom(CustomValue::new(node)))
            },
        )
    }

    /// Attaches a renderer used in place of the generic `Name[aux](..)` form.
    #[must_use]
    pub fn with_renderer<F>(mut self, render: F) -> Self
    where
        F: Fn(&CustomRender<'_>) -> Result<String> + Send + Sync + 'static,
    {
        self.render = Some(Box::new(render));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn decompose(&self, value: &TreeValue) -> Result<(Option<TreeValue>, Vec<TreeValue>)> {
        (self.decompose)(value)
    }

    pub fn recompose(
        &self,
        data: Option<&TreeValue>,
        children: Vec<TreeValue>,
    ) -> Result<TreeValue> {
        (self.recompose)(data, children)
    }

    /// Runs the custom renderer, or returns `None` if there is none.
    pub fn render(&self, node: &CustomRender<'_>) -> Option<Result<String>> {
        self.render.as_ref().map(|render| render(node))
    }

    #[must_use]
    pub fn has_renderer(&self) -> bool {
        self.render.is_some()
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("has_renderer", &self.has_renderer())
            .finish_non_exhaustive()
    }
}

/// An explicitly populated table of custom registrations, keyed by type name.
#[derive(Debug, Default)]
pub struct Registry {
    registrations: IndexMap<String, Arc<Registration>>,
}

impl Registry {
    /// Creates an empty registry. Built-in kinds need no registration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a registration and returns the shared handle nodes will point at.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRegistration`] if the name is already taken.
    pub fn register(&mut self, registration: Registration) -> Result<Arc<Registration>> {
        if self.registrations.contains_key(registration.name()) {
            return Err(Error::DuplicateRegistration(registration.name().to_string()));
        }
        let registration = Arc::new(registration);
        self.registrations
            .insert(registration.name().to_string(), Arc::clone(&registration));
        Ok(registration)
    }

    /// Resolves a registration by type name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Arc<Registration>> {
        self.registrations.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Registered type names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.registrations.keys().map(String::as_str)
    }

    /// Decides the structural kind of a value.
    ///
    /// The registration is returned only for [`Kind::Custom`].
    #[must_use]
    pub fn classify(&self, value: &TreeValue) -> (Kind, Option<Arc<Registration>>) {
        match value {
            TreeValue::None => (Kind::None, None),
            TreeValue::Tuple(_) => (Kind::Sequence, None),
            TreeValue::List(_) => (Kind::MutableSequence, None),
            TreeValue::Dict(_) => (Kind::OrderedMapping, None),
            TreeValue::Record(record) => match self.lookup(record.ty.name()) {
                Some(registration) => (Kind::Custom, Some(Arc::clone(registration))),
                None if record.has_named_fields() => (Kind::NamedRecord, None),
                None => (Kind::Leaf, None),
            },
            TreeValue::Custom(custom) => match self.lookup(custom.type_name()) {
                Some(registration) => (Kind::Custom, Some(Arc::clone(registration))),
                None => (Kind::Leaf, None),
            },
            TreeValue::Bool(_)
            | TreeValue::Number(_)
            | TreeValue::String(_)
            | TreeValue::Date(_)
            | TreeValue::BigInt(_) => (Kind::Leaf, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Record, RecordType};

    fn passthrough(name: &str) -> Registration {
        Registration::new(
            name,
            |value| Ok((None, vec![value.clone()])),
            |_, mut children| Ok(children.pop().unwrap_or_default()),
        )
    }

    fn boxed() -> TreeValue {
        let ty = Arc::new(RecordType::new("Box", ["item"]));
        TreeValue::Record(Record::new(ty, vec![1.into()]))
    }

    #[test]
    fn test_builtin_kinds() {
        let registry = Registry::new();
        assert_eq!(registry.classify(&TreeValue::None).0, Kind::None);
        assert_eq!(registry.classify(&TreeValue::Tuple(vec![])).0, Kind::Sequence);
        assert_eq!(registry.classify(&TreeValue::List(vec![])).0, Kind::MutableSequence);
        assert_eq!(
            registry.classify(&TreeValue::Dict(Default::default())).0,
            Kind::OrderedMapping
        );
        assert_eq!(registry.classify(&TreeValue::from("x")).0, Kind::Leaf);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = Registry::new();
        registry.register(passthrough("Box")).unwrap();
        let err = registry.register(passthrough("Box")).unwrap_err();
        assert_eq!(err, Error::DuplicateRegistration("Box".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registries_are_separate_namespaces() {
        let mut outer = Registry::new();
        let mut inner = Registry::new();
        let first = outer.register(passthrough("Box")).unwrap();
        let second = inner.register(passthrough("Box")).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        // No fallback from one registry to another
        inner.register(passthrough("Crate")).unwrap();
        assert!(outer.lookup("Crate").is_none());
        assert!(Registry::new().lookup("Box").is_none());

        let unbox = Registration::new(
            "Box",
            |value| match value {
                TreeValue::Record(record) => Ok((None, record.values.clone())),
                _ => Err(Error::custom("not a box")),
            },
            |_, children| Ok(TreeValue::List(children)),
        );
        let mut boxes = Registry::new();
        boxes.register(unbox).unwrap();
        let (leaves, spec) = crate::flatten(&boxed(), &boxes).unwrap();
        assert_eq!(leaves, vec![TreeValue::from(1)]);
        let err = crate::TreeSpec::decode(&spec.encode(), &Registry::new()).unwrap_err();
        assert_eq!(err, Error::UnknownRegistration("Box".to_string()));
    }

    #[test]
    fn test_record_heuristic_runs_after_lookup() {
        let ty = Arc::new(RecordType::new("Point", ["x", "y"]));
        let record = TreeValue::Record(Record::new(ty.clone(), vec![1.into(), 2.into()]));
        let ragged = TreeValue::Record(Record::new(ty, vec![1.into()]));

        let mut registry = Registry::new();
        assert_eq!(registry.classify(&record).0, Kind::NamedRecord);
        assert_eq!(registry.classify(&ragged).0, Kind::Leaf);

        let registration = registry.register(passthrough("Point")).unwrap();
        let (kind, found) = registry.classify(&record);
        assert_eq!(kind, Kind::Custom);
        assert!(Arc::ptr_eq(&found.unwrap(), &registration));
    }

    #[test]
    fn test_render_keys_checks_arity() {
        let data = TreeValue::List(vec!["a".into(), 1.into()]);
        let children = vec!["*".to_string()];
        let node = CustomRender {
            name: "OrderedDict",
            arity: 1,
            data: Some(&data),
            children: &children,
        };
        assert_eq!(node.keys().unwrap_err(), Error::aux_mismatch(Kind::Custom, 1, 2));
    }
}
