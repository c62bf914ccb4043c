//! Dynamic value representation for tree structures.
//!
//! This module provides [`TreeValue`], the host structure that the flatten
//! pass walks and the reconstruction engine rebuilds.
//!
//! ## Core Types
//!
//! - [`TreeValue`]: none, leaf scalars (bool, number, string, date, bigint) and
//!   containers (tuple, list, dict, record, custom)
//! - [`Number`]: integer or float leaf payload
//! - [`RecordType`] / [`Record`]: fixed-field, tuple-like records with named fields
//! - [`CustomNode`] / [`CustomValue`]: user-defined container types, made
//!   traversable by a [`Registration`](crate::Registration)
//!
//! ## Usage Patterns
//!
//! ### Creating Values
//!
//! ```rust
//! use treespec::{tree, TreeValue};
//!
//! let none = TreeValue::None;
//! let number = TreeValue::from(42);
//! let text = TreeValue::from("hello");
//!
//! let nested = tree!({
//!     "a": [1, 2],
//!     "b": none
//! });
//! assert!(nested.is_dict());
//! ```
//!
//! ### Records
//!
//! ```rust
//! use std::sync::Arc;
//! use treespec::{Record, RecordType, TreeValue};
//!
//! let point = Arc::new(RecordType::new("Point", ["x", "y"]));
//! let value = TreeValue::Record(Record::new(point, vec![1.into(), 2.into()]));
//!
//! let record = value.as_record().unwrap();
//! assert_eq!(record.get("y"), Some(&TreeValue::from(2)));
//! ```

use crate::map::Key;
use crate::{Error, Kind, Result, TreeMap};
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A dynamically-typed tree value.
///
/// Scalars (`Bool`, `Number`, `String`, `Date`, `BigInt`) are leaves: the
/// crate never looks inside them. `Tuple`, `List`, `Dict` and `Record` are
/// built-in containers. `Custom` holds a user type that becomes a container
/// once registered, and is a leaf otherwise.
///
/// # Examples
///
/// ```rust
/// use treespec::{Number, TreeValue};
///
/// let none = TreeValue::None;
/// let num = TreeValue::Number(Number::Integer(42));
/// let seq = TreeValue::Tuple(vec![num.clone(), none.clone()]);
///
/// assert!(none.is_none());
/// assert!(num.is_number());
/// assert_eq!(seq.to_string(), "(42, none)");
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum TreeValue {
    #[default]
    None,
    Bool(bool),
    Number(Number),
    String(String),
    Date(DateTime<Utc>),
    BigInt(BigInt),
    Tuple(Vec<TreeValue>),
    List(Vec<TreeValue>),
    Dict(TreeMap),
    Record(Record),
    Custom(CustomValue),
}

/// A numeric leaf value.
///
/// # Examples
///
/// ```rust
/// use treespec::Number;
///
/// let integer = Number::Integer(42);
/// let float = Number::Float(3.5);
///
/// assert!(integer.is_integer());
/// assert_eq!(integer.as_i64(), Some(42));
/// assert_eq!(float.as_f64(), 3.5);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    /// Returns `true` if this is an integer value.
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    /// Returns `true` if this is a floating-point value.
    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// Converts this number to an `i64` if possible.
    ///
    /// Floats convert only when they have no fractional part and fit in range.
    ///
    /// ```rust
    /// use treespec::Number;
    ///
    /// assert_eq!(Number::Float(42.0).as_i64(), Some(42));
    /// assert_eq!(Number::Float(42.5).as_i64(), None);
    /// assert_eq!(Number::Float(2f64.powi(63)).as_i64(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(*i),
            Number::Float(f) => {
                // i64::MAX as f64 rounds up to 2^63, which is out of range
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
        }
    }

    /// Converts this number to an `f64`.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Float(fl) => write!(f, "{:?}", fl),
        }
    }
}

/// The type of a named record: its name and ordered field names.
///
/// Two record types are the same type when both name and field list match.
/// This is what makes a record type survive the portable encoding of a spec.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordType {
    name: String,
    fields: Vec<String>,
}

impl RecordType {
    /// Creates a record type.
    ///
    /// ```rust
    /// use treespec::RecordType;
    ///
    /// let ty = RecordType::new("Point", ["x", "y"]);
    /// assert_eq!(ty.name(), "Point");
    /// assert_eq!(ty.fields(), ["x", "y"]);
    /// ```
    pub fn new<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RecordType {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Builds a record of this type from positional values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuxMismatch`] if the number of values differs from the
    /// number of declared fields.
    pub fn instantiate(self: &Arc<Self>, values: Vec<TreeValue>) -> Result<TreeValue> {
        if values.len() != self.fields.len() {
            return Err(Error::aux_mismatch(
                Kind::NamedRecord,
                values.len(),
                self.fields.len(),
            ));
        }
        Ok(TreeValue::Record(Record::new(Arc::clone(self), values)))
    }
}

/// A value of a [`RecordType`]: positional values, one per declared field.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub ty: Arc<RecordType>,
    pub values: Vec<TreeValue>,
}

impl Record {
    pub fn new(ty: Arc<RecordType>, values: Vec<TreeValue>) -> Self {
        Record { ty, values }
    }

    /// Returns `true` when the record carries exactly one value per declared
    /// field, which is what qualifies it as a named-record node.
    #[inline]
    #[must_use]
    pub fn has_named_fields(&self) -> bool {
        self.ty.fields.len() == self.values.len()
    }

    /// Looks up a value by field name.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&TreeValue> {
        self.ty
            .fields
            .iter()
            .position(|f| f == field)
            .and_then(|i| self.values.get(i))
    }
}

/// A user-defined container type.
///
/// Implementors are wrapped in a [`CustomValue`]. On their own they are
/// leaves; a [`Registration`](crate::Registration) under
/// [`TYPE_NAME`](CustomNode::TYPE_NAME) turns them into containers.
///
/// ```rust
/// use treespec::{CustomNode, CustomValue, TreeValue};
///
/// #[derive(Debug, PartialEq)]
/// struct Pair(TreeValue, TreeValue);
///
/// impl CustomNode for Pair {
///     const TYPE_NAME: &'static str = "Pair";
/// }
///
/// let value = CustomValue::new(Pair(1.into(), 2.into()));
/// assert_eq!(value.type_name(), "Pair");
/// assert!(value.downcast_ref::<Pair>().is_some());
/// ```
pub trait CustomNode: Any + fmt::Debug + PartialEq + Send + Sync {
    /// Name the registry resolves this type by.
    const TYPE_NAME: &'static str;
}

trait DynNode: Any + fmt::Debug + Send + Sync {
    fn type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn DynNode) -> bool;
}

impl<T: CustomNode> DynNode for T {
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn DynNode) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }
}

/// A shared handle to a [`CustomNode`].
///
/// Equality delegates to the wrapped type's own `PartialEq`; values of
/// different types are never equal.
#[derive(Clone)]
pub struct CustomValue(Arc<dyn DynNode>);

impl CustomValue {
    pub fn new<T: CustomNode>(node: T) -> Self {
        CustomValue(Arc::new(node))
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    #[must_use]
    pub fn downcast_ref<T: CustomNode>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.dyn_eq(&*other.0)
    }
}

impl TreeValue {
    /// Returns `true` if the value is none.
    #[inline]
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, TreeValue::None)
    }

    /// Returns `true` if the value is a number.
    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, TreeValue::Number(_))
    }

    /// Returns `true` if the value is a string.
    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, TreeValue::String(_))
    }

    /// Returns `true` if the value is a tuple.
    #[inline]
    #[must_use]
    pub const fn is_tuple(&self) -> bool {
        matches!(self, TreeValue::Tuple(_))
    }

    /// Returns `true` if the value is a list.
    #[inline]
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, TreeValue::List(_))
    }

    /// Returns `true` if the value is a dict.
    #[inline]
    #[must_use]
    pub const fn is_dict(&self) -> bool {
        matches!(self, TreeValue::Dict(_))
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TreeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TreeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// If the value is an integer or a whole-number float, returns it.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TreeValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Returns the elements of a tuple or list.
    #[inline]
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[TreeValue]> {
        match self {
            TreeValue::Tuple(items) | TreeValue::List(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_dict(&self) -> Option<&TreeMap> {
        match self {
            TreeValue::Dict(map) => Some(map),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            TreeValue::Record(record) => Some(record),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_custom(&self) -> Option<&CustomValue> {
        match self {
            TreeValue::Custom(custom) => Some(custom),
            _ => None,
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[TreeValue]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for TreeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeValue::None => write!(f, "none"),
            TreeValue::Bool(b) => write!(f, "{}", b),
            TreeValue::Number(n) => write!(f, "{}", n),
            // Same quoting as mapping keys
            TreeValue::String(s) => write!(f, "{}", Key::Str(s.clone())),
            TreeValue::Date(dt) => write!(f, "{}", dt.to_rfc3339()),
            TreeValue::BigInt(bi) => write!(f, "{}", bi),
            TreeValue::Tuple(items) => {
                f.write_str("(")?;
                write_joined(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            TreeValue::List(items) => {
                f.write_str("[")?;
                write_joined(f, items)?;
                f.write_str("]")
            }
            TreeValue::Dict(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
            TreeValue::Record(record) => {
                write!(f, "{}(", record.ty.name)?;
                for (i, (field, v)) in record.ty.fields.iter().zip(&record.values).enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", field, v)?;
                }
                f.write_str(")")
            }
            TreeValue::Custom(custom) => write!(f, "{:?}", custom),
        }
    }
}

impl Serialize for TreeValue {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::{Error as _, SerializeMap, SerializeSeq};

        match self {
            TreeValue::None => serializer.serialize_unit(),
            TreeValue::Bool(b) => serializer.serialize_bool(*b),
            TreeValue::Number(Number::Integer(i)) => serializer.serialize_i64(*i),
            TreeValue::Number(Number::Float(f)) => serializer.serialize_f64(*f),
            TreeValue::String(s) => serializer.serialize_str(s),
            TreeValue::Date(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            TreeValue::BigInt(bi) => serializer.serialize_str(&bi.to_string()),
            TreeValue::Tuple(items) | TreeValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for element in items {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            TreeValue::Dict(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            TreeValue::Record(record) => {
                let mut out = serializer.serialize_map(Some(record.values.len()))?;
                for (field, v) in record.ty.fields.iter().zip(&record.values) {
                    out.serialize_entry(field, v)?;
                }
                out.end()
            }
            TreeValue::Custom(custom) => Err(S::Error::custom(format!(
                "custom node {} has no portable form",
                custom.type_name()
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for TreeValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct TreeValueVisitor;

        impl<'de> Visitor<'de> for TreeValueVisitor {
            type Value = TreeValue;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any tree value")
            }

            fn visit_bool<E>(self, value: bool) -> std::result::Result<Self::Value, E> {
                Ok(TreeValue::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> std::result::Result<Self::Value, E> {
                Ok(TreeValue::Number(Number::Integer(value)))
            }

            fn visit_u64<E>(self, value: u64) -> std::result::Result<Self::Value, E> {
                match i64::try_from(value) {
                    Ok(i) => Ok(TreeValue::Number(Number::Integer(i))),
                    Err(_) => Ok(TreeValue::BigInt(BigInt::from(value))),
                }
            }

            fn visit_f64<E>(self, value: f64) -> std::result::Result<Self::Value, E> {
                Ok(TreeValue::Number(Number::Float(value)))
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E> {
                Ok(TreeValue::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> std::result::Result<Self::Value, E> {
                Ok(TreeValue::String(value))
            }

            fn visit_unit<E>(self) -> std::result::Result<Self::Value, E> {
                Ok(TreeValue::None)
            }

            fn visit_none<E>(self) -> std::result::Result<Self::Value, E> {
                Ok(TreeValue::None)
            }

            fn visit_some<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(TreeValue::List(vec))
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut values = TreeMap::new();
                while let Some((key, value)) = map.next_entry::<Key, TreeValue>()? {
                    values.insert(key, value);
                }
                Ok(TreeValue::Dict(values))
            }
        }

        deserializer.deserialize_any(TreeValueVisitor)
    }
}

impl TryFrom<TreeValue> for i64 {
    type Error = crate::Error;

    fn try_from(value: TreeValue) -> crate::Result<Self> {
        value
            .as_i64()
            .ok_or_else(|| Error::custom(format!("expected integer, found {:?}", value)))
    }
}

impl TryFrom<TreeValue> for String {
    type Error = crate::Error;

    fn try_from(value: TreeValue) -> crate::Result<Self> {
        match value {
            TreeValue::String(s) => Ok(s),
            _ => Err(Error::custom(format!("expected string, found {:?}", value))),
        }
    }
}

impl From<bool> for TreeValue {
    fn from(value: bool) -> Self {
        TreeValue::Bool(value)
    }
}

impl From<i32> for TreeValue {
    fn from(value: i32) -> Self {
        TreeValue::Number(Number::Integer(value as i64))
    }
}

impl From<i64> for TreeValue {
    fn from(value: i64) -> Self {
        TreeValue::Number(Number::Integer(value))
    }
}

impl From<u32> for TreeValue {
    fn from(value: u32) -> Self {
        TreeValue::Number(Number::Integer(value as i64))
    }
}

impl From<usize> for TreeValue {
    fn from(value: usize) -> Self {
        match i64::try_from(value) {
            Ok(i) => TreeValue::Number(Number::Integer(i)),
            Err(_) => TreeValue::BigInt(BigInt::from(value)),
        }
    }
}

impl From<f64> for TreeValue {
    fn from(value: f64) -> Self {
        TreeValue::Number(Number::Float(value))
    }
}

impl From<String> for TreeValue {
    fn from(value: String) -> Self {
        TreeValue::String(value)
    }
}

impl From<&str> for TreeValue {
    fn from(value: &str) -> Self {
        TreeValue::String(value.to_string())
    }
}

impl From<DateTime<Utc>> for TreeValue {
    fn from(value: DateTime<Utc>) -> Self {
        TreeValue::Date(value)
    }
}

impl From<BigInt> for TreeValue {
    fn from(value: BigInt) -> Self {
        TreeValue::BigInt(value)
    }
}

impl From<Vec<TreeValue>> for TreeValue {
    fn from(value: Vec<TreeValue>) -> Self {
        TreeValue::List(value)
    }
}

impl From<TreeMap> for TreeValue {
    fn from(value: TreeMap) -> Self {
        TreeValue::Dict(value)
    }
}

impl From<Record> for TreeValue {
    fn from(value: Record) -> Self {
        TreeValue::Record(value)
    }
}

impl From<CustomValue> for TreeValue {
    fn from(value: CustomValue) -> Self {
        TreeValue::Custom(value)
    }
}

impl<T: Into<TreeValue>> From<Option<T>> for TreeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(TreeValue::None, Into::into)
    }
}
