/// Builds a [`TreeValue`](crate::TreeValue) with literal-like syntax.
///
/// - `none`, `true`, `false`
/// - `[a, b]` lists, `(a, b)` tuples, `{"k": v}` dicts
/// - anything else goes through `TreeValue::from`
///
/// As in Rust, a one-element tuple needs a trailing comma: `(x,)` is a
/// tuple, while `(x)` only groups and is the same as `x`. Wrap an expression
/// of several tokens in parentheses to use it as an element, e.g.
/// `[(n * 2), (make_value())]`.
///
/// ```rust
/// use treespec::{tree, TreeValue};
///
/// let value = tree!({"a": [1, 2], "b": (none, "x")});
/// assert_eq!(value.to_string(), "{'a': [1, 2], 'b': (none, 'x')}");
/// ```
#[macro_export]
macro_rules! tree {
    (none) => {
        $crate::TreeValue::None
    };

    (true) => {
        $crate::TreeValue::Bool(true)
    };

    (false) => {
        $crate::TreeValue::Bool(false)
    };

    ([]) => {
        $crate::TreeValue::List(::std::vec::Vec::new())
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::TreeValue::List(::std::vec![$($crate::tree!($elem)),*])
    };

    (()) => {
        $crate::TreeValue::Tuple(::std::vec::Vec::new())
    };

    (( $single:tt )) => {
        $crate::tree!($single)
    };

    (( $($elem:tt),* $(,)? )) => {
        $crate::TreeValue::Tuple(::std::vec![$($crate::tree!($elem)),*])
    };

    ({}) => {
        $crate::TreeValue::Dict($crate::TreeMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut map = $crate::TreeMap::new();
        $(
            map.insert($crate::Key::from($key), $crate::tree!($value));
        )*
        $crate::TreeValue::Dict(map)
    }};

    ($other:expr) => {
        $crate::TreeValue::from($other)
    };
}
