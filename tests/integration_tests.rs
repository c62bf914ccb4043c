use serde::de::DeserializeSeed;
use std::sync::Arc;
use treespec::{
    flatten, flatten_with_options, tree, unflatten, CustomNode, CustomValue, Error, FlattenOptions,
    Kind, Record, RecordType, Registration, Registry, TreeSpec, TreeSpecSeed, TreeValue,
};

#[derive(Debug, PartialEq)]
struct Pair(TreeValue, TreeValue);

impl CustomNode for Pair {
    const TYPE_NAME: &'static str = "Pair";
}

#[derive(Debug, PartialEq)]
struct Tagged {
    tag: String,
    items: Vec<TreeValue>,
}

impl CustomNode for Tagged {
    const TYPE_NAME: &'static str = "Tagged";
}

fn pair_registration() -> Registration {
    Registration::of::<Pair, _, _>(
        |pair| Ok((None, vec![pair.0.clone(), pair.1.clone()])),
        |_, children| match <[TreeValue; 2]>::try_from(children) {
            Ok([first, second]) => Ok(Pair(first, second)),
            Err(children) => Err(Error::custom(format!(
                "Pair expects 2 children, got {}",
                children.len()
            ))),
        },
    )
}

fn tagged_registration() -> Registration {
    Registration::of::<Tagged, _, _>(
        |tagged| Ok((Some(tagged.tag.as_str().into()), tagged.items.clone())),
        |data, items| {
            let tag = data
                .and_then(TreeValue::as_str)
                .ok_or_else(|| Error::custom("Tagged needs a string tag"))?;
            Ok(Tagged {
                tag: tag.to_string(),
                items,
            })
        },
    )
}

fn pair(first: TreeValue, second: TreeValue) -> TreeValue {
    TreeValue::Custom(CustomValue::new(Pair(first, second)))
}

fn point(x: TreeValue, y: TreeValue) -> TreeValue {
    let ty = Arc::new(RecordType::new("Point", ["x", "y"]));
    TreeValue::Record(Record::new(ty, vec![x, y]))
}

#[test]
fn test_mapping_with_none() {
    let registry = Registry::new();
    let value = tree!({"a": [1, 2], "b": none});

    let (leaves, spec) = flatten(&value, &registry).unwrap();
    assert_eq!(leaves, vec![TreeValue::from(1), TreeValue::from(2)]);
    assert_eq!(spec.to_string(), "Spec({'a': [*, *], 'b': none})");
    assert_eq!(spec.num_leaves(), 2);
    assert_eq!(spec.num_nodes(), 5);
    assert_eq!(spec.kind(), Kind::OrderedMapping);

    let decoded = TreeSpec::decode(&spec.encode(), &registry).unwrap();
    assert_eq!(decoded, spec);
    assert_eq!(
        decoded.unflatten(vec![10.into(), 20.into()]).unwrap(),
        tree!({"a": [10, 20], "b": none})
    );
}

#[test]
fn test_leaf_count_errors() {
    let registry = Registry::new();
    let (_, spec) = flatten(&tree!((1, [2, 3])), &registry).unwrap();
    assert_eq!(spec.num_leaves(), 3);

    let err = spec.unflatten(vec![1.into(), 2.into()]).unwrap_err();
    assert_eq!(err, Error::ExhaustedLeaves { expected: 3, got: 2 });

    let err = spec
        .unflatten(vec![1.into(), 2.into(), 3.into(), 4.into()])
        .unwrap_err();
    assert_eq!(err, Error::TooManyLeaves { expected: 3 });
}

#[test]
fn test_leaves_consumed_in_order() {
    let registry = Registry::new();
    let value = tree!([(1, 2), {"z": 3, "a": 4}, 5]);
    let (leaves, spec) = flatten(&value, &registry).unwrap();

    // Dict keys are sorted, so "a" comes first
    assert_eq!(
        leaves,
        vec![tree!(1), tree!(2), tree!(4), tree!(3), tree!(5)]
    );

    let renumbered: Vec<TreeValue> = (0..5).map(TreeValue::from).collect();
    let rebuilt = unflatten(&spec, renumbered).unwrap();
    assert_eq!(rebuilt, tree!([(0, 1), {"a": 2, "z": 3}, 4]));
}

#[test]
fn test_unsorted_keys_keep_insertion_order() {
    let registry = Registry::new();
    let options = FlattenOptions::new().with_sort_keys(false);
    let value = tree!({"z": 1, "a": 2});
    let (leaves, spec) = flatten_with_options(&value, &registry, options).unwrap();
    assert_eq!(leaves, vec![TreeValue::from(1), TreeValue::from(2)]);
    assert_eq!(spec.to_string(), "Spec({'z': *, 'a': *})");

    let sorted = flatten(&tree!({"z": 1, "a": 2}), &registry).unwrap().1;
    assert_ne!(spec, sorted);
}

#[test]
fn test_none_is_leaf_option() {
    let registry = Registry::new();
    let value = tree!([1, none]);

    let (leaves, spec) = flatten(&value, &registry).unwrap();
    assert_eq!(leaves.len(), 1);
    assert_eq!(spec.to_string(), "Spec([*, none])");

    let options = FlattenOptions::new().with_none_is_leaf(true);
    let (leaves, spec) = flatten_with_options(&value, &registry, options).unwrap();
    assert_eq!(leaves, vec![TreeValue::from(1), TreeValue::None]);
    assert_eq!(spec.to_string(), "Spec([*, *])");
    assert_eq!(spec.unflatten(leaves).unwrap(), value);
}

#[test]
fn test_named_record() {
    let registry = Registry::new();
    let value = point(tree!(1), tree!([2, none]));

    let (leaves, spec) = flatten(&value, &registry).unwrap();
    assert_eq!(leaves, vec![TreeValue::from(1), TreeValue::from(2)]);
    assert_eq!(spec.to_string(), "Spec(Point(x=*, y=[*, none]))");

    let rebuilt = spec.unflatten(vec!["a".into(), "b".into()]).unwrap();
    let record = rebuilt.as_record().unwrap();
    assert_eq!(record.ty.name(), "Point");
    assert_eq!(record.get("x"), Some(&TreeValue::from("a")));
    assert_eq!(record.get("y"), Some(&tree!(["b", none])));
}

#[test]
fn test_custom_pair_round_trip() {
    let mut registry = Registry::new();
    registry.register(pair_registration()).unwrap();

    let value = tree!([(pair(tree!(1), tree!({"k": 2}))), 3]);
    let (leaves, spec) = flatten(&value, &registry).unwrap();
    assert_eq!(leaves, vec![tree!(1), tree!(2), tree!(3)]);
    assert_eq!(spec.to_string(), "Spec([Pair(*, {'k': *}), *])");
    assert_eq!(spec.unflatten(leaves).unwrap(), value);

    let decoded = TreeSpec::decode(&spec.encode(), &registry).unwrap();
    assert_eq!(decoded, spec);
}

#[test]
fn test_custom_aux_data() {
    let mut registry = Registry::new();
    registry.register(tagged_registration()).unwrap();

    let value = TreeValue::Custom(CustomValue::new(Tagged {
        tag: "ids".to_string(),
        items: vec![1.into(), 2.into()],
    }));
    let (leaves, spec) = flatten(&value, &registry).unwrap();
    assert_eq!(spec.to_string(), "Spec(Tagged['ids'](*, *))");

    let decoded = TreeSpec::decode(&spec.encode(), &registry).unwrap();
    assert_eq!(decoded, spec);
    assert_eq!(decoded.unflatten(leaves).unwrap(), value);
}

#[test]
fn test_unregistered_custom_is_leaf() {
    let registry = Registry::new();
    let value = pair(tree!(1), tree!(2));
    let (leaves, spec) = flatten(&value, &registry).unwrap();
    assert_eq!(leaves, vec![value]);
    assert!(spec.is_leaf());
}

#[test]
fn test_registration_overrides_record() {
    let mut registry = Registry::new();
    registry
        .register(Registration::new(
            "Point",
            |value| {
                let record = value
                    .as_record()
                    .ok_or_else(|| Error::custom("expected a Point record"))?;
                Ok((None, record.values.iter().rev().cloned().collect()))
            },
            |_, mut children| {
                children.reverse();
                let ty = Arc::new(RecordType::new("Point", ["x", "y"]));
                ty.instantiate(children)
            },
        ))
        .unwrap();

    let value = point(tree!(1), tree!(2));
    let (leaves, spec) = flatten(&value, &registry).unwrap();
    assert_eq!(spec.kind(), Kind::Custom);
    assert_eq!(leaves, vec![TreeValue::from(2), TreeValue::from(1)]);
    assert_eq!(spec.unflatten(leaves).unwrap(), value);
}

#[test]
fn test_recompose_error_propagates() {
    let mut registry = Registry::new();
    registry.register(pair_registration()).unwrap();
    let (_, spec) = flatten(&pair(tree!(1), tree!(2)), &registry).unwrap();

    // A structurally valid spec whose custom node claims one child
    let mut bad = Registry::new();
    let registration = bad.register(pair_registration()).unwrap();
    let encoded = TreeValue::List(vec![
        TreeValue::Tuple(vec![
            0.into(),
            0.into(),
            TreeValue::None,
            TreeValue::None,
            1.into(),
            1.into(),
        ]),
        TreeValue::Tuple(vec![
            6.into(),
            1.into(),
            TreeValue::None,
            registration.name().into(),
            1.into(),
            2.into(),
        ]),
    ]);
    let one_child = TreeSpec::decode(&encoded, &bad).unwrap();
    assert_eq!(
        one_child.unflatten(vec![1.into()]).unwrap_err(),
        Error::custom("Pair expects 2 children, got 1")
    );

    // Specs built against different registries never compare equal
    assert_ne!(TreeSpec::decode(&spec.encode(), &bad).unwrap(), spec);
}

#[test]
fn test_decode_unknown_registration() {
    let mut registry = Registry::new();
    registry.register(pair_registration()).unwrap();
    let (_, spec) = flatten(&pair(tree!(1), tree!(2)), &registry).unwrap();

    let err = TreeSpec::decode(&spec.encode(), &Registry::new()).unwrap_err();
    assert_eq!(err, Error::UnknownRegistration("Pair".to_string()));
}

#[test]
fn test_json_round_trip() {
    let mut registry = Registry::new();
    registry.register(tagged_registration()).unwrap();

    let value = tree!({
        "point": (point(tree!(1.5), tree!(none))),
        "tagged": (TreeValue::Custom(CustomValue::new(Tagged {
            tag: "t".to_string(),
            items: vec![tree!([1, 2])],
        }))),
        "tuple": (1,)
    });
    let (_, spec) = flatten(&value, &registry).unwrap();

    let json = serde_json::to_string(&spec).unwrap();
    let mut de = serde_json::Deserializer::from_str(&json);
    let decoded = TreeSpecSeed::new(&registry).deserialize(&mut de).unwrap();
    assert_eq!(decoded, spec);
    assert_eq!(decoded.to_string(), spec.to_string());
}

#[derive(Debug, PartialEq)]
struct WithDefault {
    factory: TreeValue,
    items: Vec<TreeValue>,
}

impl CustomNode for WithDefault {
    const TYPE_NAME: &'static str = "WithDefault";
}

#[test]
fn test_json_round_trip_keeps_tuple_aux() {
    let mut registry = Registry::new();
    registry
        .register(Registration::of::<WithDefault, _, _>(
            |node| Ok((Some(node.factory.clone()), node.items.clone())),
            |data, items| {
                Ok(WithDefault {
                    factory: data.cloned().unwrap_or_default(),
                    items,
                })
            },
        ))
        .unwrap();

    let value = TreeValue::Custom(CustomValue::new(WithDefault {
        factory: tree!(("factory", 1)),
        items: vec![tree!(7)],
    }));
    let (leaves, spec) = flatten(&value, &registry).unwrap();
    assert_eq!(spec.to_string(), "Spec(WithDefault[('factory', 1)](*))");

    let json = serde_json::to_string(&spec).unwrap();
    let mut de = serde_json::Deserializer::from_str(&json);
    let decoded = TreeSpecSeed::new(&registry).deserialize(&mut de).unwrap();
    assert_eq!(decoded, spec);
    assert_eq!(decoded.to_string(), "Spec(WithDefault[('factory', 1)](*))");
    assert_eq!(decoded.unflatten(leaves).unwrap(), value);
}

#[test]
fn test_json_layout() {
    let registry = Registry::new();
    let (_, spec) = flatten(&tree!({"a": [1, 2], "b": none}), &registry).unwrap();
    let json = serde_json::to_value(&spec).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            [0, 0, null, null, 1, 1],
            [0, 0, null, null, 1, 1],
            [5, 2, null, null, 2, 3],
            [1, 0, null, null, 0, 1],
            [4, 2, ["a", "b"], null, 2, 5]
        ])
    );
}

#[test]
fn test_json_rejects_garbage() {
    let registry = Registry::new();
    let mut de = serde_json::Deserializer::from_str("[[0, 0, null]]");
    assert!(TreeSpecSeed::new(&registry).deserialize(&mut de).is_err());

    let mut de = serde_json::Deserializer::from_str("{\"a\": 1}");
    assert!(TreeSpecSeed::new(&registry).deserialize(&mut de).is_err());
}

#[test]
fn test_composed_spec_matches_flattened() {
    let registry = Registry::new();
    let (_, flattened) = flatten(&tree!((1, [2, none])), &registry).unwrap();
    let composed = TreeSpec::tuple([
        TreeSpec::leaf(),
        TreeSpec::list([TreeSpec::leaf(), TreeSpec::none()]),
    ]);
    assert_eq!(flattened, composed);
    assert_eq!(flattened.num_leaves(), composed.num_leaves());
}

#[test]
fn test_int_and_string_keys() {
    let registry = Registry::new();
    let value = tree!({"b": 1, 2: 2, "a": 3, 1: 4});
    let (leaves, spec) = flatten(&value, &registry).unwrap();
    assert_eq!(spec.to_string(), "Spec({1: *, 2: *, 'a': *, 'b': *})");
    assert_eq!(leaves, vec![tree!(4), tree!(2), tree!(3), tree!(1)]);

    let decoded = TreeSpec::decode(&spec.encode(), &registry).unwrap();
    assert_eq!(decoded, spec);
    assert_eq!(decoded.unflatten(leaves).unwrap(), value);
}

#[test]
fn test_specs_shared_across_threads() {
    let registry = Registry::new();
    let (_, spec) = flatten(&tree!([1, (2, 3)]), &registry).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let spec = spec.clone();
            std::thread::spawn(move || {
                let leaves: Vec<TreeValue> = (0..3).map(|n| TreeValue::from(n * i)).collect();
                spec.unflatten(leaves).unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let i = i as i64;
        assert_eq!(handle.join().unwrap(), tree!([0, (i, (2 * i))]));
    }
}
