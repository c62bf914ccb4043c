//! Registering user-defined container types.
//!
//! Run with: cargo run --example custom_types

use std::error::Error;
use std::sync::Arc;
use treespec::{
    flatten, tree, CustomNode, CustomValue, Record, RecordType, Registration, Registry, TreeValue,
};

/// A fixed-capacity ring buffer; only the items are part of the tree.
#[derive(Debug, PartialEq)]
struct Ring {
    capacity: i64,
    items: Vec<TreeValue>,
}

impl CustomNode for Ring {
    const TYPE_NAME: &'static str = "Ring";
}

fn ring_registration() -> Registration {
    Registration::of::<Ring, _, _>(
        |ring| Ok((Some(TreeValue::from(ring.capacity)), ring.items.clone())),
        |data, items| {
            let capacity = data
                .and_then(TreeValue::as_i64)
                .ok_or_else(|| treespec::Error::custom("Ring needs a capacity"))?;
            Ok(Ring { capacity, items })
        },
    )
    .with_renderer(|node| {
        let capacity = node.data.map(ToString::to_string).unwrap_or_default();
        Ok(format!("Ring<{}>[{}]", capacity, node.children.join(", ")))
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut registry = Registry::new();
    registry.register(ring_registration())?;

    let ring = TreeValue::Custom(CustomValue::new(Ring {
        capacity: 4,
        items: vec![tree!(1), tree!((2, none))],
    }));

    let point = Arc::new(RecordType::new("Point", ["x", "y"]));
    let value = TreeValue::List(vec![
        ring,
        TreeValue::Record(Record::new(point, vec![tree!(3), tree!(4)])),
    ]);

    let (leaves, spec) = flatten(&value, &registry)?;
    println!("Spec:   {}", spec);
    println!("Leaves: {:?}", leaves);

    let doubled = leaves
        .iter()
        .map(|leaf| leaf.as_i64().map(|n| TreeValue::from(n * 2)).unwrap_or_else(|| leaf.clone()))
        .collect::<Vec<_>>();
    println!("Doubled: {}", spec.unflatten(doubled)?);

    // Unregistered types are opaque leaves
    let (leaves, spec) = flatten(&value, &Registry::new())?;
    println!("\nWithout registration: {} ({} leaves)", spec, leaves.len());

    Ok(())
}
