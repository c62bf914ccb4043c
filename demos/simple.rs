//! Flattening a nested value and rebuilding it with new leaves.
//!
//! Run with: cargo run --example simple

use std::error::Error;
use treespec::{flatten, tree, Registry, TreeValue};

fn main() -> Result<(), Box<dyn Error>> {
    let registry = Registry::new();
    let value = tree!({
        "name": "model",
        "weights": [0.5, 1.5, 2.5],
        "bias": (0.1, none)
    });

    // Split into leaves and shape
    let (leaves, spec) = flatten(&value, &registry)?;
    println!("Value:  {}", value);
    println!("Spec:   {}", spec);
    println!("Leaves: {} of {} nodes\n", spec.num_leaves(), spec.num_nodes());

    for (i, leaf) in leaves.iter().enumerate() {
        println!("  [{}] {}", i, leaf);
    }

    // Same shape, every leaf replaced by its position
    let positions: Vec<TreeValue> = (0..leaves.len()).map(TreeValue::from).collect();
    let rebuilt = spec.unflatten(positions)?;
    println!("\nRebuilt: {}", rebuilt);

    let original = spec.unflatten(leaves)?;
    assert_eq!(original, value);
    println!("✓ Round-trip successful");

    Ok(())
}
