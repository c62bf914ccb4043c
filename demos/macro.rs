//! Using the tree! macro to build values.
//!
//! Run with: cargo run --example macro

use std::error::Error;
use treespec::{flatten, tree, Registry};

fn main() -> Result<(), Box<dyn Error>> {
    let registry = Registry::new();

    let values = [
        tree!(42),
        tree!(none),
        tree!((1,)),
        tree!([1, "two", true, none]),
        tree!({"x": 1, "y": (2, 3)}),
        tree!({
            "encoder": {"layers": [[1, 2], [3, 4]], "dropout": 0.1},
            "decoder": {"layers": [], "dropout": none},
            7: "int keys sort first"
        }),
    ];

    for value in &values {
        let (leaves, spec) = flatten(value, &registry)?;
        println!("{}", value);
        println!("  -> {} ({} leaves)\n", spec, leaves.len());
    }

    Ok(())
}
