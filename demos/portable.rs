//! Encoding a spec, shipping it as JSON, and decoding it again.
//!
//! Run with: cargo run --example portable

use serde::de::DeserializeSeed;
use std::error::Error;
use treespec::{flatten, tree, Registry, TreeSpec, TreeSpecSeed};

fn main() -> Result<(), Box<dyn Error>> {
    let registry = Registry::new();
    let (leaves, spec) = flatten(&tree!({"a": [1, 2], "b": none}), &registry)?;

    println!("Spec:    {}", spec);
    println!("Encoded: {}\n", spec.encode());

    let json = serde_json::to_string(&spec)?;
    println!("JSON:    {}", json);

    let mut de = serde_json::Deserializer::from_str(&json);
    let decoded = TreeSpecSeed::new(&registry).deserialize(&mut de)?;
    assert_eq!(decoded, spec);
    println!("Decoded: {}", decoded);
    println!("Rebuilt: {}\n", decoded.unflatten(leaves)?);

    // Counts are checked, not trusted
    let tampered = json.replacen("[0,0,null,null,1,1]", "[0,0,null,null,5,1]", 1);
    let value: treespec::TreeValue = serde_json::from_str(&tampered)?;
    match TreeSpec::decode(&value, &registry) {
        Ok(_) => println!("tampered spec accepted?"),
        Err(err) => println!("Rejected tampered spec: {}", err),
    }

    Ok(())
}
