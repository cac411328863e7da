#![no_main]

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use smt::{verify_proof, Blake3Hasher, SparseMerkleTree, Store, DEFAULT_VALUE};

#[derive(Debug, Arbitrary)]
enum Op {
    Update { key: u8, value: Vec<u8> },
    Delete { key: u8 },
    Prove { key: u8 },
}

fuzz_target!(|ops: Vec<Op>| {
    let mut smt = SparseMerkleTree::<Blake3Hasher>::new(Store::memory(), Store::memory());
    let mut model = BTreeMap::<u8, Vec<u8>>::new();

    for op in ops {
        match op {
            Op::Update { key, value } => {
                smt.update(&[key], &value).unwrap();
                if value.is_empty() {
                    model.remove(&key);
                } else {
                    model.insert(key, value);
                }
            }
            Op::Delete { key } => {
                smt.delete(&[key]).unwrap();
                model.remove(&key);
            }
            Op::Prove { key } => {
                let proof = smt.prove(&[key]).unwrap();
                let value = model.get(&key).map_or(DEFAULT_VALUE, |v| v.as_slice());
                assert!(verify_proof(&proof, smt.root(), &[key], value, smt.spec()));
            }
        }
        assert_eq!(smt.is_empty(), model.is_empty());
    }

    // the root depends on the contents alone.
    let mut fresh = SparseMerkleTree::<Blake3Hasher>::new(Store::memory(), Store::memory());
    for (key, value) in &model {
        fresh.update(&[*key], value).unwrap();
        assert_eq!(smt.get(&[*key]).unwrap().as_ref(), Some(value));
    }
    assert_eq!(fresh.root(), smt.root());
});
