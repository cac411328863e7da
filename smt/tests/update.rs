mod common;

use common::{memory_tree, FailingStore};
use quickcheck::{Arbitrary, Gen, QuickCheck};
use rand::{seq::SliceRandom as _, SeedableRng as _};
use smt::{verify_proof, KVStore as _, MemStore, Sha2Hasher, SparseMerkleTree, Store};
use std::collections::BTreeMap;

fn key(i: u32) -> [u8; 4] {
    i.to_le_bytes()
}

fn value(i: u32) -> Vec<u8> {
    format!("value-{i}").into_bytes()
}

#[test]
fn get_has_delete() {
    let mut smt = memory_tree();

    smt.update(b"key", b"value").unwrap();
    assert!(smt.has(b"key").unwrap());
    assert_eq!(smt.get(b"key").unwrap(), Some(b"value".to_vec()));
    assert!(!smt.has(b"other").unwrap());
    assert_eq!(smt.get(b"other").unwrap(), None);

    smt.update(b"key", b"changed").unwrap();
    assert_eq!(smt.get(b"key").unwrap(), Some(b"changed".to_vec()));

    smt.delete(b"key").unwrap();
    assert!(!smt.has(b"key").unwrap());
    assert_eq!(smt.get(b"key").unwrap(), None);
    assert!(smt.is_empty());

    // deleting a missing key changes nothing.
    smt.delete(b"key").unwrap();
    assert!(smt.is_empty());
}

#[test]
fn root_is_independent_of_insertion_order() {
    let mut rng = rand_pcg::Pcg64::seed_from_u64(42);
    let mut ids: Vec<u32> = (0..200).collect();

    let mut roots = Vec::new();
    for _ in 0..4 {
        ids.shuffle(&mut rng);
        let mut smt = memory_tree();
        for &i in &ids {
            smt.update(&key(i), &value(i)).unwrap();
        }
        roots.push(smt.root().to_vec());
    }
    assert!(roots.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn delete_restores_previous_roots() {
    let mut smt = memory_tree();
    let mut roots = vec![smt.root().to_vec()];
    for i in 0..64 {
        smt.update(&key(i), &value(i)).unwrap();
        roots.push(smt.root().to_vec());
    }

    for i in (0..64).rev() {
        smt.delete(&key(i)).unwrap();
        roots.pop();
        assert_eq!(smt.root(), roots.last().unwrap().as_slice());
    }
    assert!(smt.is_empty());
}

#[test]
fn deletes_match_a_tree_built_without_them() {
    let mut smt = memory_tree();
    for i in 0..100 {
        smt.update(&key(i), &value(i)).unwrap();
    }
    for i in (0..100).filter(|i| i % 3 == 0) {
        smt.update(&key(i), b"").unwrap();
    }

    let mut fresh = memory_tree();
    for i in (0..100).filter(|i| i % 3 != 0) {
        fresh.update(&key(i), &value(i)).unwrap();
    }
    assert_eq!(smt.root(), fresh.root());

    for i in 0..100 {
        let expected = (i % 3 != 0).then(|| value(i));
        assert_eq!(smt.get(&key(i)).unwrap(), expected);
    }
}

#[test]
fn rewriting_the_same_value_writes_nothing() {
    let nodes = MemStore::new();
    let values = MemStore::new();
    let mut smt = SparseMerkleTree::<Sha2Hasher, MemStore>::new(nodes.clone(), values.clone());
    smt.update(b"a", b"1").unwrap();
    smt.update(b"b", b"2").unwrap();

    let root = smt.root().to_vec();
    let node_count = nodes.len();
    smt.update(b"a", b"1").unwrap();
    assert_eq!(smt.root(), root.as_slice());
    assert_eq!(nodes.len(), node_count);
    assert_eq!(values.len(), 2);
}

#[test]
fn failing_store_leaves_root_unchanged() {
    let nodes = FailingStore::new();
    let values = FailingStore::new();
    let mut smt = SparseMerkleTree::<Sha2Hasher, FailingStore>::new(nodes.clone(), values.clone());
    smt.update(b"a", b"1").unwrap();
    let root = smt.root().to_vec();

    nodes.set_failing(true);
    assert!(smt.update(b"b", b"2").is_err());
    assert_eq!(smt.root(), root.as_slice());
    assert!(!smt.has(b"b").unwrap());

    nodes.set_failing(false);
    values.set_failing(true);
    assert!(smt.update(b"b", b"2").is_err());
    assert!(smt.delete(b"a").is_err());
    assert_eq!(smt.root(), root.as_slice());
    assert_eq!(smt.get(b"a").unwrap(), Some(b"1".to_vec()));
    assert_eq!(values.len(), 1);

    values.set_failing(false);
    smt.update(b"b", b"2").unwrap();
    assert_eq!(smt.get(b"b").unwrap(), Some(b"2".to_vec()));
}

#[test]
fn import_reopens_a_tree() {
    let nodes = Store::memory();
    let values = Store::memory();
    let mut smt = SparseMerkleTree::<Sha2Hasher>::new(nodes.clone(), values.clone());
    for i in 0..20 {
        smt.update(&key(i), &value(i)).unwrap();
    }
    let root = smt.root().to_vec();
    drop(smt);

    let mut imported = SparseMerkleTree::<Sha2Hasher>::import(nodes, values, root.clone());
    assert_eq!(imported.root(), root.as_slice());
    for i in 0..20 {
        assert_eq!(imported.get(&key(i)).unwrap(), Some(value(i)));
    }
    imported.update(&key(20), &value(20)).unwrap();
    assert_ne!(imported.root(), root.as_slice());
}

#[test]
fn unknown_root_is_an_error() {
    let smt = SparseMerkleTree::<Sha2Hasher>::import(
        Store::memory(),
        Store::memory(),
        vec![0xAB; 32],
    );
    let err = smt.get(b"k").unwrap_err();
    assert!(err.to_string().contains(&"ab".repeat(32)));
    assert!(smt.prove(b"k").is_err());
}

#[test]
fn stopped_tree_fails() {
    let mut smt = memory_tree();
    smt.update(b"k", b"v").unwrap();
    smt.stop().unwrap();
    assert!(smt.get(b"k").is_err());
    assert!(smt.update(b"k", b"w").is_err());
    assert!(smt.nodes().get(b"anything").is_err());
}

// keys are drawn from a small range so that operations keep hitting the same leaves.
#[derive(Debug, Clone)]
enum Op {
    Update(u8, Vec<u8>),
    Delete(u8),
}

impl Arbitrary for Op {
    fn arbitrary(g: &mut Gen) -> Self {
        let key = u8::arbitrary(g) % 32;
        if u8::arbitrary(g) % 4 == 0 {
            Op::Delete(key)
        } else {
            Op::Update(key, Vec::arbitrary(g))
        }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        match self {
            Op::Update(key, value) => {
                let key = *key;
                Box::new(value.shrink().map(move |value| Op::Update(key, value)))
            }
            Op::Delete(_) => quickcheck::empty_shrinker(),
        }
    }
}

#[test]
fn tree_matches_a_map_model() {
    fn prop(ops: Vec<Op>) -> bool {
        let mut smt = SparseMerkleTree::<sha2::Sha512>::new(Store::memory(), Store::memory());
        let mut model = BTreeMap::new();
        for op in ops {
            match op {
                Op::Update(key, value) => {
                    smt.update(&[key], &value).unwrap();
                    if value.is_empty() {
                        model.remove(&key);
                    } else {
                        model.insert(key, value);
                    }
                }
                Op::Delete(key) => {
                    smt.delete(&[key]).unwrap();
                    model.remove(&key);
                }
            }
        }

        let mut fresh = SparseMerkleTree::<sha2::Sha512>::new(Store::memory(), Store::memory());
        for (key, value) in &model {
            fresh.update(&[*key], value).unwrap();
        }
        if smt.root() != fresh.root() || smt.is_empty() != model.is_empty() {
            return false;
        }

        (0..32u8).all(|key| {
            let expected = model.get(&key);
            let proof = smt.prove(&[key]).unwrap();
            let proven_value = expected.map_or(&[][..], |v| v.as_slice());
            smt.get(&[key]).unwrap().as_ref() == expected
                && verify_proof(&proof, smt.root(), &[key], proven_value, smt.spec())
        })
    }

    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(Vec<Op>) -> bool);
}
