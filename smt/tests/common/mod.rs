use anyhow::{bail, Result};
use rand::{RngCore as _, SeedableRng as _};
use smt::{
    compact, decompact, verify_compact_proof, verify_proof, KVStore, MemStore, Sha2Hasher,
    SparseMerkleProof, SparseMerkleTree, Store, TreeSpec,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing_subscriber::EnvFilter;

const ENV_NAME: &str = "SMT_LOG";

/// Install a subscriber printing whatever `SMT_LOG` asks for. Safe to call from every test.
#[allow(dead_code)]
pub fn init_logging() {
    let filter = match std::env::var(ENV_NAME) {
        Ok(directives) => EnvFilter::new(directives),
        Err(_) => return,
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// A tree over fresh in-memory stores.
#[allow(dead_code)]
pub fn memory_tree() -> SparseMerkleTree<Sha2Hasher> {
    init_logging();
    SparseMerkleTree::new(Store::memory(), Store::memory())
}

/// Replace every side node with random bytes of the same size.
#[allow(dead_code)]
pub fn randomise_proof(proof: &SparseMerkleProof, seed: u64) -> SparseMerkleProof {
    let mut rng = rand_pcg::Pcg64::seed_from_u64(seed);
    let side_nodes = proof
        .side_nodes
        .iter()
        .map(|node| {
            let mut random = vec![0u8; node.len()];
            rng.fill_bytes(&mut random);
            random
        })
        .collect();
    SparseMerkleProof {
        side_nodes,
        non_membership_leaf_data: proof.non_membership_leaf_data.clone(),
        sibling_data: proof.sibling_data.clone(),
    }
}

/// Check that compacting and decompacting `proof` gives `proof` back, and that the compact form
/// verifies exactly when the full form does.
#[allow(dead_code)]
pub fn check_compact_equivalence(
    proof: &SparseMerkleProof,
    spec: &TreeSpec<Sha2Hasher>,
    root: &[u8],
    key: &[u8],
    value: &[u8],
) {
    let compacted = compact(proof, spec).unwrap();
    let decompacted = decompact(&compacted, spec).unwrap();
    assert_eq!(&decompacted, proof);
    assert_eq!(
        verify_compact_proof(&compacted, root, key, value, spec),
        verify_proof(proof, root, key, value, spec),
    );
}

/// A store which fails every write once tripped.
#[allow(dead_code)]
#[derive(Clone)]
pub struct FailingStore {
    inner: MemStore,
    failing: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl FailingStore {
    pub fn new() -> Self {
        FailingStore {
            inner: MemStore::new(),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl KVStore for FailingStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("injected write failure");
        }
        self.inner.set(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("injected write failure");
        }
        self.inner.delete(key)
    }

    fn stop(&self) -> Result<()> {
        self.inner.stop()
    }
}
