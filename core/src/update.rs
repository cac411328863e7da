//! Tree update logic.
//!
//! Updates never modify storage directly. Each operation walks the tree through a [`NodeReader`],
//! computes the replacement path bottom-up and returns it as a [`TrieUpdate`]: the new root along
//! with every node created on the way. The caller persists the nodes and only then adopts the
//! new root, so a failed write leaves the previous root intact.
//!
//! ## Shape
//!
//! Every leaf sits at the shallowest depth at which its path is unique. Insertion preserves this
//! by splitting a colliding leaf exactly at the first bit where the two paths diverge, with
//! placeholders filling the levels between the lookup terminal and the divergence. Removal
//! preserves it by lifting a leaf that is left without a non-empty sibling as far up as it goes.
//! As a consequence, the root depends only on the set of key-value pairs, not on the order in
//! which they were written.

use crate::{
    cursor::{read_preimage, record_path, NodeReader, Terminal},
    hasher::{BinaryHash, TreeHasher},
    key_path::{bit_at, shared_bits},
    spec::TreeSpec,
    trie::{Node, NodePreimage},
};
use alloc::vec::Vec;

/// The result of applying an operation to the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrieUpdate {
    /// The root of the tree after the operation.
    pub root: Node,
    /// Nodes created by the operation, as `(hash, preimage)` pairs, ordered bottom-up.
    pub nodes: Vec<(Node, Vec<u8>)>,
}

/// Compute the effect of writing `value_hash` under `path`.
///
/// Returns `None` if the tree already holds exactly this value under this path.
pub fn insert<H: BinaryHash, R: NodeReader>(
    spec: &TreeSpec<H>,
    reader: &R,
    root: &[u8],
    path: &[u8],
    value_hash: &[u8],
) -> Result<Option<TrieUpdate>, R::Error> {
    let hasher = spec.hasher();
    let record = record_path(spec, reader, root, path)?;
    let depth = record.depth();

    let mut nodes = Vec::new();
    let (leaf, leaf_preimage) = hasher.digest_leaf(path, value_hash);
    let mut current = leaf.clone();
    nodes.push((leaf, leaf_preimage));

    match record.terminal {
        Terminal::Placeholder => {}
        Terminal::Leaf { data, .. } if data.key_path == path => {
            if data.value_hash == value_hash {
                return Ok(None);
            }
        }
        Terminal::Leaf { hash, data, .. } => {
            // the paths are distinct and agree on the first `depth` bits, so they split
            // somewhere in `depth..spec.depth()`.
            let split = shared_bits(path, &data.key_path);
            debug_assert!(split >= depth && split < spec.depth());

            current = hash_up(hasher, path, split, &current, &hash, &mut nodes);
            for level in (depth..split).rev() {
                current = hash_up(hasher, path, level, &current, hasher.placeholder(), &mut nodes);
            }
        }
    }

    for (i, side_node) in record.side_nodes.iter().enumerate() {
        let level = depth - 1 - i;
        current = hash_up(hasher, path, level, &current, side_node, &mut nodes);
    }

    Ok(Some(TrieUpdate {
        root: current,
        nodes,
    }))
}

// What is carried up the path while hashing a removal.
enum Carry {
    // Nothing is left below this level.
    Empty,
    // A single leaf is left below this level; it floats up until it meets a non-empty sibling.
    Leaf(Node),
    // The node at this level is fixed; everything above is hashed normally.
    Settled(Node),
}

/// Compute the effect of removing the value under `path`.
///
/// Returns `None` if there is no value under this path.
pub fn remove<H: BinaryHash, R: NodeReader>(
    spec: &TreeSpec<H>,
    reader: &R,
    root: &[u8],
    path: &[u8],
) -> Result<Option<TrieUpdate>, R::Error> {
    let hasher = spec.hasher();
    let record = record_path(spec, reader, root, path)?;
    match record.terminal {
        Terminal::Leaf { ref data, .. } if data.key_path == path => {}
        _ => return Ok(None),
    }

    let depth = record.depth();
    let mut nodes = Vec::new();
    let mut carry = Carry::Empty;

    for (i, side_node) in record.side_nodes.iter().enumerate() {
        let level = depth - 1 - i;
        carry = match carry {
            Carry::Empty if hasher.is_placeholder(side_node) => Carry::Empty,
            Carry::Empty => match read_preimage(spec, reader, side_node)?.0 {
                NodePreimage::Leaf(_) => Carry::Leaf(side_node.clone()),
                NodePreimage::Inner(_) => Carry::Settled(hash_up(
                    hasher,
                    path,
                    level,
                    hasher.placeholder(),
                    side_node,
                    &mut nodes,
                )),
            },
            Carry::Leaf(leaf) if hasher.is_placeholder(side_node) => Carry::Leaf(leaf),
            Carry::Leaf(node) | Carry::Settled(node) => {
                Carry::Settled(hash_up(hasher, path, level, &node, side_node, &mut nodes))
            }
        };
    }

    let root = match carry {
        Carry::Empty => hasher.placeholder().to_vec(),
        Carry::Leaf(node) | Carry::Settled(node) => node,
    };
    Ok(Some(TrieUpdate { root, nodes }))
}

// Hash `node` with its sibling to get the parent at `level`, placing `node` on the side the path
// takes at that level. The new parent is recorded in `nodes`.
fn hash_up<H: BinaryHash>(
    hasher: &TreeHasher<H>,
    path: &[u8],
    level: usize,
    node: &[u8],
    sibling: &[u8],
    nodes: &mut Vec<(Node, Vec<u8>)>,
) -> Node {
    let (hash, preimage) = if bit_at(path, level) {
        hasher.digest_inner(sibling, node)
    } else {
        hasher.digest_inner(node, sibling)
    };
    nodes.push((hash.clone(), preimage));
    hash
}
