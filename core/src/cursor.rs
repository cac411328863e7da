//! Read access to node storage and the lookup walk built on it.
//!
//! This is not intended so much for abstraction as it is for dependency injection and testability:
//! the update and proving algorithms only ever need to fetch node preimages by hash.

use crate::{
    hasher::BinaryHash,
    key_path::bit_at,
    spec::TreeSpec,
    trie::{LeafData, Node, NodeError, NodePreimage},
};
use alloc::{collections::BTreeMap, vec::Vec};

/// Content-addressed access to node preimages.
///
/// This is not required to give results that make sense; it is a plain lookup. Higher level code
/// decodes what comes back and reports anything unusable as a [`NodeError`].
pub trait NodeReader {
    /// The error type of the underlying storage.
    type Error: From<NodeError>;

    /// Fetch the preimage of the node with the given hash. `Ok(None)` if the node is unknown.
    fn read_node(&self, hash: &[u8]) -> Result<Option<Vec<u8>>, Self::Error>;
}

impl NodeReader for BTreeMap<Node, Vec<u8>> {
    type Error = NodeError;

    fn read_node(&self, hash: &[u8]) -> Result<Option<Vec<u8>>, NodeError> {
        Ok(self.get(hash).cloned())
    }
}

impl<R: NodeReader> NodeReader for &R {
    type Error = R::Error;

    fn read_node(&self, hash: &[u8]) -> Result<Option<Vec<u8>>, R::Error> {
        (**self).read_node(hash)
    }
}

/// The node a lookup ends at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminal {
    /// The lookup ended at an empty sub-tree.
    Placeholder,
    /// The lookup ended at a leaf. Its key path may differ from the one looked up.
    Leaf {
        /// The hash of the leaf.
        hash: Node,
        /// The decoded leaf.
        data: LeafData,
        /// The raw preimage of the leaf.
        preimage: Vec<u8>,
    },
}

/// A lookup path through the tree.
#[derive(Debug, Clone)]
pub struct PathRecord {
    /// Sibling nodes encountered during lookup, ordered from the terminal up to just below the
    /// root. The depth of the terminal is the number of siblings.
    pub side_nodes: Vec<Node>,
    /// The terminal node of the lookup.
    pub terminal: Terminal,
}

impl PathRecord {
    /// The depth at which the terminal node sits.
    pub fn depth(&self) -> usize {
        self.side_nodes.len()
    }
}

/// Fetch and decode the preimage of a node that must exist.
pub fn read_preimage<H: BinaryHash, R: NodeReader>(
    spec: &TreeSpec<H>,
    reader: &R,
    hash: &[u8],
) -> Result<(NodePreimage, Vec<u8>), R::Error> {
    let Some(preimage) = reader.read_node(hash)? else {
        return Err(NodeError::Missing(hash.to_vec()).into());
    };
    let decoded = spec.hasher().decode(hash, &preimage)?;
    Ok((decoded, preimage))
}

/// Record the lookup of `path` from `root`, descending until a placeholder or a leaf is reached.
///
/// The walk keeps only the siblings and the current hash; it never holds more than one preimage
/// at a time.
pub fn record_path<H: BinaryHash, R: NodeReader>(
    spec: &TreeSpec<H>,
    reader: &R,
    root: &[u8],
    path: &[u8],
) -> Result<PathRecord, R::Error> {
    let hasher = spec.hasher();
    let mut side_nodes = Vec::new();
    let mut current = root.to_vec();

    let terminal = loop {
        if hasher.is_placeholder(&current) {
            break Terminal::Placeholder;
        }

        match read_preimage(spec, reader, &current)? {
            (NodePreimage::Leaf(data), preimage) => {
                break Terminal::Leaf {
                    hash: current,
                    data,
                    preimage,
                };
            }
            (NodePreimage::Inner(inner), _) => {
                let depth = side_nodes.len();
                if depth >= spec.depth() {
                    // an inner node cannot sit below the last level.
                    return Err(NodeError::Malformed(current).into());
                }
                if bit_at(path, depth) {
                    side_nodes.push(inner.left);
                    current = inner.right;
                } else {
                    side_nodes.push(inner.right);
                    current = inner.left;
                }
            }
        }
    };

    side_nodes.reverse();
    Ok(PathRecord {
        side_nodes,
        terminal,
    })
}
