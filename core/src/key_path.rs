//! Derivation of key paths and bit-level helpers over them.
//!
//! A key path is the digest of a key, read as a sequence of bits from the most significant bit of
//! the first byte. Bit `i` decides whether the lookup descends into the left (0) or right (1)
//! child at depth `i`.

use crate::{hasher::BinaryHash, trie::KeyPath};
use bitvec::prelude::*;
use core::{fmt, marker::PhantomData};

/// Maps keys of arbitrary length onto fixed-length key paths.
pub struct PathHasher<H>(PhantomData<fn() -> H>);

impl<H> Clone for PathHasher<H> {
    fn clone(&self) -> Self {
        PathHasher(PhantomData)
    }
}

impl<H> fmt::Debug for PathHasher<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PathHasher")
    }
}

impl<H: BinaryHash> Default for PathHasher<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: BinaryHash> PathHasher<H> {
    /// Create a new path hasher.
    pub fn new() -> Self {
        PathHasher(PhantomData)
    }

    /// The length of every key path, in bytes.
    pub fn path_size(&self) -> usize {
        H::output_size()
    }

    /// Derive the path of a key.
    pub fn path(&self, key: &[u8]) -> KeyPath {
        H::hash(key)
    }
}

/// Get the bit of `path` at `index`, counting from the most significant bit.
///
/// Panics if `index` is beyond the end of the path.
pub fn bit_at(path: &[u8], index: usize) -> bool {
    path.view_bits::<Msb0>()[index]
}

/// The number of leading bits shared by two paths.
pub fn shared_bits(a: &[u8], b: &[u8]) -> usize {
    a.view_bits::<Msb0>()
        .iter()
        .zip(b.view_bits::<Msb0>().iter())
        .take_while(|(a, b)| a == b)
        .count()
}

/// Whether two paths agree on their first `bits` bits.
///
/// Paths shorter than `bits` never share the prefix.
pub fn shares_prefix(a: &[u8], b: &[u8], bits: usize) -> bool {
    let (a, b) = (a.view_bits::<Msb0>(), b.view_bits::<Msb0>());
    a.len() >= bits && b.len() >= bits && a[..bits] == b[..bits]
}
