//! Core operations and types of a sparse merkle tree.
//!
//! This crate defines the schema and basic operations over the tree in a backend-agnostic manner:
//! hashing, lookups, updates, proof generation, proof verification and proof compaction. Storage
//! is injected through [`cursor::NodeReader`] and the hash function through
//! [`hasher::BinaryHash`].
//!
//! The core types and proof verification routines of this crate do not require the
//! standard library, but do require Rust's alloc crate.

#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

extern crate alloc;

pub mod cursor;
pub mod hasher;
pub mod key_path;
pub mod proof;
pub mod prove;
pub mod spec;
pub mod trie;
pub mod update;

pub use cursor::NodeReader;
pub use spec::TreeSpec;
