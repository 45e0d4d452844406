#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod error;

/// A string-keyed hash table using open addressing with linear probing.
///
/// This module provides the `HashTable` engine: slot resolution, tombstone
/// deletion, and growth by full rebuild.
pub mod hash_table;

/// A string set layered on `HashTable`.
pub mod hash_set;

pub mod hasher;

pub use error::Error;
pub use error::Result;
pub use hash_set::HashSet;
#[cfg(any(test, feature = "stats"))]
pub use hash_table::DebugStats;
pub use hash_table::HashTable;
pub use hasher::Djb2;
pub use hasher::KeyHasher;
