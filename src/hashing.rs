//! This module provides a deterministic hasher and `HashMap` and `HashSet` variants that use
//! it. The hashing data structures in the standard library are not deterministic, and
//! simulation runs must be exactly reproducible from their seed, so iteration order over any
//! hashed collection in this crate has to be stable across processes.
//!
//! `HashMap<K, V, S>` does not have a `new` method for non-default hashers. Use
//! `HashMap::default()`, or bring the `HashMapExt` trait into scope.
//!
//! The `hash_str` free function is used to derive independent random streams in
//! `crate::random`.

use xxhash_rust::xxh3::xxh3_64;

pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

/// Provides `new` and `with_capacity` for `HashMap`.
pub trait HashMapExt {
    fn new() -> Self;
    fn with_capacity(capacity: usize) -> Self;
}

impl<K, V> HashMapExt for HashMap<K, V> {
    fn new() -> Self {
        HashMap::default()
    }

    fn with_capacity(capacity: usize) -> Self {
        HashMap::with_capacity_and_hasher(capacity, Default::default())
    }
}

/// A convenience method to compute the hash of a `&str`. Stable across platforms and
/// releases, so seeds derived from it are reproducible.
#[must_use]
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}
