//! Key hashing for slot addressing.
//!
//! The table never hashes keys itself; it asks a [`KeyHasher`] for a 64-bit
//! value and reduces it modulo the current capacity to find a key's home slot.
//! [`Djb2`] is the default and is bit-for-bit compatible with the classic
//! JavaScript `djb2` implementation that iterates over `charCodeAt`.

/// Computes the djb2 hash of `key`.
///
/// The accumulator starts at 5381 and, for every UTF-16 code unit `c`, becomes
/// `acc * 33 + c` truncated to 32 bits. Wrapping `u32` arithmetic gives the
/// same bits as wrapping `i32` arithmetic, and the result is returned as the
/// unsigned reading of those bits.
///
/// # Examples
///
/// ```rust
/// use probe_hash::hasher::djb2;
///
/// assert_eq!(djb2(""), 5381);
/// assert_eq!(djb2("a"), 177670);
/// ```
#[inline]
pub fn djb2(key: &str) -> u32 {
    key.encode_utf16().fold(5381u32, |acc, unit| {
        (acc << 5).wrapping_add(acc).wrapping_add(u32::from(unit))
    })
}

/// Maps a string key to the hash used to pick its home slot.
///
/// Implementations must be deterministic for the lifetime of a table: the
/// same key must always produce the same value, or previously inserted
/// entries become unreachable.
pub trait KeyHasher {
    /// Hashes `key`.
    fn hash_key(&self, key: &str) -> u64;
}

impl<H: KeyHasher + ?Sized> KeyHasher for &H {
    #[inline]
    fn hash_key(&self, key: &str) -> u64 {
        (**self).hash_key(key)
    }
}

/// The default [`KeyHasher`], backed by [`djb2`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Djb2;

impl KeyHasher for Djb2 {
    #[inline]
    fn hash_key(&self, key: &str) -> u64 {
        u64::from(djb2(key))
    }
}

#[cfg(feature = "foldhash")]
mod fold {
    use core::hash::BuildHasher;

    use super::KeyHasher;

    impl KeyHasher for foldhash::fast::FixedState {
        #[inline]
        fn hash_key(&self, key: &str) -> u64 {
            self.hash_one(key)
        }
    }

    impl KeyHasher for foldhash::fast::RandomState {
        #[inline]
        fn hash_key(&self, key: &str) -> u64 {
            self.hash_one(key)
        }
    }
}
