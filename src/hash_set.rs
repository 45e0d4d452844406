use alloc::string::String;
use core::fmt::Debug;

use crate::error::Result;
use crate::hash_table::HashTable;
use crate::hash_table::IntoIter;
use crate::hash_table::Keys;
use crate::hasher::Djb2;
use crate::hasher::KeyHasher;

/// A set of strings backed by a [`HashTable`] with `()` values.
///
/// Membership follows the table's rules exactly: linear probing from the
/// home slot, tombstones on removal, growth by
/// [`SIZE_RATIO`](crate::hash_table::SIZE_RATIO) once the load ratio would
/// pass [`MAX_LOAD_RATIO`](crate::hash_table::MAX_LOAD_RATIO).
pub struct HashSet<S = Djb2> {
    table: HashTable<(), S>,
}

impl<S: Clone> Clone for HashSet<S> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<S: KeyHasher> PartialEq for HashSet<S> {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|v| other.contains(v))
    }
}

impl<S: KeyHasher> Eq for HashSet<S> {}

impl<S> Debug for HashSet<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl HashSet {
    /// Creates an empty set with the default capacity, addressed by [`Djb2`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashSet;
    /// #
    /// let set = HashSet::new();
    /// assert!(set.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(Djb2)
    }

    /// Creates an empty set with exactly `capacity` slots (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Djb2)
    }
}

impl<S> HashSet<S> {
    /// Creates an empty set with the default capacity using the given hasher.
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            table: HashTable::with_hasher(hasher),
        }
    }

    /// Creates an empty set with `capacity` slots using the given hasher.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            table: HashTable::with_capacity_and_hasher(capacity, hasher),
        }
    }

    /// Returns the number of strings in the set.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the set contains no strings.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of slots in the backing table.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Removes every string, keeping the capacity.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Returns an iterator over the strings in slot order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.table.keys(),
        }
    }

    /// Removes every string and returns them as an owning iterator.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashSet;
    /// #
    /// let mut set: HashSet = ["a", "b"].into_iter().collect();
    /// let mut drained: Vec<String> = set.drain().collect();
    /// drained.sort();
    /// assert_eq!(drained, ["a", "b"]);
    /// assert!(set.is_empty());
    /// ```
    pub fn drain(&mut self) -> Drain {
        Drain {
            inner: self.table.drain(),
        }
    }
}

impl<S: KeyHasher> HashSet<S> {
    /// Adds `value` to the set, returning `true` if it was not already
    /// present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashSet;
    /// #
    /// let mut set = HashSet::new();
    /// assert!(set.insert("x"));
    /// assert!(!set.insert("x"));
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        self.table.set(value, ()).is_none()
    }

    /// Returns `true` if the set contains `value`.
    pub fn contains(&self, value: &str) -> bool {
        self.table.contains_key(value)
    }

    /// Removes `value` from the set.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`](crate::Error::KeyNotFound) if `value` is not in
    /// the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashSet;
    /// #
    /// let mut set = HashSet::new();
    /// set.insert("x");
    /// assert!(set.remove("x").is_ok());
    /// assert!(set.remove("x").is_err());
    /// ```
    pub fn remove(&mut self, value: &str) -> Result<()> {
        self.table.remove(value)
    }
}

impl<S: Default> Default for HashSet<S> {
    fn default() -> Self {
        Self {
            table: HashTable::default(),
        }
    }
}

impl<T: Into<String>, S: KeyHasher> Extend<T> for HashSet<S> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.table.extend(iter.into_iter().map(|value| (value, ())));
    }
}

impl<T: Into<String>, S: KeyHasher + Default> FromIterator<T> for HashSet<S> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl<'a, S> IntoIterator for &'a HashSet<S> {
    type Item = &'a str;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the strings of a [`HashSet`].
pub struct Iter<'a> {
    inner: Keys<'a, ()>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}
impl core::iter::FusedIterator for Iter<'_> {}

/// An owning iterator over the strings drained from a [`HashSet`].
pub struct Drain {
    inner: IntoIter<()>,
}

impl Iterator for Drain {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(value, ())| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Drain {}
impl core::iter::FusedIterator for Drain {}
