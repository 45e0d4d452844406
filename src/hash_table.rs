use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::iter::FusedIterator;

use log::debug;
use log::trace;

use crate::error::Error;
use crate::error::Result;
use crate::hasher::Djb2;
use crate::hasher::KeyHasher;

/// Highest fraction of slots that may hold live entries or tombstones once a
/// `set` has completed.
pub const MAX_LOAD_RATIO: f64 = 0.9;

/// Multiplicative growth factor applied to the capacity on every resize.
pub const SIZE_RATIO: usize = 3;

/// Capacity of a table created with [`HashTable::new`].
pub const DEFAULT_CAPACITY: usize = 8;

/// State of one cell of the backing vector.
///
/// `Deleted` keeps the key it used to hold so debugging output can show what
/// the tombstone replaced. It never matches during slot resolution.
enum Slot<V> {
    Empty,
    Occupied { key: String, value: V },
    Deleted { key: String },
}

fn empty_slots<V>(capacity: usize) -> Vec<Slot<V>> {
    let mut slots = Vec::with_capacity(capacity);
    slots.resize_with(capacity, || Slot::Empty);
    slots
}

/// Debug statistics for hash table analysis.
///
/// Only available with the `stats` feature (and always under `cfg(test)`).
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of live entries
    pub live: usize,
    /// Number of tombstones
    pub tombstones: usize,
    /// Number of never-used slots since the last rebuild
    pub empty: usize,
    /// Total number of slots allocated
    pub capacity: usize,
    /// (live + tombstones) / capacity
    pub load_ratio: f64,
    /// Largest distance between a live entry and its home slot
    pub max_displacement: usize,
    /// Mean distance between a live entry and its home slot
    pub mean_displacement: f64,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Slots: {} total, {} live, {} tombstones, {} empty",
            self.capacity, self.live, self.tombstones, self.empty
        );
        println!("Load ratio: {:.2}%", self.load_ratio * 100.0);
        println!(
            "Displacement: max {}, mean {:.3}",
            self.max_displacement, self.mean_displacement
        );
    }
}

/// A string-keyed hash table using open addressing with linear probing.
///
/// Every slot of the backing vector is empty, occupied by a live entry, or a
/// tombstone left behind by [`remove`]. Lookups walk forward from the key's
/// home slot (`hash(key) % capacity`) until they meet the key or an empty
/// slot; tombstones are stepped over. When a `set` would push
/// `(live + tombstones) / capacity` past [`MAX_LOAD_RATIO`], the table is
/// rebuilt at [`SIZE_RATIO`] times its capacity and tombstones are discarded.
///
/// The hasher `S` defaults to [`Djb2`].
///
/// [`remove`]: HashTable::remove
///
/// ## Example
///
/// ```rust
/// use probe_hash::Error;
/// use probe_hash::HashTable;
///
/// let mut table = HashTable::new();
/// table.set("a", 1);
/// table.set("b", 2);
/// table.set("a", 3);
///
/// assert_eq!(table.get("a"), Ok(&3));
/// assert_eq!(table.get("b"), Ok(&2));
/// assert!(matches!(table.get("c"), Err(Error::KeyNotFound { .. })));
/// ```
pub struct HashTable<V, S = Djb2> {
    slots: Vec<Slot<V>>,
    live: usize,
    deleted: usize,
    hasher: S,
}

struct SlotView<'a, V>(&'a Slot<V>);

impl<V: Debug> Debug for SlotView<'_, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.0 {
            Slot::Empty => f.write_str(".."),
            Slot::Occupied { key, value } => write!(f, "{key:?}: {value:?}"),
            Slot::Deleted { key } => write!(f, "<deleted {key:?}>"),
        }
    }
}

impl<V: Debug, S> Debug for HashTable<V, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HashTable")
            .field("live", &self.live)
            .field("tombstones", &self.deleted)
            .field("capacity", &self.slots.len())
            .field(
                "slots",
                &self.slots.iter().map(SlotView).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<V: Clone, S: Clone> Clone for HashTable<V, S> {
    fn clone(&self) -> Self {
        Self {
            slots: self
                .slots
                .iter()
                .map(|slot| match slot {
                    Slot::Empty => Slot::Empty,
                    Slot::Occupied { key, value } => Slot::Occupied {
                        key: key.clone(),
                        value: value.clone(),
                    },
                    Slot::Deleted { key } => Slot::Deleted { key: key.clone() },
                })
                .collect(),
            live: self.live,
            deleted: self.deleted,
            hasher: self.hasher.clone(),
        }
    }
}

impl<V> HashTable<V> {
    /// Creates an empty table with [`DEFAULT_CAPACITY`] slots, addressed by
    /// [`Djb2`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashTable;
    /// #
    /// let table: HashTable<i32> = HashTable::new();
    /// assert_eq!(table.capacity(), 8);
    /// assert!(table.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty table with exactly `capacity` slots.
    ///
    /// A capacity of zero is raised to one so the table always has a slot to
    /// probe; the first `set` then grows it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashTable;
    /// #
    /// let table: HashTable<String> = HashTable::with_capacity(100);
    /// assert_eq!(table.capacity(), 100);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Djb2)
    }
}

impl<V, S> HashTable<V, S> {
    /// See [`MAX_LOAD_RATIO`].
    pub const MAX_LOAD_RATIO: f64 = MAX_LOAD_RATIO;
    /// See [`SIZE_RATIO`].
    pub const SIZE_RATIO: usize = SIZE_RATIO;
    /// See [`DEFAULT_CAPACITY`].
    pub const DEFAULT_CAPACITY: usize = DEFAULT_CAPACITY;

    /// Creates an empty table with [`DEFAULT_CAPACITY`] slots using the given
    /// hasher.
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hasher)
    }

    /// Creates an empty table with `capacity` slots (at least one) using the
    /// given hasher.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashTable;
    /// # use probe_hash::hasher::KeyHasher;
    /// #
    /// struct Length;
    /// impl KeyHasher for Length {
    ///     fn hash_key(&self, key: &str) -> u64 {
    ///         key.len() as u64
    ///     }
    /// }
    ///
    /// let mut table = HashTable::with_capacity_and_hasher(16, Length);
    /// table.set("abc", 1);
    /// assert_eq!(table.get("abc"), Ok(&1));
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            slots: empty_slots(capacity.max(1)),
            live: 0,
            deleted: 0,
            hasher,
        }
    }

    /// Returns a reference to the table's hasher.
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Returns the number of live entries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// assert_eq!(table.len(), 0);
    /// table.set("k", 1);
    /// table.set("k", 2);
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if the table holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Returns the number of slots in the backing vector.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of tombstones awaiting the next rebuild.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.set("k", 1);
    /// table.remove("k").unwrap();
    /// assert_eq!(table.len(), 0);
    /// assert_eq!(table.tombstones(), 1);
    /// ```
    pub fn tombstones(&self) -> usize {
        self.deleted
    }

    /// Returns `(len + tombstones) / capacity`.
    pub fn load_ratio(&self) -> f64 {
        (self.live + self.deleted) as f64 / self.slots.len() as f64
    }

    /// Resets every slot to empty, dropping all values and tombstones. The
    /// capacity is kept.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// for i in 0..20 {
    ///     table.set(format!("key{i}"), i);
    /// }
    /// let capacity = table.capacity();
    ///
    /// table.clear();
    /// assert!(table.is_empty());
    /// assert_eq!(table.capacity(), capacity);
    /// ```
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::Empty;
        }
        self.live = 0;
        self.deleted = 0;
    }

    /// Returns an iterator over `(key, value)` pairs in slot order.
    ///
    /// The order depends on the hasher and the capacity and is not otherwise
    /// specified.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.set("one", 1);
    /// table.set("two", 2);
    ///
    /// let mut pairs: Vec<_> = table.iter().collect();
    /// pairs.sort();
    /// assert_eq!(pairs, vec![("one", &1), ("two", &2)]);
    /// ```
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            slots: self.slots.iter(),
            remaining: self.live,
        }
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> Keys<'_, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values.
    pub fn values(&self) -> Values<'_, V> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator over mutable references to the values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.set("a", 1);
    /// table.set("b", 2);
    /// for value in table.values_mut() {
    ///     *value *= 10;
    /// }
    /// assert_eq!(table.get("b"), Ok(&20));
    /// ```
    pub fn values_mut(&mut self) -> ValuesMut<'_, V> {
        ValuesMut {
            slots: self.slots.iter_mut(),
            remaining: self.live,
        }
    }

    /// Removes every entry and returns them as an owning iterator.
    ///
    /// The table is left empty with its capacity intact, even if the iterator
    /// is dropped early.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.set("a", 1);
    /// table.set("b", 2);
    ///
    /// let mut drained: Vec<(String, i32)> = table.drain().collect();
    /// drained.sort();
    /// assert_eq!(drained, vec![("a".to_string(), 1), ("b".to_string(), 2)]);
    /// assert!(table.is_empty());
    /// ```
    pub fn drain(&mut self) -> IntoIter<V> {
        let capacity = self.slots.len();
        let slots = core::mem::replace(&mut self.slots, empty_slots(capacity));
        let remaining = self.live;
        self.live = 0;
        self.deleted = 0;
        IntoIter {
            slots: slots.into_iter(),
            remaining,
        }
    }
}

impl<V, S: KeyHasher> HashTable<V, S> {
    #[inline]
    fn home_slot(&self, key: &str) -> usize {
        (self.hasher.hash_key(key) % self.slots.len() as u64) as usize
    }

    /// Walk the probe sequence for `key` and return the index an operation on
    /// `key` should act on: either an occupied slot holding `key`, or the
    /// first empty slot. Tombstones never stop the walk.
    fn find_slot(&self, key: &str) -> usize {
        let capacity = self.slots.len();
        let mut index = self.home_slot(key);
        for _ in 0..capacity {
            match &self.slots[index] {
                Slot::Empty => return index,
                Slot::Occupied { key: stored, .. } if stored == key => return index,
                Slot::Occupied { .. } | Slot::Deleted { .. } => {}
            }

            index += 1;
            if index == capacity {
                index = 0;
            }
        }

        unreachable!("load ratio stays below 1.0, so an empty slot always exists")
    }

    /// Would one more occupied slot push the load ratio past the maximum?
    #[inline]
    fn should_grow(&self) -> bool {
        (self.live + self.deleted + 1) as f64 / self.slots.len() as f64 > MAX_LOAD_RATIO
    }

    /// Rebuild into `new_capacity` fresh slots, replaying live entries in old
    /// slot order. Tombstones are not carried over.
    fn resize(&mut self, new_capacity: usize) {
        let old_capacity = self.slots.len();
        let reclaimed = self.deleted;
        let old_slots = core::mem::replace(&mut self.slots, empty_slots(new_capacity));

        self.live = 0;
        self.deleted = 0;
        for slot in old_slots {
            if let Slot::Occupied { key, value } = slot {
                let replaced = self.insert_resolved(key, value);
                debug_assert!(replaced.is_none());
            }
        }

        debug!(
            "resized hash table from {old_capacity} to {new_capacity} slots ({} live, {reclaimed} tombstones reclaimed)",
            self.live
        );
    }

    /// Resolve and write without checking the load ratio.
    fn insert_resolved(&mut self, key: String, value: V) -> Option<V> {
        let index = self.find_slot(&key);
        match &mut self.slots[index] {
            Slot::Occupied { value: stored, .. } => Some(core::mem::replace(stored, value)),
            slot => {
                *slot = Slot::Occupied { key, value };
                self.live += 1;
                None
            }
        }
    }

    /// Returns a reference to the value stored under `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if no live entry has this key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::Error;
    /// # use probe_hash::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.set("present", 1);
    ///
    /// assert_eq!(table.get("present"), Ok(&1));
    /// assert_eq!(
    ///     table.get("absent"),
    ///     Err(Error::KeyNotFound {
    ///         key: "absent".to_string()
    ///     })
    /// );
    /// ```
    pub fn get(&self, key: &str) -> Result<&V> {
        match &self.slots[self.find_slot(key)] {
            Slot::Occupied { value, .. } => Ok(value),
            Slot::Empty | Slot::Deleted { .. } => Err(Error::key_not_found(key)),
        }
    }

    /// Returns a mutable reference to the value stored under `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if no live entry has this key.
    pub fn get_mut(&mut self, key: &str) -> Result<&mut V> {
        let index = self.find_slot(key);
        match &mut self.slots[index] {
            Slot::Occupied { value, .. } => Ok(value),
            Slot::Empty | Slot::Deleted { .. } => Err(Error::key_not_found(key)),
        }
    }

    /// Returns `true` if a live entry has this key.
    pub fn contains_key(&self, key: &str) -> bool {
        matches!(self.slots[self.find_slot(key)], Slot::Occupied { .. })
    }

    /// Stores `value` under `key`, returning the value it replaced, if any.
    ///
    /// If one more occupied slot would push `(len + tombstones) / capacity`
    /// past [`MAX_LOAD_RATIO`], the table is first rebuilt with
    /// [`SIZE_RATIO`] times as many slots. Overwriting an existing key does
    /// not change [`len`](HashTable::len).
    ///
    /// # Panics
    ///
    /// Panics if the grown capacity overflows `usize`. Allocation failure
    /// aborts.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// for i in 0..7 {
    ///     table.set(format!("key{i}"), i);
    /// }
    /// assert_eq!(table.capacity(), 8);
    ///
    /// // The eighth entry would fill every slot: grow first.
    /// table.set("key7", 7);
    /// assert_eq!(table.capacity(), 24);
    ///
    /// assert_eq!(table.set("key7", 70), Some(7));
    /// assert_eq!(table.len(), 8);
    /// ```
    pub fn set(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        if self.should_grow() {
            let new_capacity = self
                .slots
                .len()
                .checked_mul(SIZE_RATIO)
                .expect("capacity overflow");
            self.resize(new_capacity);
        }

        self.insert_resolved(key.into(), value)
    }

    /// Removes the entry stored under `key` and returns its value.
    ///
    /// The slot becomes a tombstone; capacity never shrinks.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if no live entry has this key. The table is not
    /// modified in that case.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.set("x", 1);
    /// assert_eq!(table.remove("x"), Ok(1));
    /// assert!(table.remove("x").is_err());
    ///
    /// table.set("x", 2);
    /// assert_eq!(table.get("x"), Ok(&2));
    /// ```
    pub fn remove(&mut self, key: &str) -> Result<V> {
        let index = self.find_slot(key);
        let slot = &mut self.slots[index];
        match core::mem::replace(slot, Slot::Empty) {
            Slot::Occupied { key: stored, value } => {
                *slot = Slot::Deleted { key: stored };
                self.live -= 1;
                self.deleted += 1;
                trace!("left tombstone at slot {index} ({} tombstones)", self.deleted);
                Ok(value)
            }
            vacant => {
                *slot = vacant;
                Err(Error::key_not_found(key))
            }
        }
    }

    /// Returns, for each displacement `d`, the number of live entries stored
    /// `d` slots past their home slot.
    ///
    /// The vector is as long as the largest displacement plus one, and empty
    /// for an empty table.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_histogram(&self) -> Vec<usize> {
        let capacity = self.slots.len();
        let mut hist = Vec::new();
        for (index, slot) in self.slots.iter().enumerate() {
            if let Slot::Occupied { key, .. } = slot {
                let displacement = (index + capacity - self.home_slot(key)) % capacity;
                if hist.len() <= displacement {
                    hist.resize(displacement + 1, 0);
                }
                hist[displacement] += 1;
            }
        }
        hist
    }

    /// Returns occupancy and displacement statistics for debugging.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let hist = self.probe_histogram();
        let total: usize = hist.iter().enumerate().map(|(d, count)| d * count).sum();

        DebugStats {
            live: self.live,
            tombstones: self.deleted,
            empty: self.slots.len() - self.live - self.deleted,
            capacity: self.slots.len(),
            load_ratio: self.load_ratio(),
            max_displacement: hist.len().saturating_sub(1),
            mean_displacement: if self.live == 0 {
                0.0
            } else {
                total as f64 / self.live as f64
            },
        }
    }

    /// Pretty-prints the displacement histogram horizontally using stdout.
    #[cfg(all(any(test, feature = "stats"), feature = "std"))]
    pub fn print_probe_histogram(&self) {
        let hist = self.probe_histogram();
        let max = *hist.iter().max().unwrap_or(&0);
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!("probe histogram ({} entries):", self.live);

        let make_bar = |count: usize| -> String {
            if count == 0 {
                return String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let mut bar = "█".repeat(units / 8);
            let partial = match units % 8 {
                0 => None,
                1 => Some('▏'),
                2 => Some('▎'),
                3 => Some('▍'),
                4 => Some('▌'),
                5 => Some('▋'),
                6 => Some('▊'),
                _ => Some('▉'),
            };
            bar.extend(partial);
            bar
        };

        for (displacement, &count) in hist.iter().enumerate() {
            println!("{displacement:>3} | {} ({count})", make_bar(count));
        }
    }
}

impl<V, S: Default> Default for HashTable<V, S> {
    fn default() -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, S::default())
    }
}

impl<K, V, S> Extend<(K, V)> for HashTable<V, S>
where
    K: Into<String>,
    S: KeyHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashTable<V, S>
where
    K: Into<String>,
    S: KeyHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::default();
        table.extend(iter);
        table
    }
}

impl<'a, V, S> IntoIterator for &'a HashTable<V, S> {
    type Item = (&'a str, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V, S> IntoIterator for HashTable<V, S> {
    type Item = (String, V);
    type IntoIter = IntoIter<V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            slots: self.slots.into_iter(),
            remaining: self.live,
        }
    }
}

/// An iterator over the entries of a [`HashTable`].
///
/// This struct is created by the [`iter`] method on [`HashTable`].
///
/// [`iter`]: HashTable::iter
pub struct Iter<'a, V> {
    slots: core::slice::Iter<'a, Slot<V>>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        for slot in self.slots.by_ref() {
            if let Slot::Occupied { key, value } = slot {
                self.remaining -= 1;
                return Some((key.as_str(), value));
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}
impl<V> FusedIterator for Iter<'_, V> {}

/// An iterator over the keys of a [`HashTable`].
pub struct Keys<'a, V> {
    inner: Iter<'a, V>,
}

impl<'a, V> Iterator for Keys<'a, V> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// An iterator over the values of a [`HashTable`].
pub struct Values<'a, V> {
    inner: Iter<'a, V>,
}

impl<'a, V> Iterator for Values<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> ExactSizeIterator for Keys<'_, V> {}
impl<V> FusedIterator for Keys<'_, V> {}
impl<V> ExactSizeIterator for Values<'_, V> {}
impl<V> FusedIterator for Values<'_, V> {}

/// A mutable iterator over the values of a [`HashTable`].
pub struct ValuesMut<'a, V> {
    slots: core::slice::IterMut<'a, Slot<V>>,
    remaining: usize,
}

impl<'a, V> Iterator for ValuesMut<'a, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        for slot in self.slots.by_ref() {
            if let Slot::Occupied { value, .. } = slot {
                self.remaining -= 1;
                return Some(value);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for ValuesMut<'_, V> {}
impl<V> FusedIterator for ValuesMut<'_, V> {}

/// An owning iterator over the entries of a [`HashTable`].
///
/// Created by [`HashTable::drain`] or by `into_iter` on an owned table.
pub struct IntoIter<V> {
    slots: alloc::vec::IntoIter<Slot<V>>,
    remaining: usize,
}

impl<V> Iterator for IntoIter<V> {
    type Item = (String, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        for slot in self.slots.by_ref() {
            if let Slot::Occupied { key, value } = slot {
                self.remaining -= 1;
                return Some((key, value));
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for IntoIter<V> {}
impl<V> FusedIterator for IntoIter<V> {}

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeMap;
    use alloc::format;
    use alloc::string::ToString;
    use alloc::vec;
    use core::hash::Hasher;

    use rand::Rng;
    use rand::SeedableRng;
    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use rand::rngs::SmallRng;
    use siphasher::sip::SipHasher;

    use super::*;

    struct SipKeys {
        k0: u64,
        k1: u64,
    }

    impl SipKeys {
        fn random() -> Self {
            let mut rng = OsRng;
            Self {
                k0: rng.try_next_u64().unwrap(),
                k1: rng.try_next_u64().unwrap(),
            }
        }
    }

    impl KeyHasher for SipKeys {
        fn hash_key(&self, key: &str) -> u64 {
            let mut h = SipHasher::new_with_keys(self.k0, self.k1);
            h.write(key.as_bytes());
            h.finish()
        }
    }

    /// Sends every key to slot 0.
    struct Constant;

    impl KeyHasher for Constant {
        fn hash_key(&self, _key: &str) -> u64 {
            0
        }
    }

    fn assert_not_found<T: Debug>(result: Result<T>, key: &str) {
        assert_eq!(
            result.map(|_| ()),
            Err(Error::KeyNotFound {
                key: key.to_string()
            })
        );
    }

    #[test]
    fn get_missing_key() {
        let table: HashTable<i32> = HashTable::new();
        assert_not_found(table.get("nothing"), "nothing");
    }

    #[test]
    fn set_and_get() {
        let mut table = HashTable::new();
        assert_eq!(table.set("k", 5), None);
        assert_eq!(table.get("k"), Ok(&5));
        assert_eq!(table.len(), 1);
        assert!(table.contains_key("k"));
    }

    #[test]
    fn last_write_wins() {
        let mut table = HashTable::with_capacity(8);
        table.set("a", 1);
        table.set("b", 2);
        assert_eq!(table.set("a", 3), Some(1));

        assert_eq!(table.get("a"), Ok(&3));
        assert_eq!(table.get("b"), Ok(&2));
        assert_eq!(table.len(), 2);
        assert_eq!(table.iter().filter(|(k, _)| *k == "a").count(), 1);
    }

    #[test]
    fn overwrites_do_not_force_growth() {
        let mut table = HashTable::new();
        for i in 0..100 {
            table.set("same", i);
        }
        assert_eq!(table.len(), 1);
        assert_eq!(table.capacity(), DEFAULT_CAPACITY);
        assert_eq!(table.get("same"), Ok(&99));
    }

    #[test]
    fn removed_key_is_gone() {
        let mut table = HashTable::new();
        table.set("k", "v".to_string());
        assert_eq!(table.remove("k"), Ok("v".to_string()));
        assert_not_found(table.get("k"), "k");
        assert!(!table.contains_key("k"));
        assert_eq!(table.len(), 0);
        assert_eq!(table.tombstones(), 1);
    }

    #[test]
    fn remove_missing_does_not_mutate() {
        let mut table = HashTable::new();
        table.set("a", 1);
        table.set("b", 2);
        table.remove("b").unwrap();

        let before = (table.len(), table.tombstones(), table.capacity());
        assert_not_found(table.remove("zzz"), "zzz");
        assert_not_found(table.remove("b"), "b");
        assert_eq!((table.len(), table.tombstones(), table.capacity()), before);
    }

    #[test]
    fn reinsert_after_remove() {
        let mut table = HashTable::with_capacity(8);
        table.set("x", 1);
        table.remove("x").unwrap();
        assert_eq!(table.set("x", 2), None);

        assert_eq!(table.get("x"), Ok(&2));
        assert_eq!(table.len(), 1);
        assert_eq!(table.iter().count(), 1);
    }

    #[test]
    fn repeated_failed_lookups_are_stable() {
        let mut table = HashTable::new();
        table.set("a", 1);
        table.set("i", 2);
        table.remove("a").unwrap();

        for _ in 0..10 {
            assert_not_found(table.get("missing"), "missing");
            assert_not_found(table.get("a"), "a");
        }
        assert_eq!(table.len(), 1);
        assert_eq!(table.tombstones(), 1);
        assert_eq!(table.get("i"), Ok(&2));
    }

    #[test]
    fn growth_triples_capacity() {
        let mut table = HashTable::with_capacity(8);
        for i in 0..7 {
            table.set(format!("key{i}"), i);
        }
        assert_eq!(table.capacity(), 8);

        table.set("key7", 7);
        assert_eq!(table.capacity(), 8 * SIZE_RATIO);
        assert_eq!(table.len(), 8);

        for i in 0..8 {
            assert_eq!(table.get(&format!("key{i}")), Ok(&i));
        }
    }

    #[test]
    fn zero_capacity_is_raised() {
        let mut table = HashTable::with_capacity(0);
        assert_eq!(table.capacity(), 1);

        table.set("a", 1);
        assert_eq!(table.capacity(), 3);
        table.set("b", 2);
        assert_eq!(table.capacity(), 3);
        table.set("c", 3);
        assert_eq!(table.capacity(), 9);

        assert_eq!(table.get("a"), Ok(&1));
        assert_eq!(table.get("b"), Ok(&2));
        assert_eq!(table.get("c"), Ok(&3));
    }

    #[test]
    fn tombstone_does_not_hide_collided_key() {
        // With djb2, "a", "i" and "q" all have home slot 6 at capacity 8.
        let mut table = HashTable::with_capacity(8);
        for k in ["a", "i", "q"] {
            assert_eq!(table.home_slot(k), 6);
        }
        table.set("a", 1);
        table.set("i", 2);
        table.set("q", 3);
        assert_eq!(table.probe_histogram(), vec![1, 1, 1]);

        table.remove("i").unwrap();
        assert_eq!(table.get("q"), Ok(&3));
        assert_eq!(table.get("a"), Ok(&1));

        // Updating "q" must find its existing slot past the tombstone.
        assert_eq!(table.set("q", 30), Some(3));
        assert_eq!(table.len(), 2);

        // Reinserting "i" skips its own tombstone and takes the next empty slot.
        assert_eq!(table.set("i", 20), None);
        assert_eq!(table.len(), 3);
        assert_eq!(table.tombstones(), 1);
        assert_eq!(table.probe_histogram(), vec![1, 0, 1, 1]);
    }

    #[test]
    fn resize_drops_tombstones() {
        let mut table = HashTable::with_capacity(8);
        for i in 0..3 {
            table.set(format!("old{i}"), i);
        }
        table.remove("old0").unwrap();
        table.remove("old1").unwrap();
        assert_eq!(table.tombstones(), 2);

        // live + tombstones reaches 7 after four more inserts; the next grows.
        for i in 0..4 {
            table.set(format!("new{i}"), i);
        }
        assert_eq!(table.capacity(), 8);
        table.set("trigger", 99);

        assert_eq!(table.capacity(), 24);
        assert_eq!(table.tombstones(), 0);
        assert_eq!(table.len(), 6);
        assert_not_found(table.get("old0"), "old0");
        assert_not_found(table.get("old1"), "old1");
        assert_eq!(table.get("old2"), Ok(&2));
        assert_eq!(table.get("trigger"), Ok(&99));
    }

    #[test]
    fn load_ratio_bound_holds_with_churn() {
        let mut table = HashTable::new();
        for i in 0..500 {
            table.set(format!("k{i}"), i);
            assert!(table.load_ratio() <= MAX_LOAD_RATIO, "{:#?}", table);
            if i % 3 != 0 {
                table.remove(&format!("k{i}")).unwrap();
            }
        }
        assert_eq!(table.len(), 167);
        for i in (0..500).step_by(3) {
            assert_eq!(table.get(&format!("k{i}")), Ok(&i));
        }
    }

    #[test]
    fn explicit_collision() {
        let mut table = HashTable::with_capacity_and_hasher(8, Constant);
        for i in 0..65 {
            table.set(format!("c{i}"), i);
        }
        assert_eq!(table.len(), 65);

        for i in (0..65).step_by(2) {
            assert_eq!(table.remove(&format!("c{i}")), Ok(i));
        }
        for i in 0..65 {
            let key = format!("c{i}");
            if i % 2 == 0 {
                assert_not_found(table.get(&key), &key);
            } else {
                assert_eq!(table.get(&key), Ok(&i), "{:#?}", table);
            }
        }
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn insert_many() {
        let mut table = HashTable::with_hasher(SipKeys::random());
        for i in 0..100000u64 {
            table.set(format!("key_{i:016X}"), i);
        }
        assert_eq!(table.len(), 100000);
        for i in 0..100000u64 {
            assert_eq!(table.get(&format!("key_{i:016X}")), Ok(&i));
        }
        assert_not_found(table.get("key_missing"), "key_missing");
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn matches_btree_model() {
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        let mut table = HashTable::new();
        let mut model = BTreeMap::new();

        for _ in 0..20000 {
            let key = format!("{}", rng.random_range(0..200u32));
            match rng.random_range(0..4u8) {
                0 | 1 => {
                    let value: u32 = rng.random();
                    assert_eq!(table.set(key.clone(), value), model.insert(key, value));
                    assert!(table.load_ratio() <= MAX_LOAD_RATIO);
                }
                2 => match model.remove(&key) {
                    Some(value) => assert_eq!(table.remove(&key), Ok(value)),
                    None => assert_not_found(table.remove(&key), &key),
                },
                _ => match model.get(&key) {
                    Some(value) => assert_eq!(table.get(&key), Ok(value)),
                    None => assert_not_found(table.get(&key), &key),
                },
            }
            assert_eq!(table.len(), model.len());
            assert!(table.len() + table.tombstones() < table.capacity());
        }

        let mut pairs: Vec<(String, u32)> = table.into_iter().collect();
        pairs.sort();
        assert_eq!(pairs, model.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn get_mut_modifies_in_place() {
        let mut table = HashTable::new();
        table.set("count", 1);
        *table.get_mut("count").unwrap() += 9;
        assert_eq!(table.get("count"), Ok(&10));
        assert_not_found(table.get_mut("other"), "other");
    }

    #[test]
    fn iterators_skip_tombstones() {
        let mut table: HashTable<i32> = (0..10).map(|i| (format!("k{i}"), i)).collect();
        table.remove("k3").unwrap();
        table.remove("k7").unwrap();

        let mut keys: Vec<&str> = table.keys().collect();
        keys.sort();
        assert_eq!(keys, vec!["k0", "k1", "k2", "k4", "k5", "k6", "k8", "k9"]);
        assert_eq!(table.iter().len(), 8);
        assert_eq!(table.values().sum::<i32>(), 45 - 3 - 7);

        for value in table.values_mut() {
            *value += 1;
        }
        assert_eq!(table.get("k0"), Ok(&1));

        let mut seen = 0;
        for (key, value) in &table {
            assert_eq!(key, format!("k{}", value - 1));
            seen += 1;
        }
        assert_eq!(seen, 8);
    }

    #[test]
    fn drain_keeps_capacity() {
        let mut table = HashTable::new();
        table.extend([("a", 1), ("b", 2), ("c", 3)]);
        table.remove("b").unwrap();
        let capacity = table.capacity();

        let mut drained: Vec<(String, i32)> = table.drain().collect();
        drained.sort();
        assert_eq!(drained, vec![("a".to_string(), 1), ("c".to_string(), 3)]);
        assert!(table.is_empty());
        assert_eq!(table.tombstones(), 0);
        assert_eq!(table.capacity(), capacity);

        table.set("a", 10);
        assert_eq!(table.get("a"), Ok(&10));
    }

    #[test]
    fn drain_after_growth_keeps_grown_capacity() {
        let mut table: HashTable<i32> = (0..30).map(|i| (format!("k{i}"), i)).collect();
        table.remove("k0").unwrap();
        assert_eq!(table.capacity(), 72);

        let drain = table.drain();
        assert_eq!(drain.len(), 29);
        assert_eq!(drain.count(), 29);
        assert_eq!(table.capacity(), 72);
        assert_eq!(table.tombstones(), 0);
    }

    #[test]
    fn wrapper_iterators_report_exact_len() {
        let mut table: HashTable<i32> = (0..10).map(|i| (format!("k{i}"), i)).collect();
        table.remove("k4").unwrap();

        assert_eq!(table.keys().len(), 9);
        assert_eq!(table.values().len(), 9);
        assert_eq!(table.values_mut().len(), 9);

        let mut keys = table.keys();
        for _ in 0..9 {
            assert!(keys.next().is_some());
        }
        assert_eq!(keys.len(), 0);
        assert!(keys.next().is_none());
        assert!(keys.next().is_none());

        let mut values = table.values_mut();
        values.by_ref().for_each(|v| *v += 1);
        assert!(values.next().is_none());
    }

    #[test]
    fn partially_consumed_drain_still_empties() {
        let mut table = HashTable::new();
        table.extend([("a", 1), ("b", 2), ("c", 3)]);
        let first = table.drain().next();
        assert!(first.is_some());
        assert!(table.is_empty());
        assert_not_found(table.get("a"), "a");
    }

    #[test]
    fn clear_resets_counts() {
        let mut table = HashTable::new();
        for i in 0..20 {
            table.set(format!("k{i}"), i);
        }
        table.remove("k0").unwrap();
        let capacity = table.capacity();

        table.clear();
        assert_eq!(table.len(), 0);
        assert_eq!(table.tombstones(), 0);
        assert_eq!(table.capacity(), capacity);
        assert_not_found(table.get("k1"), "k1");
    }

    #[test]
    fn clone_is_independent() {
        let mut table = HashTable::new();
        table.set("a", 1);
        table.set("b", 2);
        table.remove("b").unwrap();

        let mut copy = table.clone();
        copy.set("a", 100);
        assert_eq!(table.get("a"), Ok(&1));
        assert_eq!(copy.get("a"), Ok(&100));
        assert_eq!(copy.tombstones(), 1);
    }

    #[test]
    fn debug_shows_slots() {
        let mut table = HashTable::with_capacity(8);
        table.set("a", 1);
        table.set("i", 2);
        table.remove("i").unwrap();

        let out = format!("{:?}", table);
        assert!(out.contains("\"a\": 1"), "{out}");
        assert!(out.contains("<deleted \"i\">"), "{out}");
        assert!(out.contains("capacity: 8"), "{out}");
    }

    #[test]
    fn debug_stats_counts() {
        let mut table = HashTable::with_capacity(8);
        table.set("a", 1);
        table.set("i", 2);
        table.set("q", 3);
        table.set("b", 4);
        table.remove("a").unwrap();

        let stats = table.debug_stats();
        assert_eq!(stats.live, 3);
        assert_eq!(stats.tombstones, 1);
        assert_eq!(stats.empty, 4);
        assert_eq!(stats.capacity, 8);
        assert_eq!(stats.load_ratio, 0.5);
        assert_eq!(stats.max_displacement, 2);
    }

    #[test]
    #[cfg(feature = "std")]
    fn histogram_output() {
        let mut table = HashTable::with_hasher(SipKeys::random());
        for i in 0..1000 {
            table.set(format!("{i}"), i);
        }
        table.print_probe_histogram();
        table.debug_stats().print();

        let hist = table.probe_histogram();
        assert_eq!(hist.iter().sum::<usize>(), 1000);
    }
}
