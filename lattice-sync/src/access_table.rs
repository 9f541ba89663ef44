//! A look-up table where each entry carries its own lock.
//!
//! Look-ups across disjoint keys never block each other; they contend only
//! on the table's reader/writer lock (held for the duration of the scan).
//! Readers of the *same* key serialize through that entry's mutex, which a
//! returned guard holds until dropped.

use core::fmt;
use core::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex, RwLock};

struct Row<K, V> {
    key: K,
    value: Arc<Mutex<V>>,
}

/// A keyed table synchronizing access per value.
///
/// Entries are reference-counted: [`erase`](AccessTable::erase) removes an
/// entry from the table immediately, but its storage lives on until the
/// last [`ValueGuard`] over it drops.
///
/// # Example
///
/// ```
/// use lattice_sync::AccessTable;
///
/// let table: AccessTable<&str, u32> = AccessTable::new();
/// table.insert("hits", 0);
///
/// if let Some(mut hits) = table.find(&"hits") {
///     *hits += 1;
/// }
/// assert_eq!(*table.find(&"hits").unwrap(), 1);
/// ```
pub struct AccessTable<K, V> {
    rows: RwLock<Vec<Row<K, V>>>,
}

impl<K, V> AccessTable<K, V> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }

    /// Appends an entry. Does not deduplicate: a key inserted twice is
    /// present twice, and [`find`](AccessTable::find) returns the first.
    pub fn insert(&self, key: K, value: V) {
        self.rows.write().push(Row {
            key,
            value: Arc::new(Mutex::new(value)),
        });
    }

    /// Replaces the value of an existing key, or appends a new entry.
    pub fn try_insert(&self, key: K, value: V)
    where
        K: PartialEq,
    {
        let mut rows = self.rows.write();
        for row in rows.iter() {
            if row.key == key {
                *row.value.lock() = value;
                return;
            }
        }
        rows.push(Row {
            key,
            value: Arc::new(Mutex::new(value)),
        });
    }

    /// Looks up `key` and locks its entry.
    ///
    /// The table's reader lock is released when this returns; only the
    /// entry's own mutex stays held, by the guard.
    pub fn find(&self, key: &K) -> Option<ValueGuard<V>>
    where
        K: PartialEq,
    {
        let rows = self.rows.read();
        rows.iter().find(|row| row.key == *key).map(|row| ValueGuard {
            guard: Mutex::lock_arc(&row.value),
        })
    }

    /// Removes the first entry matching `key`, if any.
    ///
    /// A guard already held over the entry stays valid; the entry's
    /// storage is released when the last guard drops.
    pub fn erase(&self, key: &K)
    where
        K: PartialEq,
    {
        let mut rows = self.rows.write();
        if let Some(at) = rows.iter().position(|row| row.key == *key) {
            rows.remove(at);
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// True when the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for AccessTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for AccessTable<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTable")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

/// Exclusive access to one entry's value; unlocks on drop.
pub struct ValueGuard<V> {
    guard: ArcMutexGuard<RawMutex, V>,
}

impl<V> Deref for ValueGuard<V> {
    type Target = V;

    #[inline]
    fn deref(&self) -> &V {
        &self.guard
    }
}

impl<V> DerefMut for ValueGuard<V> {
    #[inline]
    fn deref_mut(&mut self) -> &mut V {
        &mut self.guard
    }
}

impl<V: fmt::Debug> fmt::Debug for ValueGuard<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueGuard").field(&**self).finish()
    }
}
