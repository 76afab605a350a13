//! Concurrency-safe tables.
//!
//! Each table sits behind its own `RwLock`. Reads copy what they need out
//! under a short read lock and release it before returning, so nothing a
//! caller does with the result (including running user callbacks that
//! mutate the same table) can deadlock against the table.

use std::borrow::Borrow;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

use crate::error::{BrokerError, BrokerResult, RegistryKind};

fn lock_err(kind: RegistryKind, context: &'static str) -> BrokerError {
    BrokerError::internal(format!("poisoned {kind} lock: {context}"))
}

/// A named map guarded by a reader/writer lock.
#[derive(Debug)]
pub(crate) struct Registry<K, V> {
    kind: RegistryKind,
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> Registry<K, V>
where
    K: Eq + Hash + ToString,
    V: Clone,
{
    pub(crate) fn new(kind: RegistryKind) -> Self {
        Self {
            kind,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts `value` unless `key` is already taken.
    pub(crate) fn insert_unique(&self, key: K, value: V) -> BrokerResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| lock_err(self.kind, "insert"))?;
        match entries.entry(key) {
            Entry::Occupied(e) => Err(BrokerError::duplicate(self.kind, e.key().to_string())),
            Entry::Vacant(e) => {
                e.insert(value);
                Ok(())
            }
        }
    }

    /// Inserts or overwrites; last writer wins.
    pub(crate) fn upsert(&self, key: K, value: V) -> BrokerResult<Option<V>> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| lock_err(self.kind, "upsert"))?;
        Ok(entries.insert(key, value))
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> BrokerResult<Option<V>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let entries = self
            .entries
            .read()
            .map_err(|_| lock_err(self.kind, "get"))?;
        Ok(entries.get(key).cloned())
    }

    /// Removes `key` if `pred` holds for its current value.
    ///
    /// Fails with `NotFound` if the key is absent or the predicate rejects it,
    /// which keeps stale handles from removing a newer entry under the same key.
    pub(crate) fn remove_if<Q>(&self, key: &Q, pred: impl FnOnce(&V) -> bool) -> BrokerResult<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized + ToString,
    {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| lock_err(self.kind, "remove"))?;
        if entries.get(key).map(pred) == Some(true) {
            if let Some(value) = entries.remove(key) {
                return Ok(value);
            }
        }
        Err(BrokerError::not_found(self.kind, key.to_string()))
    }

    pub(crate) fn remove<Q>(&self, key: &Q) -> BrokerResult<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized + ToString,
    {
        self.remove_if(key, |_| true)
    }

    /// Point-in-time copy of every value.
    pub(crate) fn snapshot(&self) -> BrokerResult<Vec<V>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| lock_err(self.kind, "snapshot"))?;
        Ok(entries.values().cloned().collect())
    }

    /// Point-in-time copy of the values `pred` selects.
    pub(crate) fn snapshot_where(&self, mut pred: impl FnMut(&K, &V) -> bool) -> BrokerResult<Vec<V>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| lock_err(self.kind, "snapshot"))?;
        Ok(entries
            .iter()
            .filter(|(k, v)| pred(k, v))
            .map(|(_, v)| v.clone())
            .collect())
    }

    /// Removes and returns every entry.
    pub(crate) fn drain(&self) -> BrokerResult<Vec<V>> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| lock_err(self.kind, "drain"))?;
        Ok(entries.drain().map(|(_, v)| v).collect())
    }

    pub(crate) fn len(&self) -> BrokerResult<usize> {
        let entries = self
            .entries
            .read()
            .map_err(|_| lock_err(self.kind, "len"))?;
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_unique_rejects_duplicates() {
        let reg: Registry<String, u32> = Registry::new(RegistryKind::Client);
        reg.insert_unique("a".to_string(), 1).unwrap();
        let err = reg.insert_unique("a".to_string(), 2).unwrap_err();
        assert_eq!(err, BrokerError::duplicate(RegistryKind::Client, "a"));
        assert_eq!(reg.get("a").unwrap(), Some(1));
    }

    #[test]
    fn test_upsert_overwrites() {
        let reg: Registry<String, u32> = Registry::new(RegistryKind::Attribute);
        assert_eq!(reg.upsert("a".to_string(), 1).unwrap(), None);
        assert_eq!(reg.upsert("a".to_string(), 2).unwrap(), Some(1));
        assert_eq!(reg.get("a").unwrap(), Some(2));
    }

    #[test]
    fn test_remove_twice_is_not_found() {
        let reg: Registry<String, u32> = Registry::new(RegistryKind::Subscription);
        reg.insert_unique("f".to_string(), 7).unwrap();
        assert_eq!(reg.remove("f").unwrap(), 7);
        assert!(reg.remove("f").unwrap_err().is_not_found());
    }

    #[test]
    fn test_remove_if_guards_stale_entries() {
        let reg: Registry<String, u32> = Registry::new(RegistryKind::Subscription);
        reg.insert_unique("f".to_string(), 2).unwrap();
        assert!(reg.remove_if("f", |v| *v == 1).unwrap_err().is_not_found());
        assert_eq!(reg.len().unwrap(), 1);
        assert_eq!(reg.remove_if("f", |v| *v == 2).unwrap(), 2);
    }

    #[test]
    fn test_snapshot_is_detached_from_table() {
        let reg: Registry<String, u32> = Registry::new(RegistryKind::Client);
        reg.insert_unique("a".to_string(), 1).unwrap();
        reg.insert_unique("b".to_string(), 2).unwrap();

        let snap = reg.snapshot().unwrap();
        // Mutating while holding a snapshot must not block.
        reg.insert_unique("c".to_string(), 3).unwrap();
        assert_eq!(snap.len(), 2);
        assert_eq!(reg.len().unwrap(), 3);

        let mut evens = reg.snapshot_where(|_, v| v % 2 == 0).unwrap();
        evens.sort_unstable();
        assert_eq!(evens, vec![2]);

        assert_eq!(reg.drain().unwrap().len(), 3);
        assert_eq!(reg.len().unwrap(), 0);
    }
}
