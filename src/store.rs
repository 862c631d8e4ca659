//! Ledger substrate boundary and the two stores shipped with the crate
use super::config::StoreConfig;
use super::error::StoreError;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Pending writes of one transaction, ordered by key.
pub type WriteSet = BTreeMap<String, Vec<u8>>;

/// Values a transaction observed in the store, `None` for keys that were absent.
pub type ReadSet = BTreeMap<String, Option<Vec<u8>>>;

/// Durable key-value state the ledger core reads from and commits to.
pub trait LedgerStore {
    /// Current value at `key`, `None` when absent.
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Apply every write in the set or none of them.
    ///
    /// Fails with [`StoreError::Conflict`] when any key in `reads` no longer
    /// holds the value the transaction observed. The check and the writes
    /// happen atomically.
    fn apply(&self, reads: &ReadSet, writes: &WriteSet) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.state.read().map_err(|_| StoreError::Poisoned)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Keys currently stored that start with `prefix`.
    pub fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }
}

impl LedgerStore for MemoryStore {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.get(key).cloned())
    }

    fn apply(&self, reads: &ReadSet, writes: &WriteSet) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        for (key, observed) in reads {
            if state.get(key) != observed.as_ref() {
                return Err(StoreError::Conflict(key.clone()));
            }
        }
        for (key, value) in writes {
            state.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}

/// Persistent store backed by a single sled tree.
#[derive(Debug, Clone)]
pub struct SledStore {
    tree: sled::Tree,
    flush_on_commit: bool,
}

impl SledStore {
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let db = sled::open(&config.path)?;
        let tree = db.open_tree(&config.tree)?;
        tracing::info!(path = ?config.path, tree = %config.tree, "opened sled ledger store");

        Ok(Self {
            tree,
            flush_on_commit: config.flush_on_commit,
        })
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

impl LedgerStore for SledStore {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.tree.get(key.as_bytes())?.map(|value| value.to_vec()))
    }

    fn apply(&self, reads: &ReadSet, writes: &WriteSet) -> Result<(), StoreError> {
        // sled retries the closure on internal conflicts, so it only borrows
        let outcome = self.tree.transaction(|tx| {
            for (key, observed) in reads {
                let current = tx.get(key.as_bytes())?;
                if current.as_deref() != observed.as_deref() {
                    return Err(ConflictableTransactionError::Abort(key.clone()));
                }
            }
            for (key, value) in writes {
                tx.insert(key.as_bytes(), value.as_slice())?;
            }
            Ok(())
        });

        match outcome {
            Ok(()) => {}
            Err(TransactionError::Abort(key)) => return Err(StoreError::Conflict(key)),
            Err(TransactionError::Storage(e)) => return Err(StoreError::Sled(e)),
        }

        if self.flush_on_commit {
            self.tree.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_store_applies_writes() {
        let store = MemoryStore::new();
        let mut writes = WriteSet::new();
        writes.insert("SHOP/1:a".into(), vec![1]);
        writes.insert("SHOP/1:b".into(), vec![2]);
        writes.insert("USER/1:a".into(), vec![3]);

        store.apply(&ReadSet::new(), &writes).unwrap();

        assert_eq!(store.get_state("SHOP/1:b").unwrap(), Some(vec![2]));
        assert_eq!(store.get_state("SHOP/1:c").unwrap(), None);
        assert_eq!(store.keys_with_prefix("SHOP/").unwrap().len(), 2);
    }

    fn stale_reads_are_rejected<S: LedgerStore>(store: &S) {
        let mut first = WriteSet::new();
        first.insert("CUSTOMER/2:C1".into(), vec![1]);
        store.apply(&ReadSet::new(), &first).unwrap();

        // both writers saw [1], only the first may commit
        let mut seen = ReadSet::new();
        seen.insert("CUSTOMER/2:C1".into(), Some(vec![1]));
        let mut bump = WriteSet::new();
        bump.insert("CUSTOMER/2:C1".into(), vec![2]);
        store.apply(&seen, &bump).unwrap();

        let mut other = WriteSet::new();
        other.insert("CUSTOMER/2:C1".into(), vec![3]);
        other.insert("SHOP/2:S1".into(), vec![9]);
        assert!(matches!(
            store.apply(&seen, &other),
            Err(StoreError::Conflict(key)) if key == "CUSTOMER/2:C1"
        ));
        assert_eq!(store.get_state("CUSTOMER/2:C1").unwrap(), Some(vec![2]));
        assert_eq!(store.get_state("SHOP/2:S1").unwrap(), None);

        // a key read as absent conflicts once someone creates it
        let mut absent = ReadSet::new();
        absent.insert("CUSTOMER/2:C1".into(), None);
        assert!(matches!(store.apply(&absent, &other), Err(StoreError::Conflict(_))));
    }

    #[test]
    fn memory_store_rejects_stale_reads() {
        stale_reads_are_rejected(&MemoryStore::new());
    }

    #[test]
    fn sled_store_rejects_stale_reads() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let config = StoreConfig {
            path: temp_dir.path().join("conflict.db"),
            tree: "ledger".into(),
            flush_on_commit: false,
        };
        stale_reads_are_rejected(&SledStore::open(&config)?);
        Ok(())
    }

    #[test]
    fn sled_store_applies_writes() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let config = StoreConfig {
            path: temp_dir.path().join("store.db"),
            tree: "ledger".into(),
            flush_on_commit: true,
        };
        let store = SledStore::open(&config)?;

        let mut writes = WriteSet::new();
        writes.insert("CUSTOMER/2:C1".into(), vec![7, 7]);
        store.apply(&ReadSet::new(), &writes)?;

        assert_eq!(store.get_state("CUSTOMER/2:C1")?, Some(vec![7, 7]));
        assert_eq!(store.len(), 1);
        Ok(())
    }
}
