use super::error::{LedgerError, LedgerResult};
use super::keys::CompositeKey;
use super::store::{LedgerStore, ReadSet, WriteSet};
use std::cell::RefCell;

/// One transaction against the ledger.
///
/// Writes are buffered in key order and only reach the store on [`TxContext::commit`].
/// Reads see the transaction's own pending writes first, and every value first
/// read from the store is remembered so the commit can be refused if another
/// transaction changed it in the meantime. Dropping the context without
/// committing discards everything it wrote.
pub struct TxContext<'s, S: LedgerStore> {
    store: &'s S,
    caller: String, // authenticated identity of the invoking party
    reads: RefCell<ReadSet>,
    writes: WriteSet,
}

impl<'s, S: LedgerStore> TxContext<'s, S> {
    pub fn new(store: &'s S, caller: impl Into<String>) -> Self {
        Self {
            store,
            caller: caller.into(),
            reads: RefCell::new(ReadSet::new()),
            writes: WriteSet::new(),
        }
    }

    pub fn caller_identity(&self) -> &str {
        &self.caller
    }

    pub fn get_state(&self, key: &CompositeKey) -> LedgerResult<Option<Vec<u8>>> {
        if let Some(pending) = self.writes.get(key.as_str()) {
            return Ok(Some(pending.clone()));
        }
        // repeated reads return the first observed value
        if let Some(observed) = self.reads.borrow().get(key.as_str()) {
            return Ok(observed.clone());
        }

        let value = self.store.get_state(key.as_str())?;
        self.reads
            .borrow_mut()
            .insert(key.to_string(), value.clone());
        Ok(value)
    }

    pub fn put_state(&mut self, key: &CompositeKey, value: Vec<u8>) {
        self.writes.insert(key.to_string(), value);
    }

    /// Store values this transaction depends on, keyed as read.
    pub fn read_set(&self) -> ReadSet {
        self.reads.borrow().clone()
    }

    pub fn write_set(&self) -> &WriteSet {
        &self.writes
    }

    /// SHA-256 over the canonical encoding of the pending writes.
    pub fn write_set_digest(&self) -> LedgerResult<String> {
        let cbor = minicbor::to_vec(&self.writes)
            .map_err(|e| LedgerError::Codec(format!("write set: {e}")))?;
        Ok(sha256::digest(&cbor))
    }

    /// Applies every pending write atomically and returns the write-set digest.
    ///
    /// Fails with [`StoreError::Conflict`](super::error::StoreError::Conflict)
    /// when a value this transaction read was changed by a commit in between.
    pub fn commit(self) -> LedgerResult<String> {
        let digest = self.write_set_digest()?;
        if !self.writes.is_empty() {
            self.store.apply(&self.reads.into_inner(), &self.writes)?;
        }
        Ok(digest)
    }
}
