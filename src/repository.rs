//! Typed existence checks, reads and writes of entity records
use super::codec::{self, Record};
use super::context::TxContext;
use super::error::{LedgerError, LedgerResult};
use super::keys::CompositeKey;
use super::store::LedgerStore;

pub trait Repository {
    /// True iff a non-empty value is stored at `key`.
    fn exists(&self, key: &CompositeKey) -> LedgerResult<bool>;

    /// Reads the record at `key`, failing with `NotFound` when absent.
    fn get<T: Record>(&self, key: &CompositeKey) -> LedgerResult<T>;

    /// Unconditionally overwrites the record under its own key.
    fn put<T: Record>(&mut self, record: &T) -> LedgerResult<CompositeKey>;

    /// Fails with `AlreadyExists` when a `T` is already stored at `key`.
    fn ensure_absent<T: Record>(&self, key: &CompositeKey) -> LedgerResult<()> {
        if self.exists(key)? {
            return Err(LedgerError::AlreadyExists {
                entity: T::ENTITY,
                key: key.to_string(),
            });
        }
        Ok(())
    }

    /// Fails with `NotFound` when no `T` is stored at `key`.
    fn ensure_present<T: Record>(&self, key: &CompositeKey) -> LedgerResult<()> {
        if !self.exists(key)? {
            return Err(LedgerError::NotFound {
                entity: T::ENTITY,
                key: key.to_string(),
            });
        }
        Ok(())
    }
}

impl<S: LedgerStore> Repository for TxContext<'_, S> {
    fn exists(&self, key: &CompositeKey) -> LedgerResult<bool> {
        Ok(self
            .get_state(key)?
            .is_some_and(|value| !value.is_empty()))
    }

    fn get<T: Record>(&self, key: &CompositeKey) -> LedgerResult<T> {
        match self.get_state(key)? {
            Some(value) if !value.is_empty() => codec::decode(&value),
            _ => Err(LedgerError::NotFound {
                entity: T::ENTITY,
                key: key.to_string(),
            }),
        }
    }

    fn put<T: Record>(&mut self, record: &T) -> LedgerResult<CompositeKey> {
        let key = record.key();
        let value = codec::encode(record)?;
        tracing::debug!(key = %key, bytes = value.len(), "staged {} write", T::ENTITY);
        self.put_state(&key, value);
        Ok(key)
    }
}
