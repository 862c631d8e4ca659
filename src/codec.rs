//! Canonical CBOR encoding of entity records.
//!
//! Records derive `minicbor` with explicit field indices, so fields are always
//! written in index order as a fixed-length array.
use super::error::{LedgerError, LedgerResult};
use super::keys::{CompositeKey, EntityType};

/// An entity that lives under a composite key in the ledger.
pub trait Record: minicbor::Encode<()> + for<'b> minicbor::Decode<'b, ()> + Sized {
    const ENTITY: EntityType;

    fn key(&self) -> CompositeKey;
}

pub fn encode<T: Record>(record: &T) -> LedgerResult<Vec<u8>> {
    minicbor::to_vec(record).map_err(|e| LedgerError::Codec(format!("{}: {e}", T::ENTITY)))
}

pub fn decode<T: Record>(bytes: &[u8]) -> LedgerResult<T> {
    minicbor::decode(bytes).map_err(|e| LedgerError::Codec(format!("{}: {e}", T::ENTITY)))
}
