//! Identifier helpers and argument checks shared by the operations

use super::error::{LedgerError, LedgerResult};
use bech32::Bech32m;
use uuid7::uuid7;

const SERIES_HRP: &str = "series";

/// Fresh coupon series identifier: a uuid7 encoded as bech32m under the
/// `series` prefix. Generated by clients when preparing a batch, never while a
/// transaction executes, since replicas must agree on every argument.
pub fn new_series_id() -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(SERIES_HRP)?;
    Ok(bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?)
}

/// Recovers the 16 uuid bytes of a series id made by [`new_series_id`].
pub fn series_id_bytes(series_id: &str) -> anyhow::Result<Vec<u8>> {
    let (hrp, bytes) = bech32::decode(series_id)?;
    anyhow::ensure!(hrp.as_str() == SERIES_HRP, "not a series id: {series_id}");
    anyhow::ensure!(bytes.len() == 16, "series id carries {} bytes, expected 16", bytes.len());
    Ok(bytes)
}

pub(crate) fn require_id(field: &str, value: &str) -> LedgerResult<()> {
    if value.is_empty() {
        return Err(LedgerError::InvalidArgument(format!("{field} must not be empty")));
    }
    Ok(())
}

pub(crate) fn require_finite(field: &str, value: f64) -> LedgerResult<()> {
    if !value.is_finite() {
        return Err(LedgerError::InvalidArgument(format!("{field} must be finite, got {value}")));
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &str, value: f64) -> LedgerResult<()> {
    require_finite(field, value)?;
    if value < 0.0 {
        return Err(LedgerError::InvalidArgument(format!("{field} must not be negative, got {value}")));
    }
    Ok(())
}
