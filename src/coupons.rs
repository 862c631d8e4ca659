//! Batch issuance of coupons against an active coupon type
use super::context::TxContext;
use super::error::{LedgerError, LedgerResult};
use super::keys::{self, CompositeKey, EntityType};
use super::repository::Repository;
use super::store::LedgerStore;
use super::types::{Coupon, CouponType, TimeStamp};
use super::utils::{new_series_id, require_id};
use chrono::Utc;

/// Arguments for one issuance. Coupon ids are `{id_base}_{i}` for `i` in `0..count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponBatch {
    id_base: String,
    type_id: String,
    owner: String,
    valid_until: TimeStamp<Utc>,
    series_id: String,
    count: usize,
}

impl CouponBatch {
    pub fn new(
        id_base: impl Into<String>,
        type_id: impl Into<String>,
        owner: impl Into<String>,
        valid_until: TimeStamp<Utc>,
        series_id: impl Into<String>,
    ) -> Self {
        Self {
            id_base: id_base.into(),
            type_id: type_id.into(),
            owner: owner.into(),
            valid_until,
            series_id: series_id.into(),
            count: 1,
        }
    }
    /// Same as [`CouponBatch::new`] with a freshly generated series id.
    pub fn with_new_series(
        id_base: impl Into<String>,
        type_id: impl Into<String>,
        owner: impl Into<String>,
        valid_until: TimeStamp<Utc>,
    ) -> anyhow::Result<Self> {
        Ok(Self::new(id_base, type_id, owner, valid_until, new_series_id()?))
    }
    pub fn series_id(&self) -> &str {
        &self.series_id
    }
    pub fn set_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }
    pub fn coupon_ids(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.count).map(move |i| format!("{}_{i}", self.id_base))
    }
}

/// Creates every coupon of the batch, or none of them.
///
/// The coupon type must exist and be active. Coupon ids already present under
/// the same type are rejected before anything is written.
pub fn create_coupon<S: LedgerStore>(
    ctx: &mut TxContext<'_, S>,
    batch: &CouponBatch,
) -> LedgerResult<Vec<Coupon>> {
    if batch.count < 1 {
        return Err(LedgerError::InvalidArgument(format!(
            "coupon count must be at least 1, got {}",
            batch.count
        )));
    }
    require_id("coupon id base", &batch.id_base)?;

    let type_key = CompositeKey::from(batch.type_id.as_str());
    type_key.expect_entity(EntityType::CouponType)?;
    ctx.ensure_present::<CouponType>(&type_key)?;

    let coupon_type: CouponType = ctx.get(&type_key)?;
    if !coupon_type.active {
        return Err(LedgerError::InactiveType(batch.type_id.clone()));
    }

    for id in batch.coupon_ids() {
        ctx.ensure_absent::<Coupon>(&keys::coupon_key(&id, &batch.type_id))?;
    }

    let mut issued = Vec::with_capacity(batch.count);
    for id in batch.coupon_ids() {
        let coupon = Coupon {
            id,
            type_id: batch.type_id.clone(),
            owner: batch.owner.clone(),
            valid_until: batch.valid_until.clone(),
            series_id: batch.series_id.clone(),
        };
        ctx.put(&coupon)?;
        issued.push(coupon);
    }
    Ok(issued)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{create_coupon_type, set_coupon_type_active};
    use crate::store::MemoryStore;

    fn valid_until() -> TimeStamp<Utc> {
        TimeStamp::from_unix_seconds(1_900_000_000).unwrap()
    }

    #[test]
    fn issues_numbered_coupons() {
        let store = MemoryStore::new();
        let mut ctx = TxContext::new(&store, "shop");
        let type_id = create_coupon_type(&mut ctx, "S1", "discount", "10").unwrap();

        let batch = CouponBatch::new("C", type_id.as_str(), "owner1", valid_until(), "series1").set_count(3);
        let coupons = create_coupon(&mut ctx, &batch).unwrap();

        let ids: Vec<_> = coupons.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["C_0", "C_1", "C_2"]);
        for id in ["C_0", "C_1", "C_2"] {
            assert!(ctx.exists(&keys::coupon_key(id, type_id.as_str())).unwrap());
        }
        assert!(!ctx.exists(&keys::coupon_key("C_3", type_id.as_str())).unwrap());
    }

    #[test]
    fn generated_series_is_shared_by_the_batch() {
        let store = MemoryStore::new();
        let mut ctx = TxContext::new(&store, "shop");
        let type_id = create_coupon_type(&mut ctx, "S1", "discount", "10").unwrap();

        let batch = CouponBatch::with_new_series("G", type_id.as_str(), "owner1", valid_until())
            .unwrap()
            .set_count(2);
        assert!(batch.series_id().starts_with("series1"));

        let coupons = create_coupon(&mut ctx, &batch).unwrap();
        assert!(coupons.iter().all(|c| c.series_id == batch.series_id()));
    }

    #[test]
    fn zero_count_is_rejected() {
        let store = MemoryStore::new();
        let mut ctx = TxContext::new(&store, "shop");
        let type_id = create_coupon_type(&mut ctx, "S1", "discount", "10").unwrap();

        let batch = CouponBatch::new("C", type_id.as_str(), "owner1", valid_until(), "s").set_count(0);
        assert!(matches!(create_coupon(&mut ctx, &batch), Err(LedgerError::InvalidArgument(_))));
    }

    #[test]
    fn inactive_type_issues_nothing() {
        let store = MemoryStore::new();
        let mut ctx = TxContext::new(&store, "shop");
        let type_id = create_coupon_type(&mut ctx, "S1", "discount", "10").unwrap();
        set_coupon_type_active(&mut ctx, type_id.as_str(), false).unwrap();
        let writes_before = ctx.write_set().len();

        let batch = CouponBatch::new("C", type_id.as_str(), "owner1", valid_until(), "s").set_count(2);
        assert!(matches!(create_coupon(&mut ctx, &batch), Err(LedgerError::InactiveType(_))));
        assert_eq!(ctx.write_set().len(), writes_before);
    }

    #[test]
    fn missing_type_is_not_found() {
        let store = MemoryStore::new();
        let mut ctx = TxContext::new(&store, "shop");
        let type_id = keys::coupon_type_key("S1", "discount", "10");

        let batch = CouponBatch::new("C", type_id.as_str(), "owner1", valid_until(), "s");
        assert!(matches!(
            create_coupon(&mut ctx, &batch),
            Err(LedgerError::NotFound { entity: EntityType::CouponType, .. })
        ));
    }

    #[test]
    fn overlapping_batch_writes_nothing() {
        let store = MemoryStore::new();
        let mut ctx = TxContext::new(&store, "shop");
        let type_id = create_coupon_type(&mut ctx, "S1", "discount", "10").unwrap();

        let first = CouponBatch::new("C", type_id.as_str(), "owner1", valid_until(), "s").set_count(2);
        create_coupon(&mut ctx, &first).unwrap();
        let writes_before = ctx.write_set().len();

        let second = CouponBatch::new("C", type_id.as_str(), "owner2", valid_until(), "s").set_count(4);
        assert!(matches!(
            create_coupon(&mut ctx, &second),
            Err(LedgerError::AlreadyExists { entity: EntityType::Coupon, .. })
        ));
        assert_eq!(ctx.write_set().len(), writes_before);

        let kept: Coupon = ctx.get(&keys::coupon_key("C_1", type_id.as_str())).unwrap();
        assert_eq!(kept.owner, "owner1");
    }
}
