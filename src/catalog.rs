//! Shop, customer and coupon type lifecycle
use super::codec::Record;
use super::context::TxContext;
use super::error::{LedgerError, LedgerResult};
use super::keys::{self, CompositeKey, EntityType};
use super::repository::Repository;
use super::store::LedgerStore;
use super::types::{CouponType, Customer, Shop};
use super::utils::{require_finite, require_id, require_non_negative};

/// Creates a shop whose awards go entirely to the global customer balance.
pub fn create_shop<S: LedgerStore>(
    ctx: &mut TxContext<'_, S>,
    id: &str,
    price_to_points_multiplier: f64,
    min_price_to_get_points: f64,
    max_given_points: f64,
) -> LedgerResult<Shop> {
    require_id("shop id", id)?;
    require_non_negative("price_to_points_multiplier", price_to_points_multiplier)?;
    require_finite("min_price_to_get_points", min_price_to_get_points)?;
    require_non_negative("max_given_points", max_given_points)?;

    ctx.ensure_absent::<Shop>(&keys::shop_key(id))?;

    let shop = Shop::new(
        id,
        price_to_points_multiplier,
        min_price_to_get_points,
        max_given_points,
    );
    ctx.put(&shop)?;
    Ok(shop)
}

pub fn create_customer<S: LedgerStore>(ctx: &mut TxContext<'_, S>, id: &str) -> LedgerResult<Customer> {
    require_id("customer id", id)?;
    ctx.ensure_absent::<Customer>(&keys::customer_key(id))?;

    let customer = Customer::new(id);
    ctx.put(&customer)?;
    Ok(customer)
}

/// Replaces a customer's point balance. Balances never go down.
pub fn update_customer<S: LedgerStore>(
    ctx: &mut TxContext<'_, S>,
    id: &str,
    points: f64,
) -> LedgerResult<Customer> {
    require_id("customer id", id)?;
    require_non_negative("points", points)?;

    let key = keys::customer_key(id);
    ctx.ensure_present::<Customer>(&key)?;
    let mut customer: Customer = ctx.get(&key)?;

    if points < customer.points {
        return Err(LedgerError::InvalidArgument(format!(
            "customer {id} balance cannot decrease from {} to {points}",
            customer.points
        )));
    }
    customer.points = points;
    ctx.put(&customer)?;
    Ok(customer)
}

/// Creates an active coupon type and returns the key coupons refer to it by.
pub fn create_coupon_type<S: LedgerStore>(
    ctx: &mut TxContext<'_, S>,
    shop_id: &str,
    kind: &str,
    val: &str,
) -> LedgerResult<CompositeKey> {
    require_id("shop id", shop_id)?;
    require_id("coupon kind", kind)?;

    let coupon_type = CouponType::new(shop_id, kind, val);
    ctx.ensure_absent::<CouponType>(&coupon_type.key())?;
    ctx.put(&coupon_type)
}

pub fn set_coupon_type_active<S: LedgerStore>(
    ctx: &mut TxContext<'_, S>,
    type_id: &str,
    active: bool,
) -> LedgerResult<CouponType> {
    let key = CompositeKey::from(type_id);
    key.expect_entity(EntityType::CouponType)?;
    ctx.ensure_present::<CouponType>(&key)?;

    let mut coupon_type: CouponType = ctx.get(&key)?;
    if coupon_type.active != active {
        coupon_type.active = active;
        ctx.put(&coupon_type)?;
    }
    Ok(coupon_type)
}
