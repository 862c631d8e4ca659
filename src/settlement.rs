//! Purchase settlement: converts a paid amount into a points award and splits
//! it between the customer's global balance and the per-shop balance.
//!
//! Tie-break rule: the free share is rounded half-up (`2.5 -> 3`, `2.4 -> 2`)
//! and then clamped to the whole part of the capped award, so it is always a
//! whole number. The shop-specific share is `capped - free >= 0` and keeps any
//! fractional remainder (a capped award of 12.6 at a full free share gives
//! 12 free points and 0.6 shop-specific points).
use super::context::TxContext;
use super::error::{LedgerError, LedgerResult};
use super::keys;
use super::repository::Repository;
use super::store::LedgerStore;
use super::types::{Customer, Shop, ShopSpecificToken};
use super::utils::{require_finite, require_id, require_non_negative};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Award {
    pub raw_points: f64,
    pub capped_points: f64,
    pub free_points: f64,
    pub shop_specific_points: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PurchaseOutcome {
    PointsGiven {
        award: Award,
        customer_points: f64,      // global balance after the award
        shop_specific_amount: f64, // per-shop balance after the award
    },
    /// The paid amount was below the shop's threshold. Nothing was written.
    NoPointsGiven,
}

impl PurchaseOutcome {
    pub fn award(&self) -> Option<&Award> {
        match self {
            PurchaseOutcome::PointsGiven { award, .. } => Some(award),
            PurchaseOutcome::NoPointsGiven => None,
        }
    }
}

/// Rounds non-negative values half-up.
pub fn round_half_up(value: f64) -> f64 {
    // f64::round goes away from zero on ties, which is half-up for values >= 0
    value.round()
}

/// Pure award arithmetic. `None` when `paid_amount` is under the threshold.
pub fn compute_award(shop: &Shop, paid_amount: f64) -> Option<Award> {
    let raw_points = paid_amount * shop.price_to_points_multiplier;
    if paid_amount < shop.min_price_to_get_points {
        return None;
    }

    let capped_points = raw_points.min(shop.max_given_points);
    let free_points = round_half_up(capped_points * shop.free_points_percentage)
        .min(capped_points.floor())
        .max(0.0);
    let shop_specific_points = capped_points - free_points;

    Some(Award {
        raw_points,
        capped_points,
        free_points,
        shop_specific_points,
    })
}

/// Creates the zero balance for a (shop, customer) pair.
pub fn create_shop_specific_token<S: LedgerStore>(
    ctx: &mut TxContext<'_, S>,
    shop_id: &str,
    customer_id: &str,
) -> LedgerResult<ShopSpecificToken> {
    ctx.ensure_present::<Shop>(&keys::shop_key(shop_id))?;
    ctx.ensure_present::<Customer>(&keys::customer_key(customer_id))?;
    ctx.ensure_absent::<ShopSpecificToken>(&keys::shop_specific_token_key(shop_id, customer_id))?;

    let token = ShopSpecificToken::new(shop_id, customer_id);
    ctx.put(&token)?;
    Ok(token)
}

pub fn increase_shop_specific_token<S: LedgerStore>(
    ctx: &mut TxContext<'_, S>,
    shop_id: &str,
    customer_id: &str,
    add_amount: f64,
) -> LedgerResult<ShopSpecificToken> {
    require_non_negative("add_amount", add_amount)?;

    let key = keys::shop_specific_token_key(shop_id, customer_id);
    ctx.ensure_present::<ShopSpecificToken>(&key)?;

    let mut token: ShopSpecificToken = ctx.get(&key)?;
    token.amount += add_amount;
    ctx.put(&token)?;
    Ok(token)
}

pub fn register_purchase<S: LedgerStore>(
    ctx: &mut TxContext<'_, S>,
    shop_id: &str,
    customer_id: &str,
    paid_amount: f64,
) -> LedgerResult<PurchaseOutcome> {
    require_id("shop id", shop_id)?;
    require_id("customer id", customer_id)?;
    require_finite("paid_amount", paid_amount)?;
    if paid_amount < 0.0 {
        return Err(LedgerError::InvalidArgument(format!(
            "paid_amount must not be negative, got {paid_amount}"
        )));
    }

    let customer_key = keys::customer_key(customer_id);
    let shop_key = keys::shop_key(shop_id);
    ctx.ensure_present::<Customer>(&customer_key)?;
    ctx.ensure_present::<Shop>(&shop_key)?;

    let shop: Shop = ctx.get(&shop_key)?;
    let mut customer: Customer = ctx.get(&customer_key)?;

    let Some(award) = compute_award(&shop, paid_amount) else {
        tracing::debug!(
            shop_id,
            customer_id,
            paid_amount,
            threshold = shop.min_price_to_get_points,
            "purchase below threshold, no points given"
        );
        return Ok(PurchaseOutcome::NoPointsGiven);
    };
    tracing::debug!(shop_id, customer_id, paid_amount, ?award, "computed award");

    customer.points += award.free_points;
    ctx.put(&customer)?;

    if !ctx.exists(&keys::shop_specific_token_key(shop_id, customer_id))? {
        create_shop_specific_token(ctx, shop_id, customer_id)?;
    }
    let token = increase_shop_specific_token(ctx, shop_id, customer_id, award.shop_specific_points)?;

    Ok(PurchaseOutcome::PointsGiven {
        award,
        customer_points: customer.points,
        shop_specific_amount: token.amount,
    })
}
