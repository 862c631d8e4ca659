//! Service layer API for loyalty program operations
//!
//! Every business action runs as one transaction: preconditions are read,
//! writes are staged, and the whole write set is committed in a single batch.
//! A failed action commits nothing. Actions racing on the same keys are
//! serialized by the store: the loser fails with a conflict and may be retried.
use super::catalog;
use super::config::LedgerConfig;
use super::context::TxContext;
use super::coupons::{self, CouponBatch};
use super::error::{ContractError, LedgerResult, Operation};
use super::keys::{self, CompositeKey, EntityType};
use super::registration;
use super::repository::Repository;
use super::settlement::{self, PurchaseOutcome};
use super::store::{LedgerStore, SledStore};
use super::types::{Coupon, CouponType, Customer, Shop, ShopSpecificToken, User};
use anyhow::Context;
use std::sync::Arc;

// coupon types are addressed by the key returned from create_coupon_type
fn coupon_type_key(type_id: &str) -> LedgerResult<CompositeKey> {
    let key = CompositeKey::from(type_id);
    key.expect_entity(EntityType::CouponType)?;
    Ok(key)
}

pub struct LoyaltyService<S: LedgerStore> {
    store: Arc<S>,
}

impl LoyaltyService<SledStore> {
    /// Opens the sled store described by `config`.
    pub fn open(config: &LedgerConfig) -> anyhow::Result<Self> {
        let store = SledStore::open(&config.store).context("failed to open ledger store")?;
        Ok(Self::new(Arc::new(store)))
    }
}

impl<S: LedgerStore> LoyaltyService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn transact<T, F>(&self, operation: Operation, caller: &str, action: F) -> Result<T, ContractError>
    where
        F: FnOnce(&mut TxContext<'_, S>) -> LedgerResult<T>,
    {
        let mut ctx = TxContext::new(self.store.as_ref(), caller);

        let value = match action(&mut ctx) {
            Ok(value) => value,
            Err(source) => {
                tracing::warn!(%operation, caller, error = %source, "rejected");
                return Err(ContractError::new(operation, source));
            }
        };

        let written: Vec<String> = ctx.write_set().keys().cloned().collect();
        let digest = ctx.commit().map_err(|source| {
            tracing::warn!(%operation, caller, error = %source, "commit refused");
            ContractError::new(operation, source)
        })?;
        tracing::info!(%operation, caller, ?written, %digest, "committed");

        Ok(value)
    }

    fn query<T, F>(&self, action: F) -> Result<T, ContractError>
    where
        F: FnOnce(&TxContext<'_, S>) -> LedgerResult<T>,
    {
        let ctx = TxContext::new(self.store.as_ref(), "");
        action(&ctx).map_err(|source| ContractError::new(Operation::Query, source))
    }

    /// Register the caller as a user with the given role
    pub fn register(&self, caller: &str, role: &str) -> Result<User, ContractError> {
        self.transact(Operation::Register, caller, |ctx| registration::register(ctx, role))
    }

    pub fn create_shop(
        &self,
        caller: &str,
        id: &str,
        price_to_points_multiplier: f64,
        min_price_to_get_points: f64,
        max_given_points: f64,
    ) -> Result<Shop, ContractError> {
        self.transact(Operation::CreateShop, caller, |ctx| {
            catalog::create_shop(
                ctx,
                id,
                price_to_points_multiplier,
                min_price_to_get_points,
                max_given_points,
            )
        })
    }

    pub fn create_customer(&self, caller: &str, id: &str) -> Result<Customer, ContractError> {
        self.transact(Operation::CreateCustomer, caller, |ctx| catalog::create_customer(ctx, id))
    }

    pub fn update_customer(&self, caller: &str, id: &str, points: f64) -> Result<Customer, ContractError> {
        self.transact(Operation::UpdateCustomer, caller, |ctx| {
            catalog::update_customer(ctx, id, points)
        })
    }

    /// Create an active coupon type, returning the key coupons are issued against
    pub fn create_coupon_type(
        &self,
        caller: &str,
        shop_id: &str,
        kind: &str,
        val: &str,
    ) -> Result<CompositeKey, ContractError> {
        self.transact(Operation::CreateCouponType, caller, |ctx| {
            catalog::create_coupon_type(ctx, shop_id, kind, val)
        })
    }

    pub fn set_coupon_type_active(
        &self,
        caller: &str,
        type_id: &str,
        active: bool,
    ) -> Result<CouponType, ContractError> {
        self.transact(Operation::SetCouponTypeActive, caller, |ctx| {
            catalog::set_coupon_type_active(ctx, type_id, active)
        })
    }

    /// Issue a batch of coupons against an active coupon type
    pub fn create_coupon(&self, caller: &str, batch: &CouponBatch) -> Result<Vec<Coupon>, ContractError> {
        self.transact(Operation::CreateCoupon, caller, |ctx| coupons::create_coupon(ctx, batch))
    }

    /// Settle a purchase into points for the customer
    pub fn register_purchase(
        &self,
        caller: &str,
        shop_id: &str,
        customer_id: &str,
        paid_amount: f64,
    ) -> Result<PurchaseOutcome, ContractError> {
        self.transact(Operation::RegisterPurchase, caller, |ctx| {
            settlement::register_purchase(ctx, shop_id, customer_id, paid_amount)
        })
    }

    pub fn create_shop_specific_token(
        &self,
        caller: &str,
        shop_id: &str,
        customer_id: &str,
    ) -> Result<ShopSpecificToken, ContractError> {
        self.transact(Operation::CreateShopSpecificToken, caller, |ctx| {
            settlement::create_shop_specific_token(ctx, shop_id, customer_id)
        })
    }

    pub fn increase_shop_specific_token(
        &self,
        caller: &str,
        shop_id: &str,
        customer_id: &str,
        add_amount: f64,
    ) -> Result<ShopSpecificToken, ContractError> {
        self.transact(Operation::IncreaseShopSpecificToken, caller, |ctx| {
            settlement::increase_shop_specific_token(ctx, shop_id, customer_id, add_amount)
        })
    }

    pub fn user_exists(&self, identity: &str) -> Result<bool, ContractError> {
        self.query(|ctx| ctx.exists(&keys::user_key(identity)))
    }

    pub fn shop_exists(&self, id: &str) -> Result<bool, ContractError> {
        self.query(|ctx| ctx.exists(&keys::shop_key(id)))
    }

    pub fn customer_exists(&self, id: &str) -> Result<bool, ContractError> {
        self.query(|ctx| ctx.exists(&keys::customer_key(id)))
    }

    pub fn coupon_type_exists(&self, type_id: &str) -> Result<bool, ContractError> {
        self.query(|ctx| ctx.exists(&coupon_type_key(type_id)?))
    }

    pub fn coupon_exists(&self, id: &str, type_id: &str) -> Result<bool, ContractError> {
        self.query(|ctx| ctx.exists(&keys::coupon_key(id, type_id)))
    }

    pub fn shop_specific_token_exists(&self, shop_id: &str, customer_id: &str) -> Result<bool, ContractError> {
        self.query(|ctx| ctx.exists(&keys::shop_specific_token_key(shop_id, customer_id)))
    }

    pub fn get_user(&self, identity: &str) -> Result<User, ContractError> {
        self.query(|ctx| ctx.get(&keys::user_key(identity)))
    }

    pub fn get_shop(&self, id: &str) -> Result<Shop, ContractError> {
        self.query(|ctx| ctx.get(&keys::shop_key(id)))
    }

    pub fn get_customer(&self, id: &str) -> Result<Customer, ContractError> {
        self.query(|ctx| ctx.get(&keys::customer_key(id)))
    }

    pub fn get_coupon_type(&self, type_id: &str) -> Result<CouponType, ContractError> {
        self.query(|ctx| ctx.get(&coupon_type_key(type_id)?))
    }

    pub fn get_coupon(&self, id: &str, type_id: &str) -> Result<Coupon, ContractError> {
        self.query(|ctx| ctx.get(&keys::coupon_key(id, type_id)))
    }

    pub fn get_shop_specific_token(
        &self,
        shop_id: &str,
        customer_id: &str,
    ) -> Result<ShopSpecificToken, ContractError> {
        self.query(|ctx| ctx.get(&keys::shop_specific_token_key(shop_id, customer_id)))
    }
}
