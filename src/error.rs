use super::keys::EntityType;
use std::fmt;

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    #[error("{entity} already exists at key {key}")]
    AlreadyExists { entity: EntityType, key: String },
    #[error("identity {0} is already registered")]
    AlreadyRegistered(String),
    #[error("{entity} not found at key {key}")]
    NotFound { entity: EntityType, key: String },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid role {0:?}, expected one of admin, shop, customer")]
    InvalidRole(String),
    #[error("coupon type {0} is not active")]
    InactiveType(String),
    #[error("failed to encode or decode record: {0}")]
    Codec(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("in-memory store lock was poisoned")]
    Poisoned,
    #[error("key {0} changed since the transaction read it")]
    Conflict(String),
}

/// Business actions exposed by [`crate::service::LoyaltyService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Register,
    CreateShop,
    CreateCustomer,
    UpdateCustomer,
    CreateCouponType,
    SetCouponTypeActive,
    CreateCoupon,
    RegisterPurchase,
    CreateShopSpecificToken,
    IncreaseShopSpecificToken,
    Query,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Register => "register",
            Operation::CreateShop => "create_shop",
            Operation::CreateCustomer => "create_customer",
            Operation::UpdateCustomer => "update_customer",
            Operation::CreateCouponType => "create_coupon_type",
            Operation::SetCouponTypeActive => "set_coupon_type_active",
            Operation::CreateCoupon => "create_coupon",
            Operation::RegisterPurchase => "register_purchase",
            Operation::CreateShopSpecificToken => "create_shop_specific_token",
            Operation::IncreaseShopSpecificToken => "increase_shop_specific_token",
            Operation::Query => "query",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed business action: the operation name plus the cause.
#[derive(thiserror::Error, Debug)]
#[error("{operation} failed: {source}")]
pub struct ContractError {
    pub operation: Operation,
    #[source]
    pub source: LedgerError,
}

impl ContractError {
    pub fn new(operation: Operation, source: LedgerError) -> Self {
        Self { operation, source }
    }
    pub fn cause(&self) -> &LedgerError {
        &self.source
    }
}
