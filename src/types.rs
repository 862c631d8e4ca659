//! Ledger-resident entity records
use super::codec::Record;
use super::error::LedgerError;
use super::keys::{self, CompositeKey, EntityType};
use chrono::{DateTime, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    #[n(0)]
    Admin,
    #[n(1)]
    Shop,
    #[n(2)]
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Shop => "shop",
            Role::Customer => "customer",
        }
    }
}

impl FromStr for Role {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "shop" => Ok(Role::Shop),
            "customer" => Ok(Role::Customer),
            other => Err(LedgerError::InvalidRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct User {
    #[n(0)]
    pub id: String, // authenticated caller identity
    #[n(1)]
    pub role: Role,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct Shop {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub price_to_points_multiplier: f64,
    #[n(2)]
    pub min_price_to_get_points: f64,
    #[n(3)]
    pub max_given_points: f64,
    #[n(4)]
    pub free_points_percentage: f64, // share of an award credited to the global balance
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct Customer {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub points: f64,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct CouponType {
    #[n(0)]
    pub shop_id: String,
    #[n(1)]
    pub kind: String,
    #[n(2)]
    pub val: String,
    #[n(3)]
    pub active: bool,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Coupon {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub type_id: String, // composite key of the CouponType
    #[n(2)]
    pub owner: String,
    #[n(3)]
    pub valid_until: TimeStamp<Utc>,
    #[n(4)]
    pub series_id: String,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct ShopSpecificToken {
    #[n(0)]
    pub shop_id: String,
    #[n(1)]
    pub customer_id: String,
    #[n(2)]
    pub amount: f64,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn from_unix_seconds(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(TimeStamp)
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

// encoded as [seconds, subsecond nanoseconds] so any chrono date fits
impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.array(2)?
            .i64(self.0.timestamp())?
            .u32(self.0.timestamp_subsec_nanos())?
            .ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        if d.array()? != Some(2) {
            return Err(minicbor::decode::Error::message(
                "expected timestamp as [seconds, nanoseconds]",
            ));
        }
        let secs = d.i64()?;
        let nsecs = d.u32()?;

        DateTime::from_timestamp(secs, nsecs)
            .map(TimeStamp)
            .ok_or_else(|| minicbor::decode::Error::message("timestamp out of range"))
    }
}

impl User {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self { id: id.into(), role }
    }
}

impl Shop {
    /// New shops credit the whole award to the customer's global balance.
    pub fn new(
        id: impl Into<String>,
        price_to_points_multiplier: f64,
        min_price_to_get_points: f64,
        max_given_points: f64,
    ) -> Self {
        Self {
            id: id.into(),
            price_to_points_multiplier,
            min_price_to_get_points,
            max_given_points,
            free_points_percentage: 1.0,
        }
    }
    pub fn with_free_points_percentage(mut self, percentage: f64) -> Self {
        self.free_points_percentage = percentage;
        self
    }
}

impl Customer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            points: 0.0,
        }
    }
}

impl CouponType {
    pub fn new(shop_id: impl Into<String>, kind: impl Into<String>, val: impl Into<String>) -> Self {
        Self {
            shop_id: shop_id.into(),
            kind: kind.into(),
            val: val.into(),
            active: true,
        }
    }
}

impl ShopSpecificToken {
    pub fn new(shop_id: impl Into<String>, customer_id: impl Into<String>) -> Self {
        Self {
            shop_id: shop_id.into(),
            customer_id: customer_id.into(),
            amount: 0.0,
        }
    }
}

impl Record for User {
    const ENTITY: EntityType = EntityType::User;

    fn key(&self) -> CompositeKey {
        keys::user_key(&self.id)
    }
}

impl Record for Shop {
    const ENTITY: EntityType = EntityType::Shop;

    fn key(&self) -> CompositeKey {
        keys::shop_key(&self.id)
    }
}

impl Record for Customer {
    const ENTITY: EntityType = EntityType::Customer;

    fn key(&self) -> CompositeKey {
        keys::customer_key(&self.id)
    }
}

impl Record for CouponType {
    const ENTITY: EntityType = EntityType::CouponType;

    fn key(&self) -> CompositeKey {
        keys::coupon_type_key(&self.shop_id, &self.kind, &self.val)
    }
}

impl Record for Coupon {
    const ENTITY: EntityType = EntityType::Coupon;

    fn key(&self) -> CompositeKey {
        keys::coupon_key(&self.id, &self.type_id)
    }
}

impl Record for ShopSpecificToken {
    const ENTITY: EntityType = EntityType::ShopSpecificToken;

    fn key(&self) -> CompositeKey {
        keys::shop_specific_token_key(&self.shop_id, &self.customer_id)
    }
}
