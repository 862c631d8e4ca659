//! Composite key derivation for ledger-resident entities.
//!
//! A key is the entity tag followed by each identifying part rendered as
//! `/<byte length>:<part>`. The length prefix keeps the mapping injective for
//! any UTF-8 part, including parts that are composite keys themselves.
use super::error::{LedgerError, LedgerResult};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityType {
    Shop,
    Customer,
    CouponType,
    Coupon,
    ShopSpecificToken,
    User,
}

impl EntityType {
    pub const ALL: [EntityType; 6] = [
        EntityType::Shop,
        EntityType::Customer,
        EntityType::CouponType,
        EntityType::Coupon,
        EntityType::ShopSpecificToken,
        EntityType::User,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            EntityType::Shop => "SHOP",
            EntityType::Customer => "CUSTOMER",
            EntityType::CouponType => "COUPONTYPE",
            EntityType::Coupon => "COUPON",
            EntityType::ShopSpecificToken => "SHOP_SPECIFIC_TOKEN",
            EntityType::User => "USER",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for EntityType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::ALL
            .into_iter()
            .find(|entity| entity.tag() == s)
            .ok_or_else(|| LedgerError::InvalidArgument(format!("unknown entity tag {s:?}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompositeKey(String);

impl CompositeKey {
    pub fn new<P: AsRef<str>>(entity: EntityType, parts: &[P]) -> Self {
        let mut key = String::from(entity.tag());
        for part in parts {
            let part = part.as_ref();
            key.push('/');
            key.push_str(&part.len().to_string());
            key.push(':');
            key.push_str(part);
        }
        Self(key)
    }

    /// Parses a key back into its entity type and identifying parts.
    pub fn split(&self) -> LedgerResult<(EntityType, Vec<String>)> {
        let malformed = || LedgerError::InvalidArgument(format!("malformed composite key {:?}", self.0));

        let (tag, mut rest) = match self.0.find('/') {
            Some(idx) => self.0.split_at(idx),
            None => (self.0.as_str(), ""),
        };
        let entity = tag.parse::<EntityType>()?;

        let mut parts = Vec::new();
        while !rest.is_empty() {
            let body = rest.strip_prefix('/').ok_or_else(malformed)?;
            let (len, tail) = body.split_once(':').ok_or_else(malformed)?;
            let len: usize = len.parse().map_err(|_| malformed())?;
            if tail.len() < len || !tail.is_char_boundary(len) {
                return Err(malformed());
            }
            let (part, tail) = tail.split_at(len);
            parts.push(part.to_string());
            rest = tail;
        }

        Ok((entity, parts))
    }

    /// Fails unless the key was derived for `entity`.
    pub fn expect_entity(&self, entity: EntityType) -> LedgerResult<()> {
        let (found, _) = self.split()?;
        if found != entity {
            return Err(LedgerError::InvalidArgument(format!(
                "key {} refers to a {found}, expected a {entity}",
                self.0
            )));
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CompositeKey {
    fn from(value: &str) -> Self {
        CompositeKey(value.to_string())
    }
}

impl From<String> for CompositeKey {
    fn from(value: String) -> Self {
        CompositeKey(value)
    }
}

impl AsRef<str> for CompositeKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn shop_key(id: &str) -> CompositeKey {
    CompositeKey::new(EntityType::Shop, &[id])
}

pub fn customer_key(id: &str) -> CompositeKey {
    CompositeKey::new(EntityType::Customer, &[id])
}

pub fn coupon_type_key(shop_id: &str, kind: &str, val: &str) -> CompositeKey {
    CompositeKey::new(EntityType::CouponType, &[shop_id, kind, val])
}

pub fn coupon_key(id: &str, type_id: &str) -> CompositeKey {
    CompositeKey::new(EntityType::Coupon, &[id, type_id])
}

pub fn shop_specific_token_key(shop_id: &str, customer_id: &str) -> CompositeKey {
    CompositeKey::new(EntityType::ShopSpecificToken, &[shop_id, customer_id])
}

pub fn user_key(identity: &str) -> CompositeKey {
    CompositeKey::new(EntityType::User, &[identity])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_layout_is_stable() {
        let key = shop_specific_token_key("S1", "C1");
        assert_eq!(key.as_str(), "SHOP_SPECIFIC_TOKEN/2:S1/2:C1");
    }

    #[test]
    fn shifted_separators_do_not_collide() {
        // naive joining would render both of these as "a/b/c"
        let a = CompositeKey::new(EntityType::CouponType, &["a/b", "c", ""]);
        let b = CompositeKey::new(EntityType::CouponType, &["a", "b/c", ""]);
        assert_ne!(a, b);
    }

    #[test]
    fn same_parts_different_entity_differ() {
        assert_ne!(shop_key("X"), customer_key("X"));
        assert_ne!(coupon_key("X", "Y"), shop_specific_token_key("X", "Y"));
    }

    #[test]
    fn split_recovers_nested_keys() {
        let type_id = coupon_type_key("S1", "discount", "10");
        let key = coupon_key("C_0", type_id.as_str());

        let (entity, parts) = key.split().unwrap();
        assert_eq!(entity, EntityType::Coupon);
        assert_eq!(parts, vec!["C_0".to_string(), type_id.to_string()]);
    }

    #[test]
    fn split_handles_multibyte_parts() {
        let key = customer_key("čaj☕");
        let (entity, parts) = key.split().unwrap();
        assert_eq!(entity, EntityType::Customer);
        assert_eq!(parts, vec!["čaj☕".to_string()]);
    }

    #[test]
    fn expect_entity_checks_the_tag() {
        assert!(shop_key("S1").expect_entity(EntityType::Shop).is_ok());
        assert!(shop_key("S1").expect_entity(EntityType::CouponType).is_err());
    }

    #[test]
    fn split_rejects_malformed_keys() {
        assert!(CompositeKey::from("SHOP/9:S1").split().is_err());
        assert!(CompositeKey::from("SHOP/x:S1").split().is_err());
        assert!(CompositeKey::from("NOPE/2:S1").split().is_err());
        assert!(CompositeKey::from("SHOP2:S1").split().is_err());
    }
}
