//! Property-based tests for record encoding and key derivation
//!
//! Independent replicas must write byte-identical values and agree on which
//! key an entity lives under, so these properties are checked over random
//! identifiers and field values rather than fixed fixtures.

use loyalty_ledger::{
    codec::{self, Record},
    keys::{CompositeKey, EntityType},
    types::{Coupon, CouponType, Customer, Shop, ShopSpecificToken, TimeStamp},
};
use proptest::prelude::*;

// PROPERTY TEST STRATEGIES

fn entity_strategy() -> impl Strategy<Value = EntityType> {
    (0usize..EntityType::ALL.len()).prop_map(|i| EntityType::ALL[i])
}

/// Identifier parts, deliberately including the key separators
fn part_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z0-9]{0,6}",
        "[a-z/:0-9]{0,8}",
        any::<String>(),
    ]
}

fn parts_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(part_strategy(), 0..4)
}

fn coupon_strategy() -> impl Strategy<Value = Coupon> {
    (part_strategy(), part_strategy(), part_strategy(), -2_000_000_000i64..20_000_000_000, part_strategy())
        .prop_map(|(id, type_id, owner, secs, series_id)| Coupon {
            id,
            type_id,
            owner,
            valid_until: TimeStamp::from_unix_seconds(secs).unwrap(),
            series_id,
        })
}

proptest! {
    #[test]
    fn split_inverts_derivation(entity in entity_strategy(), parts in parts_strategy()) {
        let key = CompositeKey::new(entity, &parts);
        let (decoded_entity, decoded_parts) = key.split().unwrap();
        prop_assert_eq!(decoded_entity, entity);
        prop_assert_eq!(decoded_parts, parts);
    }

    #[test]
    fn distinct_inputs_give_distinct_keys(
        a in (entity_strategy(), parts_strategy()),
        b in (entity_strategy(), parts_strategy()),
    ) {
        prop_assume!(a != b);
        prop_assert_ne!(CompositeKey::new(a.0, &a.1), CompositeKey::new(b.0, &b.1));
    }

    #[test]
    fn shop_round_trips(
        id in part_strategy(),
        numbers in (-1e9f64..1e9, -1e9f64..1e9, 0.0f64..1e9, 0.0f64..=1.0),
    ) {
        // compare bit patterns, equal-comparing floats may still differ in sign of zero
        let shop = Shop::new(id, numbers.0, numbers.1, numbers.2).with_free_points_percentage(numbers.3);
        let decoded: Shop = codec::decode(&codec::encode(&shop).unwrap()).unwrap();

        prop_assert_eq!(&decoded.id, &shop.id);
        prop_assert_eq!(decoded.price_to_points_multiplier.to_bits(), shop.price_to_points_multiplier.to_bits());
        prop_assert_eq!(decoded.min_price_to_get_points.to_bits(), shop.min_price_to_get_points.to_bits());
        prop_assert_eq!(decoded.max_given_points.to_bits(), shop.max_given_points.to_bits());
        prop_assert_eq!(decoded.free_points_percentage.to_bits(), shop.free_points_percentage.to_bits());
    }

    #[test]
    fn coupon_round_trips_and_keeps_its_key(coupon in coupon_strategy()) {
        let bytes = codec::encode(&coupon).unwrap();
        let decoded: Coupon = codec::decode(&bytes).unwrap();

        prop_assert_eq!(decoded.key(), coupon.key());
        prop_assert_eq!(&decoded, &coupon);
        prop_assert_eq!(codec::encode(&decoded).unwrap(), bytes);
    }

    #[test]
    fn balances_round_trip(id in part_strategy(), points in 0.0f64..1e12, active in any::<bool>()) {
        let customer = Customer { id: id.clone(), points };
        let token = ShopSpecificToken { shop_id: id.clone(), customer_id: id.clone(), amount: points };
        let coupon_type = CouponType { shop_id: id.clone(), kind: id.clone(), val: id, active };

        prop_assert_eq!(codec::decode::<Customer>(&codec::encode(&customer).unwrap()).unwrap(), customer);
        prop_assert_eq!(codec::decode::<ShopSpecificToken>(&codec::encode(&token).unwrap()).unwrap(), token);
        prop_assert_eq!(codec::decode::<CouponType>(&codec::encode(&coupon_type).unwrap()).unwrap(), coupon_type);
    }
}
