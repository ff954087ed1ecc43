//! Order totals and order numbers

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::*;

/// Tax rate applied to the subtotal (12%)
pub const TAX_RATE: Decimal = Decimal::from_parts(12, 0, 0, false, 2);

/// Minutes added to preparation time for delivery
pub const DELIVERY_BUFFER_MINUTES: i32 = 30;

const DECIMAL_PLACES: u32 = 2;

const ORDER_NUMBER_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ORDER_NUMBER_SUFFIX_LEN: usize = 6;

/// Round to 2 decimal places, half away from zero
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Monetary breakdown of one order, computed once at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub sub_total: Decimal,
    pub delivery_fee: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    pub fn compute(sub_total: Decimal, delivery_fee: Decimal) -> Self {
        let tax = round_money(sub_total * TAX_RATE);
        Self {
            sub_total,
            delivery_fee,
            tax,
            total: sub_total + delivery_fee + tax,
        }
    }
}

/// Slowest preparation time plus the delivery buffer
pub fn estimated_delivery_time(preparation_times: impl IntoIterator<Item = i32>) -> i32 {
    preparation_times.into_iter().max().unwrap_or(0) + DELIVERY_BUFFER_MINUTES
}

/// `ORD-{YYYYMMDD}-{6 uppercase alphanumerics}`
pub fn format_order_number<R: Rng + ?Sized>(rng: &mut R, now_millis: i64) -> String {
    let suffix: String = (0..ORDER_NUMBER_SUFFIX_LEN)
        .map(|_| ORDER_NUMBER_ALPHABET[rng.gen_range(0..ORDER_NUMBER_ALPHABET.len())] as char)
        .collect();
    format!("ORD-{}-{}", shared::util::date_stamp(now_millis), suffix)
}

/// Source of candidate order numbers; uniqueness is enforced by the store
pub trait OrderNumberGenerator: Send + Sync {
    fn next_number(&self, now_millis: i64) -> String;
}

/// Order numbers drawn from a seedable RNG
pub struct RandomOrderNumbers {
    rng: Mutex<StdRng>,
}

impl RandomOrderNumbers {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl OrderNumberGenerator for RandomOrderNumbers {
    fn next_number(&self, now_millis: i64) -> String {
        format_order_number(&mut *self.rng.lock(), now_millis)
    }
}
