use alloy::primitives::U256;
use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};

pub fn u256_to_bigint(value: U256) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, &value.to_be_bytes::<32>())
}

/// Scales down an on-chain fixed-point integer by `10^decimals`.
///
/// The conversion is exact: the integer becomes the unscaled value of a
/// `BigDecimal` with `decimals` as its scale, so no precision is lost for
/// values with 18+ significant digits.
pub fn to_normalized_amount(value: U256, decimals: u32) -> BigDecimal {
    BigDecimal::new(u256_to_bigint(value), i64::from(decimals))
}
