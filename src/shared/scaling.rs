//! Conversions between native ledger integers and decimal values.
//!
//! The ledger stores every amount as an integer in the smallest unit of its
//! asset. Collateral uses the mint's decimals, perp sizes and prices use the
//! market's size and price decimals, cache prices use 9 decimals and margin
//! fractions are per mille.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::program::constants::{CACHE_PRICE_DECIMALS, PER_MILLE_DECIMALS};

/// Errors raised while converting a decimal into native units
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScalingError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: Decimal },

    #[error("{field} {value} is finer than {decimals} decimals")]
    TooPrecise {
        field: &'static str,
        value: Decimal,
        decimals: u32,
    },

    #[error("{field} {value} overflows native units")]
    Overflow { field: &'static str, value: Decimal },
}

/// Native integer amount to a decimal value.
pub fn from_native(amount: i128, decimals: u32) -> Decimal {
    Decimal::from_i128_with_scale(amount, decimals).normalize()
}

/// Strictly positive decimal to native units.
///
/// Values with more fractional digits than `decimals` are refused rather
/// than rounded, so a request never trades a different size than it named.
pub fn to_native(field: &'static str, value: Decimal, decimals: u32) -> Result<u64, ScalingError> {
    if value <= Decimal::ZERO {
        return Err(ScalingError::NotPositive { field, value });
    }
    let factor = Decimal::from(10u64.pow(decimals));
    let scaled = value
        .checked_mul(factor)
        .ok_or(ScalingError::Overflow { field, value })?;
    if !scaled.fract().is_zero() {
        return Err(ScalingError::TooPrecise {
            field,
            value,
            decimals,
        });
    }
    scaled.to_u64().ok_or(ScalingError::Overflow { field, value })
}

/// Cache price (1e9) to a decimal price.
pub fn from_cache_price(price: u64) -> Decimal {
    from_native(price as i128, CACHE_PRICE_DECIMALS)
}

/// Signed cache value (1e9), e.g. funding rates.
pub fn from_cache_signed(value: i64) -> Decimal {
    from_native(value as i128, CACHE_PRICE_DECIMALS)
}

/// Per-mille fraction to a decimal fraction.
pub fn from_per_mille(value: u16) -> Decimal {
    from_native(value as i128, PER_MILLE_DECIMALS)
}
