// 2.0: fixed point helpers. every conversion hop in the engine goes through mul_div_floor,
// so truncation happens once per hop and never rounds up.
// products are taken at 512 bits; only the quotient has to fit back into 256.

use primitive_types::{U256, U512};
use rust_decimal::Decimal;

/// Scale of rates built from human readable decimals (1.0 == 10^18).
pub const RATE_DECIMALS: u8 = 18;

/// Largest exponent whose power of ten still fits in 256 bits.
pub const MAX_DECIMALS: u8 = 77;

// 2.1: 10^decimals, None past MAX_DECIMALS
pub fn pow10(decimals: u8) -> Option<U256> {
    if decimals > MAX_DECIMALS {
        return None;
    }
    Some(U256::exp10(decimals as usize))
}

// 2.2: floor(a * b / denominator). None on zero denominator or a quotient wider than 256 bits.
pub fn mul_div_floor(a: U256, b: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    let product: U512 = a.full_mul(b);
    let quotient = product / U512::from(denominator);
    U256::try_from(quotient).ok()
}

// 2.3: exact decimal → scaled integer. rejects negatives and anything that would lose digits.
pub fn decimal_to_scaled(value: Decimal, decimals: u8) -> Option<U256> {
    if value.is_sign_negative() && !value.is_zero() {
        return None;
    }
    let value = value.normalize();
    let scale = value.scale();
    if scale > decimals as u32 {
        return None;
    }
    let mantissa = u128::try_from(value.mantissa()).ok()?;
    let factor = pow10(decimals - scale as u8)?;
    U256::from(mantissa).checked_mul(factor)
}

// 2.4: render a scaled integer as a plain decimal string, trailing zeros trimmed.
pub fn format_units(raw: U256, decimals: u8) -> String {
    let Some(unit) = pow10(decimals) else {
        return raw.to_string();
    };
    if decimals == 0 {
        return raw.to_string();
    }

    let whole = raw / unit;
    let frac = raw % unit;
    if frac.is_zero() {
        return whole.to_string();
    }

    let padded = format!("{:0>width$}", frac.to_string(), width = decimals as usize);
    format!("{}.{}", whole, padded.trim_end_matches('0'))
}
