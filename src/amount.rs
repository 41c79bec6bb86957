//! Limits and overflow-checked arithmetic for money amounts, share counts and prices.

use rust_decimal::Decimal;

use crate::Error;

/// The largest amount, share count or price accepted from a form.
pub(crate) const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Whether `amount` is within [MAX_AMOUNT] either side of zero.
pub(crate) fn is_within_limit(amount: Decimal) -> bool {
    amount.abs() <= MAX_AMOUNT
}

/// Add two decimals.
///
/// # Errors
/// Returns [Error::ArithmeticOverflow] if the result does not fit in a [Decimal].
pub(crate) fn checked_add(left: Decimal, right: Decimal) -> Result<Decimal, Error> {
    left.checked_add(right).ok_or(Error::ArithmeticOverflow)
}

/// Subtract `right` from `left`.
///
/// # Errors
/// Returns [Error::ArithmeticOverflow] if the result does not fit in a [Decimal].
pub(crate) fn checked_sub(left: Decimal, right: Decimal) -> Result<Decimal, Error> {
    left.checked_sub(right).ok_or(Error::ArithmeticOverflow)
}

/// Multiply two decimals.
///
/// # Errors
/// Returns [Error::ArithmeticOverflow] if the result does not fit in a [Decimal].
pub(crate) fn checked_mul(left: Decimal, right: Decimal) -> Result<Decimal, Error> {
    left.checked_mul(right).ok_or(Error::ArithmeticOverflow)
}

/// Sum `values`, stopping at the first overflow.
///
/// # Errors
/// Returns [Error::ArithmeticOverflow] if a partial sum does not fit in a [Decimal].
pub(crate) fn checked_sum(values: impl IntoIterator<Item = Decimal>) -> Result<Decimal, Error> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |total, value| checked_add(total, value))
}

/// `part` as a percentage of `whole`.
///
/// Returns `None` when `whole` is zero or the percentage is too large to represent.
pub(crate) fn checked_percent(part: Decimal, whole: Decimal) -> Option<Decimal> {
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
}
