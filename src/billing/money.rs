use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};

/// Every stored amount has two decimal places.
pub const SCALE: u32 = 2;

/// Largest daily charge, `DECIMAL(10,2)` in `daily_menus`.
pub fn max_charge() -> Decimal {
    Decimal::new(9_999_999_999, SCALE)
}

/// Largest bill amount, `DECIMAL(12,2)` in `bills`.
pub fn max_bill_amount() -> Decimal {
    Decimal::new(999_999_999_999, SCALE)
}

/// Rejects negative amounts, more than two decimal places and anything a
/// daily column cannot hold.
pub fn validate_charge(label: &str, amount: Decimal) -> AppResult<()> {
    if amount < Decimal::ZERO {
        return Err(AppError::invalid(format!("{label} cannot be negative")));
    }
    if amount.normalize().scale() > SCALE {
        return Err(AppError::invalid(format!(
            "{label} can have at most {SCALE} decimal places"
        )));
    }
    if amount > max_charge() {
        return Err(AppError::invalid(format!(
            "{label} cannot exceed {}",
            max_charge()
        )));
    }
    Ok(())
}

/// Overflow-checked sum.
pub fn checked_sum(label: &str, amounts: impl IntoIterator<Item = Decimal>) -> AppResult<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
        .ok_or_else(|| AppError::invalid(format!("{label} is too large")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn accepts_cents_up_to_the_column_limit() {
        assert!(validate_charge("Fixed charge", dec!(0)).is_ok());
        assert!(validate_charge("Fixed charge", dec!(20.50)).is_ok());
        assert!(validate_charge("Fixed charge", dec!(20.500)).is_ok());
        assert!(validate_charge("Fixed charge", dec!(99999999.99)).is_ok());
    }

    #[test]
    fn rejects_negative_fractional_cents_and_oversized_amounts() {
        for amount in [dec!(-0.01), dec!(20.005), dec!(100000000), Decimal::MAX] {
            assert!(
                matches!(
                    validate_charge("Meal price", amount),
                    Err(AppError::InvalidArgument { .. })
                ),
                "{amount} accepted"
            );
        }
    }

    #[test]
    fn checked_sum_reports_overflow_instead_of_panicking() {
        assert_eq!(checked_sum("Food", [dec!(1.25), dec!(2.75)]).unwrap(), dec!(4));
        assert!(matches!(
            checked_sum("Food", [Decimal::MAX, Decimal::MAX]),
            Err(AppError::InvalidArgument { .. })
        ));
    }
}
