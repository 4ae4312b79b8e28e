//! Fee arithmetic for rentals.
//!
//! Every amount is an exact decimal rounded half-up to cents right where it is computed.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Share of the daily rate charged for every day a book is returned late
pub const LATE_FEE_RATE: Decimal = dec!(0.15);

const MONEY_SCALE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeeError {
    #[error("Rental period of {0} days is invalid, at least one day is required")]
    InvalidRentalPeriod(i32),

    #[error("Fee for daily rate {daily_rate} over {days} days is out of range")]
    FeeOverflow { daily_rate: Decimal, days: i64 },
}

/// Zero with cent precision, serializes as "0.00"
pub fn zero_fee() -> Decimal {
    Decimal::new(0, MONEY_SCALE)
}

/// Rounds half-up to cents and always keeps two decimal places, 30 becomes 30.00
fn round_money(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Price of renting a book for the whole period
pub fn rental_fee(daily_rate: Decimal, rental_days: i32) -> Result<Decimal, FeeError> {
    if rental_days < 1 {
        return Err(FeeError::InvalidRentalPeriod(rental_days));
    }
    daily_rate
        .checked_mul(Decimal::from(rental_days))
        .map(round_money)
        .ok_or(FeeError::FeeOverflow {
            daily_rate,
            days: rental_days.into(),
        })
}

/// Surcharge for returning a book days_late days after the expected date
pub fn late_fee(daily_rate: Decimal, days_late: i64) -> Result<Decimal, FeeError> {
    if days_late <= 0 {
        return Ok(zero_fee());
    }
    daily_rate
        .checked_mul(LATE_FEE_RATE)
        .and_then(|daily_fee| daily_fee.checked_mul(Decimal::from(days_late)))
        .map(round_money)
        .ok_or(FeeError::FeeOverflow {
            daily_rate,
            days: days_late,
        })
}

/// Whole days between the expected and the actual return date, zero for on-time and early returns
pub fn days_late(expected_return_date: NaiveDate, actual_return_date: NaiveDate) -> i64 {
    (actual_return_date - expected_return_date)
        .num_days()
        .max(0)
}

#[cfg(test)]
mod fees_tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_rental_fee() {
        assert_eq!(rental_fee(dec!(15.99), 7).unwrap(), dec!(111.93));
        assert_eq!(rental_fee(dec!(15.99), 5).unwrap(), dec!(79.95));
        assert_eq!(rental_fee(dec!(0.335), 1).unwrap(), dec!(0.34));
        assert_eq!(rental_fee(dec!(0.00), 3).unwrap(), dec!(0));
    }

    #[test]
    fn test_fees_keep_cent_precision() {
        assert_eq!(rental_fee(dec!(15), 2).unwrap().to_string(), "30.00");
        assert_eq!(rental_fee(dec!(0.335), 1).unwrap().to_string(), "0.34");
        assert_eq!(late_fee(dec!(20), 1).unwrap().to_string(), "3.00");
    }

    #[test]
    fn test_fee_overflow_is_an_error() {
        assert_eq!(
            rental_fee(Decimal::MAX / dec!(10), 100),
            Err(FeeError::FeeOverflow {
                daily_rate: Decimal::MAX / dec!(10),
                days: 100,
            })
        );
        assert!(matches!(
            late_fee(Decimal::MAX, 100_000_000),
            Err(FeeError::FeeOverflow {
                days: 100_000_000,
                ..
            })
        ));
    }

    #[test]
    fn test_rental_fee_rejects_empty_period() {
        assert_eq!(
            rental_fee(dec!(15.99), 0),
            Err(FeeError::InvalidRentalPeriod(0))
        );
        assert_eq!(
            rental_fee(dec!(15.99), -3),
            Err(FeeError::InvalidRentalPeriod(-3))
        );
    }

    #[test]
    fn test_late_fee() {
        // 15% of 15.99 is 2.3985 a day, three days make 7.1955
        assert_eq!(late_fee(dec!(15.99), 3).unwrap(), dec!(7.20));
        assert_eq!(late_fee(dec!(10.00), 1).unwrap(), dec!(1.50));
        assert_eq!(late_fee(dec!(15.99), 0).unwrap(), dec!(0));
        assert_eq!(late_fee(dec!(15.99), -2).unwrap(), dec!(0));
        assert_eq!(late_fee(dec!(15.99), 0).unwrap().to_string(), "0.00");
    }

    #[test]
    fn test_days_late() {
        let expected = date(2024, 3, 8);
        assert_eq!(days_late(expected, date(2024, 3, 11)), 3);
        assert_eq!(days_late(expected, date(2024, 3, 8)), 0);
        assert_eq!(days_late(expected, date(2024, 3, 6)), 0);
        assert_eq!(days_late(expected, date(2024, 4, 8)), 31);
    }
}
