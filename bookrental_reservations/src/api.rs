use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use bookrental_inventory::api::BookId;

pub type UserId = i32;
pub type ReservationId = i32;

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct UserDetails {
    pub name: String,
    pub email: String,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    Eq,
    PartialEq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Active,
    Returned,
    Overdue,
}

impl ReservationStatus {
    /// RETURNED and OVERDUE accept no further transitions
    pub fn is_terminal(self) -> bool {
        !matches!(self, ReservationStatus::Active)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct ReservationRequest {
    pub user_id: UserId,
    pub book_id: BookId,
    pub rental_days: i32,
    pub start_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct ReturnBookRequest {
    pub return_date: NaiveDate,
}

/// Projection of a reservation handed out to callers of the reservation service
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct ReservationResponse {
    pub id: ReservationId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub rental_days: i32,
    pub start_date: NaiveDate,
    pub expected_return_date: NaiveDate,
    pub actual_return_date: Option<NaiveDate>,
    pub daily_rate: Decimal,
    pub total_fee: Decimal,
    pub late_fee: Decimal,
    pub status: ReservationStatus,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod api_tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_status_names() {
        assert_eq!(ReservationStatus::Active.as_ref(), "ACTIVE");
        assert_eq!(ReservationStatus::Overdue.to_string(), "OVERDUE");
        assert_eq!(
            ReservationStatus::from_str("RETURNED").unwrap(),
            ReservationStatus::Returned
        );
        assert!(ReservationStatus::from_str("LOST").is_err());
        assert_eq!(
            serde_json::to_string(&ReservationStatus::Returned).unwrap(),
            "\"RETURNED\""
        );
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!ReservationStatus::Active.is_terminal());
        assert!(ReservationStatus::Returned.is_terminal());
        assert!(ReservationStatus::Overdue.is_terminal());
    }
}
