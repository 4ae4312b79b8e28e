use chrono::NaiveDate;
use rust_decimal::Decimal;

use bookrental_inventory::inventory_ledger::InventoryError;

use crate::api::{BookId, ReservationId, UserId};
use crate::fees::FeeError;
use crate::reservations_repository::ReservationsRepositoryError;
use crate::users_repository::UsersRepositoryError;

/// Failure of a reservation service operation.
/// Every variant names the id or date that caused it.
#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("User {0} not found")]
    UserNotFound(UserId),

    #[error("Book {0} not found")]
    BookNotFound(BookId),

    #[error("No copies of book {0} are available")]
    NoCopiesAvailable(BookId),

    #[error("Reservation {0} not found")]
    ReservationNotFound(ReservationId),

    #[error("Reservation {0} was already returned")]
    AlreadyReturned(ReservationId),

    #[error(
        "Return date {return_date} of reservation {reservation_id} is before its start date {start_date}"
    )]
    InvalidReturnDate {
        reservation_id: ReservationId,
        start_date: NaiveDate,
        return_date: NaiveDate,
    },

    #[error("Rental period of {0} days is invalid")]
    InvalidRentalPeriod(i32),

    #[error("Insufficient stock of book {0}")]
    InsufficientStock(BookId),

    #[error("Fee for daily rate {daily_rate} over {days} days is out of range")]
    FeeOverflow { daily_rate: Decimal, days: i64 },

    #[error("Storage failure {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<FeeError> for ReservationError {
    fn from(err: FeeError) -> Self {
        match err {
            FeeError::InvalidRentalPeriod(days) => ReservationError::InvalidRentalPeriod(days),
            FeeError::FeeOverflow { daily_rate, days } => {
                ReservationError::FeeOverflow { daily_rate, days }
            }
        }
    }
}

impl From<InventoryError> for ReservationError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::BookNotFound(book_id) => ReservationError::BookNotFound(book_id),
            InventoryError::InsufficientStock(book_id) => {
                ReservationError::InsufficientStock(book_id)
            }
            other => ReservationError::Storage(Box::new(other)),
        }
    }
}

impl From<UsersRepositoryError> for ReservationError {
    fn from(err: UsersRepositoryError) -> Self {
        match err {
            UsersRepositoryError::UserNotFound(user_id) => ReservationError::UserNotFound(user_id),
            other => ReservationError::Storage(Box::new(other)),
        }
    }
}

impl From<ReservationsRepositoryError> for ReservationError {
    fn from(err: ReservationsRepositoryError) -> Self {
        match err {
            ReservationsRepositoryError::ReservationNotFound(id) => {
                ReservationError::ReservationNotFound(id)
            }
            ReservationsRepositoryError::AlreadyReturned(id) => {
                ReservationError::AlreadyReturned(id)
            }
            ReservationsRepositoryError::Inventory(inventory_err) => inventory_err.into(),
            other => ReservationError::Storage(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod error_tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn test_storage_failure_keeps_its_source() {
        let err: ReservationError =
            UsersRepositoryError::Other("connection reset".to_string()).into();

        assert!(matches!(err, ReservationError::Storage(..)));
        let source = err.source().expect("source missing");
        assert!(source.downcast_ref::<UsersRepositoryError>().is_some());
        assert_eq!(err.to_string(), "Storage failure Other error connection reset");
    }

    #[test]
    fn test_domain_errors_are_not_storage_failures() {
        let err: ReservationError =
            ReservationsRepositoryError::Inventory(InventoryError::InsufficientStock(7)).into();
        assert!(matches!(err, ReservationError::InsufficientStock(7)));

        let err: ReservationError = FeeError::FeeOverflow {
            daily_rate: Decimal::MAX,
            days: 3,
        }
        .into();
        assert!(matches!(err, ReservationError::FeeOverflow { days: 3, .. }));
    }
}
