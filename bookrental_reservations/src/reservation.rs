use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::api::{BookId, ReservationId, ReservationResponse, ReservationStatus, UserId};
use crate::fees::zero_fee;

/// Stored reservation.
/// daily_rate and total_fee are a snapshot taken at creation and never follow later price changes of the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
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

/// Reservation that was not stored yet, the repository assigns its id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub user_id: UserId,
    pub book_id: BookId,
    pub rental_days: i32,
    pub start_date: NaiveDate,
    pub expected_return_date: NaiveDate,
    pub daily_rate: Decimal,
    pub total_fee: Decimal,
    pub created_at: NaiveDateTime,
}

impl NewReservation {
    pub fn into_reservation(self, id: ReservationId) -> Reservation {
        Reservation {
            id,
            user_id: self.user_id,
            book_id: self.book_id,
            rental_days: self.rental_days,
            start_date: self.start_date,
            expected_return_date: self.expected_return_date,
            actual_return_date: None,
            daily_rate: self.daily_rate,
            total_fee: self.total_fee,
            late_fee: zero_fee(),
            status: ReservationStatus::Active,
            created_at: self.created_at,
        }
    }
}

/// Outcome of a return, applied once to an ACTIVE reservation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnRecord {
    pub actual_return_date: NaiveDate,
    pub late_fee: Decimal,
    pub status: ReservationStatus,
}

impl Reservation {
    pub fn apply_return(&mut self, record: &ReturnRecord) {
        self.actual_return_date = Some(record.actual_return_date);
        self.late_fee = record.late_fee;
        self.status = record.status;
    }

    /// Not returned yet and past its expected return date.
    /// Only a query-time view, the stored status stays ACTIVE until the book is returned.
    pub fn is_overdue_as_of(&self, date: NaiveDate) -> bool {
        self.status == ReservationStatus::Active && self.expected_return_date < date
    }
}

impl From<Reservation> for ReservationResponse {
    fn from(reservation: Reservation) -> Self {
        ReservationResponse {
            id: reservation.id,
            user_id: reservation.user_id,
            book_id: reservation.book_id,
            rental_days: reservation.rental_days,
            start_date: reservation.start_date,
            expected_return_date: reservation.expected_return_date,
            actual_return_date: reservation.actual_return_date,
            daily_rate: reservation.daily_rate,
            total_fee: reservation.total_fee,
            late_fee: reservation.late_fee,
            status: reservation.status,
            created_at: reservation.created_at,
        }
    }
}
