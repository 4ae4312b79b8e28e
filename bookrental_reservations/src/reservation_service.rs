//! Reservation lifecycle.
//!
//! A reservation is created ACTIVE and moves exactly once, on return, to RETURNED (on time or early)
//! or OVERDUE (late). Creation takes one copy of the book from the inventory ledger and return puts it
//! back, each in the same repository transaction as the reservation write.
//!
//! Overdue listing is a query-time view only: a reservation past its expected return date keeps its
//! stored ACTIVE status until the book is actually returned.

use std::sync::Arc;

use chrono::{Days, NaiveDate};

use bookrental_inventory::inventory_ledger::InventoryLedger;

use crate::api::{
    BookId, ReservationId, ReservationRequest, ReservationResponse, ReservationStatus,
    ReturnBookRequest, UserId,
};
use crate::clock::{Clock, SystemClock};
use crate::error::ReservationError;
use crate::fees;
use crate::reservation::{NewReservation, Reservation, ReturnRecord};
use crate::reservations_repository::ReservationsRepository;
use crate::users_repository::UsersRepository;

#[derive(Clone)]
pub struct ReservationService {
    users_repository: Arc<dyn UsersRepository>,
    inventory_ledger: Arc<dyn InventoryLedger>,
    reservations_repository: Arc<dyn ReservationsRepository>,
    clock: Arc<dyn Clock>,
}

fn into_responses(reservations: Vec<Reservation>) -> Vec<ReservationResponse> {
    reservations.into_iter().map(ReservationResponse::from).collect()
}

impl ReservationService {
    pub fn new(
        users_repository: Arc<dyn UsersRepository>,
        inventory_ledger: Arc<dyn InventoryLedger>,
        reservations_repository: Arc<dyn ReservationsRepository>,
    ) -> Self {
        Self::with_clock(
            users_repository,
            inventory_ledger,
            reservations_repository,
            Arc::new(SystemClock),
        )
    }

    pub fn with_clock(
        users_repository: Arc<dyn UsersRepository>,
        inventory_ledger: Arc<dyn InventoryLedger>,
        reservations_repository: Arc<dyn ReservationsRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users_repository,
            inventory_ledger,
            reservations_repository,
            clock,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_reservation(
        &self,
        request: ReservationRequest,
    ) -> Result<ReservationResponse, ReservationError> {
        self.users_repository.get_user(request.user_id).await?;

        let book = self
            .inventory_ledger
            .find_by_external_id(request.book_id)
            .await?
            .ok_or(ReservationError::BookNotFound(request.book_id))?;

        if book.available_quantity <= 0 {
            tracing::warn!("Book {} has no copies available", book.external_id);
            return Err(ReservationError::NoCopiesAvailable(book.external_id));
        }

        let total_fee = fees::rental_fee(book.daily_rate, request.rental_days)?;
        let expected_return_date = request
            .start_date
            .checked_add_days(Days::new(request.rental_days as u64))
            .ok_or(ReservationError::InvalidRentalPeriod(request.rental_days))?;

        let reservation = self
            .reservations_repository
            .insert_reservation(NewReservation {
                user_id: request.user_id,
                book_id: book.external_id,
                rental_days: request.rental_days,
                start_date: request.start_date,
                expected_return_date,
                daily_rate: book.daily_rate,
                total_fee,
                created_at: self.clock.now(),
            })
            .await?;

        tracing::info!(
            "Reservation {} created for user {} and book {}, due {}",
            reservation.id,
            reservation.user_id,
            reservation.book_id,
            reservation.expected_return_date
        );
        Ok(reservation.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn return_book(
        &self,
        reservation_id: ReservationId,
        request: ReturnBookRequest,
    ) -> Result<ReservationResponse, ReservationError> {
        let reservation = self
            .reservations_repository
            .get_reservation(reservation_id)
            .await?;

        if reservation.status.is_terminal() {
            tracing::warn!("Reservation {} was already returned", reservation_id);
            return Err(ReservationError::AlreadyReturned(reservation_id));
        }

        if request.return_date < reservation.start_date {
            return Err(ReservationError::InvalidReturnDate {
                reservation_id,
                start_date: reservation.start_date,
                return_date: request.return_date,
            });
        }

        let days_late = fees::days_late(reservation.expected_return_date, request.return_date);
        let record = if days_late == 0 {
            ReturnRecord {
                actual_return_date: request.return_date,
                late_fee: fees::zero_fee(),
                status: ReservationStatus::Returned,
            }
        } else {
            ReturnRecord {
                actual_return_date: request.return_date,
                late_fee: fees::late_fee(reservation.daily_rate, days_late)?,
                status: ReservationStatus::Overdue,
            }
        };

        let returned = self
            .reservations_repository
            .record_return(reservation_id, record)
            .await?;

        tracing::info!(
            "Reservation {} returned as {} with late fee {}",
            returned.id,
            returned.status,
            returned.late_fee
        );
        Ok(returned.into())
    }

    pub async fn get_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> Result<ReservationResponse, ReservationError> {
        Ok(self
            .reservations_repository
            .get_reservation(reservation_id)
            .await?
            .into())
    }

    pub async fn get_all_reservations(&self) -> Result<Vec<ReservationResponse>, ReservationError> {
        Ok(into_responses(self.reservations_repository.find_all().await?))
    }

    pub async fn get_reservations_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ReservationResponse>, ReservationError> {
        Ok(into_responses(
            self.reservations_repository.find_by_user_id(user_id).await?,
        ))
    }

    pub async fn get_active_reservations_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ReservationResponse>, ReservationError> {
        Ok(into_responses(
            self.reservations_repository
                .find_active_by_user_id(user_id)
                .await?,
        ))
    }

    pub async fn get_reservations_by_status(
        &self,
        status: ReservationStatus,
    ) -> Result<Vec<ReservationResponse>, ReservationError> {
        Ok(into_responses(
            self.reservations_repository.find_by_status(status).await?,
        ))
    }

    pub async fn get_active_reservations(
        &self,
    ) -> Result<Vec<ReservationResponse>, ReservationError> {
        self.get_reservations_by_status(ReservationStatus::Active)
            .await
    }

    pub async fn get_reservations_by_book(
        &self,
        book_id: BookId,
    ) -> Result<Vec<ReservationResponse>, ReservationError> {
        Ok(into_responses(
            self.reservations_repository.find_by_book_id(book_id).await?,
        ))
    }

    /// ACTIVE reservations whose expected return date is before today
    pub async fn get_overdue_reservations(
        &self,
    ) -> Result<Vec<ReservationResponse>, ReservationError> {
        self.get_overdue_reservations_as_of(self.clock.today())
            .await
    }

    pub async fn get_overdue_reservations_as_of(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<ReservationResponse>, ReservationError> {
        Ok(into_responses(
            self.reservations_repository.find_overdue(date).await?,
        ))
    }

    /// Reservations starting between start and end, both inclusive
    pub async fn get_reservations_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ReservationResponse>, ReservationError> {
        Ok(into_responses(
            self.reservations_repository
                .find_by_date_range(start, end)
                .await?,
        ))
    }

    pub async fn count_active_by_book(&self, book_id: BookId) -> Result<i64, ReservationError> {
        Ok(self
            .reservations_repository
            .count_active_by_book(book_id)
            .await?)
    }
}
