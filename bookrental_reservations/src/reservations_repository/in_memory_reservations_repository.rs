use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;

use bookrental_inventory::inventory_ledger::InMemoryInventoryLedger;

use crate::api::{BookId, ReservationId, ReservationStatus, UserId};
use crate::reservation::{NewReservation, Reservation, ReturnRecord};
use crate::reservations_repository::{ReservationsRepository, ReservationsRepositoryError};

/// Reservations kept in process memory next to an in-memory ledger.
/// The reservations write lock is held while the ledger is updated, which makes the pair a single step.
pub struct InMemoryReservationsRepository {
    inventory_ledger: Arc<InMemoryInventoryLedger>,
    reservations: parking_lot::RwLock<BTreeMap<ReservationId, Reservation>>,
    reservation_sequence_generator: AtomicI32,
}

impl InMemoryReservationsRepository {
    pub fn new(inventory_ledger: Arc<InMemoryInventoryLedger>) -> Self {
        Self {
            inventory_ledger,
            reservations: Default::default(),
            reservation_sequence_generator: AtomicI32::new(1),
        }
    }

    fn filtered(&self, predicate: impl Fn(&Reservation) -> bool) -> Vec<Reservation> {
        self.reservations
            .read()
            .values()
            .filter(|reservation| predicate(reservation))
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl ReservationsRepository for InMemoryReservationsRepository {
    async fn insert_reservation(
        &self,
        reservation: NewReservation,
    ) -> Result<Reservation, ReservationsRepositoryError> {
        let mut reservations_lock = self.reservations.write();

        self.inventory_ledger.take_copy(reservation.book_id)?;

        let id = self
            .reservation_sequence_generator
            .fetch_add(1, Ordering::Relaxed);
        let reservation = reservation.into_reservation(id);
        reservations_lock.insert(id, reservation.clone());
        Ok(reservation)
    }

    async fn record_return(
        &self,
        reservation_id: ReservationId,
        record: ReturnRecord,
    ) -> Result<Reservation, ReservationsRepositoryError> {
        let mut reservations_lock = self.reservations.write();

        let reservation = reservations_lock
            .get_mut(&reservation_id)
            .ok_or(ReservationsRepositoryError::ReservationNotFound(
                reservation_id,
            ))?;
        if reservation.status.is_terminal() {
            return Err(ReservationsRepositoryError::AlreadyReturned(reservation_id));
        }

        self.inventory_ledger.put_back_copy(reservation.book_id)?;

        reservation.apply_return(&record);
        Ok(reservation.clone())
    }

    async fn get_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Reservation, ReservationsRepositoryError> {
        self.reservations
            .read()
            .get(&reservation_id)
            .cloned()
            .ok_or(ReservationsRepositoryError::ReservationNotFound(
                reservation_id,
            ))
    }

    async fn find_all(&self) -> Result<Vec<Reservation>, ReservationsRepositoryError> {
        Ok(self.filtered(|_| true))
    }

    async fn find_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Reservation>, ReservationsRepositoryError> {
        Ok(self.filtered(|reservation| reservation.user_id == user_id))
    }

    async fn find_active_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Reservation>, ReservationsRepositoryError> {
        Ok(self.filtered(|reservation| {
            reservation.user_id == user_id && reservation.status == ReservationStatus::Active
        }))
    }

    async fn find_by_status(
        &self,
        status: ReservationStatus,
    ) -> Result<Vec<Reservation>, ReservationsRepositoryError> {
        Ok(self.filtered(|reservation| reservation.status == status))
    }

    async fn find_by_book_id(
        &self,
        book_id: BookId,
    ) -> Result<Vec<Reservation>, ReservationsRepositoryError> {
        Ok(self.filtered(|reservation| reservation.book_id == book_id))
    }

    async fn find_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Reservation>, ReservationsRepositoryError> {
        Ok(self.filtered(|reservation| {
            reservation.start_date >= start && reservation.start_date <= end
        }))
    }

    async fn find_overdue(
        &self,
        as_of: NaiveDate,
    ) -> Result<Vec<Reservation>, ReservationsRepositoryError> {
        Ok(self.filtered(|reservation| reservation.is_overdue_as_of(as_of)))
    }

    async fn count_active_by_book(
        &self,
        book_id: BookId,
    ) -> Result<i64, ReservationsRepositoryError> {
        Ok(self
            .reservations
            .read()
            .values()
            .filter(|reservation| {
                reservation.book_id == book_id && reservation.status == ReservationStatus::Active
            })
            .count() as i64)
    }
}
