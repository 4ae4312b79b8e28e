pub use in_memory_reservations_repository::InMemoryReservationsRepository;
pub use postgres_reservations_repository::{
    PostgresReservationsRepository, PostgresReservationsRepositoryConfig,
};

use chrono::NaiveDate;

use bookrental_inventory::inventory_ledger::InventoryError;

use crate::api::{BookId, ReservationId, ReservationStatus, UserId};
use crate::reservation::{NewReservation, Reservation, ReturnRecord};

mod in_memory_reservations_repository;
mod postgres_reservations_repository;

#[derive(Debug, thiserror::Error)]
pub enum ReservationsRepositoryError {
    #[error("Reservation {0} not found")]
    ReservationNotFound(ReservationId),

    #[error("Reservation {0} is not active")]
    AlreadyReturned(ReservationId),

    #[error("Inventory failure {0}")]
    Inventory(#[from] InventoryError),

    #[error("Unknown reservation status {0}")]
    InvalidStatus(String),

    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),
}

/// Storage of reservations.
/// Writes that touch the stock of a book run in one transaction together with the ledger update.
/// Listing operations return reservations ordered by id.
#[async_trait::async_trait]
pub trait ReservationsRepository: Send + Sync {
    /// Stores a new ACTIVE reservation and takes one copy of its book off the shelf.
    /// Nothing is stored when the ledger has no copy left.
    async fn insert_reservation(
        &self,
        reservation: NewReservation,
    ) -> Result<Reservation, ReservationsRepositoryError>;

    /// Stores the return of an ACTIVE reservation and puts its copy back on the shelf.
    /// Fails with AlreadyReturned when the stored reservation is not ACTIVE anymore.
    async fn record_return(
        &self,
        reservation_id: ReservationId,
        record: ReturnRecord,
    ) -> Result<Reservation, ReservationsRepositoryError>;

    async fn get_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Reservation, ReservationsRepositoryError>;

    async fn find_all(&self) -> Result<Vec<Reservation>, ReservationsRepositoryError>;

    async fn find_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Reservation>, ReservationsRepositoryError>;

    async fn find_active_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Reservation>, ReservationsRepositoryError>;

    async fn find_by_status(
        &self,
        status: ReservationStatus,
    ) -> Result<Vec<Reservation>, ReservationsRepositoryError>;

    async fn find_by_book_id(
        &self,
        book_id: BookId,
    ) -> Result<Vec<Reservation>, ReservationsRepositoryError>;

    /// Reservations starting between start and end, both inclusive
    async fn find_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Reservation>, ReservationsRepositoryError>;

    /// ACTIVE reservations expected back before as_of
    async fn find_overdue(
        &self,
        as_of: NaiveDate,
    ) -> Result<Vec<Reservation>, ReservationsRepositoryError>;

    async fn count_active_by_book(&self, book_id: BookId)
        -> Result<i64, ReservationsRepositoryError>;
}
