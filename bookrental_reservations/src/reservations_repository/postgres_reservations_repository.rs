use std::str::FromStr;

use anyhow::Context;
use chrono::NaiveDate;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls, Row};

use bookrental_inventory::inventory_ledger::{
    create_books_table, decrease_available, increase_available,
};

use crate::api::{BookId, ReservationId, ReservationStatus, UserId};
use crate::reservation::{NewReservation, Reservation, ReturnRecord};
use crate::reservations_repository::{ReservationsRepository, ReservationsRepositoryError};

const RESERVATION_COLUMNS: &str = "id, user_id, book_id, rental_days, start_date, \
    expected_return_date, actual_return_date, daily_rate, total_fee, late_fee, status, created_at";

pub struct PostgresReservationsRepositoryConfig {
    pub hostname: String,
    pub username: String,
    pub password: String,
}

/// Reservations stored in postgres next to the books table of the ledger.
/// The client sits behind a mutex because opening a transaction needs exclusive access to it.
pub struct PostgresReservationsRepository {
    client: tokio::sync::Mutex<Client>,
}

impl PostgresReservationsRepository {
    pub async fn init(config: PostgresReservationsRepositoryConfig) -> anyhow::Result<Self> {
        let connection_str = format!(
            "postgresql://{}:{}@{}",
            config.username, config.password, config.hostname
        );
        tracing::info!("Postgres connection to {}", config.hostname);
        let (client, connection) = tokio_postgres::connect(&connection_str, NoTls)
            .await
            .context("Failed to start postgres")?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("connection error: {}", e);
            }
        });

        create_books_table(&client).await?;

        client
            .batch_execute(
                "
        CREATE TABLE IF NOT EXISTS reservations (
            id                      SERIAL PRIMARY KEY,
            user_id                 INTEGER NOT NULL,
            book_id                 INTEGER NOT NULL REFERENCES books (external_id),
            rental_days             INTEGER NOT NULL CHECK (rental_days >= 1),
            start_date              DATE NOT NULL,
            expected_return_date    DATE NOT NULL,
            actual_return_date      DATE,
            daily_rate              NUMERIC(12, 2) NOT NULL,
            total_fee               NUMERIC(12, 2) NOT NULL,
            late_fee                NUMERIC(12, 2) NOT NULL DEFAULT 0,
            status                  TEXT NOT NULL,
            created_at              TIMESTAMP NOT NULL
            )
        ",
            )
            .await
            .context("Failed to setup reservations table")?;

        Ok(Self {
            client: tokio::sync::Mutex::new(client),
        })
    }

    async fn query_reservations(
        &self,
        condition: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Reservation>, ReservationsRepositoryError> {
        let query = format!(
            "SELECT {} FROM reservations WHERE {} ORDER BY id",
            RESERVATION_COLUMNS, condition
        );
        let rows = self.client.lock().await.query(query.as_str(), params).await?;
        rows.iter().map(row_to_reservation).collect()
    }
}

fn row_to_reservation(row: &Row) -> Result<Reservation, ReservationsRepositoryError> {
    let status: String = row.try_get(10)?;
    let status = ReservationStatus::from_str(&status)
        .map_err(|_| ReservationsRepositoryError::InvalidStatus(status.clone()))?;

    Ok(Reservation {
        id: row.try_get(0)?,
        user_id: row.try_get(1)?,
        book_id: row.try_get(2)?,
        rental_days: row.try_get(3)?,
        start_date: row.try_get(4)?,
        expected_return_date: row.try_get(5)?,
        actual_return_date: row.try_get(6)?,
        daily_rate: row.try_get(7)?,
        total_fee: row.try_get(8)?,
        late_fee: row.try_get(9)?,
        status,
        created_at: row.try_get(11)?,
    })
}

#[async_trait::async_trait]
impl ReservationsRepository for PostgresReservationsRepository {
    async fn insert_reservation(
        &self,
        reservation: NewReservation,
    ) -> Result<Reservation, ReservationsRepositoryError> {
        let mut client = self.client.lock().await;
        // Dropping the transaction without commit rolls back both writes
        let transaction = client.transaction().await?;

        let row = transaction
            .query_one(
                "INSERT INTO reservations (user_id, book_id, rental_days, start_date, \
                 expected_return_date, daily_rate, total_fee, late_fee, status, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8, $9) RETURNING id",
                &[
                    &reservation.user_id,
                    &reservation.book_id,
                    &reservation.rental_days,
                    &reservation.start_date,
                    &reservation.expected_return_date,
                    &reservation.daily_rate,
                    &reservation.total_fee,
                    &ReservationStatus::Active.as_ref(),
                    &reservation.created_at,
                ],
            )
            .await?;
        let id: ReservationId = row.try_get(0)?;

        decrease_available(&transaction, reservation.book_id).await?;

        transaction.commit().await?;
        Ok(reservation.into_reservation(id))
    }

    async fn record_return(
        &self,
        reservation_id: ReservationId,
        record: ReturnRecord,
    ) -> Result<Reservation, ReservationsRepositoryError> {
        let mut client = self.client.lock().await;
        let transaction = client.transaction().await?;

        let query = format!(
            "UPDATE reservations SET actual_return_date = $2, late_fee = $3, status = $4 \
             WHERE id = $1 AND status = $5 RETURNING {}",
            RESERVATION_COLUMNS
        );
        let row = transaction
            .query_opt(
                query.as_str(),
                &[
                    &reservation_id,
                    &record.actual_return_date,
                    &record.late_fee,
                    &record.status.as_ref(),
                    &ReservationStatus::Active.as_ref(),
                ],
            )
            .await?;

        let reservation = match row {
            Some(row) => row_to_reservation(&row)?,
            None => {
                let exists = transaction
                    .query_opt(
                        "SELECT 1 FROM reservations WHERE id = $1",
                        &[&reservation_id],
                    )
                    .await?;
                return Err(match exists {
                    Some(_) => ReservationsRepositoryError::AlreadyReturned(reservation_id),
                    None => ReservationsRepositoryError::ReservationNotFound(reservation_id),
                });
            }
        };

        increase_available(&transaction, reservation.book_id).await?;

        transaction.commit().await?;
        Ok(reservation)
    }

    async fn get_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Reservation, ReservationsRepositoryError> {
        self.query_reservations("id = $1", &[&reservation_id])
            .await?
            .into_iter()
            .next()
            .ok_or(ReservationsRepositoryError::ReservationNotFound(
                reservation_id,
            ))
    }

    async fn find_all(&self) -> Result<Vec<Reservation>, ReservationsRepositoryError> {
        self.query_reservations("TRUE", &[]).await
    }

    async fn find_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Reservation>, ReservationsRepositoryError> {
        self.query_reservations("user_id = $1", &[&user_id]).await
    }

    async fn find_active_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Reservation>, ReservationsRepositoryError> {
        self.query_reservations(
            "user_id = $1 AND status = $2",
            &[&user_id, &ReservationStatus::Active.as_ref()],
        )
        .await
    }

    async fn find_by_status(
        &self,
        status: ReservationStatus,
    ) -> Result<Vec<Reservation>, ReservationsRepositoryError> {
        self.query_reservations("status = $1", &[&status.as_ref()])
            .await
    }

    async fn find_by_book_id(
        &self,
        book_id: BookId,
    ) -> Result<Vec<Reservation>, ReservationsRepositoryError> {
        self.query_reservations("book_id = $1", &[&book_id]).await
    }

    async fn find_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Reservation>, ReservationsRepositoryError> {
        self.query_reservations("start_date >= $1 AND start_date <= $2", &[&start, &end])
            .await
    }

    async fn find_overdue(
        &self,
        as_of: NaiveDate,
    ) -> Result<Vec<Reservation>, ReservationsRepositoryError> {
        self.query_reservations(
            "status = $1 AND expected_return_date < $2",
            &[&ReservationStatus::Active.as_ref(), &as_of],
        )
        .await
    }

    async fn count_active_by_book(
        &self,
        book_id: BookId,
    ) -> Result<i64, ReservationsRepositoryError> {
        let row = self
            .client
            .lock()
            .await
            .query_one(
                "SELECT COUNT(*) FROM reservations WHERE book_id = $1 AND status = $2",
                &[&book_id, &ReservationStatus::Active.as_ref()],
            )
            .await?;
        Ok(row.try_get(0)?)
    }
}
