use anyhow::Context;
use tokio_postgres::{Client, GenericClient, NoTls, Row};

use crate::api::{Book, BookId};
use crate::inventory_ledger::{validate_book, InventoryError, InventoryLedger};

pub struct PostgresInventoryLedgerConfig {
    pub hostname: String,
    pub username: String,
    pub password: String,
}

pub struct PostgresInventoryLedger {
    client: Client,
}

impl PostgresInventoryLedger {
    pub async fn init(config: PostgresInventoryLedgerConfig) -> anyhow::Result<Self> {
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
        Ok(Self { client })
    }
}

/// Creates the books table if it does not exist yet.
/// The check constraints keep the counts in bounds even for writes from outside the ledger.
pub async fn create_books_table(client: &Client) -> anyhow::Result<()> {
    client
        .batch_execute(
            "
        CREATE TABLE IF NOT EXISTS books (
            external_id          INTEGER PRIMARY KEY,
            title                TEXT NOT NULL,
            total_quantity       INTEGER NOT NULL CHECK (total_quantity >= 0),
            available_quantity   INTEGER NOT NULL CHECK (available_quantity >= 0),
            daily_rate           NUMERIC(12, 2) NOT NULL CHECK (daily_rate >= 0),
            CHECK (available_quantity <= total_quantity)
            )
        ",
        )
        .await
        .context("Failed to setup books table")
}

/// Takes one copy of the book using the given client or transaction.
/// The conditional update holds the row lock of the book until the surrounding transaction ends,
/// so two callers can never both take the last copy.
pub async fn decrease_available<C>(client: &C, book_id: BookId) -> Result<(), InventoryError>
where
    C: GenericClient + Sync,
{
    let rows = client
        .query(
            "UPDATE books SET available_quantity = available_quantity - 1 \
             WHERE external_id = $1 AND available_quantity > 0 RETURNING available_quantity",
            &[&book_id],
        )
        .await?;

    if rows.is_empty() {
        let book = client
            .query_opt("SELECT 1 FROM books WHERE external_id = $1", &[&book_id])
            .await?;
        return Err(match book {
            Some(_) => InventoryError::InsufficientStock(book_id),
            None => InventoryError::BookNotFound(book_id),
        });
    }
    Ok(())
}

/// Puts one copy of the book back using the given client or transaction, capped at total_quantity
pub async fn increase_available<C>(client: &C, book_id: BookId) -> Result<(), InventoryError>
where
    C: GenericClient + Sync,
{
    let rows = client
        .query(
            "UPDATE books SET available_quantity = LEAST(available_quantity + 1, total_quantity) \
             WHERE external_id = $1 RETURNING available_quantity",
            &[&book_id],
        )
        .await?;

    if rows.is_empty() {
        Err(InventoryError::BookNotFound(book_id))
    } else {
        Ok(())
    }
}

fn row_to_book(row: &Row) -> Result<Book, tokio_postgres::Error> {
    Ok(Book {
        external_id: row.try_get(0)?,
        title: row.try_get(1)?,
        total_quantity: row.try_get(2)?,
        available_quantity: row.try_get(3)?,
        daily_rate: row.try_get(4)?,
    })
}

#[async_trait::async_trait]
impl InventoryLedger for PostgresInventoryLedger {
    async fn save_book(&self, book: Book) -> Result<(), InventoryError> {
        validate_book(&book)?;
        self.client
            .execute(
                "INSERT INTO books (external_id, title, total_quantity, available_quantity, daily_rate) \
                 VALUES ($1, $2, $3, $4, $5) \
                 ON CONFLICT (external_id) DO UPDATE SET title = EXCLUDED.title, \
                 total_quantity = EXCLUDED.total_quantity, \
                 available_quantity = EXCLUDED.available_quantity, \
                 daily_rate = EXCLUDED.daily_rate",
                &[
                    &book.external_id,
                    &book.title,
                    &book.total_quantity,
                    &book.available_quantity,
                    &book.daily_rate,
                ],
            )
            .await?;
        Ok(())
    }

    async fn find_by_external_id(&self, book_id: BookId) -> Result<Option<Book>, InventoryError> {
        let row = self
            .client
            .query_opt(
                "SELECT external_id, title, total_quantity, available_quantity, daily_rate \
                 FROM books WHERE external_id = $1",
                &[&book_id],
            )
            .await?;

        Ok(row.as_ref().map(row_to_book).transpose()?)
    }

    async fn list_books(&self) -> Result<Vec<Book>, InventoryError> {
        let rows = self
            .client
            .query(
                "SELECT external_id, title, total_quantity, available_quantity, daily_rate \
                 FROM books ORDER BY external_id",
                &[],
            )
            .await?;

        rows.iter()
            .map(|row| Ok(row_to_book(row)?))
            .collect()
    }

    async fn decrease(&self, book_id: BookId) -> Result<(), InventoryError> {
        decrease_available(&self.client, book_id).await
    }

    async fn increase(&self, book_id: BookId) -> Result<(), InventoryError> {
        increase_available(&self.client, book_id).await
    }
}
