pub use in_memory_inventory_ledger::InMemoryInventoryLedger;
pub use postgres_inventory_ledger::{
    create_books_table, decrease_available, increase_available, PostgresInventoryLedger,
    PostgresInventoryLedgerConfig,
};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::api::{Book, BookId};

/// Largest daily rate a ledger accepts, the upper bound of the NUMERIC(12, 2) rate column
pub const MAX_DAILY_RATE: Decimal = dec!(9999999999.99);

mod in_memory_inventory_ledger;
mod postgres_inventory_ledger;

#[derive(thiserror::Error, Debug)]
pub enum InventoryError {
    #[error("Book {0} not found")]
    BookNotFound(BookId),

    #[error("Book {0} has no copies left")]
    InsufficientStock(BookId),

    #[error("Book {book_id} has {available} copies available out of {total}")]
    InvalidQuantities {
        book_id: BookId,
        available: i32,
        total: i32,
    },

    #[error("Book {0} has negative daily rate")]
    NegativeDailyRate(BookId),

    #[error("Book {book_id} daily rate {daily_rate} is above {}", MAX_DAILY_RATE)]
    DailyRateTooHigh { book_id: BookId, daily_rate: Decimal },

    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),
}

/// Owner of the per-book copy counts.
/// No other component is allowed to write available_quantity.
#[async_trait::async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Stores the book, replacing the one with the same external id if present
    async fn save_book(&self, book: Book) -> Result<(), InventoryError>;

    /// Retrieves the book by its external id, None if it is not in the ledger
    async fn find_by_external_id(&self, book_id: BookId) -> Result<Option<Book>, InventoryError>;

    /// Lists all books in the ledger
    async fn list_books(&self) -> Result<Vec<Book>, InventoryError>;

    /// Takes one copy of the book off the shelf.
    /// Fails with InsufficientStock when no copy is available.
    async fn decrease(&self, book_id: BookId) -> Result<(), InventoryError>;

    /// Puts one copy of the book back on the shelf, never above total_quantity
    async fn increase(&self, book_id: BookId) -> Result<(), InventoryError>;
}

pub(crate) fn validate_book(book: &Book) -> Result<(), InventoryError> {
    if book.total_quantity < 0
        || book.available_quantity < 0
        || book.available_quantity > book.total_quantity
    {
        return Err(InventoryError::InvalidQuantities {
            book_id: book.external_id,
            available: book.available_quantity,
            total: book.total_quantity,
        });
    }
    if book.daily_rate < Decimal::ZERO {
        return Err(InventoryError::NegativeDailyRate(book.external_id));
    }
    if book.daily_rate > MAX_DAILY_RATE {
        return Err(InventoryError::DailyRateTooHigh {
            book_id: book.external_id,
            daily_rate: book.daily_rate,
        });
    }
    Ok(())
}
