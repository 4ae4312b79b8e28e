use std::collections::HashMap;

use crate::api::{Book, BookId};
use crate::inventory_ledger::{validate_book, InventoryError, InventoryLedger};

/// Ledger kept in process memory.
/// Every count update happens under the write lock, so updates on the same book are serialized.
#[derive(Default)]
pub struct InMemoryInventoryLedger {
    books: parking_lot::RwLock<HashMap<BookId, Book>>,
}

impl InMemoryInventoryLedger {
    /// Synchronous form of decrease, usable while the caller holds its own locks
    pub fn take_copy(&self, book_id: BookId) -> Result<(), InventoryError> {
        let mut locked_books = self.books.write();
        let book = locked_books
            .get_mut(&book_id)
            .ok_or(InventoryError::BookNotFound(book_id))?;

        if book.available_quantity <= 0 {
            return Err(InventoryError::InsufficientStock(book_id));
        }
        book.available_quantity -= 1;
        Ok(())
    }

    /// Synchronous form of increase, usable while the caller holds its own locks
    pub fn put_back_copy(&self, book_id: BookId) -> Result<(), InventoryError> {
        let mut locked_books = self.books.write();
        let book = locked_books
            .get_mut(&book_id)
            .ok_or(InventoryError::BookNotFound(book_id))?;

        if book.available_quantity >= book.total_quantity {
            tracing::warn!(
                "Book {} already has all {} copies on the shelf",
                book_id,
                book.total_quantity
            );
            return Ok(());
        }
        book.available_quantity += 1;
        Ok(())
    }
}

#[async_trait::async_trait]
impl InventoryLedger for InMemoryInventoryLedger {
    async fn save_book(&self, book: Book) -> Result<(), InventoryError> {
        validate_book(&book)?;
        self.books.write().insert(book.external_id, book);
        Ok(())
    }

    async fn find_by_external_id(&self, book_id: BookId) -> Result<Option<Book>, InventoryError> {
        Ok(self.books.read().get(&book_id).cloned())
    }

    async fn list_books(&self) -> Result<Vec<Book>, InventoryError> {
        let mut books: Vec<Book> = self.books.read().values().cloned().collect();
        books.sort_by_key(|book| book.external_id);
        Ok(books)
    }

    async fn decrease(&self, book_id: BookId) -> Result<(), InventoryError> {
        self.take_copy(book_id)
    }

    async fn increase(&self, book_id: BookId) -> Result<(), InventoryError> {
        self.put_back_copy(book_id)
    }
}
