use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// External id of the book, shared with the catalog it was ingested from
pub type BookId = i32;

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Book {
    pub external_id: BookId,
    pub title: String,
    /// Number of copies owned by the library
    pub total_quantity: i32,
    /// Number of copies on the shelf, always between 0 and total_quantity
    pub available_quantity: i32,
    /// Current price of renting the book for a single day
    pub daily_rate: Decimal,
}
