pub mod api;

pub mod inventory_ledger;
