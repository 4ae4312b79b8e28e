pub mod api;
pub mod backend;
pub mod clock;
pub mod error;
pub mod fees;
pub mod reservation;
pub mod reservation_service;
pub mod reservations_repository;
pub mod settings;
pub mod telemetry;
pub mod users_repository;
