use std::sync::Arc;

use anyhow::Context;

use bookrental_inventory::inventory_ledger::{
    InMemoryInventoryLedger, InventoryLedger, PostgresInventoryLedger,
    PostgresInventoryLedgerConfig,
};

use crate::reservation_service::ReservationService;
use crate::reservations_repository::{
    InMemoryReservationsRepository, PostgresReservationsRepository,
    PostgresReservationsRepositoryConfig, ReservationsRepository,
};
use crate::settings::{Settings, StorageKind};
use crate::users_repository::{
    InMemoryUsersRepository, PostgresUsersRepository, PostgresUsersRepositoryConfig,
    UsersRepository,
};

/// Storage collaborators of the reservation service, all backed by the same storage engine
#[derive(Clone)]
pub struct RentalBackend {
    pub users_repository: Arc<dyn UsersRepository>,
    pub inventory_ledger: Arc<dyn InventoryLedger>,
    pub reservations_repository: Arc<dyn ReservationsRepository>,
}

impl RentalBackend {
    pub fn in_memory() -> Self {
        let inventory_ledger = Arc::new(InMemoryInventoryLedger::default());
        Self {
            users_repository: Arc::new(InMemoryUsersRepository::default()),
            reservations_repository: Arc::new(InMemoryReservationsRepository::new(
                inventory_ledger.clone(),
            )),
            inventory_ledger,
        }
    }

    pub async fn postgres(settings: &Settings) -> anyhow::Result<Self> {
        // The ledger goes first, the reservations table references its books table
        let inventory_ledger = PostgresInventoryLedger::init(PostgresInventoryLedgerConfig {
            hostname: settings.db_host.clone(),
            username: settings.db_username.clone(),
            password: settings.db_password.clone(),
        })
        .await
        .context("Failed to init inventory ledger")?;

        let users_repository = PostgresUsersRepository::init(PostgresUsersRepositoryConfig {
            hostname: settings.db_host.clone(),
            username: settings.db_username.clone(),
            password: settings.db_password.clone(),
        })
        .await
        .context("Failed to init users repository")?;

        let reservations_repository =
            PostgresReservationsRepository::init(PostgresReservationsRepositoryConfig {
                hostname: settings.db_host.clone(),
                username: settings.db_username.clone(),
                password: settings.db_password.clone(),
            })
            .await
            .context("Failed to init reservations repository")?;

        Ok(Self {
            users_repository: Arc::new(users_repository),
            inventory_ledger: Arc::new(inventory_ledger),
            reservations_repository: Arc::new(reservations_repository),
        })
    }

    pub async fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        match settings.storage {
            StorageKind::InMemory => Ok(Self::in_memory()),
            StorageKind::Postgres => Self::postgres(settings).await,
        }
    }

    pub fn reservation_service(&self) -> ReservationService {
        ReservationService::new(
            self.users_repository.clone(),
            self.inventory_ledger.clone(),
            self.reservations_repository.clone(),
        )
    }
}
