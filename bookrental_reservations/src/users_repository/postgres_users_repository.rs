use anyhow::Context;
use serde_json::json;
use tokio_postgres::{Client, NoTls, Statement};

use crate::api::{UserDetails, UserId};
use crate::users_repository::{UsersRepository, UsersRepositoryError};

pub struct PostgresUsersRepositoryConfig {
    pub hostname: String,
    pub username: String,
    pub password: String,
}

pub struct PostgresUsersRepository {
    client: Client,
}

impl PostgresUsersRepository {
    pub async fn init(config: PostgresUsersRepositoryConfig) -> anyhow::Result<Self> {
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

        client
            .batch_execute(
                "
        CREATE TABLE IF NOT EXISTS users (
            id              SERIAL PRIMARY KEY,
            params          JSONB
            )
        ",
            )
            .await
            .context("Failed to setup users table")?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl UsersRepository for PostgresUsersRepository {
    async fn add_user(&self, details: UserDetails) -> Result<UserId, UsersRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("INSERT INTO users (params) VALUES ($1) RETURNING id")
            .await?;

        let rows = self.client.query(&stmt, &[&json!(details)]).await?;

        let user_id: UserId = rows
            .first()
            .ok_or_else(|| UsersRepositoryError::Other("Id not returned".to_string()))?
            .try_get(0)?;

        Ok(user_id)
    }

    async fn get_user(&self, id: UserId) -> Result<UserDetails, UsersRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT params FROM users WHERE id = ($1)")
            .await?;

        let rows = self.client.query(&stmt, &[&id]).await?;

        let details: serde_json::Value = rows
            .first()
            .ok_or(UsersRepositoryError::UserNotFound(id))?
            .try_get(0)?;

        Ok(serde_json::from_value(details)?)
    }

    async fn get_all_user_ids(&self) -> Result<Vec<UserId>, UsersRepositoryError> {
        let stmt: Statement = self.client.prepare("SELECT id FROM users ORDER BY id").await?;
        let rows = self.client.query(&stmt, &[]).await?;
        rows.iter().map(|row| Ok(row.try_get(0)?)).collect()
    }
}
