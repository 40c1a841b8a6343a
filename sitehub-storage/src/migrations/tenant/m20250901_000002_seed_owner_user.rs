use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ConnectionTrait, DatabaseBackend};

use super::SEED_OWNER_EMAIL;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Insert-if-absent keyed on the unique email column
        let sql = match manager.get_database_backend() {
            DatabaseBackend::MySql => format!(
                "INSERT IGNORE INTO users (email, name) VALUES ('{SEED_OWNER_EMAIL}', 'Owner')"
            ),
            DatabaseBackend::Sqlite => format!(
                "INSERT OR IGNORE INTO users (email, name) VALUES ('{SEED_OWNER_EMAIL}', 'Owner')"
            ),
            _ => format!(
                "INSERT INTO users (email, name) VALUES ('{SEED_OWNER_EMAIL}', 'Owner') ON CONFLICT (email) DO NOTHING"
            ),
        };

        manager.get_connection().execute_unprepared(&sql).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(&format!("DELETE FROM users WHERE email = '{SEED_OWNER_EMAIL}'"))
            .await?;
        Ok(())
    }
}
