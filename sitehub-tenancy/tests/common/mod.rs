#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::DbErr;
use sitehub_config::{DatabaseConfig, ProvisioningConfig};
use sitehub_storage::DatabaseConnection;
use sitehub_tenancy::{AdminExecutor, MigrationRunner, ProvisionError, Provisioner};

/// Records every administrative statement; optionally fails on a keyword
#[derive(Default)]
pub struct RecordingExecutor {
    pub statements: Mutex<Vec<String>>,
    pub fail_on: Mutex<Option<&'static str>>,
}

impl RecordingExecutor {
    pub fn failing_on(keyword: &'static str) -> Self {
        Self {
            fail_on: Mutex::new(Some(keyword)),
            ..Default::default()
        }
    }

    /// Let every later statement succeed
    pub fn recover(&self) {
        *self.fail_on.lock().unwrap() = None;
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }
}

#[async_trait]
impl AdminExecutor for RecordingExecutor {
    async fn execute(&self, statement: &str) -> Result<(), ProvisionError> {
        self.statements.lock().unwrap().push(statement.to_string());
        let fail_on = *self.fail_on.lock().unwrap();
        match fail_on {
            Some(keyword) if statement.starts_with(keyword) => {
                Err(ProvisionError::Statement(DbErr::Custom(format!("{keyword} denied"))))
            }
            _ => Ok(()),
        }
    }
}

/// Records migration targets without connecting anywhere
#[derive(Default)]
pub struct RecordingRunner {
    pub urls: Mutex<Vec<String>>,
}

impl RecordingRunner {
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MigrationRunner for RecordingRunner {
    async fn run(&self, tenant_db_url: &str) -> Result<(), ProvisionError> {
        self.urls.lock().unwrap().push(tenant_db_url.to_string());
        Ok(())
    }
}

pub fn provisioning_config() -> ProvisioningConfig {
    ProvisioningConfig {
        base_domain: "sitehub.test".to_string(),
        ..ProvisioningConfig::default()
    }
}

pub fn provisioner(executor: Arc<RecordingExecutor>, runner: Arc<dyn MigrationRunner>) -> Provisioner {
    Provisioner::new(provisioning_config(), executor, runner)
}

pub fn sqlite_config(url: &str) -> DatabaseConfig {
    DatabaseConfig {
        url: url.to_string(),
        max_connections: 1,
        min_connections: 1,
        connection_timeout: Duration::from_secs(5),
        idle_timeout: Duration::from_secs(600),
    }
}

/// Migrated registry in a temp file
pub async fn registry_db(dir: &tempfile::TempDir) -> DatabaseConnection {
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("registry.db").display());
    let db = DatabaseConnection::new(sqlite_config(&url)).await.unwrap();
    db.migrate_registry().await.unwrap();
    db
}

pub fn sqlite_url(dir: &tempfile::TempDir, name: &str) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join(name).display())
}
