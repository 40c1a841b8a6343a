//! Process-wide tenant connection cache
//!
//! One entry per `db_url`. The entry is published into the map before any I/O
//! happens, so concurrent first requests for a tenant converge on the same
//! entry; the connection and the model bindings inside it are each initialised
//! through a `OnceCell`, which runs the initialiser exactly once even under
//! contention and never holds the map lock across an await.
//!
//! Retiring a `db_url` closes its entry and refuses any later lookup, so a
//! request that loaded a tenant just before removal cannot cache its pool again.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use sea_orm::{ConnectOptions, Database, DatabaseConnection as SeaConnection, EntityTrait, PaginatorTrait};
use sea_orm_migration::MigratorTrait;
use sitehub_config::PoolConfig;
use sitehub_storage::{redact_database_url, TenantMigrator, TenantUser, TenantUserColumn, TenantUsers};
use tokio::sync::{watch, OnceCell};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::PoolError;

/// Schema bindings for one tenant connection
#[derive(Debug, Clone)]
pub struct TenantModels {
    connection: SeaConnection,
    applied_migrations: Vec<String>,
}

impl TenantModels {
    pub fn new(connection: SeaConnection, applied_migrations: Vec<String>) -> Self {
        Self {
            connection,
            applied_migrations,
        }
    }

    /// Migration names applied to this tenant database when it was bound
    pub fn applied_migrations(&self) -> &[String] {
        &self.applied_migrations
    }

    pub async fn count_users(&self) -> Result<u64, PoolError> {
        Ok(TenantUsers::find().count(&self.connection).await?)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<TenantUser>, PoolError> {
        use sea_orm::{ColumnTrait, QueryFilter};

        Ok(TenantUsers::find()
            .filter(TenantUserColumn::Email.eq(email))
            .one(&self.connection)
            .await?)
    }
}

/// Builds the model bindings for a tenant connection
#[async_trait]
pub trait ModelBinder: Send + Sync {
    async fn bind(&self, connection: &SeaConnection) -> Result<TenantModels, PoolError>;
}

/// Binds the tenant repositories after reading which migrations are applied
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaModelBinder;

#[async_trait]
impl ModelBinder for SchemaModelBinder {
    async fn bind(&self, connection: &SeaConnection) -> Result<TenantModels, PoolError> {
        let applied = TenantMigrator::get_applied_migrations(connection)
            .await
            .map_err(|e| PoolError::ModelInit(e.to_string()))?
            .iter()
            .map(|migration| migration.name().to_string())
            .collect();
        Ok(TenantModels::new(connection.clone(), applied))
    }
}

/// Pooled connection plus the models bound to it
#[derive(Debug, Clone)]
pub struct TenantHandle {
    pub connection: SeaConnection,
    pub models: Arc<TenantModels>,
}

struct TenantEntry {
    connection: OnceCell<SeaConnection>,
    models: OnceCell<Arc<TenantModels>>,
    last_used_at: Mutex<Instant>,
}

impl TenantEntry {
    fn new() -> Self {
        Self {
            connection: OnceCell::new(),
            models: OnceCell::new(),
            last_used_at: Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        *self.last_used_at.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_used_at.lock().unwrap_or_else(|e| e.into_inner()).elapsed()
    }

    async fn close(&self) -> Result<(), sea_orm::DbErr> {
        match self.connection.get() {
            Some(connection) => connection.clone().close().await,
            None => Ok(()),
        }
    }
}

/// Cache of tenant pools keyed by connection string
pub struct TenantPoolManager {
    config: PoolConfig,
    binder: Arc<dyn ModelBinder>,
    entries: DashMap<String, Arc<TenantEntry>>,
    retired: DashSet<String>,
    connections_opened: AtomicUsize,
    shutdown_tx: watch::Sender<bool>,
}

impl TenantPoolManager {
    pub fn new(config: PoolConfig, binder: Arc<dyn ModelBinder>) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            config,
            binder,
            entries: DashMap::new(),
            retired: DashSet::new(),
            connections_opened: AtomicUsize::new(0),
            shutdown_tx,
        }
    }

    /// Pooled connection for `db_url`, opened on first use
    pub async fn get(&self, db_url: &str) -> Result<SeaConnection, PoolError> {
        let entry = self.entry(db_url).await?;
        entry.touch();
        Ok(self.connection_for(&entry, db_url).await?.clone())
    }

    /// Pooled connection plus model bindings, both initialised at most once
    pub async fn get_with_models(&self, db_url: &str) -> Result<TenantHandle, PoolError> {
        let entry = self.entry(db_url).await?;
        entry.touch();
        let connection = self.connection_for(&entry, db_url).await?.clone();

        let models = entry
            .models
            .get_or_try_init(|| async {
                debug!(db = %redact_database_url(db_url), "Binding tenant models");
                self.binder.bind(&connection).await.map(Arc::new)
            })
            .await?
            .clone();

        Ok(TenantHandle { connection, models })
    }

    /// Close and evict one entry. Returns whether an entry existed.
    pub async fn close(&self, db_url: &str) -> Result<bool, PoolError> {
        let Some((_, entry)) = self.entries.remove(db_url) else {
            return Ok(false);
        };
        entry.close().await?;
        debug!(db = %redact_database_url(db_url), "Closed tenant pool");
        Ok(true)
    }

    /// Close `db_url`'s entry and refuse every later lookup of it.
    /// Returns whether an entry existed.
    pub async fn retire(&self, db_url: &str) -> Result<bool, PoolError> {
        // Mark before evicting; `entry` checks the mark again after publishing
        self.retired.insert(db_url.to_string());
        self.close(db_url).await
    }

    pub fn is_retired(&self, db_url: &str) -> bool {
        self.retired.contains(db_url)
    }

    /// Close and evict every entry. Individual failures do not stop the rest.
    pub async fn close_all(&self) -> Result<usize, PoolError> {
        let keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        let total = keys.len();
        let mut failed = 0;

        for key in keys {
            if let Some((_, entry)) = self.entries.remove(&key) {
                if let Err(e) = entry.close().await {
                    warn!(db = %redact_database_url(&key), error = %e, "Failed to close tenant pool");
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(PoolError::CloseFailed { failed, total });
        }
        info!("Closed {} tenant pools", total);
        Ok(total)
    }

    /// Close every entry unused for longer than `max_idle`. Returns the count closed.
    pub async fn prune_idle(&self, max_idle: Duration) -> usize {
        let stale: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.value().idle_for() > max_idle)
            .map(|e| e.key().clone())
            .collect();

        let mut closed = 0;
        for key in stale {
            // Re-check under the shard lock; the entry may have been used meanwhile
            let Some((_, entry)) = self.entries.remove_if(&key, |_, e| e.idle_for() > max_idle) else {
                continue;
            };
            if let Err(e) = entry.close().await {
                warn!(db = %redact_database_url(&key), error = %e, "Failed to close idle tenant pool");
            }
            closed += 1;
        }

        if closed > 0 {
            info!("Pruned {} idle tenant pools", closed);
        }
        closed
    }

    /// Run [`prune_idle`](Self::prune_idle) every `interval` until shutdown.
    pub fn spawn_pruner(self: &Arc<Self>, interval: Duration, max_idle: Duration) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        manager.prune_idle(max_idle).await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            debug!("Tenant pool pruner stopping");
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Stop the pruner and close every pool.
    pub async fn shutdown(&self) -> Result<usize, PoolError> {
        self.shutdown_tx.send_replace(true);
        self.close_all().await
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, db_url: &str) -> bool {
        self.entries.contains_key(db_url)
    }

    /// Total pools opened over the manager's lifetime
    pub fn connections_opened(&self) -> usize {
        self.connections_opened.load(Ordering::Relaxed)
    }

    async fn entry(&self, db_url: &str) -> Result<Arc<TenantEntry>, PoolError> {
        if self.retired.contains(db_url) {
            return Err(PoolError::Retired);
        }

        // The shard guard is dropped at the end of this statement
        let entry = Arc::clone(
            self.entries
                .entry(db_url.to_string())
                .or_insert_with(|| Arc::new(TenantEntry::new()))
                .value(),
        );

        // Retired between the check and the insert
        if self.retired.contains(db_url) {
            if let Some((_, stale)) = self.entries.remove(db_url) {
                if let Err(e) = stale.close().await {
                    warn!(db = %redact_database_url(db_url), error = %e, "Failed to close retired tenant pool");
                }
            }
            return Err(PoolError::Retired);
        }

        Ok(entry)
    }

    async fn connection_for<'e>(&self, entry: &'e TenantEntry, db_url: &str) -> Result<&'e SeaConnection, PoolError> {
        entry.connection.get_or_try_init(|| self.connect(db_url)).await
    }

    async fn connect(&self, db_url: &str) -> Result<SeaConnection, PoolError> {
        let mut opts = ConnectOptions::new(db_url.to_string());
        opts.max_connections(self.config.max_connections)
            .min_connections(self.config.min_connections)
            .connect_timeout(self.config.acquire_timeout)
            .acquire_timeout(self.config.acquire_timeout)
            .idle_timeout(self.config.idle_timeout)
            .sqlx_logging(false);

        let connection = tokio::time::timeout(self.config.acquire_timeout, Database::connect(opts))
            .await
            .map_err(|_| PoolError::AcquireTimeout)??;

        self.connections_opened.fetch_add(1, Ordering::Relaxed);
        info!(db = %redact_database_url(db_url), "Opened tenant pool");
        Ok(connection)
    }
}
