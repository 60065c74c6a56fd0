//! Lazily-initialized SQL persistence.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DbBackend, DbConn, DbErr, Statement,
};
use sea_orm_migration::MigratorTrait;
use tokio::sync::OnceCell;

use globe_core::error::RepoError;
use globe_core::ports::{InitState, StorageHealth, StorageProbe};

use super::config::DatabaseConfig;
use super::migration::Migrator;

/// Owns the database connection pool and brings it up on first use.
///
/// The first caller connects, pings, creates the schema and applies the
/// migrations; concurrent callers wait on that same attempt. A failed attempt
/// leaves the state at [`InitState::Failed`] and the next caller retries.
pub struct SqlPersistence {
    config: DatabaseConfig,
    conn: OnceCell<DbConn>,
    state: Mutex<InitState>,
}

impl SqlPersistence {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            conn: OnceCell::new(),
            state: Mutex::new(InitState::Uninitialized),
        }
    }

    /// Build a persistence layer over an already-open connection.
    pub fn from_connection(config: DatabaseConfig, conn: DbConn) -> Self {
        Self {
            config,
            conn: OnceCell::new_with(Some(conn)),
            state: Mutex::new(InitState::Ready),
        }
    }

    /// The shared connection, initializing it if needed.
    pub async fn connection(&self) -> Result<DbConn, RepoError> {
        self.conn
            .get_or_try_init(|| self.initialize())
            .await
            .cloned()
    }

    fn set_state(&self, state: InitState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    async fn initialize(&self) -> Result<DbConn, RepoError> {
        self.set_state(InitState::Initializing);
        tracing::info!(
            database = %self.config.database_name,
            transport = ?self.config.transport(),
            "Initializing database"
        );

        match self.connect_and_migrate().await {
            Ok(conn) => {
                tracing::info!("Database initialization completed");
                self.set_state(InitState::Ready);
                Ok(conn)
            }
            Err(e) => {
                let message = e.to_string();
                tracing::error!(error = %message, "Database initialization failed");
                self.set_state(InitState::Failed(message.clone()));
                Err(RepoError::Connection(message))
            }
        }
    }

    async fn open(&self) -> Result<DbConn, DbErr> {
        let options = ConnectOptions::new(self.config.connection_url())
            .max_connections(self.config.max_connections)
            .min_connections(self.config.min_connections)
            .connect_timeout(Duration::from_secs(20))
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(300))
            .set_schema_search_path(self.config.schema())
            .sqlx_logging(false)
            .to_owned();

        Database::connect(options).await
    }

    async fn connect_and_migrate(&self) -> Result<DbConn, DbErr> {
        let db = self.open().await?;
        db.ping().await?;
        tracing::info!("Successfully pinged database server");

        let schema = self.config.schema();
        db.execute_unprepared(&format!("CREATE SCHEMA IF NOT EXISTS \"{schema}\""))
            .await?;
        Migrator::up(&db, None).await?;
        tracing::info!(schema = %schema, "Blog collections ready");

        Ok(db)
    }
}

fn names(rows: Vec<sea_orm::QueryResult>) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.try_get::<String>("", "name").ok())
        .collect()
}

#[async_trait]
impl StorageHealth for SqlPersistence {
    async fn ensure_ready(&self) -> Result<(), RepoError> {
        self.connection().await.map(|_| ())
    }

    fn state(&self) -> InitState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn probe(&self) -> Result<StorageProbe, RepoError> {
        let connection_err = |e: DbErr| RepoError::Connection(e.to_string());

        let db = self.open().await.map_err(connection_err)?;
        db.ping().await.map_err(connection_err)?;

        let databases = db
            .query_all(Statement::from_string(
                DbBackend::Postgres,
                "SELECT datname::text AS name FROM pg_database \
                 WHERE NOT datistemplate ORDER BY datname",
            ))
            .await
            .map_err(connection_err)?;

        let collections = db
            .query_all(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT table_name::text AS name FROM information_schema.tables \
                 WHERE table_schema = $1 ORDER BY table_name",
                [self.config.schema().into()],
            ))
            .await
            .map_err(connection_err)?;

        if let Err(e) = db.close().await {
            tracing::debug!(error = %e, "Closing probe connection failed");
        }

        Ok(StorageProbe {
            backend: "postgres",
            databases: names(databases),
            collections: names(collections),
        })
    }
}
