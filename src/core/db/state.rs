use anyhow::Context;
use sqlx::{
    Sqlite,
    pool::PoolConnection,
    sqlite::{
        SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
    },
};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub(super) struct DbState {
    db_file: PathBuf,
    pool: SqlitePool,
}

impl std::fmt::Debug for DbState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbState")
            .field("db_file", &self.db_file)
            .finish()
    }
}

impl DbState {
    /// Acquire a pooled connection
    pub(super) async fn conn(&self) -> anyhow::Result<PoolConnection<Sqlite>> {
        let conn = self
            .pool
            .acquire()
            .await
            .with_context(|| format!("Failed to acquire connection to {:?}", self.db_file))?;
        Ok(conn)
    }

    pub(super) async fn new<P: AsRef<Path>>(db_file: P) -> anyhow::Result<Self> {
        let db_file = db_file.as_ref().to_path_buf();

        if let Some(parent) = db_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create database directory {:?}", parent))?;
            }
        }

        let connect_opts = SqliteConnectOptions::new()
            .filename(&db_file)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_opts)
            .await
            .with_context(|| format!("Failed to open database {:?}", db_file))?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { db_file, pool })
    }

    /// Flush the WAL and release file handles
    pub(super) async fn close(&self) -> anyhow::Result<()> {
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE);")
            .execute(&self.pool)
            .await?;
        self.pool.close().await;
        Ok(())
    }
}
