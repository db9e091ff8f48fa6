/*!
 * Shared handle to the history database.
 *
 * One SQLite connection sits behind a mutex and every query runs on tokio's
 * blocking pool. Opening a handle always brings the schema up to date, so a
 * fresh file and an in-memory database behave the same.
 */

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::schema;

const HISTORY_FILENAME: &str = "history.db";
const APP_DIRNAME: &str = "multitrans";
const IN_MEMORY: &str = ":memory:";

/// Cloneable handle; clones share one connection
#[derive(Clone)]
pub struct DatabaseConnection {
    db_path: PathBuf,
    connection: Arc<Mutex<Connection>>,
}

impl DatabaseConnection {
    /// Open the history file in the per-user data directory
    pub fn new_default() -> Result<Self> {
        Self::new(Self::default_database_path()?)
    }

    /// Open `db_path`, creating the file and its directories when missing
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(dir) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).with_context(|| format!("Cannot create {}", dir.display()))?;
        }

        info!("Opening history database at {}", db_path.display());
        let conn = Connection::open(&db_path).with_context(|| format!("Cannot open {}", db_path.display()))?;
        Self::from_connection(conn, db_path)
    }

    /// Throwaway database that lives as long as the handle
    pub fn new_in_memory() -> Result<Self> {
        debug!("Opening in-memory history database");
        let conn = Connection::open_in_memory().context("Cannot open in-memory database")?;
        Self::from_connection(conn, PathBuf::from(IN_MEMORY))
    }

    fn from_connection(conn: Connection, db_path: PathBuf) -> Result<Self> {
        schema::initialize_schema(&conn)?;
        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// `<data dir>/multitrans/history.db`, falling back to `~/.local/share`
    pub fn default_database_path() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
            .ok_or_else(|| anyhow!("No data directory for the history database"))?;
        Ok(data_dir.join(APP_DIRNAME).join(HISTORY_FILENAME))
    }

    /// File path, or `:memory:`
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn lock(connection: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
        connection
            .lock()
            .map_err(|_| anyhow!("History database lock poisoned"))
    }

    /// Run `f` against the connection on the blocking pool
    pub async fn execute_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || f(&*Self::lock(&connection)?))
            .await
            .context("History database task panicked")?
    }
}
