/// Snapshot persistence
///
/// The last successfully scraped snapshot is kept under a fixed key so the
/// service can keep answering requests while the upstream page is down.
/// Writes are last-write-wins; there is no history, only the latest copy.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use postgres::Client;

use crate::model::Snapshot;

/// Key under which the latest water-level snapshot lives.
pub const WATER_LEVEL_KEY: &str = "water_level_latest";

/// Snapshot persistence error
#[derive(Debug)]
pub enum StoreError {
    /// Snapshot could not be serialized or deserialized
    Serialization(serde_json::Error),
    /// Backend query failed
    Database(postgres::Error),
    /// Store mutex was poisoned by a panicking holder
    Poisoned,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Serialization(e) => write!(f, "Snapshot serialization failed: {}", e),
            StoreError::Database(e) => write!(f, "Snapshot store query failed: {}", e),
            StoreError::Poisoned => write!(f, "Snapshot store lock poisoned"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Serialization(e) => Some(e),
            StoreError::Database(e) => Some(e),
            StoreError::Poisoned => None,
        }
    }
}

/// Where snapshots live. The orchestrator only sees this trait, so tests
/// swap in the in-memory store and deployments pick Postgres when a
/// database is reachable.
pub trait SnapshotStore: Send + Sync {
    /// Fetch the snapshot stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Snapshot>, StoreError>;

    /// Replace whatever is stored under `key`.
    fn put(&self, key: &str, snapshot: &Snapshot) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Volatile store. Used in tests and as the fallback when the service
/// starts without a reachable database.
#[derive(Default)]
pub struct MemorySnapshotStore {
    inner: Mutex<HashMap<String, Snapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn get(&self, key: &str) -> Result<Option<Snapshot>, StoreError> {
        let map = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &str, snapshot: &Snapshot) -> Result<(), StoreError> {
        let mut map = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        map.insert(key.to_string(), snapshot.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Postgres store
// ---------------------------------------------------------------------------

/// Postgres-backed store. One row per key in floodwatch.snapshots, the
/// snapshot body held as JSONB.
pub struct PostgresSnapshotStore {
    // postgres::Client is not Sync; the endpoint worker pool shares this
    // store, so access is serialized through a mutex.
    client: Mutex<Client>,
}

impl PostgresSnapshotStore {
    pub fn new(client: Client) -> Self {
        Self {
            client: Mutex::new(client),
        }
    }
}

impl SnapshotStore for PostgresSnapshotStore {
    fn get(&self, key: &str) -> Result<Option<Snapshot>, StoreError> {
        let mut client = self.client.lock().map_err(|_| StoreError::Poisoned)?;
        let row = client
            .query_opt(
                "SELECT body FROM floodwatch.snapshots WHERE snapshot_key = $1",
                &[&key],
            )
            .map_err(StoreError::Database)?;

        match row {
            Some(row) => {
                let body: serde_json::Value = row.get(0);
                let snapshot =
                    serde_json::from_value(body).map_err(StoreError::Serialization)?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, snapshot: &Snapshot) -> Result<(), StoreError> {
        let body = serde_json::to_value(snapshot).map_err(StoreError::Serialization)?;
        let mut client = self.client.lock().map_err(|_| StoreError::Poisoned)?;
        client
            .execute(
                "INSERT INTO floodwatch.snapshots (snapshot_key, body, stored_at) \
                 VALUES ($1, $2, $3) \
                 ON CONFLICT (snapshot_key) \
                 DO UPDATE SET body = EXCLUDED.body, stored_at = EXCLUDED.stored_at",
                &[&key, &body, &Utc::now()],
            )
            .map_err(StoreError::Database)?;
        Ok(())
    }
}
