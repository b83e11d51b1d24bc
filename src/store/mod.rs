//! Table store
//!
//! Keeps every table in memory and mirrors it to a single JSON document.
//! Mutations take the write lock, apply the change, then enqueue a snapshot
//! of the whole store while still holding the lock, so snapshots reach the
//! writer task in mutation order. Callers never wait for the disk.

mod error;
mod persist;
mod task;

use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use uuid::Uuid;

pub use error::StoreError;
pub use task::{NewTask, Table, Task, TaskPatch, TaskSearch};

use crate::logger;
use persist::PersistQueue;

/// In-memory image of the database file
pub(crate) type Tables = BTreeMap<Table, Vec<Task>>;

pub struct Store {
    path: PathBuf,
    tables: RwLock<Tables>,
    queue: PersistQueue,
}

impl Store {
    /// Load the store from `path`.
    ///
    /// A missing or unreadable file is not an error: the store starts empty
    /// and the empty document is written back immediately. An existing file
    /// that fails to parse is first moved to `<path>.bak`; if that fails the
    /// file is left in place and nothing is written until the next mutation.
    pub async fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let queue = PersistQueue::spawn(path.clone());

        let tables = match persist::load(&path).await {
            Ok(tables) => {
                let count: usize = tables.values().map(Vec::len).sum();
                logger::log_store_loaded(&path, count);
                tables
            }
            Err(e) => {
                logger::log_store_initialized(&path, &e);
                let tables = Tables::new();
                if e.is_missing_file() || keep_unreadable(&path).await {
                    match persist::encode(&tables) {
                        Ok(snapshot) => queue.enqueue(snapshot),
                        Err(e) => logger::log_persist_failed(&path, &e),
                    }
                }
                tables
            }
        };

        Self {
            path,
            tables: RwLock::new(tables),
            queue,
        }
    }

    /// Records of `table` in insertion order, optionally filtered by `search`
    pub async fn select(&self, table: Table, search: Option<&TaskSearch>) -> Vec<Task> {
        let tables = self.tables.read().await;
        let Some(rows) = tables.get(&table) else {
            return Vec::new();
        };

        match search {
            Some(search) => rows.iter().filter(|row| search.matches(row)).cloned().collect(),
            None => rows.clone(),
        }
    }

    pub async fn len(&self, table: Table) -> usize {
        self.tables.read().await.get(&table).map_or(0, Vec::len)
    }

    /// Append `record` under a fresh id and return the stored task
    pub async fn insert(&self, table: Table, record: NewTask) -> Task {
        let task = record.with_id(new_id());

        let mut tables = self.tables.write().await;
        tables.entry(table).or_default().push(task.clone());
        self.persist(&tables);

        task
    }

    /// Append every record, each under its own fresh id
    pub async fn insert_many(&self, table: Table, records: Vec<NewTask>) -> Vec<Task> {
        let tasks: Vec<Task> = records
            .into_iter()
            .map(|record| record.with_id(new_id()))
            .collect();

        let mut tables = self.tables.write().await;
        tables.entry(table).or_default().extend(tasks.iter().cloned());
        self.persist(&tables);

        tasks
    }

    /// Sparse-merge `patch` into the record with `id`
    pub async fn update(&self, table: Table, id: &str, patch: &TaskPatch) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let row = tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|row| row.id == id))
            .ok_or_else(|| not_found(table, id))?;

        patch.apply(row, Utc::now());
        self.persist(&tables);
        Ok(())
    }

    pub async fn delete(&self, table: Table, id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let rows = tables.get_mut(&table).ok_or_else(|| not_found(table, id))?;
        let index = rows
            .iter()
            .position(|row| row.id == id)
            .ok_or_else(|| not_found(table, id))?;

        rows.remove(index);
        self.persist(&tables);
        Ok(())
    }

    /// Wait until every mutation made so far has been written to disk
    pub async fn flush(&self) {
        self.queue.flush().await;
    }

    fn persist(&self, tables: &Tables) {
        match persist::encode(tables) {
            Ok(snapshot) => self.queue.enqueue(snapshot),
            Err(e) => logger::log_persist_failed(&self.path, &e),
        }
    }
}

/// Returns whether the old file was moved out of the way
async fn keep_unreadable(path: &Path) -> bool {
    match persist::backup(path).await {
        Ok(backup) => {
            logger::log_store_backed_up(path, &backup);
            true
        }
        Err(e) => {
            logger::log_persist_failed(path, &e);
            false
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn not_found(table: Table, id: &str) -> StoreError {
    StoreError::NotFound {
        table,
        id: id.to_string(),
    }
}
