// Store persistence module
// Loads the JSON document at startup and writes snapshots through one ordered queue

use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};

use super::error::StoreError;
use super::Tables;
use crate::logger;

enum PersistCommand {
    /// Full serialized store, replaces the file contents
    Write(Vec<u8>),
    /// Acknowledged once every earlier snapshot has been written
    Flush(oneshot::Sender<()>),
}

/// Handle to the single writer task owning the database file
pub struct PersistQueue {
    tx: mpsc::UnboundedSender<PersistCommand>,
}

impl PersistQueue {
    /// Spawn the writer task for `path`. Must be called inside a tokio runtime.
    pub fn spawn(path: PathBuf) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(path, rx));
        Self { tx }
    }

    /// Queue a snapshot without waiting for the write
    pub fn enqueue(&self, snapshot: Vec<u8>) {
        if self.tx.send(PersistCommand::Write(snapshot)).is_err() {
            logger::log_error("Persist queue closed, snapshot dropped");
        }
    }

    /// Wait until all snapshots queued before this call are on disk
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(PersistCommand::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

async fn run_writer(path: PathBuf, mut rx: mpsc::UnboundedReceiver<PersistCommand>) {
    while let Some(command) = rx.recv().await {
        let mut snapshot = match command {
            PersistCommand::Write(snapshot) => snapshot,
            PersistCommand::Flush(ack) => {
                let _ = ack.send(());
                continue;
            }
        };

        // Only the newest queued snapshot matters; flushes that arrived
        // meanwhile are answered after it is written.
        let mut acks = Vec::new();
        while let Ok(next) = rx.try_recv() {
            match next {
                PersistCommand::Write(newer) => snapshot = newer,
                PersistCommand::Flush(ack) => acks.push(ack),
            }
        }

        if let Err(e) = write_snapshot(&path, &snapshot).await {
            logger::log_persist_failed(&path, &e);
        }

        for ack in acks {
            let _ = ack.send(());
        }
    }
}

async fn write_snapshot(path: &Path, snapshot: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, snapshot).await?;
    Ok(())
}

/// Serialize every table into the on-disk document
pub fn encode(tables: &Tables) -> Result<Vec<u8>, StoreError> {
    Ok(serde_json::to_vec(tables)?)
}

/// Move an unreadable document aside to `<path>.bak`, returning the new path
pub async fn backup(path: &Path) -> Result<PathBuf, StoreError> {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    let backup = PathBuf::from(name);
    tokio::fs::rename(path, &backup).await?;
    Ok(backup)
}

/// Read the document at `path`
pub async fn load(path: &Path) -> Result<Tables, StoreError> {
    let content = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&content)?)
}
