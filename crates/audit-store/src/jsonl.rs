use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, warn};

use toolgate_gateway::{AuditQuery, AuditRecord, AuditSink, AuditStats, AuditStoreError};

enum WriterMsg {
    Record(Box<AuditRecord>),
    Flush(oneshot::Sender<()>),
}

/// Durable audit store: one JSON object per line, append-only.
///
/// Writes go through an unbounded channel to a background writer task, so
/// `append` never blocks the caller on file I/O; write failures are logged
/// and dropped, never surfaced to the execution path. Reads flush the
/// channel first so they observe every record appended before the query.
pub struct JsonlAuditStore {
    path: PathBuf,
    tx: mpsc::UnboundedSender<WriterMsg>,
}

impl JsonlAuditStore {
    /// Opens (or creates) the log file and starts the writer task. Must be
    /// called from within a tokio runtime.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, AuditStoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(writer_loop(file, rx));

        Ok(Self { path, tx })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Barrier: resolves once every previously appended record has been
    /// handed to the OS. Used before reads and at shutdown.
    pub async fn flush(&self) -> Result<(), AuditStoreError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(WriterMsg::Flush(ack_tx))
            .map_err(|_| AuditStoreError::WriterGone)?;
        ack_rx.await.map_err(|_| AuditStoreError::WriterGone)
    }

    fn read_all(&self) -> Result<Vec<AuditRecord>, AuditStoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditRecord>(&line) {
                Ok(record) => records.push(record),
                // A corrupt line loses one record, not the whole read path.
                Err(err) => warn!(line = index + 1, error = %err, "skipping corrupt audit line"),
            }
        }

        Ok(records)
    }
}

async fn writer_loop(mut file: File, mut rx: mpsc::UnboundedReceiver<WriterMsg>) {
    while let Some(msg) = rx.recv().await {
        match msg {
            WriterMsg::Record(record) => match serde_json::to_string(&record) {
                Ok(line) => {
                    if let Err(err) = writeln!(file, "{line}") {
                        error!(error = %err, tool = %record.tool, "failed to write audit record");
                    }
                }
                Err(err) => {
                    error!(error = %err, tool = %record.tool, "failed to serialize audit record")
                }
            },
            WriterMsg::Flush(ack) => {
                if let Err(err) = file.sync_all() {
                    error!(error = %err, "failed to sync audit log");
                }
                let _ = ack.send(());
            }
        }
    }
}

#[async_trait]
impl AuditSink for JsonlAuditStore {
    async fn append(&self, record: AuditRecord) -> Result<(), AuditStoreError> {
        self.tx
            .send(WriterMsg::Record(Box::new(record)))
            .map_err(|_| AuditStoreError::WriterGone)
    }
}

#[async_trait]
impl AuditQuery for JsonlAuditStore {
    async fn session_history(&self, session_id: &str) -> Result<Vec<AuditRecord>, AuditStoreError> {
        self.flush().await?;
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|record| record.session_id == session_id)
            .collect())
    }

    async fn stats(
        &self,
        tenant_id: &str,
        since: DateTime<Utc>,
    ) -> Result<AuditStats, AuditStoreError> {
        self.flush().await?;
        let records = self.read_all()?;
        Ok(AuditStats::from_records(records.iter().filter(|record| {
            record.tenant_id == tenant_id && record.created_at >= since
        })))
    }
}
