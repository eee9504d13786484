//! Log writer with time-based rotation

use chrono::{DateTime, Local, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use timeroll_core::{Result, TimeZoneMode};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::action::{self, ActionRunner};
use crate::policy::TimeBasedRollingPolicy;

const LINE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Log writer that rolls its file over on period boundaries
pub struct RollingFileWriter {
    policy: TimeBasedRollingPolicy,
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    runner: ActionRunner,
    /// Channel to broadcast new log lines
    broadcast_tx: Option<mpsc::Sender<String>>,
}

impl RollingFileWriter {
    /// Create a writer from an activated policy and open its active file
    pub fn new(policy: TimeBasedRollingPolicy) -> Result<Self> {
        let path = policy.active_file_path();
        let writer = open_append(&path)?;
        let runner = ActionRunner::spawn()?;

        debug!("Opened active log file {}", path.display());

        Ok(Self {
            policy,
            path,
            writer: Some(writer),
            runner,
            broadcast_tx: None,
        })
    }

    /// Set up broadcasting for live log streaming
    pub fn with_broadcast(mut self, tx: mpsc::Sender<String>) -> Self {
        self.broadcast_tx = Some(tx);
        self
    }

    /// Write a timestamped line to the log
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.write_line_at(line, Utc::now())
    }

    /// Write a timestamped line as if the current time were `now`.
    ///
    /// The stamp uses the same time zone as the file names, so a record's
    /// date always matches the file it lands in.
    pub fn write_line_at(&mut self, line: &str, now: DateTime<Utc>) -> Result<()> {
        self.roll_if_needed(now.timestamp_millis())?;

        let timestamp = match self.policy.template().time_zone() {
            TimeZoneMode::Utc => now.format(LINE_TIMESTAMP_FORMAT).to_string(),
            TimeZoneMode::Local => now.with_timezone(&Local).format(LINE_TIMESTAMP_FORMAT).to_string(),
        };
        let formatted = format!("[{}] {}\n", timestamp, line);
        self.append(formatted.as_bytes())?;

        // Broadcast to live subscribers
        if let Some(tx) = &self.broadcast_tx {
            // Non-blocking send
            let _ = tx.try_send(formatted);
        }

        Ok(())
    }

    /// Write raw bytes (without timestamp)
    pub fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.write_raw_at(data, Utc::now())
    }

    /// Write raw bytes as if the current time were `now`
    pub fn write_raw_at(&mut self, data: &[u8], now: DateTime<Utc>) -> Result<()> {
        self.roll_if_needed(now.timestamp_millis())?;
        self.append(data)?;

        if let Some(tx) = &self.broadcast_tx {
            if let Ok(line) = String::from_utf8(data.to_vec()) {
                let _ = tx.try_send(line);
            }
        }

        Ok(())
    }

    fn append(&mut self, data: &[u8]) -> Result<()> {
        let writer = self.writer()?;
        writer.write_all(data)?;
        writer.flush()?;
        Ok(())
    }

    /// Ask the policy whether to roll over and carry out the rollover.
    ///
    /// A failed synchronous action is returned to the caller so the pending
    /// record is not written; the active file is reopened either way.
    fn roll_if_needed(&mut self, now_millis: i64) -> Result<()> {
        if !self.policy.is_triggering_event(now_millis) {
            return Ok(());
        }

        let rollover = self.policy.rollover(now_millis);

        if !rollover.did_rollover {
            if rollover.active_file != self.path {
                self.close_current()?;
                self.open(rollover.active_file)?;
            }
            return Ok(());
        }

        info!(
            "Rolling over {} -> {}",
            self.path.display(),
            rollover.active_file.display()
        );

        self.close_current()?;
        let sync_result = action::run_all(&rollover.sync_actions);
        self.open(rollover.active_file)?;
        sync_result?;

        self.runner.submit(rollover.async_actions);
        Ok(())
    }

    fn close_current(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }

    fn open(&mut self, path: PathBuf) -> Result<()> {
        self.writer = Some(open_append(&path)?);
        self.path = path;
        Ok(())
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => open_append(&self.path)?,
        };
        Ok(self.writer.insert(writer))
    }

    /// Flush buffered data
    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Flush and wait for background compression to finish
    pub fn close(mut self) -> Result<()> {
        self.close_current()?;
        self.runner.shutdown();
        Ok(())
    }

    /// Get the active log file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> &TimeBasedRollingPolicy {
        &self.policy
    }
}

fn open_append(path: &Path) -> Result<BufWriter<File>> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(BufWriter::new(file))
}

/// Async capture of a byte stream (child output, stdin) into a rolling file
pub struct LogCapture {
    writer: RollingFileWriter,
    raw: bool,
}

impl LogCapture {
    pub fn new(writer: RollingFileWriter) -> Self {
        Self { writer, raw: false }
    }

    /// Copy lines verbatim instead of prefixing a timestamp
    pub fn raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    /// Spawn a task that copies the reader line by line until EOF.
    ///
    /// The task hands the writer back so the caller can close it.
    pub fn spawn_capture<R>(self, reader: R) -> tokio::task::JoinHandle<RollingFileWriter>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let Self { mut writer, raw } = self;

        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);

            if raw {
                let mut line = Vec::new();
                loop {
                    line.clear();
                    match reader.read_until(b'\n', &mut line).await {
                        Ok(0) => break,
                        Ok(_) => {
                            if let Err(e) = writer.write_raw(&line) {
                                warn!("Failed to write log data: {}", e);
                            }
                        }
                        Err(e) => {
                            warn!("Failed to read input: {}", e);
                            break;
                        }
                    }
                }
            } else {
                let mut lines = reader.lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if let Err(e) = writer.write_line(&line) {
                        warn!("Failed to write log line: {}", e);
                    }
                }
            }

            writer
        })
    }
}
