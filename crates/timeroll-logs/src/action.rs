//! Rollover actions and their executor
//!
//! Synchronous actions run on the writer's thread before the next record is
//! written. Asynchronous ones are handed to an [`ActionRunner`], a background
//! thread whose failures are logged and never reach the writer.

use crossbeam_channel::Sender;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use timeroll_core::{Error, Result};
use tracing::{debug, info, warn};

/// A side effect needed to complete a rollover
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolloverAction {
    /// Move a file; with `must_succeed` a failed move is an error
    Rename {
        from: PathBuf,
        to: PathBuf,
        must_succeed: bool,
    },
    /// Gzip `from` into `to`
    CompressGzip {
        from: PathBuf,
        to: PathBuf,
        delete_source: bool,
    },
    /// Zip `from` into a single-entry archive at `to`
    CompressZip {
        from: PathBuf,
        to: PathBuf,
        delete_source: bool,
    },
}

impl RolloverAction {
    /// Run the action.
    ///
    /// Returns `Ok(false)` when there was nothing to do (missing source for an
    /// optional rename or a compression).
    pub fn execute(&self) -> Result<bool> {
        match self {
            RolloverAction::Rename {
                from,
                to,
                must_succeed,
            } => rename(from, to, *must_succeed),
            RolloverAction::CompressGzip {
                from,
                to,
                delete_source,
            } => compress(from, to, *delete_source, gzip_file),
            RolloverAction::CompressZip {
                from,
                to,
                delete_source,
            } => compress(from, to, *delete_source, zip_file),
        }
    }

    /// File the action reads from
    pub fn source(&self) -> &Path {
        match self {
            RolloverAction::Rename { from, .. }
            | RolloverAction::CompressGzip { from, .. }
            | RolloverAction::CompressZip { from, .. } => from,
        }
    }

    /// File the action produces
    pub fn target(&self) -> &Path {
        match self {
            RolloverAction::Rename { to, .. }
            | RolloverAction::CompressGzip { to, .. }
            | RolloverAction::CompressZip { to, .. } => to,
        }
    }
}

/// Run actions in order, stopping at the first error
pub fn run_all(actions: &[RolloverAction]) -> Result<()> {
    for action in actions {
        action.execute()?;
    }
    Ok(())
}

fn rename(from: &Path, to: &Path, must_succeed: bool) -> Result<bool> {
    let failed = |reason: String| Error::RenameFailed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        reason,
    };

    if !from.exists() {
        if must_succeed {
            return Err(failed("source does not exist".to_string()));
        }
        debug!("Nothing to rename at {}", from.display());
        return Ok(false);
    }

    if let Some(parent) = to.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| failed(e.to_string()))?;
        }
    }

    match fs::rename(from, to) {
        Ok(()) => {
            debug!("Renamed {} to {}", from.display(), to.display());
            Ok(true)
        }
        Err(e) if must_succeed => Err(failed(e.to_string())),
        Err(e) => {
            warn!("Failed to rename {} to {}: {}", from.display(), to.display(), e);
            Ok(false)
        }
    }
}

fn compress(
    from: &Path,
    to: &Path,
    delete_source: bool,
    write_archive: fn(&Path, &Path) -> io::Result<()>,
) -> Result<bool> {
    if !from.exists() {
        debug!("Nothing to compress at {}", from.display());
        return Ok(false);
    }

    write_archive(from, to).map_err(|e| Error::compression(from.to_path_buf(), e.to_string()))?;

    if delete_source {
        fs::remove_file(from).map_err(|e| {
            Error::compression(
                from.to_path_buf(),
                format!("archive written but source not removed: {}", e),
            )
        })?;
    }

    info!("Compressed {} to {}", from.display(), to.display());
    Ok(true)
}

fn gzip_file(from: &Path, to: &Path) -> io::Result<()> {
    let mut input = File::open(from)?;
    let output = BufWriter::new(File::create(to)?);

    let mut encoder = GzEncoder::new(output, Compression::default());
    io::copy(&mut input, &mut encoder)?;

    let file = encoder.finish()?.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}

fn zip_file(from: &Path, to: &Path) -> io::Result<()> {
    let entry_name = from
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "log".to_string());

    let write = || -> zip::result::ZipResult<()> {
        let mut input = File::open(from)?;
        let mut archive = zip::ZipWriter::new(File::create(to)?);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        archive.start_file(entry_name.as_str(), options)?;
        io::copy(&mut input, &mut archive)?;
        archive.finish()?.sync_all()?;
        Ok(())
    };

    write().map_err(|e| match e {
        zip::result::ZipError::Io(io_err) => io_err,
        other => io::Error::new(io::ErrorKind::Other, other.to_string()),
    })
}

/// Background executor for asynchronous rollover actions
pub struct ActionRunner {
    tx: Option<Sender<Vec<RolloverAction>>>,
    handle: Option<JoinHandle<()>>,
}

impl ActionRunner {
    /// Start the worker thread
    pub fn spawn() -> Result<Self> {
        let (tx, rx) = crossbeam_channel::unbounded::<Vec<RolloverAction>>();

        let handle = std::thread::Builder::new()
            .name("timeroll-actions".to_string())
            .spawn(move || {
                for batch in rx {
                    for action in batch {
                        match action.execute() {
                            Ok(true) => {}
                            Ok(false) => debug!("Skipped action on missing {}", action.source().display()),
                            Err(e) => warn!("Background rollover action failed: {}", e),
                        }
                    }
                }
                debug!("Action runner stopped");
            })?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    /// Queue actions; returns immediately
    pub fn submit(&self, actions: Vec<RolloverAction>) {
        if actions.is_empty() {
            return;
        }

        match &self.tx {
            Some(tx) => {
                if tx.send(actions).is_err() {
                    warn!("Action runner is gone, dropping rollover actions");
                }
            }
            None => warn!("Action runner is shut down, dropping rollover actions"),
        }
    }

    /// Finish queued work and stop the worker
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        drop(self.tx.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Action runner thread panicked");
            }
        }
    }
}

impl Drop for ActionRunner {
    fn drop(&mut self) {
        self.stop();
    }
}
