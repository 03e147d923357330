//! Background refresh of external data sets.
//!
//! Long-running hosts keep derived tables (weather, reference elevation,
//! place names) up to date with a periodic task:
//! - A PID-file guard so only one process refreshes at a time
//! - One pass per interval, every source in order on the blocking pool
//! - Transient errors (missing table, locked database) are skipped until the
//!   next pass; anything else stops the loop
//! - Shutdown through a `watch` channel, joined by [`RefreshHandle::stop`]

use log::{debug, info, warn};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use sysinfo::{Pid, System};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Errors raised by a refresh source or the scheduler itself.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("table {0} does not exist yet")]
    MissingTable(String),

    #[error("database is locked")]
    DatabaseLocked,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("refresh failed: {0}")]
    Failed(String),
}

impl RefreshError {
    /// True for errors that usually clear up by the next pass.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RefreshError::MissingTable(_) | RefreshError::DatabaseLocked)
    }
}

/// An external data set that can be reloaded.
///
/// `refresh` runs on tokio's blocking pool, so it may do synchronous I/O.
pub trait RefreshSource: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Reload the data set. Returns the number of rows (or items) updated.
    fn refresh(&self) -> Result<usize, RefreshError>;
}

/// Counters reported when the refresher stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    /// Completed passes over all sources
    pub passes: u64,
    /// Sum of the counts returned by sources
    pub refreshed: usize,
    /// Source runs skipped because of a retryable error
    pub skipped: u64,
}

// =============================================================================
// Instance lock
// =============================================================================

/// PID-file guard. The file is removed when the lock is dropped.
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
}

impl InstanceLock {
    /// Take the lock at `path`.
    ///
    /// Returns `Ok(None)` when the file names another process that is still
    /// running, or when another process wins the race for a stale file. A
    /// stale or unreadable PID is replaced.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Option<Self>, RefreshError> {
        let path = path.as_ref();
        let own_pid = std::process::id();

        match create_pid_file(path, own_pid) {
            Ok(()) => return Ok(Some(Self::held(path))),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                if let Ok(pid) = contents.trim().parse::<u32>() {
                    if pid != own_pid && process_alive(pid) {
                        info!("[Refresh] {} held by running process {}", path.display(), pid);
                        return Ok(None);
                    }
                    debug!("[Refresh] Replacing stale lock of process {}", pid);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        match create_pid_file(path, own_pid) {
            Ok(()) => Ok(Some(Self::held(path))),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                info!("[Refresh] {} taken by another process", path.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn held(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("[Refresh] Could not remove {}: {}", self.path.display(), e);
        }
    }
}

/// Create `path` exclusively and write `pid` into it.
fn create_pid_file(path: &Path, pid: u32) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(pid.to_string().as_bytes())
}

fn process_alive(pid: u32) -> bool {
    let mut system = System::new();
    system.refresh_process(Pid::from_u32(pid))
}

// =============================================================================
// Scheduler
// =============================================================================

/// Periodic refresher over a list of sources.
pub struct BackgroundRefresher {
    interval: Duration,
    sources: Vec<Arc<dyn RefreshSource>>,
}

impl BackgroundRefresher {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            sources: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: impl RefreshSource) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Start the refresh task on the current tokio runtime.
    ///
    /// Returns `Ok(None)` if another process holds the lock at `lock_path`.
    pub fn start(self, lock_path: impl AsRef<Path>) -> Result<Option<RefreshHandle>, RefreshError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| RefreshError::Failed(format!("no tokio runtime: {}", e)))?;

        let Some(lock) = InstanceLock::acquire(lock_path)? else {
            return Ok(None);
        };

        info!(
            "[Refresh] Starting with {} sources every {:?}",
            self.sources.len(),
            self.interval
        );

        let (shutdown, rx) = watch::channel(false);
        let task = runtime.spawn(run_loop(self.interval, self.sources, rx));

        Ok(Some(RefreshHandle {
            shutdown,
            task,
            _lock: lock,
        }))
    }
}

/// Running refresher. Holds the instance lock until stopped.
pub struct RefreshHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<Result<RefreshStats, RefreshError>>,
    _lock: InstanceLock,
}

impl RefreshHandle {
    /// Signal shutdown and wait for the task to finish.
    ///
    /// A pass in progress completes first. Returns the error that stopped the
    /// loop if it ended on its own.
    pub async fn stop(self) -> Result<RefreshStats, RefreshError> {
        // The receiver is gone if the loop already exited
        let _ = self.shutdown.send(true);

        let stats = self
            .task
            .await
            .map_err(|e| RefreshError::Failed(format!("refresh task aborted: {}", e)))??;

        info!(
            "[Refresh] Stopped after {} passes ({} refreshed, {} skipped)",
            stats.passes, stats.refreshed, stats.skipped
        );
        Ok(stats)
    }

    /// True once the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn run_loop(
    interval: Duration,
    sources: Vec<Arc<dyn RefreshSource>>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<RefreshStats, RefreshError> {
    let mut stats = RefreshStats::default();

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        let start = Instant::now();
        for source in &sources {
            let name = source.name().to_string();
            let job = Arc::clone(source);
            let outcome = tokio::task::spawn_blocking(move || job.refresh())
                .await
                .map_err(|e| RefreshError::Failed(format!("{} panicked: {}", name, e)))?;

            match outcome {
                Ok(count) => {
                    debug!("[Refresh] {}: {} updated", name, count);
                    stats.refreshed += count;
                }
                Err(e) if e.is_retryable() => {
                    warn!("[Refresh] {}: {}, retrying next pass", name, e);
                    stats.skipped += 1;
                }
                Err(e) => {
                    warn!("[Refresh] {}: {}, stopping", name, e);
                    return Err(e);
                }
            }
        }

        stats.passes += 1;
        debug!("[Refresh] Pass {} done in {:?}", stats.passes, start.elapsed());
    }

    Ok(stats)
}
