//! Cross-process lock guarding ledger mutations
//!
//! The lock is a sidecar file created with create-new semantics, so at most
//! one station process holds it. Each holder writes a unique token into the
//! file and only ever removes a lock file that still carries its own token.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use plategate_types::LedgerError;

const RETRY_INTERVAL: Duration = Duration::from_millis(10);

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(0);

#[derive(Debug)]
pub(crate) struct LedgerLock {
    path: PathBuf,
    token: String,
}

impl LedgerLock {
    /// Block until the lock is ours or `timeout` elapses. A lock file older
    /// than `stale_after` belongs to a crashed process and is broken.
    pub(crate) fn acquire(
        path: &Path,
        timeout: Duration,
        stale_after: Duration,
    ) -> Result<Self, LedgerError> {
        let token = new_token();
        let started = Instant::now();
        loop {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut file) => {
                    if let Err(e) = write!(file, "{}", token).and_then(|_| file.sync_all()) {
                        let _ = fs::remove_file(path);
                        return Err(e.into());
                    }
                    debug!(lock = %path.display(), "ledger lock acquired");
                    return Ok(Self {
                        path: path.to_path_buf(),
                        token,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if is_stale(path, stale_after) && break_stale_lock(path, stale_after, &token) {
                        continue;
                    }
                    if started.elapsed() >= timeout {
                        return Err(LedgerError::LockTimeout {
                            path: path.to_path_buf(),
                            waited_ms: started.elapsed().as_millis() as u64,
                        });
                    }
                    thread::sleep(RETRY_INTERVAL);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        match fs::read_to_string(&self.path) {
            Ok(owner) if owner == self.token => {
                if let Err(e) = fs::remove_file(&self.path) {
                    warn!(lock = %self.path.display(), error = %e, "failed to release ledger lock");
                }
            }
            Ok(_) => warn!(
                lock = %self.path.display(),
                "ledger lock was broken as stale and is now held by another writer"
            ),
            Err(e) => warn!(lock = %self.path.display(), error = %e, "ledger lock vanished"),
        }
    }
}

/// Pid, per-process counter and clock, so threads and processes never share
/// a token
fn new_token() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!(
        "{}:{}:{}",
        std::process::id(),
        NEXT_TOKEN.fetch_add(1, Ordering::Relaxed),
        nanos
    )
}

fn is_stale(path: &Path, stale_after: Duration) -> bool {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .is_some_and(|age| age > stale_after)
}

/// Move the lock aside under a private name, then decide on the moved file.
/// The rename is atomic, so only one waiter captures a given lock file. If
/// the captured file turns out to be fresh (another waiter broke the stale
/// lock and took it in the meantime) it is linked back in place, which fails
/// rather than overwrite a newer lock. Returns whether a stale lock was
/// removed.
fn break_stale_lock(path: &Path, stale_after: Duration, token: &str) -> bool {
    let mut aside = path.as_os_str().to_owned();
    aside.push(format!(".broken-{}", token.replace(':', "-")));
    let aside = PathBuf::from(aside);

    if fs::rename(path, &aside).is_err() {
        // Someone else moved or released it first
        return false;
    }

    if is_stale(&aside, stale_after) {
        warn!(lock = %path.display(), "removed stale ledger lock");
        let _ = fs::remove_file(&aside);
        return true;
    }

    if let Err(e) = fs::hard_link(&aside, path) {
        warn!(lock = %path.display(), error = %e, "could not restore live ledger lock");
    }
    let _ = fs::remove_file(&aside);
    false
}
