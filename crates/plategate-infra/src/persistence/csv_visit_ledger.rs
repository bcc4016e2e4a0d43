//! CSV file implementation of VisitLedger
//!
//! Both station processes open the same file. Reads go straight to the file;
//! every mutation runs as one transaction: take the lock file, read all
//! rows, change them in memory, write a temp file next to the ledger, sync
//! it, rename it over the ledger, release the lock. A reader therefore only
//! ever sees a complete file, and neither station can overwrite a row the
//! other committed in between.

use std::fs::{self, File};
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use plategate_domain::model::VisitRecord;
use plategate_domain::repository::VisitLedger;
use plategate_types::{Error, LedgerError};

use super::ledger_lock::LedgerLock;
use super::ledger_row::{truncate_to_seconds, LedgerRow, LEDGER_HEADER};

/// Lock tuning for ledger mutations
#[derive(Debug, Clone, Copy)]
pub struct LedgerOptions {
    /// How long a mutation waits for the other station to finish
    pub lock_timeout: Duration,
    /// Age after which a leftover lock file is considered abandoned
    pub stale_lock_after: Duration,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
            stale_lock_after: Duration::from_secs(30),
        }
    }
}

/// File-based visit ledger (CSV)
#[derive(Debug, Clone)]
pub struct CsvVisitLedger {
    path: PathBuf,
    lock_path: PathBuf,
    options: LedgerOptions,
}

impl CsvVisitLedger {
    /// Open the ledger at `path`, creating it with a header row if absent
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        Self::open_with_options(path, LedgerOptions::default())
    }

    pub fn open_with_options(
        path: impl Into<PathBuf>,
        options: LedgerOptions,
    ) -> Result<Self, LedgerError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let ledger = Self {
            lock_path: lock_path_for(&path),
            path,
            options,
        };

        if !ledger.path.exists() {
            let _lock = ledger.lock()?;
            // The other station may have created it while we waited
            if !ledger.path.exists() {
                ledger.write_records(&[])?;
                info!(ledger = %ledger.path.display(), "created visit ledger");
            }
        }

        Ok(ledger)
    }

    /// Get the CSV path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<LedgerLock, LedgerError> {
        LedgerLock::acquire(
            &self.lock_path,
            self.options.lock_timeout,
            self.options.stale_lock_after,
        )
    }

    fn read_records(&self) -> Result<Vec<VisitRecord>, LedgerError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(LedgerError::Missing(self.path.clone()))
            }
            Err(e) => return Err(e.into()),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));

        let mut records = Vec::new();
        for (row_idx, row) in reader.deserialize::<LedgerRow>().enumerate() {
            // +2: 0-based index and the header line
            records.push(row?.into_record(row_idx + 2)?);
        }
        Ok(records)
    }

    fn write_records(&self, records: &[VisitRecord]) -> Result<(), LedgerError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let temp = NamedTempFile::new_in(dir)?;

        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(temp.as_file());
            writer.write_record(LEDGER_HEADER)?;
            for record in records {
                writer.serialize(LedgerRow::from(record))?;
            }
            writer.flush()?;
        }
        temp.as_file().sync_all()?;

        // Keep the ledger's permissions rather than the temp file's 0600
        if let Ok(meta) = fs::metadata(&self.path) {
            let _ = fs::set_permissions(temp.path(), meta.permissions());
        }

        temp.persist(&self.path)
            .map_err(|e| LedgerError::Persist(e.error.to_string()))?;
        Ok(())
    }

    /// Run one locked read-modify-replace transaction. The closure returns
    /// its result and whether it changed anything; unchanged ledgers are not
    /// rewritten.
    fn mutate<T, F>(&self, operation: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Vec<VisitRecord>) -> (T, bool),
    {
        let _lock = self.lock()?;
        let mut records = self.read_records()?;
        let (result, changed) = operation(&mut records);
        if changed {
            self.write_records(&records)?;
        }
        Ok(result)
    }
}

impl VisitLedger for CsvVisitLedger {
    fn append(&self, plate: &str, entry_time: NaiveDateTime) -> Result<VisitRecord, Error> {
        let record = VisitRecord::new(plate, truncate_to_seconds(entry_time));
        self.mutate(|records| {
            records.push(record.clone());
            ((), true)
        })?;
        debug!(plate, ledger = %self.path.display(), "visit appended");
        Ok(record)
    }

    fn find_open(&self, plate: &str) -> Result<Option<VisitRecord>, Error> {
        Ok(self
            .read_records()?
            .into_iter()
            .find(|r| r.plate == plate && r.is_open()))
    }

    fn find_open_paid(&self, plate: &str) -> Result<Option<VisitRecord>, Error> {
        Ok(self
            .read_records()?
            .into_iter()
            .find(|r| r.plate == plate && r.is_open() && r.is_paid()))
    }

    fn close(&self, plate: &str, exit_time: NaiveDateTime) -> Result<usize, Error> {
        let exit_time = truncate_to_seconds(exit_time);
        let closed = self.mutate(|records| {
            let closed = records
                .iter_mut()
                .filter(|r| r.plate == plate)
                .map(|r| r.close_at(exit_time))
                .filter(|closed_now| *closed_now)
                .count();
            (closed, closed > 0)
        })?;
        debug!(plate, closed, "visits closed");
        Ok(closed)
    }

    fn record_payment(
        &self,
        plate: &str,
        amount: Decimal,
        paid_at: NaiveDateTime,
    ) -> Result<Option<VisitRecord>, Error> {
        let paid_at = truncate_to_seconds(paid_at);
        let updated = self.mutate(|records| {
            let updated = records
                .iter_mut()
                .find(|r| r.plate == plate && r.is_open() && !r.is_paid())
                .map(|r| {
                    r.mark_paid(amount, paid_at);
                    r.clone()
                });
            let changed = updated.is_some();
            (updated, changed)
        })?;
        Ok(updated)
    }

    fn find_all(&self) -> Result<Vec<VisitRecord>, Error> {
        Ok(self.read_records()?)
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "ledger".into());
    name.push(".lock");
    path.with_file_name(name)
}
