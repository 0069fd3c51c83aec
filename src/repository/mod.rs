//! Repository layer: in-memory stores written through to JSON files

pub mod books;
pub mod loans;
pub mod members;
pub mod notifications;
pub mod reservations;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// Persisted form of one store.
///
/// `decode` is tolerant: a record that fails to parse or validate is skipped,
/// and a document of the wrong shape yields an empty store.
pub trait Document: Default + Send + Sync + 'static {
    const KIND: &'static str;

    fn encode(&self) -> AppResult<String>;

    fn decode(value: Value) -> Self;
}

/// Write failures not yet shown to the caller.
///
/// Stores push here instead of failing the operation; the console drains the
/// list after each action and prints one warning per failure.
#[derive(Clone, Default)]
pub struct PersistenceWarnings(Arc<Mutex<Vec<AppError>>>);

impl PersistenceWarnings {
    pub fn push(&self, error: AppError) {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).push(error);
    }

    pub fn take(&self) -> Vec<AppError> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

/// One document held in memory behind a lock and mirrored to `path`.
pub struct JsonStore<D> {
    path: PathBuf,
    state: Arc<RwLock<D>>,
    warnings: PersistenceWarnings,
}

impl<D> Clone for JsonStore<D> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            state: Arc::clone(&self.state),
            warnings: self.warnings.clone(),
        }
    }
}

impl<D: Document> JsonStore<D> {
    pub fn open(path: PathBuf, warnings: PersistenceWarnings) -> Self {
        let state = load::<D>(&path);
        Self {
            path,
            state: Arc::new(RwLock::new(state)),
            warnings,
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&D) -> R) -> R {
        f(&self.read_guard())
    }

    /// Run `f` under the write lock and write the document through when it succeeds.
    /// A failed write keeps the in-memory change, is logged and queued as a warning.
    pub fn update<R>(&self, f: impl FnOnce(&mut D) -> AppResult<R>) -> AppResult<R> {
        let mut guard = self.write_guard();
        let result = f(&mut guard)?;
        if let Err(e) = self.save(&guard) {
            tracing::error!(
                store = D::KIND,
                path = %self.path.display(),
                error = %e,
                "Failed to persist store, keeping in-memory state"
            );
            self.warnings.push(AppError::Persistence(format!(
                "{} not saved to {}: {}",
                D::KIND,
                self.path.display(),
                e
            )));
        }
        Ok(result)
    }

    /// Replace the in-memory document with what is on disk
    pub fn reload(&self) {
        let fresh = load::<D>(&self.path);
        *self.write_guard() = fresh;
    }

    fn save(&self, document: &D) -> AppResult<()> {
        let body = document.encode()?;
        write_atomically(&self.path, body.as_bytes())
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, D> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, D> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Write to a sibling temporary file, then rename it over `path`.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn load<D: Document>(path: &Path) -> D {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(store = D::KIND, path = %path.display(), "No data file yet, starting empty");
            return D::default();
        }
        Err(e) => {
            tracing::error!(store = D::KIND, path = %path.display(), error = %e, "Cannot read data file, starting empty");
            return D::default();
        }
    };
    if raw.trim().is_empty() {
        return D::default();
    }
    match serde_json::from_str::<Value>(&raw) {
        Ok(value) => D::decode(value),
        Err(e) => {
            tracing::error!(store = D::KIND, path = %path.display(), error = %e, "Malformed data file, starting empty");
            D::default()
        }
    }
}

/// Decode each element of a JSON array, skipping the ones that fail `accept`.
pub(crate) fn decode_records<T: DeserializeOwned>(
    kind: &str,
    value: Value,
    accept: impl Fn(&T) -> Result<(), String>,
) -> Vec<T> {
    let items = match value {
        Value::Array(items) => items,
        Value::Null => return Vec::new(),
        other => {
            tracing::error!(store = kind, found = %json_kind(&other), "Expected a list of records, starting empty");
            return Vec::new();
        }
    };
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let record = serde_json::from_value::<T>(item)
                .map_err(|e| e.to_string())
                .and_then(|record| accept(&record).map(|_| record));
            match record {
                Ok(record) => Some(record),
                Err(reason) => {
                    tracing::warn!(store = kind, index, reason = %reason, "Skipping invalid record");
                    None
                }
            }
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub const BOOKS_FILE: &str = "books.json";
pub const MEMBERS_FILE: &str = "members.json";
pub const LOANS_FILE: &str = "loans.json";
pub const RESERVATIONS_FILE: &str = "reservations.json";
pub const NOTIFICATIONS_FILE: &str = "notifications.txt";

/// Main repository struct holding every store of one data directory
#[derive(Clone)]
pub struct Repository {
    pub data_dir: PathBuf,
    pub warnings: PersistenceWarnings,
    pub books: books::BooksRepository,
    pub members: members::MembersRepository,
    pub loans: loans::LoansRepository,
    pub reservations: reservations::ReservationsRepository,
    pub notifications: notifications::NotificationsRepository,
}

impl Repository {
    /// Open (and create if needed) the data directory and load every store
    pub fn open(data_dir: impl AsRef<Path>) -> AppResult<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;
        let warnings = PersistenceWarnings::default();
        let repository = Self {
            books: books::BooksRepository::open(data_dir.join(BOOKS_FILE), warnings.clone()),
            members: members::MembersRepository::open(data_dir.join(MEMBERS_FILE), warnings.clone()),
            loans: loans::LoansRepository::open(data_dir.join(LOANS_FILE), warnings.clone()),
            reservations: reservations::ReservationsRepository::open(
                data_dir.join(RESERVATIONS_FILE),
                warnings.clone(),
            ),
            notifications: notifications::NotificationsRepository::new(data_dir.join(NOTIFICATIONS_FILE)),
            warnings,
            data_dir,
        };
        tracing::info!(
            data_dir = %repository.data_dir.display(),
            books = repository.books.count(),
            members = repository.members.count(),
            loans = repository.loans.count(),
            reservations = repository.reservations.count(),
            "Stores loaded"
        );
        Ok(repository)
    }

    /// Re-read every store from disk
    pub fn reload(&self) {
        self.books.reload();
        self.members.reload();
        self.loans.reload();
        self.reservations.reload();
    }
}
