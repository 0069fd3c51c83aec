//! Append-only notifications log (`notifications.txt`)

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::{error::AppResult, models::Notification};

#[derive(Clone)]
pub struct NotificationsRepository {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl NotificationsRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Append one `[timestamp] message` line
    pub fn append(&self, notification: &Notification) -> AppResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", notification)?;
        Ok(())
    }

    /// Every line of the log, oldest first. A missing file reads as empty.
    pub fn read_all(&self) -> AppResult<Vec<String>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(raw
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}
