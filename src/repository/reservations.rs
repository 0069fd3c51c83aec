//! Reservations repository (`reservations.json`): reservations plus per-book queues

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::books::isbn_key;
use super::{decode_records, Document, JsonStore, PersistenceWarnings};
use crate::{
    error::{AppError, AppResult},
    models::{Reservation, ReservationStatus},
};

#[derive(Debug, Default)]
pub struct ReservationBook {
    pub reservations: IndexMap<String, Reservation>,
    /// isbn key -> reservation ids, first come first served
    pub queues: IndexMap<String, Vec<String>>,
}

impl ReservationBook {
    pub fn queue_mut(&mut self, isbn: &str) -> &mut Vec<String> {
        self.queues.entry(isbn_key(isbn)).or_default()
    }

    /// Remove `id` from whichever queue holds it; empty queues are dropped.
    pub fn dequeue(&mut self, id: &str) {
        for queue in self.queues.values_mut() {
            queue.retain(|queued| queued != id);
        }
        self.queues.retain(|_, queue| !queue.is_empty());
    }

    /// Keep only Pending reservations in the queue for `isbn`
    pub fn retain_pending(&mut self, isbn: &str) {
        let key = isbn_key(isbn);
        let reservations = &self.reservations;
        if let Some(queue) = self.queues.get_mut(&key) {
            queue.retain(|id| {
                reservations
                    .get(id)
                    .is_some_and(|r| r.status() == ReservationStatus::Pending)
            });
            if queue.is_empty() {
                self.queues.shift_remove(&key);
            }
        }
    }

    pub fn has_open(&self, matricule: &str, isbn: &str) -> bool {
        let key = isbn_key(isbn);
        self.reservations
            .values()
            .any(|r| r.matricule == matricule && isbn_key(&r.isbn) == key && r.is_open())
    }
}

/// On disk the queues live under `files`
#[derive(Serialize)]
struct ReservationsFile<'a> {
    reservations: Vec<&'a Reservation>,
    #[serde(rename = "files")]
    queues: &'a IndexMap<String, Vec<String>>,
}

#[derive(Deserialize)]
struct RawReservationsFile {
    #[serde(default)]
    reservations: Value,
    #[serde(default, rename = "files", alias = "queues")]
    queues: IndexMap<String, Vec<String>>,
}

impl Document for ReservationBook {
    const KIND: &'static str = "reservations";

    fn encode(&self) -> AppResult<String> {
        let file = ReservationsFile {
            reservations: self.reservations.values().collect(),
            queues: &self.queues,
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    fn decode(value: Value) -> Self {
        let raw = match serde_json::from_value::<RawReservationsFile>(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(store = Self::KIND, error = %e, "Malformed reservations document, starting empty");
                return Self::default();
            }
        };

        let mut book = ReservationBook::default();
        for reservation in decode_records::<Reservation>(Self::KIND, raw.reservations, |_| Ok(())) {
            book.reservations.insert(reservation.id.clone(), reservation);
        }
        // Queue entries must point at a known reservation for the same book
        for (isbn, ids) in raw.queues {
            let key = isbn_key(&isbn);
            let ids: Vec<String> = ids
                .into_iter()
                .filter(|id| {
                    let known = book
                        .reservations
                        .get(id)
                        .is_some_and(|r| isbn_key(&r.isbn) == key);
                    if !known {
                        tracing::warn!(store = Self::KIND, isbn = %isbn, id = %id, "Dropping unknown queue entry");
                    }
                    known
                })
                .collect();
            if !ids.is_empty() {
                book.queues.entry(key).or_default().extend(ids);
            }
        }
        book
    }
}

#[derive(Clone)]
pub struct ReservationsRepository {
    store: JsonStore<ReservationBook>,
}

impl ReservationsRepository {
    pub fn open(path: PathBuf, warnings: PersistenceWarnings) -> Self {
        Self {
            store: JsonStore::open(path, warnings),
        }
    }

    pub fn count(&self) -> usize {
        self.store.read(|b| b.reservations.len())
    }

    pub fn get(&self, id: &str) -> AppResult<Reservation> {
        self.store
            .read(|b| b.reservations.get(id).cloned())
            .ok_or_else(|| AppError::ReservationNotFound(id.to_string()))
    }

    pub fn filter(&self, predicate: impl Fn(&Reservation) -> bool) -> Vec<Reservation> {
        self.store.read(|b| {
            b.reservations
                .values()
                .filter(|r| predicate(r))
                .cloned()
                .collect()
        })
    }

    /// Pending reservations queued for `isbn`, in queue order
    pub fn pending_queue(&self, isbn: &str) -> Vec<Reservation> {
        self.store.read(|b| {
            b.queues
                .get(&isbn_key(isbn))
                .map(|ids| {
                    ids.iter()
                        .filter_map(|id| b.reservations.get(id))
                        .filter(|r| r.status() == ReservationStatus::Pending)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    pub fn modify<R>(&self, f: impl FnOnce(&mut ReservationBook) -> AppResult<R>) -> AppResult<R> {
        self.store.update(f)
    }

    pub fn reload(&self) {
        self.store.reload()
    }
}
