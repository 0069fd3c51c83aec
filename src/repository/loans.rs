//! Loans repository (`loans.json`): loans plus the suspension table

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{decode_records, Document, JsonStore, PersistenceWarnings};
use crate::{
    error::{AppError, AppResult},
    models::{
        datetime::{format_timestamp, parse_timestamp},
        Loan,
    },
};

#[derive(Debug, Default)]
pub struct LoanBook {
    pub loans: IndexMap<String, Loan>,
    /// matricule -> suspension expiry
    pub suspensions: BTreeMap<String, DateTime<Utc>>,
}

impl LoanBook {
    /// Drop expired suspensions. Returns how many were removed.
    pub fn prune_suspensions(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.suspensions.len();
        self.suspensions.retain(|_, until| *until > now);
        before - self.suspensions.len()
    }

    /// Extend (or set) a suspension. Returns the expiry now in force.
    pub fn suspend(&mut self, matricule: &str, until: DateTime<Utc>) -> DateTime<Utc> {
        self.suspensions.insert(matricule.to_string(), until);
        until
    }
}

#[derive(Serialize)]
struct LoansFile<'a> {
    loans: Vec<&'a Loan>,
    suspensions: BTreeMap<&'a str, String>,
}

#[derive(Deserialize)]
struct RawLoansFile {
    #[serde(default)]
    loans: Value,
    #[serde(default)]
    suspensions: BTreeMap<String, String>,
}

impl Document for LoanBook {
    const KIND: &'static str = "loans";

    fn encode(&self) -> AppResult<String> {
        let file = LoansFile {
            loans: self.loans.values().collect(),
            suspensions: self
                .suspensions
                .iter()
                .map(|(m, until)| (m.as_str(), format_timestamp(until)))
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    fn decode(value: Value) -> Self {
        let raw = match value {
            // Bare list: loans without a suspension table
            Value::Array(_) => RawLoansFile {
                loans: value,
                suspensions: BTreeMap::new(),
            },
            other => match serde_json::from_value::<RawLoansFile>(other) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::error!(store = Self::KIND, error = %e, "Malformed loans document, starting empty");
                    return Self::default();
                }
            },
        };

        let mut book = LoanBook::default();
        for loan in decode_records::<Loan>(Self::KIND, raw.loans, |l| {
            if l.due_at < l.borrowed_at {
                Err(format!("loan {} is due before it was borrowed", l.id))
            } else {
                Ok(())
            }
        }) {
            if book.loans.contains_key(&loan.id) {
                tracing::warn!(store = Self::KIND, id = %loan.id, "Skipping duplicate loan id");
                continue;
            }
            book.loans.insert(loan.id.clone(), loan);
        }
        for (matricule, raw_until) in raw.suspensions {
            match parse_timestamp(&raw_until) {
                Ok(until) => {
                    book.suspensions.insert(matricule, until);
                }
                Err(e) => {
                    tracing::warn!(store = Self::KIND, matricule = %matricule, error = %e, "Skipping invalid suspension");
                }
            }
        }
        book
    }
}

#[derive(Clone)]
pub struct LoansRepository {
    store: JsonStore<LoanBook>,
}

impl LoansRepository {
    pub fn open(path: PathBuf, warnings: PersistenceWarnings) -> Self {
        Self {
            store: JsonStore::open(path, warnings),
        }
    }

    pub fn count(&self) -> usize {
        self.store.read(|b| b.loans.len())
    }

    pub fn get(&self, id: &str) -> AppResult<Loan> {
        self.store
            .read(|b| b.loans.get(id).cloned())
            .ok_or_else(|| AppError::LoanNotFound(id.to_string()))
    }

    /// Loans for which `predicate` holds, oldest first
    pub fn filter(&self, predicate: impl Fn(&Loan) -> bool) -> Vec<Loan> {
        self.store
            .read(|b| b.loans.values().filter(|l| predicate(l)).cloned().collect())
    }

    /// Unexpired suspension for `matricule`, pruning expired entries first
    pub fn active_suspension(&self, matricule: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let (current, stale) = self.store.read(|b| {
            (
                b.suspensions.get(matricule).copied().filter(|until| *until > now),
                b.suspensions.values().any(|until| *until <= now),
            )
        });
        if stale {
            self.prune(now);
        }
        current
    }

    /// Suspensions still in force, pruning expired entries first
    pub fn suspensions(&self, now: DateTime<Utc>) -> Vec<(String, DateTime<Utc>)> {
        self.prune(now);
        self.store.read(|b| {
            b.suspensions
                .iter()
                .map(|(m, until)| (m.clone(), *until))
                .collect()
        })
    }

    fn prune(&self, now: DateTime<Utc>) {
        let result = self.store.update(|b| Ok(b.prune_suspensions(now)));
        if let Ok(removed) = result {
            if removed > 0 {
                tracing::debug!(removed, "Expired suspensions pruned");
            }
        }
    }

    /// Mutate the loan table and suspensions together; expired suspensions are
    /// pruned before the document is written.
    pub fn modify<R>(
        &self,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut LoanBook) -> AppResult<R>,
    ) -> AppResult<R> {
        self.store.update(|b| {
            let result = f(b)?;
            b.prune_suspensions(now);
            Ok(result)
        })
    }

    pub fn reload(&self) {
        self.store.reload()
    }
}
