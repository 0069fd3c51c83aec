//! Members repository (`members.json`)

use std::path::PathBuf;

use indexmap::IndexMap;
use serde_json::Value;
use validator::Validate;

use super::{decode_records, Document, JsonStore, PersistenceWarnings};
use crate::{
    error::{AppError, AppResult},
    models::member::{email_key, Member},
};

/// Members keyed by matricule, in registration order
#[derive(Debug, Default)]
pub struct Roster {
    pub members: IndexMap<String, Member>,
}

impl Roster {
    /// Whether another member than `except` already uses `email`
    pub fn email_taken(&self, email: &str, except: Option<&str>) -> bool {
        let key = email_key(email);
        self.members
            .values()
            .any(|m| Some(m.matricule.as_str()) != except && email_key(&m.email) == key)
    }
}

impl Document for Roster {
    const KIND: &'static str = "members";

    fn encode(&self) -> AppResult<String> {
        let members: Vec<&Member> = self.members.values().collect();
        Ok(serde_json::to_string_pretty(&members)?)
    }

    fn decode(value: Value) -> Self {
        let mut roster = Roster::default();
        for member in decode_records::<Member>(Self::KIND, value, |m| m.validate().map_err(|e| e.to_string())) {
            if roster.members.contains_key(&member.matricule) || roster.email_taken(&member.email, None) {
                tracing::warn!(store = Self::KIND, matricule = %member.matricule, "Skipping duplicate member");
                continue;
            }
            roster.members.insert(member.matricule.clone(), member);
        }
        roster
    }
}

#[derive(Clone)]
pub struct MembersRepository {
    store: JsonStore<Roster>,
}

impl MembersRepository {
    pub fn open(path: PathBuf, warnings: PersistenceWarnings) -> Self {
        Self {
            store: JsonStore::open(path, warnings),
        }
    }

    pub fn count(&self) -> usize {
        self.store.read(|r| r.members.len())
    }

    pub fn get(&self, matricule: &str) -> AppResult<Member> {
        self.store
            .read(|r| r.members.get(matricule).cloned())
            .ok_or_else(|| AppError::MemberNotFound(matricule.to_string()))
    }

    pub fn find_by_email(&self, email: &str) -> Option<Member> {
        let key = email_key(email);
        self.store.read(|r| {
            r.members
                .values()
                .find(|m| email_key(&m.email) == key)
                .cloned()
        })
    }

    pub fn list(&self) -> Vec<Member> {
        self.store.read(|r| r.members.values().cloned().collect())
    }

    pub fn matricule_taken(&self, matricule: &str) -> bool {
        self.store.read(|r| r.members.contains_key(matricule))
    }

    /// Insert a new member; `DuplicateEmail` if the address is in use
    pub fn insert(&self, member: Member) -> AppResult<Member> {
        self.store.update(|r| {
            if r.email_taken(&member.email, None) {
                return Err(AppError::DuplicateEmail(member.email.clone()));
            }
            r.members.insert(member.matricule.clone(), member.clone());
            Ok(member)
        })
    }

    pub fn update<R>(&self, matricule: &str, f: impl FnOnce(&mut Member) -> AppResult<R>) -> AppResult<R> {
        self.store.update(|r| {
            let member = r
                .members
                .get_mut(matricule)
                .ok_or_else(|| AppError::MemberNotFound(matricule.to_string()))?;
            f(member)
        })
    }

    /// Mutate the whole roster, for checks that span several members
    pub fn modify<R>(&self, f: impl FnOnce(&mut Roster) -> AppResult<R>) -> AppResult<R> {
        self.store.update(f)
    }

    pub fn remove(&self, matricule: &str) -> AppResult<Member> {
        self.store.update(|r| {
            r.members
                .shift_remove(matricule)
                .ok_or_else(|| AppError::MemberNotFound(matricule.to_string()))
        })
    }

    pub fn reload(&self) {
        self.store.reload()
    }
}
