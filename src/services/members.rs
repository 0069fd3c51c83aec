//! Membership service

use crate::{
    clock::SharedClock,
    error::{AppError, AppResult},
    ids::{generate_unique_id, MEMBER_PREFIX},
    models::{Member, MemberCategory, MemberUpdate, NewMember},
    repository::Repository,
};

#[derive(Clone)]
pub struct MembersService {
    repository: Repository,
    clock: SharedClock,
}

impl MembersService {
    pub fn new(repository: Repository, clock: SharedClock) -> Self {
        Self { repository, clock }
    }

    /// Register a member; the email address must be unused
    pub fn create(&self, request: NewMember) -> AppResult<Member> {
        let matricule = generate_unique_id(MEMBER_PREFIX, |id| self.repository.members.matricule_taken(id));
        let member = Member::new(matricule, request, self.clock.now())?;
        let member = self.repository.members.insert(member)?;
        tracing::info!(
            actor = "librarian",
            action = "create_member",
            target = %member.matricule,
            category = %member.category(),
            "Member registered"
        );
        Ok(member)
    }

    pub fn get(&self, matricule: &str) -> AppResult<Member> {
        self.repository.members.get(matricule)
    }

    pub fn find_by_email(&self, email: &str) -> Option<Member> {
        self.repository.members.find_by_email(email)
    }

    pub fn list(&self) -> Vec<Member> {
        self.repository.members.list()
    }

    /// Change personal fields. A new email must not belong to another member.
    pub fn update(&self, matricule: &str, update: MemberUpdate) -> AppResult<Member> {
        let member = self.repository.members.modify(|roster| {
            if let Some(email) = update.email.as_deref() {
                if roster.email_taken(email, Some(matricule)) {
                    return Err(AppError::DuplicateEmail(email.trim().to_string()));
                }
            }
            let member = roster
                .members
                .get_mut(matricule)
                .ok_or_else(|| AppError::MemberNotFound(matricule.to_string()))?;
            member.apply_update(update)?;
            Ok(member.clone())
        })?;
        tracing::info!(actor = "librarian", action = "update_member", target = %member.matricule, "Member updated");
        Ok(member)
    }

    pub fn change_category(&self, matricule: &str, category: MemberCategory) -> AppResult<Member> {
        let member = self.repository.members.update(matricule, |m| {
            m.change_category(category)?;
            Ok(m.clone())
        })?;
        tracing::info!(
            actor = "librarian",
            action = "change_category",
            target = %member.matricule,
            category = %category,
            "Member category changed"
        );
        Ok(member)
    }

    /// Returns false if the member does not exist
    pub fn activate(&self, matricule: &str) -> bool {
        self.set_active(matricule, true)
    }

    /// Returns false if the member does not exist
    pub fn deactivate(&self, matricule: &str) -> bool {
        self.set_active(matricule, false)
    }

    fn set_active(&self, matricule: &str, active: bool) -> bool {
        match self
            .repository
            .members
            .update(matricule, |m| Ok(m.set_active(active)))
        {
            Ok(changed) => {
                if changed {
                    tracing::info!(
                        actor = "librarian",
                        action = if active { "activate" } else { "deactivate" },
                        target = %matricule,
                        "Member activation changed"
                    );
                }
                true
            }
            Err(_) => false,
        }
    }

    /// Whether the member may take one more loan (active and below the limit)
    pub fn can_borrow(&self, matricule: &str) -> AppResult<bool> {
        Ok(self.repository.members.get(matricule)?.can_borrow())
    }

    /// Unregister a member. Refused while they still hold loans.
    pub fn remove(&self, matricule: &str) -> AppResult<Member> {
        let member = self.repository.members.modify(|roster| {
            let member = roster
                .members
                .get(matricule)
                .ok_or_else(|| AppError::MemberNotFound(matricule.to_string()))?;
            if member.loan_count() > 0 {
                return Err(AppError::Validation(format!(
                    "member {} still holds {} loan(s)",
                    matricule,
                    member.loan_count()
                )));
            }
            roster
                .members
                .shift_remove(matricule)
                .ok_or_else(|| AppError::MemberNotFound(matricule.to_string()))
        })?;
        tracing::info!(actor = "librarian", action = "remove_member", target = %member.matricule, "Member removed");
        Ok(member)
    }

    pub fn reload(&self) {
        self.repository.members.reload()
    }
}
