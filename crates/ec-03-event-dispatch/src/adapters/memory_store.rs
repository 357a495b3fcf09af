//! In-memory record store.
//!
//! One lock over all tables so the sink, identity and group ports observe
//! each other's writes the way a single database would.

use crate::domain::records::{
    CourseMember, CourseMemberKey, EnrollmentStatus, EnrollmentUpdate, GroupRecord,
    IdentityRecord, MemberGroupRecord, Priority,
};
use crate::ports::outbound::{
    GroupStore, IdentityStore, OfficialRoster, SinkError, StoreError, UpdateSink,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct Tables {
    updates: Vec<EnrollmentUpdate>,
    identities: HashMap<String, IdentityRecord>,
    groups: Vec<GroupRecord>,
    member_groups: Vec<MemberGroupRecord>,
    course_members: Vec<CourseMember>,
}

/// Record store backing every local port with in-memory tables.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    tables: Mutex<Tables>,
    /// Reject the update at this position of the next batch.
    fail_at: Mutex<Option<usize>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next batch fail at record `index`.
    pub fn fail_next_batch_at(&self, index: usize) {
        *self.fail_at.lock() = Some(index);
    }

    pub fn add_group(&self, group: GroupRecord) {
        self.tables.lock().groups.push(group);
    }

    pub fn add_member_group(&self, member_group: MemberGroupRecord) {
        self.tables.lock().member_groups.push(member_group);
    }

    pub fn add_course_member(&self, member: CourseMember) {
        self.tables.lock().course_members.push(member);
    }

    pub fn add_identity(&self, identity: IdentityRecord) {
        self.tables
            .lock()
            .identities
            .insert(identity.reg_id.clone(), identity);
    }

    /// Every update applied so far, in order.
    pub fn updates(&self) -> Vec<EnrollmentUpdate> {
        self.tables.lock().updates.clone()
    }

    pub fn identity(&self, reg_id: &str) -> Option<IdentityRecord> {
        self.tables.lock().identities.get(reg_id).cloned()
    }

    /// First group record with this name.
    pub fn group(&self, group_id: &str) -> Option<GroupRecord> {
        self.tables
            .lock()
            .groups
            .iter()
            .find(|g| g.group_id == group_id)
            .cloned()
    }

    pub fn member_groups(&self) -> Vec<MemberGroupRecord> {
        self.tables.lock().member_groups.clone()
    }

    pub fn course_member_records(&self) -> Vec<CourseMember> {
        self.tables.lock().course_members.clone()
    }
}

#[async_trait]
impl UpdateSink for MemoryRecordStore {
    async fn submit_batch(&self, updates: &[EnrollmentUpdate]) -> Result<usize, SinkError> {
        let fail_at = self.fail_at.lock().take();
        let mut tables = self.tables.lock();
        for (applied, update) in updates.iter().enumerate() {
            if fail_at == Some(applied) {
                return Err(SinkError {
                    applied,
                    reason: format!("rejected {} for {}", update.section_sis_id, update.reg_id),
                });
            }
            tables.updates.push(update.clone());
        }
        Ok(updates.len())
    }
}

#[async_trait]
impl IdentityStore for MemoryRecordStore {
    async fn find_identity(&self, reg_id: &str) -> Result<Option<IdentityRecord>, StoreError> {
        Ok(self.identity(reg_id))
    }

    async fn save_identity(&self, record: IdentityRecord) -> Result<(), StoreError> {
        self.add_identity(record);
        Ok(())
    }
}

#[async_trait]
impl GroupStore for MemoryRecordStore {
    async fn groups_named(&self, group_id: &str) -> Result<Vec<GroupRecord>, StoreError> {
        Ok(self
            .tables
            .lock()
            .groups
            .iter()
            .filter(|g| g.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn member_groups_named(
        &self,
        group_id: &str,
    ) -> Result<Vec<MemberGroupRecord>, StoreError> {
        Ok(self
            .tables
            .lock()
            .member_groups
            .iter()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn has_active_member_groups(&self, root_group_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .tables
            .lock()
            .member_groups
            .iter()
            .any(|m| m.root_group_id == root_group_id && !m.is_deleted))
    }

    async fn mark_group_deleted(
        &self,
        group_id: &str,
        deleted_by: &str,
        at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let mut tables = self.tables.lock();
        let mut marked = 0;
        for group in tables
            .groups
            .iter_mut()
            .filter(|g| g.group_id == group_id && !g.is_deleted)
        {
            group.is_deleted = true;
            group.deleted_by = Some(deleted_by.to_string());
            group.deleted_date = Some(at);
            group.priority = Priority::Immediate;
            marked += 1;
        }
        Ok(marked)
    }

    async fn mark_member_groups_deleted(
        &self,
        group_id: &str,
    ) -> Result<Vec<MemberGroupRecord>, StoreError> {
        let mut tables = self.tables.lock();
        let mut marked = Vec::new();
        for member_group in tables
            .member_groups
            .iter_mut()
            .filter(|m| m.group_id == group_id && !m.is_deleted)
        {
            member_group.is_deleted = true;
            marked.push(member_group.clone());
        }
        Ok(marked)
    }

    async fn set_group_priority(
        &self,
        group_id: &str,
        priority: Priority,
    ) -> Result<usize, StoreError> {
        let mut tables = self.tables.lock();
        let mut updated = 0;
        for group in tables
            .groups
            .iter_mut()
            .filter(|g| g.group_id == group_id && !g.is_deleted)
        {
            group.priority = priority;
            updated += 1;
        }
        Ok(updated)
    }

    async fn rename_group(&self, old_name: &str, new_name: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();
        for group in tables.groups.iter_mut().filter(|g| g.group_id == old_name) {
            group.group_id = new_name.to_string();
        }
        for member_group in tables.member_groups.iter_mut() {
            if member_group.group_id == old_name {
                member_group.group_id = new_name.to_string();
            }
            if member_group.root_group_id == old_name {
                member_group.root_group_id = new_name.to_string();
            }
        }
        Ok(())
    }

    async fn upsert_member_group(
        &self,
        group_id: &str,
        root_group_id: &str,
        is_deleted: bool,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();
        match tables
            .member_groups
            .iter_mut()
            .find(|m| m.group_id == group_id && m.root_group_id == root_group_id)
        {
            Some(existing) => existing.is_deleted = is_deleted,
            None => tables.member_groups.push(MemberGroupRecord {
                group_id: group_id.to_string(),
                root_group_id: root_group_id.to_string(),
                is_deleted,
            }),
        }
        Ok(())
    }

    async fn course_members(&self, key: &CourseMemberKey) -> Result<Vec<CourseMember>, StoreError> {
        Ok(self
            .tables
            .lock()
            .course_members
            .iter()
            .filter(|m| &m.key == key)
            .cloned()
            .collect())
    }

    async fn save_course_member(&self, member: CourseMember) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();
        tables.course_members.retain(|m| m.key != member.key);
        tables.course_members.push(member);
        Ok(())
    }
}

#[async_trait]
impl OfficialRoster for MemoryRecordStore {
    /// Active enrollment of the net id's registry id in any section of
    /// `course_id`, judged by the latest update per section.
    async fn is_officially_enrolled(
        &self,
        course_id: &str,
        net_id: &str,
    ) -> Result<bool, StoreError> {
        let tables = self.tables.lock();
        let Some(reg_id) = tables
            .identities
            .values()
            .find(|i| i.net_id == net_id)
            .map(|i| i.reg_id.as_str())
        else {
            return Ok(false);
        };

        let mut latest: HashMap<&str, EnrollmentStatus> = HashMap::new();
        for update in tables
            .updates
            .iter()
            .filter(|u| u.reg_id == reg_id && u.section_sis_id.starts_with(course_id))
        {
            latest.insert(update.section_sis_id.as_str(), update.status);
        }
        Ok(latest.values().any(|s| *s == EnrollmentStatus::Active))
    }
}
