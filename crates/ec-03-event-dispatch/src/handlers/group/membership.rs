//! Membership group sub-handler.
//!
//! Owns groups registered against a course and the groups nested inside
//! them. Member changes become course-member records; nested groups are
//! expanded through the membership lookup, acting as the identity that
//! registered the root group.

use crate::domain::errors::{IngestError, SkipReason};
use crate::domain::events::{ChangeSubjectNameBody, UpdateMembersBody};
use crate::domain::outcome::HandlerReport;
use crate::domain::policy::{is_academic_course_id, valid_gmail_id, valid_net_id};
use crate::domain::records::{
    CourseMember, CourseMemberKey, GroupMember, GroupRecord, MemberType, Priority,
    DELETED_BY_EVENT,
};
use crate::ports::outbound::{GroupStore, MembershipError, MembershipLookup, OfficialRoster};
use shared_types::TimeSource;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct MembershipGroups {
    groups: Arc<dyn GroupStore>,
    lookup: Arc<dyn MembershipLookup>,
    roster: Arc<dyn OfficialRoster>,
    time: Arc<dyn TimeSource>,
}

/// Per-message memo of validated member names to their course-member name.
type Validated = HashMap<String, String>;

impl MembershipGroups {
    pub fn new(
        groups: Arc<dyn GroupStore>,
        lookup: Arc<dyn MembershipLookup>,
        roster: Arc<dyn OfficialRoster>,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            groups,
            lookup,
            roster,
            time,
        }
    }

    /// Apply added and removed members to every active course group that
    /// `group_id` is, or is nested in. Returns the number of members named.
    pub async fn update_members(
        &self,
        group_id: &str,
        body: &UpdateMembersBody,
        report: &mut HandlerReport,
    ) -> Result<u64, IngestError> {
        info!(
            group = %group_id,
            added = body.add_members.len(),
            removed = body.delete_members.len(),
            "update-members"
        );

        let targets = self.target_groups(group_id).await?;
        let mut validated = Validated::new();

        for (members, is_deleted) in [(&body.add_members, false), (&body.delete_members, true)] {
            for member in members {
                for group in &targets {
                    self.update_group(group, member, is_deleted, &mut validated, report)
                        .await?;
                }
            }
        }

        Ok((body.add_members.len() + body.delete_members.len()) as u64)
    }

    /// Mark the group and its nested records deleted and flag the roots
    /// for immediate reimport.
    pub async fn delete_group(&self, group_id: &str) -> Result<u64, IngestError> {
        info!(group = %group_id, "delete-group");

        let now = self.time.now_utc();
        self.groups
            .mark_group_deleted(group_id, DELETED_BY_EVENT, now)
            .await?;

        for member_group in self.groups.mark_member_groups_deleted(group_id).await? {
            self.groups
                .set_group_priority(&member_group.root_group_id, Priority::Immediate)
                .await?;
        }
        Ok(1)
    }

    pub async fn change_subject_name(&self, body: &ChangeSubjectNameBody) -> Result<u64, IngestError> {
        info!(old = %body.old_name, new = %body.new_name, "change-subject-name");
        self.groups.rename_group(&body.old_name, &body.new_name).await?;
        Ok(1)
    }

    /// Active groups named `group_id`, then the active roots of every active
    /// member group with that name.
    async fn target_groups(&self, group_id: &str) -> Result<Vec<GroupRecord>, IngestError> {
        let mut targets: Vec<GroupRecord> = self
            .groups
            .groups_named(group_id)
            .await?
            .into_iter()
            .filter(|g| !g.is_deleted)
            .collect();

        for member_group in self.groups.member_groups_named(group_id).await? {
            if member_group.is_deleted {
                continue;
            }
            targets.extend(
                self.groups
                    .groups_named(&member_group.root_group_id)
                    .await?
                    .into_iter()
                    .filter(|g| !g.is_deleted),
            );
        }
        Ok(targets)
    }

    async fn update_group(
        &self,
        group: &GroupRecord,
        member: &GroupMember,
        is_deleted: bool,
        validated: &mut Validated,
        report: &mut HandlerReport,
    ) -> Result<(), IngestError> {
        match member.member_type {
            MemberType::Group => {
                self.update_member_group(group, &member.name, is_deleted, report)
                    .await
            }
            MemberType::NetId | MemberType::Eppn => {
                let name = match validated.get(&member.name) {
                    Some(name) => name.clone(),
                    None => match member_name(member) {
                        Ok(name) => {
                            validated.insert(member.name.clone(), name.clone());
                            name
                        }
                        Err(e) => {
                            info!(member = %member.name, error = %e, "policy fail");
                            report.skip(SkipReason::Policy(e));
                            return Ok(());
                        }
                    },
                };
                self.update_course_member(group, &name, member.member_type, is_deleted)
                    .await
            }
            MemberType::Other => {
                info!(member = %member.name, "unused member type");
                Ok(())
            }
        }
    }

    async fn update_member_group(
        &self,
        group: &GroupRecord,
        member_group: &str,
        is_deleted: bool,
        report: &mut HandlerReport,
    ) -> Result<(), IngestError> {
        let effective = match self
            .lookup
            .effective_members(member_group, &group.added_by)
            .await
        {
            Ok(effective) => effective,
            Err(MembershipError::NotFound(missing)) => {
                self.groups.mark_member_groups_deleted(&missing).await?;
                error!(
                    member_group = %missing,
                    group = %group.group_id,
                    "member group not found"
                );
                report.skip(SkipReason::NestedGroup {
                    group: missing,
                    reason: "not found".into(),
                });
                return Ok(());
            }
            Err(MembershipError::Transport(e)) => return Err(e.into()),
            Err(e) => {
                error!(member_group = %member_group, group = %group.group_id, error = %e, "member group lookup refused");
                report.skip(SkipReason::NestedGroup {
                    group: member_group.to_string(),
                    reason: e.to_string(),
                });
                return Ok(());
            }
        };

        for (nested, reason) in &effective.unreadable_groups {
            warn!(member_group = %nested, group = %group.group_id, reason = %reason, "nested group skipped");
            report.skip(SkipReason::NestedGroup {
                group: nested.clone(),
                reason: reason.clone(),
            });
        }

        for member in &effective.valid {
            match member_name(member) {
                Ok(name) => {
                    self.update_course_member(group, &name, member.member_type, is_deleted)
                        .await?;
                }
                Err(e) => {
                    info!(member = %member.name, member_group = %member_group, error = %e, "policy fail");
                    report.skip(SkipReason::Policy(e));
                }
            }
        }

        for nested in std::iter::once(member_group).chain(effective.nested_groups.iter().map(String::as_str)) {
            self.groups
                .upsert_member_group(nested, &group.group_id, is_deleted)
                .await?;
        }
        Ok(())
    }

    async fn update_course_member(
        &self,
        group: &GroupRecord,
        name: &str,
        member_type: MemberType,
        is_deleted: bool,
    ) -> Result<(), IngestError> {
        let key = CourseMemberKey {
            name: name.to_string(),
            member_type,
            course_id: group.course_id.clone(),
            role: group.role.clone(),
        };

        let mut existing = self.groups.course_members(&key).await?;
        if existing.len() > 1 {
            debug!(
                count = existing.len(),
                member = %name,
                course = %group.course_id,
                role = %group.role,
                "collapsing duplicate course members"
            );
        }
        let mut record = if existing.is_empty() {
            CourseMember::new(key)
        } else {
            existing.swap_remove(0)
        };

        let deleted = if is_deleted {
            if self.in_member_group(group, name).await? {
                false
            } else if self.officially_enrolled(group, name).await? {
                debug!(member = %name, course = %group.course_id, "officially enrolled, removal ignored");
                record.is_deleted
            } else {
                true
            }
        } else {
            // official enrollment already provisions the member
            self.officially_enrolled(group, name).await?
        };

        record.is_deleted = deleted;
        record.priority = if record.queue_id.is_none() {
            Priority::Default
        } else {
            Priority::High
        };
        self.groups.save_course_member(record).await?;

        info!(
            state = if deleted { "deleted" } else { "active" },
            member = %name,
            course = %group.course_id,
            role = %group.role,
            "group member updated"
        );
        Ok(())
    }

    /// Whether the member still arrives through another nested group.
    async fn in_member_group(&self, group: &GroupRecord, name: &str) -> Result<bool, IngestError> {
        if !self.groups.has_active_member_groups(&group.group_id).await? {
            return Ok(false);
        }
        match self
            .lookup
            .is_effective_member(&group.group_id, name, &group.added_by)
            .await
        {
            Ok(found) => Ok(found),
            Err(MembershipError::Transport(e)) => Err(e.into()),
            Err(e) => {
                warn!(group = %group.group_id, member = %name, error = %e, "effective member check failed");
                Ok(false)
            }
        }
    }

    async fn officially_enrolled(&self, group: &GroupRecord, name: &str) -> Result<bool, IngestError> {
        if !is_academic_course_id(&group.course_id) {
            return Ok(false);
        }
        Ok(self
            .roster
            .is_officially_enrolled(&group.course_id, name)
            .await?)
    }
}

/// Course-member name of a person member: the net id, or the normalised
/// gmail address of an eppn.
fn member_name(member: &GroupMember) -> Result<String, crate::domain::policy::PolicyError> {
    match member.member_type {
        MemberType::Eppn => valid_gmail_id(&member.name),
        _ => valid_net_id(&member.name).map(|_| member.name.clone()),
    }
}
