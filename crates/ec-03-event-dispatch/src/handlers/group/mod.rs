//! # Group Event Handler
//!
//! Group notifications carry their action and group name in a base64 JSON
//! `MessageContext` header. The group name selects an owning sub-handler,
//! tried in a fixed order where the first claim wins:
//!
//! 1. `Import` - configured import groups, every action ignored
//! 2. `Course` - `course_<yyyy><qtr>-<curric><num><sect>` names, ignored
//! 3. `Membership` - registered course groups and their nested groups
//! 4. `Unowned` - everything else, every action ignored
//!
//! The body is only decrypted when the owner acts on it.

pub mod membership;

pub use membership::MembershipGroups;

use crate::domain::config::DispatchConfig;
use crate::domain::errors::{IngestError, SkipReason, UnknownActionError};
use crate::domain::events::{ChangeSubjectNameBody, DeleteGroupBody, GroupContext, UpdateMembersBody};
use crate::domain::outcome::HandlerReport;
use crate::domain::policy::course_group_sis_id;
use crate::ports::outbound::GroupStore;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ec_01_message_extraction::{ExtractionError, MessageExtractionApi};
use shared_types::{Envelope, EventCategory, HeaderField};
use std::sync::Arc;
use tracing::info;

/// Action code carried in the message context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupAction {
    UpdateMembers,
    PutGroup,
    DeleteGroup,
    PutMembers,
    ChangeSubjectName,
    NoAction,
    Unknown(String),
}

impl GroupAction {
    pub fn parse(code: &str) -> Self {
        match code {
            "update-members" => GroupAction::UpdateMembers,
            "put-group" => GroupAction::PutGroup,
            "delete-group" => GroupAction::DeleteGroup,
            "put-members" => GroupAction::PutMembers,
            "change-subject-name" => GroupAction::ChangeSubjectName,
            "no-action" => GroupAction::NoAction,
            other => GroupAction::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            GroupAction::UpdateMembers => "update-members",
            GroupAction::PutGroup => "put-group",
            GroupAction::DeleteGroup => "delete-group",
            GroupAction::PutMembers => "put-members",
            GroupAction::ChangeSubjectName => "change-subject-name",
            GroupAction::NoAction => "no-action",
            GroupAction::Unknown(code) => code,
        }
    }
}

/// Sub-handler that claimed a group name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupOwner {
    Import,
    Course { course_sis_id: String },
    Membership,
    Unowned,
}

impl GroupOwner {
    pub fn name(&self) -> &'static str {
        match self {
            GroupOwner::Import => "import",
            GroupOwner::Course { .. } => "course",
            GroupOwner::Membership => "membership",
            GroupOwner::Unowned => "unowned",
        }
    }
}

/// Decode the base64 JSON message context of a group envelope.
pub fn decode_context(envelope: &Envelope) -> Result<GroupContext, IngestError> {
    let encoded = envelope
        .header
        .message_context
        .as_deref()
        .ok_or(ExtractionError::MissingField(HeaderField::MessageContext))?;
    let raw = STANDARD
        .decode(encoded.trim())
        .map_err(|e| IngestError::Payload(format!("MessageContext: {e}")))?;
    Ok(serde_json::from_slice(&raw)?)
}

pub struct GroupHandler {
    extraction: Arc<dyn MessageExtractionApi>,
    groups: Arc<dyn GroupStore>,
    membership: MembershipGroups,
    config: DispatchConfig,
}

impl GroupHandler {
    pub fn new(
        extraction: Arc<dyn MessageExtractionApi>,
        groups: Arc<dyn GroupStore>,
        membership: MembershipGroups,
        config: DispatchConfig,
    ) -> Self {
        Self {
            extraction,
            groups,
            membership,
            config,
        }
    }

    /// First sub-handler, in claim order, that claims `group`.
    pub async fn owner_of(&self, group: &str) -> Result<GroupOwner, IngestError> {
        if self.config.is_import_group(group) {
            return Ok(GroupOwner::Import);
        }
        if let Some(course_sis_id) = course_group_sis_id(group) {
            return Ok(GroupOwner::Course { course_sis_id });
        }
        if !self.groups.groups_named(group).await?.is_empty()
            || !self.groups.member_groups_named(group).await?.is_empty()
        {
            return Ok(GroupOwner::Membership);
        }
        Ok(GroupOwner::Unowned)
    }

    pub async fn handle(&self, envelope: &Envelope) -> Result<HandlerReport, IngestError> {
        let context = decode_context(envelope)?;
        let action = GroupAction::parse(&context.action);
        let group = context.group.as_str();
        let mut report = HandlerReport::new(EventCategory::Group);

        let owner = self.owner_of(group).await?;

        let count = match (&owner, &action) {
            (_, GroupAction::Unknown(code)) => {
                info!(group = %group, action = %code, "unknown group action");
                report.skip(SkipReason::UnknownAction(UnknownActionError {
                    code: code.clone(),
                    subject: group.to_string(),
                }));
                0
            }
            (_, GroupAction::NoAction) => {
                info!(group = %group, "no-action");
                0
            }
            (GroupOwner::Membership, GroupAction::UpdateMembers) => {
                let body: UpdateMembersBody = self.extraction.extract(envelope).await?.decode()?;
                self.membership
                    .update_members(group, &body, &mut report)
                    .await?
            }
            (GroupOwner::Membership, GroupAction::DeleteGroup) => {
                let body: DeleteGroupBody = self.extraction.extract(envelope).await?.decode()?;
                let target = body.group.as_deref().unwrap_or(group);
                self.membership.delete_group(target).await?
            }
            (GroupOwner::Membership, GroupAction::ChangeSubjectName) => {
                let body: ChangeSubjectNameBody =
                    self.extraction.extract(envelope).await?.decode()?;
                self.membership.change_subject_name(&body).await?
            }
            (GroupOwner::Course { course_sis_id }, _) => {
                info!(
                    course = %course_sis_id,
                    action = %action.as_str(),
                    "ignoring course group event"
                );
                0
            }
            (_, _) => {
                info!(
                    group = %group,
                    owner = owner.name(),
                    action = %action.as_str(),
                    "ignoring group event"
                );
                0
            }
        };

        if count > 0 {
            report.loaded();
        }
        Ok(report.with_recorded(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MemoryRecordStore, StaticMembership};
    use crate::domain::records::{GroupRecord, MemberGroupRecord};
    use async_trait::async_trait;
    use ec_01_message_extraction::{ExtractedPayload, SignatureError};
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use shared_types::EnvelopeHeader;

    /// Extraction stub returning a fixed body and counting calls.
    struct FixedBody {
        body: Value,
        calls: Mutex<usize>,
    }

    impl FixedBody {
        fn new(body: Value) -> Arc<Self> {
            Arc::new(Self {
                body,
                calls: Mutex::new(0),
            })
        }
    }

    #[async_trait]
    impl MessageExtractionApi for FixedBody {
        async fn authenticate(&self, _envelope: &Envelope) -> Result<(), SignatureError> {
            Ok(())
        }

        async fn extract(&self, _envelope: &Envelope) -> Result<ExtractedPayload, ExtractionError> {
            *self.calls.lock() += 1;
            Ok(ExtractedPayload::new(self.body.clone()))
        }
    }

    fn envelope(action: &str, group: &str) -> Envelope {
        let context = json!({"action": action, "group": group}).to_string();
        Envelope::new(
            EnvelopeHeader {
                message_type: Some("gws".into()),
                version: Some("UWIT-1".into()),
                message_context: Some(STANDARD.encode(context)),
                ..Default::default()
            },
            "",
        )
    }

    fn handler(
        body: Arc<FixedBody>,
        groups: Arc<MemoryRecordStore>,
        config: DispatchConfig,
    ) -> GroupHandler {
        let membership = MembershipGroups::new(
            groups.clone(),
            Arc::new(StaticMembership::new()),
            groups.clone(),
            Arc::new(shared_types::FixedTimeSource::new(1_700_000_000)),
        );
        GroupHandler::new(body, groups, membership, config)
    }

    #[test]
    fn test_action_codes() {
        assert_eq!(GroupAction::parse("delete-group"), GroupAction::DeleteGroup);
        assert_eq!(
            GroupAction::parse("frobnicate"),
            GroupAction::Unknown("frobnicate".into())
        );
        assert_eq!(GroupAction::parse("put-members").as_str(), "put-members");
    }

    #[test]
    fn test_missing_context_is_extraction_error() {
        let err = decode_context(&Envelope::default()).unwrap_err();
        assert_eq!(
            err,
            IngestError::Extraction(ExtractionError::MissingField(HeaderField::MessageContext))
        );
    }

    #[tokio::test]
    async fn test_claim_order_first_match_wins() {
        let groups = Arc::new(MemoryRecordStore::new());
        groups.add_group(GroupRecord::new("u_team_a", "course-1", "student", "owner"));
        groups.add_group(GroupRecord::new(
            "course_2024aut-cse142a",
            "2024-autumn-CSE-142-A",
            "student",
            "owner",
        ));
        groups.add_member_group(MemberGroupRecord {
            group_id: "u_nested".into(),
            root_group_id: "u_team_a".into(),
            is_deleted: false,
        });
        let handler = handler(
            FixedBody::new(json!({})),
            groups,
            DispatchConfig::default().with_import_groups(["u_team_a"]),
        );

        assert_eq!(handler.owner_of("u_team_a").await.unwrap(), GroupOwner::Import);
        assert!(matches!(
            handler.owner_of("course_2024aut-cse142a").await.unwrap(),
            GroupOwner::Course { .. }
        ));
        assert_eq!(handler.owner_of("u_nested").await.unwrap(), GroupOwner::Membership);
        assert_eq!(handler.owner_of("u_nobody").await.unwrap(), GroupOwner::Unowned);
    }

    #[tokio::test]
    async fn test_unknown_action_is_zero_effect() {
        let body = FixedBody::new(json!({}));
        let groups = Arc::new(MemoryRecordStore::new());
        groups.add_group(GroupRecord::new("u_team_a", "course-1", "student", "owner"));

        let report = handler(body.clone(), groups, DispatchConfig::default())
            .handle(&envelope("frobnicate", "u_team_a"))
            .await
            .unwrap();

        assert_eq!(report.recorded, 0);
        assert!(matches!(
            report.skipped().next(),
            Some(SkipReason::UnknownAction(_))
        ));
        assert_eq!(*body.calls.lock(), 0);
    }

    #[tokio::test]
    async fn test_unowned_group_never_decrypts() {
        let body = FixedBody::new(json!({"addMembers": [{"type": "uwnetid", "name": "jdoe"}]}));
        let report = handler(body.clone(), Arc::new(MemoryRecordStore::new()), DispatchConfig::default())
            .handle(&envelope("update-members", "u_somebody_else"))
            .await
            .unwrap();

        assert_eq!(report.recorded, 0);
        assert_eq!(*body.calls.lock(), 0);
    }

    #[tokio::test]
    async fn test_membership_update_records_member_count() {
        let body = FixedBody::new(json!({
            "addMembers": [{"type": "uwnetid", "name": "jdoe"}],
            "deleteMembers": [{"type": "uwnetid", "name": "asmith"}]
        }));
        let groups = Arc::new(MemoryRecordStore::new());
        groups.add_group(GroupRecord::new("u_team_a", "course-1", "student", "owner"));

        let report = handler(body.clone(), groups.clone(), DispatchConfig::default())
            .handle(&envelope("update-members", "u_team_a"))
            .await
            .unwrap();

        assert_eq!(report.recorded, 2);
        assert_eq!(*body.calls.lock(), 1);
        assert_eq!(groups.course_member_records().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_uses_context_group_without_body_name() {
        let groups = Arc::new(MemoryRecordStore::new());
        groups.add_group(GroupRecord::new("u_team_a", "course-1", "student", "owner"));

        let report = handler(FixedBody::new(json!({})), groups.clone(), DispatchConfig::default())
            .handle(&envelope("delete-group", "u_team_a"))
            .await
            .unwrap();

        assert_eq!(report.recorded, 1);
        assert!(groups.group("u_team_a").unwrap().is_deleted);
    }
}
