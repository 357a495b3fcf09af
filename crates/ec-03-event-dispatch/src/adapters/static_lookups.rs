//! Fixed upstream lookups for tests and offline replay.

use crate::ports::outbound::{
    EffectiveMembers, LookupError, MembershipError, MembershipLookup, ScheduleGate,
};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};

/// `ScheduleGate` over a fixed set of (campus, year, quarter) terms under
/// construction. Matching is case-insensitive.
#[derive(Debug, Default)]
pub struct StaticScheduleGate {
    building: RwLock<HashSet<(String, String, String)>>,
    queries: Mutex<usize>,
}

impl StaticScheduleGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_under_construction(&self, campus: &str, year: &str, quarter: &str) {
        self.building.write().insert(term_key(campus, year, quarter));
    }

    pub fn clear(&self) {
        self.building.write().clear();
    }

    pub fn queries(&self) -> usize {
        *self.queries.lock()
    }
}

fn term_key(campus: &str, year: &str, quarter: &str) -> (String, String, String) {
    (
        campus.to_lowercase(),
        year.to_string(),
        quarter.to_lowercase(),
    )
}

#[async_trait]
impl ScheduleGate for StaticScheduleGate {
    async fn is_under_construction(
        &self,
        campus: &str,
        year: &str,
        quarter: &str,
    ) -> Result<bool, LookupError> {
        *self.queries.lock() += 1;
        Ok(self
            .building
            .read()
            .contains(&term_key(campus, year, quarter)))
    }
}

/// `MembershipLookup` over fixed answers. Unregistered groups are not found.
#[derive(Debug, Default)]
pub struct StaticMembership {
    answers: RwLock<HashMap<String, Result<EffectiveMembers, MembershipError>>>,
    effective: RwLock<HashSet<(String, String)>>,
    /// (group, act_as) of every effective-members query.
    queries: Mutex<Vec<(String, String)>>,
}

impl StaticMembership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_members(&self, group: &str, members: EffectiveMembers) {
        self.answers.write().insert(group.to_string(), Ok(members));
    }

    pub fn set_error(&self, group: &str, error: MembershipError) {
        self.answers.write().insert(group.to_string(), Err(error));
    }

    /// Record `member` as an effective member of `group`.
    pub fn add_effective_member(&self, group: &str, member: &str) {
        self.effective
            .write()
            .insert((group.to_string(), member.to_string()));
    }

    pub fn queries(&self) -> Vec<(String, String)> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl MembershipLookup for StaticMembership {
    async fn effective_members(
        &self,
        group_id: &str,
        act_as: &str,
    ) -> Result<EffectiveMembers, MembershipError> {
        self.queries
            .lock()
            .push((group_id.to_string(), act_as.to_string()));
        self.answers
            .read()
            .get(group_id)
            .cloned()
            .unwrap_or_else(|| Err(MembershipError::NotFound(group_id.to_string())))
    }

    async fn is_effective_member(
        &self,
        group_id: &str,
        member: &str,
        _act_as: &str,
    ) -> Result<bool, MembershipError> {
        Ok(self
            .effective
            .read()
            .contains(&(group_id.to_string(), member.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::GroupMember;

    #[tokio::test]
    async fn test_gate_is_case_insensitive() {
        let gate = StaticScheduleGate::new();
        gate.set_under_construction("Seattle", "2024", "Autumn");

        assert!(gate.is_under_construction("seattle", "2024", "autumn").await.unwrap());
        assert!(!gate.is_under_construction("tacoma", "2024", "autumn").await.unwrap());
        assert_eq!(gate.queries(), 2);
    }

    #[tokio::test]
    async fn test_unregistered_group_not_found() {
        let lookup = StaticMembership::new();
        lookup.set_members(
            "u_known",
            EffectiveMembers {
                valid: vec![GroupMember::net_id("jdoe")],
                ..Default::default()
            },
        );

        assert_eq!(
            lookup.effective_members("u_known", "owner").await.unwrap().valid.len(),
            1
        );
        assert_eq!(
            lookup.effective_members("u_gone", "owner").await,
            Err(MembershipError::NotFound("u_gone".into()))
        );
        assert_eq!(lookup.queries()[1], ("u_gone".to_string(), "owner".to_string()));
    }
}
