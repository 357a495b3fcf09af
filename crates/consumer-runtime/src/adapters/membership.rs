//! Group membership from the group web service.
//!
//! Effective members are the direct members of a group with every nested
//! group expanded. Each group is read at most once per lookup, so cycles in
//! the nesting terminate. A nested group that is missing or refused is
//! skipped and reported; only failures of the queried group itself, or of
//! the transport, fail the lookup.

use super::http::{service_url, HttpError, HttpGetter, HttpResponse};
use async_trait::async_trait;
use ec_03_event_dispatch::{
    EffectiveMembers, GroupMember, LookupError, MemberType, MembershipError, MembershipLookup,
};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Header naming the identity a lookup runs on behalf of.
pub const ACT_AS_HEADER: &str = "X-UW-Act-as";

const SERVICE: &str = "gws";

#[derive(Deserialize)]
struct MemberList {
    #[serde(default)]
    data: Vec<GroupMember>,
}

/// Direct (unexpanded) member listing of one group.
#[async_trait]
pub trait MemberSource: Send + Sync {
    async fn direct_members(
        &self,
        group_id: &str,
        act_as: &str,
    ) -> Result<Vec<GroupMember>, MembershipError>;
}

pub struct GwsMembership {
    http: HttpGetter,
    base_url: String,
}

impl GwsMembership {
    pub fn new(http: HttpGetter, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn members_url(&self, group_id: &str) -> Result<String, HttpError> {
        service_url(
            &self.base_url,
            &["group_sws", "v3", "group", group_id, "member"],
        )
    }

    pub fn effective_member_url(&self, group_id: &str, member: &str) -> Result<String, HttpError> {
        service_url(
            &self.base_url,
            &["group_sws", "v3", "group", group_id, "effective_member", member],
        )
    }

    async fn get(&self, url: &str, act_as: &str) -> Result<HttpResponse, MembershipError> {
        self.http
            .get(url, &[(ACT_AS_HEADER, act_as)])
            .await
            .map_err(transport)
    }
}

#[async_trait]
impl MemberSource for GwsMembership {
    async fn direct_members(
        &self,
        group_id: &str,
        act_as: &str,
    ) -> Result<Vec<GroupMember>, MembershipError> {
        let url = self.members_url(group_id).map_err(transport)?;
        let response = self.get(&url, act_as).await?;
        parse_members(group_id, &response)
    }
}

fn transport(err: HttpError) -> MembershipError {
    MembershipError::Transport(LookupError {
        service: SERVICE,
        reason: err.to_string(),
    })
}

/// Map a non-success status to the lookup failure it stands for.
pub fn status_error(group_id: &str, status: u16) -> MembershipError {
    match status {
        404 => MembershipError::NotFound(group_id.to_string()),
        401 => MembershipError::Unauthorized(group_id.to_string()),
        403 => MembershipError::Policy(format!("access to {group_id} denied")),
        other => MembershipError::Transport(LookupError {
            service: SERVICE,
            reason: format!("group {group_id} lookup returned status {other}"),
        }),
    }
}

/// Direct members listed in a member response.
pub fn parse_members(
    group_id: &str,
    response: &HttpResponse,
) -> Result<Vec<GroupMember>, MembershipError> {
    if !response.is_success() {
        return Err(status_error(group_id, response.status));
    }
    let list: MemberList = serde_json::from_slice(&response.body).map_err(|e| {
        MembershipError::Transport(LookupError {
            service: SERVICE,
            reason: format!("malformed member list for {group_id}: {e}"),
        })
    })?;
    Ok(list.data)
}

/// Expand `group_id` over `source`, depth first.
pub async fn expand_members(
    source: &dyn MemberSource,
    group_id: &str,
    act_as: &str,
) -> Result<EffectiveMembers, MembershipError> {
    let mut effective = EffectiveMembers::default();
    let mut visited: HashSet<String> = HashSet::from([group_id.to_string()]);
    let mut seen: HashSet<GroupMember> = HashSet::new();
    let mut pending = vec![group_id.to_string()];

    while let Some(current) = pending.pop() {
        let members = match source.direct_members(&current, act_as).await {
            Ok(members) => members,
            Err(e @ MembershipError::Transport(_)) => return Err(e),
            Err(e) if current != group_id => {
                warn!(group = %group_id, nested = %current, error = %e, "skipping unreadable nested group");
                effective.nested_groups.retain(|name| *name != current);
                effective.unreadable_groups.push((current, e.to_string()));
                continue;
            }
            Err(e) => return Err(e),
        };

        for member in members {
            match member.member_type {
                MemberType::Group => {
                    if visited.insert(member.name.clone()) {
                        effective.nested_groups.push(member.name.clone());
                        pending.push(member.name);
                    }
                }
                MemberType::NetId | MemberType::Eppn => {
                    if seen.insert(member.clone()) {
                        effective.valid.push(member);
                    }
                }
                MemberType::Other => effective.invalid.push(member),
            }
        }
    }

    debug!(
        group = %group_id,
        valid = effective.valid.len(),
        invalid = effective.invalid.len(),
        nested = effective.nested_groups.len(),
        unreadable = effective.unreadable_groups.len(),
        "expanded effective members"
    );
    Ok(effective)
}

#[async_trait]
impl MembershipLookup for GwsMembership {
    async fn effective_members(
        &self,
        group_id: &str,
        act_as: &str,
    ) -> Result<EffectiveMembers, MembershipError> {
        expand_members(self, group_id, act_as).await
    }

    async fn is_effective_member(
        &self,
        group_id: &str,
        member: &str,
        act_as: &str,
    ) -> Result<bool, MembershipError> {
        let url = self
            .effective_member_url(group_id, member)
            .map_err(transport)?;
        let response = self.get(&url, act_as).await?;
        match response.status {
            200..=299 => Ok(true),
            404 => Ok(false),
            status => Err(status_error(group_id, status)),
        }
    }
}
