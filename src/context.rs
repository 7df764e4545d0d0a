//! Per-request authorization context.

use std::collections::HashSet;
use std::sync::Arc;

use crate::acl::AccessControlList;

/// Read-only authorization view for one request or connection.
///
/// Built by the gate from a verified token payload and the shared ACL.
/// Immutable after construction; clone freely across concurrent checks.
/// Role resolution happens at each `is_authorized` call, so a context that
/// outlives `AccessControlList::clear` degrades to deny-all rather than
/// reading stale grants.
#[derive(Clone)]
pub struct SecurityContext {
    acl: Arc<AccessControlList>,
    roles: Vec<String>,
}

impl SecurityContext {
    pub(crate) fn new(acl: Arc<AccessControlList>, payload: &[u8]) -> Self {
        let roles = roles_from_payload(&acl, payload);
        Self { acl, roles }
    }

    /// Role identifiers claimed by the token, before ACL resolution.
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// True when any claimed role's resolved capability set grants
    /// `operation`. No claimed roles, or none that the ACL defines, means
    /// every operation is denied.
    pub fn is_authorized(&self, operation: &str) -> bool {
        self.roles.iter().any(|r| self.acl.resolve(r).contains(operation))
    }
}

impl std::fmt::Debug for SecurityContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityContext").field("roles", &self.roles).finish()
    }
}

/// Interpret verified payload bytes as role claims.
///
/// Accepted shapes: a JSON object with `role` (string), `roles` (string
/// array), or `subject` (mapped through the ACL assign table); or bare
/// UTF-8 text naming one role (comma-separated list accepted). Non-UTF-8
/// payloads and claim-free JSON carry no roles.
fn roles_from_payload(acl: &AccessControlList, payload: &[u8]) -> Vec<String> {
    let Ok(text) = std::str::from_utf8(payload) else {
        return Vec::new();
    };
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    let mut roles: Vec<String> = Vec::new();
    if let Ok(doc) = serde_json::from_str::<serde_json::Value>(text) {
        if let Some(role) = doc.get("role").and_then(|v| v.as_str()) {
            roles.push(role.to_string());
        }
        if let Some(list) = doc.get("roles").and_then(|v| v.as_array()) {
            roles.extend(list.iter().filter_map(|v| v.as_str()).map(|s| s.to_string()));
        }
        if let Some(subject) = doc.get("subject").and_then(|v| v.as_str()) {
            roles.extend(acl.assigned_roles(subject));
        }
    } else {
        roles.extend(
            text.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string()),
        );
    }
    let mut seen: HashSet<String> = HashSet::new();
    roles.retain(|r| seen.insert(r.clone()));
    roles
}
