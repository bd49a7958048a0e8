//! View-based access control for outgoing notifications.
//!
//! Before a notification is sent to a target, every OID it carries (the
//! trap OID and each varbind OID) must fall inside the notify view granted
//! to the target's security parameters. Denial is silent per target: the
//! notification is suppressed for that target and dispatch continues.
//!
//! [`AccessControl`] is the seam; [`NotifyVacm`] is the bundled RFC 3415
//! style implementation. Checks fail closed: an unknown principal, a
//! missing access entry, or an undefined view all deny.

use std::collections::HashMap;

use bytes::Bytes;

use crate::config::{FilterAction, FilterSubtree};
use crate::oid::Oid;
use crate::security::{SecurityContext, SecurityLevel, SecurityModel};

/// Grants or denies visibility of a single OID to a principal.
pub trait AccessControl: Send + Sync {
    /// `true` if `oid` is within the notify view of the principal described
    /// by `ctx`.
    fn allows_notify(&self, ctx: &SecurityContext, oid: &Oid) -> bool;
}

/// Permits everything. For closed deployments and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl AccessControl for AllowAll {
    fn allows_notify(&self, _ctx: &SecurityContext, _oid: &Oid) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
struct AccessEntry {
    group: Bytes,
    context_prefix: Bytes,
    security_model: SecurityModel,
    security_level: SecurityLevel,
    exact_context: bool,
    notify_view: Bytes,
}

/// View-based access control scoped to the notify view.
///
/// Three tables: (security model, security name) to group, group to access
/// entry, view name to a set of included/excluded subtree families with
/// wildcard masks. When several access entries match, the most specific
/// wins: exact context over prefix, concrete model over any, then highest
/// security level.
#[derive(Debug, Default)]
pub struct NotifyVacm {
    groups: HashMap<(SecurityModel, Bytes), Bytes>,
    access: Vec<AccessEntry>,
    views: HashMap<Bytes, Vec<FilterSubtree>>,
}

impl NotifyVacm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a (security model, security name) principal to a group.
    pub fn add_group(
        &mut self,
        model: SecurityModel,
        security_name: impl Into<Bytes>,
        group: impl Into<Bytes>,
    ) {
        self.groups
            .insert((model, security_name.into()), group.into());
    }

    /// Grant a group a notify view.
    pub fn add_access(
        &mut self,
        group: impl Into<Bytes>,
        context_prefix: impl Into<Bytes>,
        security_model: SecurityModel,
        security_level: SecurityLevel,
        exact_context: bool,
        notify_view: impl Into<Bytes>,
    ) {
        self.access.push(AccessEntry {
            group: group.into(),
            context_prefix: context_prefix.into(),
            security_model,
            security_level,
            exact_context,
            notify_view: notify_view.into(),
        });
    }

    /// Add a subtree family to a view.
    pub fn add_view_subtree(&mut self, view: impl Into<Bytes>, subtree: FilterSubtree) {
        self.views.entry(view.into()).or_default().push(subtree);
    }

    fn group_of(&self, model: SecurityModel, security_name: &[u8]) -> Option<&Bytes> {
        self.groups
            .get(&(model, Bytes::copy_from_slice(security_name)))
            .or_else(|| self.groups.get(&(SecurityModel::Any, Bytes::copy_from_slice(security_name))))
    }

    fn notify_view_of(&self, ctx: &SecurityContext) -> Option<&Bytes> {
        let group = self.group_of(ctx.security_model, &ctx.security_name)?;
        self.access
            .iter()
            .filter(|e| {
                e.group == group
                    && (e.security_model == SecurityModel::Any
                        || e.security_model == ctx.security_model)
                    && e.security_level <= ctx.security_level
                    && if e.exact_context {
                        ctx.context_name == e.context_prefix
                    } else {
                        ctx.context_name.starts_with(&e.context_prefix)
                    }
            })
            // Most specific entry wins.
            .max_by_key(|e| {
                (
                    e.exact_context,
                    e.context_prefix.len(),
                    e.security_model != SecurityModel::Any,
                    e.security_level,
                )
            })
            .map(|e| &e.notify_view)
    }
}

impl AccessControl for NotifyVacm {
    fn allows_notify(&self, ctx: &SecurityContext, oid: &Oid) -> bool {
        let Some(view) = self.notify_view_of(ctx) else {
            return false;
        };
        let Some(families) = self.views.get(view) else {
            return false;
        };
        // Longest matching family decides; no match denies.
        families
            .iter()
            .filter(|f| f.matches(oid))
            .max_by_key(|f| f.oid.len())
            .is_some_and(|f| f.action == FilterAction::Include)
    }
}
