//! Notification filters (snmpNotifyFilterTable, RFC 3413).
//!
//! A filter profile is an ordered set of (subtree, mask, include/exclude)
//! rules associated with a target-params name. The decision is keyed on the
//! **trap OID** (the notification identifier): bound varbind OIDs are not
//! consulted. Where several subtrees match, the most specific (longest)
//! subtree wins. A trap OID that matches no subtree passes, so a profile
//! consisting only of exclusions admits everything outside them.

use std::collections::HashMap;

use bytes::Bytes;

use crate::oid::Oid;

/// Whether a matching subtree admits or rejects the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAction {
    /// Notifications under this subtree are sent.
    Include,
    /// Notifications under this subtree are suppressed.
    Exclude,
}

/// A filter subtree with an optional wildcard mask.
///
/// Mask semantics are the same as view subtree masks (RFC 3415): bit 7 of
/// byte 0 corresponds to arc 0; a 1 bit requires an exact arc match, a 0 bit
/// is a wildcard. Arcs beyond the mask require an exact match.
#[derive(Debug, Clone)]
pub struct FilterSubtree {
    /// Base OID of the subtree.
    pub oid: Oid,
    /// Wildcard mask (empty = exact prefix match).
    pub mask: Vec<u8>,
    /// Include or exclude.
    pub action: FilterAction,
}

impl FilterSubtree {
    /// Create an unmasked subtree rule.
    pub fn new(oid: Oid, action: FilterAction) -> Self {
        Self {
            oid,
            mask: Vec::new(),
            action,
        }
    }

    /// Check if an OID falls under this subtree (honoring the mask).
    pub fn matches(&self, oid: &Oid) -> bool {
        let subtree_arcs = self.oid.arcs();
        let oid_arcs = oid.arcs();

        if oid_arcs.len() < subtree_arcs.len() {
            return false;
        }

        for (i, &subtree_arc) in subtree_arcs.iter().enumerate() {
            let mask_bit = if i / 8 < self.mask.len() {
                (self.mask[i / 8] >> (7 - (i % 8))) & 1
            } else {
                1 // Default: exact match required
            };

            if mask_bit == 1 && oid_arcs[i] != subtree_arc {
                return false;
            }
        }

        true
    }
}

/// Filter profiles keyed by target-params name.
#[derive(Debug, Clone, Default)]
pub struct NotifyFilterTable {
    profiles: HashMap<Bytes, Vec<FilterSubtree>>,
}

impl NotifyFilterTable {
    /// Create an empty table (every notification passes).
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter rule to the profile for `params_name`.
    pub fn add_rule(&mut self, params_name: impl Into<Bytes>, rule: FilterSubtree) {
        self.profiles.entry(params_name.into()).or_default().push(rule);
    }

    /// Remove the whole profile for `params_name`.
    pub fn remove_profile(&mut self, params_name: &[u8]) -> bool {
        self.profiles.remove(params_name).is_some()
    }

    /// Decide whether a notification identified by `trap_oid` passes the
    /// profile associated with `params_name`.
    ///
    /// No profile for the name means no filtering: pass. Otherwise the most
    /// specific matching subtree decides; no match passes.
    pub fn passes(&self, params_name: &[u8], trap_oid: &Oid) -> bool {
        let Some(rules) = self.profiles.get(params_name) else {
            return true;
        };

        let best = rules
            .iter()
            .filter(|rule| rule.matches(trap_oid))
            .max_by_key(|rule| rule.oid.len());

        match best {
            Some(rule) => rule.action == FilterAction::Include,
            None => true,
        }
    }
}
