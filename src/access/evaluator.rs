//! Access Evaluator
//!
//! Decides whether an identity may read or write a named operation.

use std::collections::BTreeSet;

use crate::access::{AccessPredicate, AccessRules, Identity};

/// The kind of access being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

impl AccessKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessKind::Read => "read",
            AccessKind::Write => "write",
        }
    }
}

/// Authorisation metadata an entry exposes to the evaluator.
pub trait AccessControlled {
    fn creator_id(&self) -> &str;
    fn auths_for(&self, kind: AccessKind) -> &BTreeSet<String>;
    fn predicate_for(&self, kind: AccessKind) -> Option<&AccessPredicate>;
}

// == Access Evaluator ==
/// Stateless decision function, parameterised by the registry's admin
/// authority and custom rule table.
///
/// Rules, first match wins:
/// 1. a predicate for the requested kind decides alone
/// 2. the creator is granted
/// 3. holders of any listed reader/writer authority are granted
/// 4. admin override, when configured and asserted on the call
/// 5. everyone else is denied
#[derive(Debug, Clone, Default)]
pub struct AccessEvaluator {
    admin_auth: String,
    rules: AccessRules,
}

impl AccessEvaluator {
    pub fn new(admin_auth: impl Into<String>, rules: AccessRules) -> Self {
        Self {
            admin_auth: admin_auth.into(),
            rules,
        }
    }

    pub fn admin_auth(&self) -> &str {
        &self.admin_auth
    }

    /// `asserted_admin_auth` is the admin token supplied by the caller; pass
    /// an empty string to opt out of the override.
    pub fn is_authorised<E: AccessControlled + ?Sized>(
        &self,
        identity: &Identity,
        entry: &E,
        kind: AccessKind,
        asserted_admin_auth: &str,
    ) -> bool {
        if let Some(predicate) = entry.predicate_for(kind) {
            return predicate.evaluate(identity, entry.creator_id(), &self.rules);
        }

        if !identity.user_id.is_empty() && identity.user_id == entry.creator_id() {
            return true;
        }

        if identity.has_any_auth(entry.auths_for(kind)) {
            return true;
        }

        self.is_admin(identity, asserted_admin_auth)
    }

    /// Admin override: configured, asserted on the call, and held.
    pub fn is_admin(&self, identity: &Identity, asserted_admin_auth: &str) -> bool {
        !self.admin_auth.is_empty()
            && asserted_admin_auth == self.admin_auth
            && identity.has_auth(&self.admin_auth)
    }
}
