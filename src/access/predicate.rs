//! Access Predicates
//!
//! Per-entry rules that replace the default reader/writer list check.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::access::Identity;

// == Access Rule ==
/// Extension point for custom predicates.
///
/// Registered on the registry under a name and referenced from entries via
/// [`AccessPredicate::Custom`]. Must be pure: it may be evaluated
/// concurrently from many tasks.
pub trait AccessRule: Send + Sync {
    fn evaluate(&self, identity: &Identity, creator_id: &str, params: &Value) -> bool;
}

impl<F> AccessRule for F
where
    F: Fn(&Identity, &str, &Value) -> bool + Send + Sync,
{
    fn evaluate(&self, identity: &Identity, creator_id: &str, params: &Value) -> bool {
        self(identity, creator_id, params)
    }
}

// == Access Rules ==
/// Named custom rules available to [`AccessPredicate::Custom`].
#[derive(Clone, Default)]
pub struct AccessRules {
    rules: HashMap<String, Arc<dyn AccessRule>>,
}

impl AccessRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `rule` under `name`, replacing any previous rule.
    pub fn register(mut self, name: impl Into<String>, rule: impl AccessRule + 'static) -> Self {
        self.rules.insert(name.into(), Arc::new(rule));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn AccessRule>> {
        self.rules.get(name)
    }
}

impl fmt::Debug for AccessRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.rules.keys().collect();
        names.sort();
        f.debug_struct("AccessRules").field("rules", &names).finish()
    }
}

// == Access Predicate ==
/// A rule attached to an entry that decides read or write access on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AccessPredicate {
    /// Denies everyone, including the creator
    NoAccess,
    /// Grants everyone
    Unrestricted,
    /// Grants only the creator
    CreatorOnly,
    /// Grants holders of any of the listed authorities
    Authorised { auths: BTreeSet<String> },
    /// Delegates to a rule registered in [`AccessRules`]
    Custom {
        rule: String,
        #[serde(default)]
        params: Value,
    },
}

impl AccessPredicate {
    pub fn authorised<I, S>(auths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AccessPredicate::Authorised {
            auths: auths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn custom(rule: impl Into<String>, params: Value) -> Self {
        AccessPredicate::Custom {
            rule: rule.into(),
            params,
        }
    }

    /// Evaluates the predicate. Unknown custom rules deny.
    pub fn evaluate(&self, identity: &Identity, creator_id: &str, rules: &AccessRules) -> bool {
        match self {
            AccessPredicate::NoAccess => false,
            AccessPredicate::Unrestricted => true,
            AccessPredicate::CreatorOnly => {
                !identity.user_id.is_empty() && identity.user_id == creator_id
            }
            AccessPredicate::Authorised { auths } => identity.has_any_auth(auths),
            AccessPredicate::Custom { rule, params } => match rules.get(rule) {
                Some(custom) => custom.evaluate(identity, creator_id, params),
                None => {
                    warn!("Access rule '{}' is not registered, denying access", rule);
                    false
                }
            },
        }
    }
}
