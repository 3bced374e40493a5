//! Caller identity: a user id plus the operation authorities it holds.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Who is calling the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Unique user id; empty for the anonymous user
    pub user_id: String,
    /// Operation authorities (groups/roles) granted to the user
    #[serde(default)]
    pub op_auths: BTreeSet<String>,
}

impl Identity {
    /// Creates an identity with no authorities.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            op_auths: BTreeSet::new(),
        }
    }

    /// The anonymous user: empty id, no authorities.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_auth(mut self, auth: impl Into<String>) -> Self {
        self.op_auths.insert(auth.into());
        self
    }

    pub fn with_auths<I, S>(mut self, auths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.op_auths.extend(auths.into_iter().map(Into::into));
        self
    }

    pub fn has_auth(&self, auth: &str) -> bool {
        self.op_auths.contains(auth)
    }

    /// True if the identity holds at least one of `auths`.
    pub fn has_any_auth<'a, I>(&self, auths: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        auths.into_iter().any(|auth| self.op_auths.contains(auth))
    }
}
