//! Named Operation Registry
//!
//! Stores named operation details in a cache backend and enforces read/write
//! access on every lookup, overwrite and deletion.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::access::{AccessEvaluator, AccessKind, AccessRules, Identity};
use crate::cache::{CacheBackend, CacheService};
use crate::config::DEFAULT_NAMESPACE;
use crate::error::{CacheError, RegistryError, Result};
use crate::named::NamedOperationDetail;

const KEY_SEPARATOR: &str = "::";

// == Registry Config ==
/// Everything needed to construct a registry; no global lookup is involved.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Prefix isolating this registry's keys in a shared backend
    pub namespace: String,
    /// Authority granting admin override; empty disables it
    pub admin_auth: String,
    /// Backend the registry builds for itself
    pub backend: CacheBackend,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            admin_auth: String::new(),
            backend: CacheBackend::default(),
        }
    }
}

// == Named Operation Registry ==
/// Access-controlled store of named operations.
///
/// Holds no state besides the backend handle, so clones share the same
/// entries and the registry can be used from any number of tasks.
///
/// Creation uses the backend's conditional insert, so two concurrent
/// first-time adds have exactly one winner when the backend's
/// `put_if_absent` is atomic. Overwrites are a read followed by an
/// unconditional write: a concurrent overwrite between the two may be lost.
#[derive(Clone)]
pub struct NamedOperationRegistry {
    cache: Arc<dyn CacheService>,
    namespace: String,
    evaluator: AccessEvaluator,
}

impl NamedOperationRegistry {
    // == Constructors ==
    /// Creates a registry over an existing backend.
    pub fn new(
        cache: Arc<dyn CacheService>,
        namespace: impl Into<String>,
        admin_auth: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            namespace: namespace.into(),
            evaluator: AccessEvaluator::new(admin_auth, AccessRules::new()),
        }
    }

    /// Creates a registry, building the configured backend.
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(
            config.backend.build(),
            config.namespace.clone(),
            config.admin_auth.clone(),
        )
    }

    /// Makes custom access rules available to entries' predicates.
    pub fn with_access_rules(mut self, rules: AccessRules) -> Self {
        self.evaluator = AccessEvaluator::new(self.evaluator.admin_auth().to_string(), rules);
        self
    }

    // == Add ==
    /// Adds a named operation without asserting admin authority.
    pub async fn add(
        &self,
        detail: NamedOperationDetail,
        overwrite: bool,
        identity: &Identity,
    ) -> Result<()> {
        self.add_with_admin(detail, overwrite, identity, "").await
    }

    /// Adds a named operation.
    ///
    /// A new name must be created by its own creator. An existing name is
    /// only replaced when `overwrite` is set and the caller has write access
    /// to the existing entry; the replacement supersedes every field.
    pub async fn add_with_admin(
        &self,
        detail: NamedOperationDetail,
        overwrite: bool,
        identity: &Identity,
        admin_auth: &str,
    ) -> Result<()> {
        detail.validate()?;
        let name = detail.operation_name().to_string();
        let key = self.key(&name);
        let json = detail.to_json()?;

        match self.cache.get(&key).await? {
            None => {
                if detail.creator_id() != identity.user_id {
                    warn!(
                        "User {} attempted to create named operation {} as {}",
                        identity.user_id,
                        name,
                        detail.creator_id()
                    );
                    return Err(unauthorized(identity, "create", &name));
                }

                match self.cache.put_if_absent(&key, json).await {
                    Ok(()) => {
                        info!("Named operation {} created by {}", name, identity.user_id);
                        Ok(())
                    }
                    // Lost a race with a concurrent create
                    Err(CacheError::AlreadyExists(_)) => Err(RegistryError::Overwriting(name)),
                    Err(err) => Err(err.into()),
                }
            }
            Some(raw) => {
                if !overwrite {
                    debug!("Named operation {} already exists", name);
                    return Err(RegistryError::Overwriting(name));
                }

                if !self.can_write_stored(&raw, &name, identity, admin_auth) {
                    warn!(
                        "User {} denied write access to named operation {}",
                        identity.user_id, name
                    );
                    return Err(unauthorized(identity, AccessKind::Write.as_str(), &name));
                }

                self.cache.put(&key, json).await?;
                info!("Named operation {} overwritten by {}", name, identity.user_id);
                Ok(())
            }
        }
    }

    // == Get ==
    pub async fn get(&self, name: &str, identity: &Identity) -> Result<NamedOperationDetail> {
        self.get_with_admin(name, identity, "").await
    }

    /// Fetches a named operation the caller may read.
    ///
    /// A missing entry is reported exactly like a denied one.
    pub async fn get_with_admin(
        &self,
        name: &str,
        identity: &Identity,
        admin_auth: &str,
    ) -> Result<NamedOperationDetail> {
        validate_name(name)?;
        let denied = || unauthorized(identity, AccessKind::Read.as_str(), name);

        let raw = match self.cache.get(&self.key(name)).await? {
            Some(raw) => raw,
            None => {
                debug!("Named operation {} requested by {} is absent", name, identity.user_id);
                return Err(denied());
            }
        };

        let detail = decode_stored(&raw, name).map_err(|err| {
            RegistryError::BackendUnavailable(format!(
                "Stored named operation {} is unreadable: {}",
                name, err
            ))
        })?;
        if !detail.has_read_access(identity, &self.evaluator, admin_auth) {
            warn!(
                "User {} denied read access to named operation {}",
                identity.user_id, name
            );
            return Err(denied());
        }

        debug!("Named operation {} read by {}", name, identity.user_id);
        Ok(detail)
    }

    // == Delete ==
    pub async fn delete(&self, name: &str, identity: &Identity) -> Result<()> {
        self.delete_with_admin(name, identity, "").await
    }

    /// Removes a named operation the caller may write.
    pub async fn delete_with_admin(
        &self,
        name: &str,
        identity: &Identity,
        admin_auth: &str,
    ) -> Result<()> {
        validate_name(name)?;
        let key = self.key(name);
        let denied = || unauthorized(identity, "delete", name);

        let raw = match self.cache.get(&key).await? {
            Some(raw) => raw,
            None => {
                debug!("Named operation {} to delete is absent", name);
                return Err(denied());
            }
        };

        if !self.can_write_stored(&raw, name, identity, admin_auth) {
            warn!(
                "User {} denied delete access to named operation {}",
                identity.user_id, name
            );
            return Err(denied());
        }

        // Already gone is fine: the entry is absent either way
        self.cache.remove(&key).await?;
        info!("Named operation {} deleted by {}", name, identity.user_id);
        Ok(())
    }

    // == List All ==
    pub async fn list_all(&self, identity: &Identity) -> Result<Vec<NamedOperationDetail>> {
        self.list_all_with_admin(identity, "").await
    }

    /// Returns every named operation the caller may read.
    ///
    /// The key set is snapshotted once; entries removed afterwards, entries
    /// the caller cannot read and malformed entries are left out. Only
    /// backend failures are reported. Order is unspecified.
    ///
    /// Costs one `keys()` call plus one `get` per entry in the namespace,
    /// unlike the single-entry operations which are bounded to one read and
    /// one write.
    pub async fn list_all_with_admin(
        &self,
        identity: &Identity,
        admin_auth: &str,
    ) -> Result<Vec<NamedOperationDetail>> {
        let prefix = self.key_prefix();
        let keys = self.namespaced_keys().await?;
        let mut visible = Vec::with_capacity(keys.len());

        for key in keys {
            let Some(raw) = self.cache.get(&key).await? else {
                continue;
            };
            let name = &key[prefix.len()..];
            match decode_stored(&raw, name) {
                Ok(detail) => {
                    if detail.has_read_access(identity, &self.evaluator, admin_auth) {
                        visible.push(detail);
                    }
                }
                Err(err) => warn!("Skipping malformed named operation at {}: {}", key, err),
            }
        }

        debug!(
            "Listed {} named operations for {}",
            visible.len(),
            identity.user_id
        );
        Ok(visible)
    }

    // == Clear ==
    /// Removes every entry in this registry's namespace without any access
    /// check. For trusted operational callers only.
    pub async fn clear(&self) -> Result<()> {
        let keys = self.namespaced_keys().await?;
        let count = keys.len();
        for key in keys {
            self.cache.remove(&key).await?;
        }
        info!("Cleared {} named operations from {}", count, self.namespace);
        Ok(())
    }

    // == Helpers ==
    /// `"{len}:{namespace}::"`. The length makes the prefix unambiguous even
    /// when a namespace or name contains the separator.
    fn key_prefix(&self) -> String {
        format!(
            "{}:{}{}",
            self.namespace.len(),
            self.namespace,
            KEY_SEPARATOR
        )
    }

    fn key(&self, name: &str) -> String {
        format!("{}{}", self.key_prefix(), name)
    }

    async fn namespaced_keys(&self) -> Result<Vec<String>> {
        let prefix = self.key_prefix();
        let keys = self.cache.keys().await?;
        Ok(keys.into_iter().filter(|k| k.starts_with(&prefix)).collect())
    }

    /// Write check against the stored entry. A stored entry that no longer
    /// decodes can only be replaced or removed under admin override.
    fn can_write_stored(&self, raw: &str, name: &str, identity: &Identity, admin_auth: &str) -> bool {
        match decode_stored(raw, name) {
            Ok(existing) => existing.has_write_access(identity, &self.evaluator, admin_auth),
            Err(err) => {
                warn!("Stored named operation {} is malformed: {}", name, err);
                self.evaluator.is_admin(identity, admin_auth)
            }
        }
    }
}

impl std::fmt::Debug for NamedOperationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedOperationRegistry")
            .field("namespace", &self.namespace)
            .field("evaluator", &self.evaluator)
            .finish_non_exhaustive()
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(RegistryError::InvalidArgument(
            "Operation name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Decodes a stored detail and checks it belongs under `name`.
fn decode_stored(raw: &str, name: &str) -> Result<NamedOperationDetail> {
    let detail = NamedOperationDetail::from_json(raw)?;
    if detail.operation_name() != name {
        return Err(RegistryError::InvalidArgument(format!(
            "Stored named operation {} is keyed as {}",
            detail.operation_name(),
            name
        )));
    }
    Ok(detail)
}

fn unauthorized(identity: &Identity, action: &'static str, name: &str) -> RegistryError {
    RegistryError::Unauthorized {
        user: identity.user_id.clone(),
        action,
        name: name.to_string(),
    }
}
