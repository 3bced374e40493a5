//! Integration Tests for the Named Operation Registry
//!
//! Exercises the public registry API end to end against the in-memory
//! backend and a backend that is always down.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use named_ops::cache::CacheResult;
use named_ops::{
    AccessPredicate, CacheBackend, CacheError, CacheService, HashMapCacheService, Identity,
    NamedOperationDetail, NamedOperationRegistry, RegistryConfig, RegistryError,
};
use serde_json::{json, Value};

// == Fixtures ==

const OPERATION_NAME: &str = "New operation";
const GAFFER_USER: &str = "gaffer user";
const ADVANCED_GAFFER_USER: &str = "advanced gaffer user";
const ADMIN_AUTH: &str = "admin auth";
const EMPTY_ADMIN_AUTH: &str = "";

fn standard_user() -> Identity {
    Identity::new("123").with_auth(GAFFER_USER)
}

fn advanced_user() -> Identity {
    Identity::new("456").with_auths([GAFFER_USER, ADVANCED_GAFFER_USER])
}

fn user_with_admin_auth() -> Identity {
    Identity::new("adminUser").with_auth(ADMIN_AUTH)
}

fn standard_chain() -> Value {
    json!({ "operations": [{ "class": "AddElements" }] })
}

fn alternative_chain() -> Value {
    json!({ "operations": [{ "class": "GetElements" }] })
}

fn standard() -> NamedOperationDetail {
    NamedOperationDetail::builder()
        .operation_name(OPERATION_NAME)
        .description("standard operation")
        .creator_id(standard_user().user_id)
        .readers([GAFFER_USER])
        .writers([ADVANCED_GAFFER_USER])
        .operation_chain(standard_chain())
        .build()
        .unwrap()
}

fn alternative() -> NamedOperationDetail {
    NamedOperationDetail::builder()
        .operation_name(OPERATION_NAME)
        .description("alternative operation")
        .creator_id(advanced_user().user_id)
        .readers([GAFFER_USER])
        .writers([ADVANCED_GAFFER_USER])
        .operation_chain(alternative_chain())
        .build()
        .unwrap()
}

fn create_registry() -> NamedOperationRegistry {
    NamedOperationRegistry::from_config(&RegistryConfig {
        namespace: "namedOperation".to_string(),
        admin_auth: ADMIN_AUTH.to_string(),
        backend: CacheBackend::HashMap { max_entries: 100 },
    })
}

fn names(ops: &[NamedOperationDetail]) -> HashSet<String> {
    ops.iter().map(|op| op.operation_name().to_string()).collect()
}

// == Add / Get ==

#[tokio::test]
async fn test_should_add_named_operation() {
    let registry = create_registry();

    registry.add(standard(), false, &standard_user()).await.unwrap();
    let fetched = registry.get(OPERATION_NAME, &standard_user()).await.unwrap();

    assert_eq!(fetched, standard());
}

#[tokio::test]
async fn test_should_fail_if_named_operation_already_exists() {
    let registry = create_registry();

    registry.add(standard(), false, &standard_user()).await.unwrap();
    let result = registry.add(alternative(), false, &advanced_user()).await;

    assert!(matches!(result, Err(RegistryError::Overwriting(_))));
    assert_eq!(
        registry.get(OPERATION_NAME, &standard_user()).await.unwrap(),
        standard()
    );
}

#[tokio::test]
async fn test_should_fail_when_key_is_empty() {
    let registry = create_registry();
    registry.add(standard(), false, &standard_user()).await.unwrap();

    assert!(matches!(
        registry.get("", &advanced_user()).await,
        Err(RegistryError::InvalidArgument(_))
    ));
    assert!(matches!(
        registry.delete("", &advanced_user()).await,
        Err(RegistryError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn test_should_fail_if_named_operation_is_invalid() {
    let registry = create_registry();
    let invalid: NamedOperationDetail = serde_json::from_value(json!({
        "operationName": "",
        "creatorId": "123",
        "operationChain": {}
    }))
    .unwrap();

    assert!(matches!(
        registry.add(invalid, false, &standard_user()).await,
        Err(RegistryError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn test_should_deny_unauthorised_reader() {
    let registry = create_registry();
    registry.add(standard(), false, &standard_user()).await.unwrap();

    let result = registry.get(OPERATION_NAME, &Identity::anonymous()).await;
    assert!(matches!(result, Err(RegistryError::Unauthorized { .. })));
}

#[tokio::test]
async fn test_should_allow_readers_with_correct_op_auths() {
    let registry = create_registry();
    registry.add(standard(), false, &standard_user()).await.unwrap();

    assert_eq!(
        registry.get(OPERATION_NAME, &advanced_user()).await.unwrap(),
        standard()
    );
}

#[tokio::test]
async fn test_should_allow_users_to_read_their_own_operations() {
    let registry = create_registry();
    let op = NamedOperationDetail::builder()
        .operation_name(OPERATION_NAME)
        .creator_id(standard_user().user_id)
        .operation_chain(standard_chain())
        .readers(Vec::<String>::new())
        .writers([ADVANCED_GAFFER_USER])
        .build()
        .unwrap();

    registry.add(op.clone(), false, &standard_user()).await.unwrap();
    assert_eq!(registry.get(OPERATION_NAME, &standard_user()).await.unwrap(), op);
}

// == Overwrite ==

#[tokio::test]
async fn test_should_allow_users_to_overwrite_their_own_operations() {
    let registry = create_registry();
    let op = NamedOperationDetail::builder()
        .operation_name(OPERATION_NAME)
        .creator_id(standard_user().user_id)
        .operation_chain(standard_chain())
        .readers([GAFFER_USER])
        .writers(Vec::<String>::new())
        .build()
        .unwrap();

    registry.add(op, false, &standard_user()).await.unwrap();
    registry.add(standard(), true, &standard_user()).await.unwrap();

    assert_eq!(
        registry.get(OPERATION_NAME, &standard_user()).await.unwrap(),
        standard()
    );
}

#[tokio::test]
async fn test_should_deny_unauthorised_overwrite() {
    let registry = create_registry();
    registry.add(alternative(), false, &advanced_user()).await.unwrap();

    let result = registry.add(standard(), true, &standard_user()).await;
    assert!(matches!(result, Err(RegistryError::Unauthorized { .. })));
    assert_eq!(
        registry.get(OPERATION_NAME, &advanced_user()).await.unwrap(),
        alternative()
    );
}

#[tokio::test]
async fn test_should_allow_overwrite_if_flag_set_and_user_authorised() {
    let registry = create_registry();
    registry.add(standard(), false, &standard_user()).await.unwrap();

    registry.add(alternative(), true, &advanced_user()).await.unwrap();

    assert_eq!(
        registry.get(OPERATION_NAME, &standard_user()).await.unwrap(),
        alternative()
    );
}

#[tokio::test]
async fn test_overwrite_replaces_access_lists_wholesale() {
    let registry = create_registry();
    registry.add(standard(), false, &standard_user()).await.unwrap();

    let locked_down = NamedOperationDetail::builder()
        .operation_name(OPERATION_NAME)
        .creator_id(advanced_user().user_id)
        .operation_chain(alternative_chain())
        .build()
        .unwrap();
    registry.add(locked_down, true, &advanced_user()).await.unwrap();

    // The previous creator and readers no longer apply
    assert!(registry.get(OPERATION_NAME, &standard_user()).await.is_err());
    assert!(registry.get(OPERATION_NAME, &advanced_user()).await.is_ok());
}

#[tokio::test]
async fn test_should_allow_overwrite_when_user_has_admin_auth() {
    let registry = create_registry();
    registry
        .add_with_admin(alternative(), false, &advanced_user(), EMPTY_ADMIN_AUTH)
        .await
        .unwrap();
    let alt = NamedOperationDetail::builder()
        .operation_name(OPERATION_NAME)
        .description("alt")
        .creator_id(standard_user().user_id)
        .operation_chain(alternative_chain())
        .build()
        .unwrap();

    registry
        .add_with_admin(alt.clone(), true, &user_with_admin_auth(), ADMIN_AUTH)
        .await
        .unwrap();

    assert_eq!(registry.get(OPERATION_NAME, &standard_user()).await.unwrap(), alt);
}

#[tokio::test]
async fn test_admin_auth_must_be_asserted() {
    let registry = create_registry();
    registry.add(alternative(), false, &advanced_user()).await.unwrap();

    let result = registry
        .add(standard(), true, &user_with_admin_auth())
        .await;
    assert!(matches!(result, Err(RegistryError::Unauthorized { .. })));
}

#[tokio::test]
async fn test_get_with_admin_reads_private_operation() {
    let registry = create_registry();
    let private = NamedOperationDetail::builder()
        .operation_name(OPERATION_NAME)
        .creator_id(advanced_user().user_id)
        .operation_chain(alternative_chain())
        .build()
        .unwrap();
    registry.add(private.clone(), false, &advanced_user()).await.unwrap();

    assert!(matches!(
        registry
            .get_with_admin(OPERATION_NAME, &user_with_admin_auth(), EMPTY_ADMIN_AUTH)
            .await,
        Err(RegistryError::Unauthorized { .. })
    ));
    assert_eq!(
        registry
            .get_with_admin(OPERATION_NAME, &user_with_admin_auth(), ADMIN_AUTH)
            .await
            .unwrap(),
        private
    );
}

#[tokio::test]
async fn test_delete_with_admin_removes_operation_without_writers() {
    let registry = create_registry();
    let no_writers = NamedOperationDetail::builder()
        .operation_name(OPERATION_NAME)
        .creator_id(advanced_user().user_id)
        .readers([GAFFER_USER])
        .operation_chain(alternative_chain())
        .build()
        .unwrap();
    registry.add(no_writers, false, &advanced_user()).await.unwrap();

    assert!(matches!(
        registry
            .delete_with_admin(OPERATION_NAME, &user_with_admin_auth(), EMPTY_ADMIN_AUTH)
            .await,
        Err(RegistryError::Unauthorized { .. })
    ));
    assert!(registry.get(OPERATION_NAME, &advanced_user()).await.is_ok());

    registry
        .delete_with_admin(OPERATION_NAME, &user_with_admin_auth(), ADMIN_AUTH)
        .await
        .unwrap();
    assert!(registry.list_all(&advanced_user()).await.unwrap().is_empty());
}

// == Delete ==

#[tokio::test]
async fn test_should_deny_unauthorised_delete() {
    let registry = create_registry();
    registry.add(alternative(), false, &advanced_user()).await.unwrap();

    let result = registry.delete(OPERATION_NAME, &standard_user()).await;
    assert!(matches!(result, Err(RegistryError::Unauthorized { .. })));
    assert!(registry.get(OPERATION_NAME, &advanced_user()).await.is_ok());
}

#[tokio::test]
async fn test_creator_can_delete_with_empty_lists() {
    let registry = create_registry();
    let op = NamedOperationDetail::builder()
        .operation_name(OPERATION_NAME)
        .creator_id(standard_user().user_id)
        .operation_chain(standard_chain())
        .build()
        .unwrap();
    registry.add(op, false, &standard_user()).await.unwrap();

    registry.delete(OPERATION_NAME, &standard_user()).await.unwrap();
    assert!(matches!(
        registry.get(OPERATION_NAME, &standard_user()).await,
        Err(RegistryError::Unauthorized { .. })
    ));
}

#[tokio::test]
async fn test_delete_missing_entry_is_unauthorized() {
    let registry = create_registry();

    let result = registry.delete(OPERATION_NAME, &standard_user()).await;
    assert!(matches!(result, Err(RegistryError::Unauthorized { .. })));
}

#[tokio::test]
async fn test_should_deny_delete_with_write_no_access_predicate() {
    let registry = create_registry();
    let no_write_access = NamedOperationDetail::builder()
        .creator_id(standard_user().user_id)
        .description("an operation that does not allow write access")
        .operation_name("test")
        .readers([GAFFER_USER])
        .operation_chain(standard_chain())
        .write_access_predicate(AccessPredicate::NoAccess)
        .build()
        .unwrap();
    registry
        .add(no_write_access, false, &standard_user())
        .await
        .unwrap();

    let result = registry.delete("test", &standard_user()).await;
    assert!(matches!(result, Err(RegistryError::Unauthorized { .. })));
    assert!(registry.get("test", &standard_user()).await.is_ok());
}

// == List All ==

#[tokio::test]
async fn test_should_return_empty_list_if_no_operations() {
    let registry = create_registry();

    assert!(registry.list_all(&standard_user()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_should_return_operations_a_user_can_execute() {
    let registry = create_registry();
    registry.add(standard(), false, &standard_user()).await.unwrap();
    let alt = NamedOperationDetail::builder()
        .operation_name("different operation")
        .description("alt")
        .creator_id(advanced_user().user_id)
        .readers([GAFFER_USER])
        .writers([ADVANCED_GAFFER_USER])
        .operation_chain(alternative_chain())
        .build()
        .unwrap();
    registry.add(alt.clone(), false, &advanced_user()).await.unwrap();

    let listed = registry.list_all(&standard_user()).await.unwrap();

    assert_eq!(listed.len(), 2);
    assert!(listed.contains(&standard()));
    assert!(listed.contains(&alt));
}

#[tokio::test]
async fn test_should_not_return_operation_a_user_cannot_execute() {
    let registry = create_registry();
    registry.add(standard(), false, &standard_user()).await.unwrap();
    let no_read_access = NamedOperationDetail::builder()
        .creator_id(advanced_user().user_id)
        .description("an operation that a standard user cannot execute")
        .operation_name("test")
        .readers([ADVANCED_GAFFER_USER])
        .writers([ADVANCED_GAFFER_USER])
        .operation_chain(standard_chain())
        .build()
        .unwrap();
    registry
        .add(no_read_access, false, &advanced_user())
        .await
        .unwrap();

    let listed = registry.list_all(&standard_user()).await.unwrap();

    assert_eq!(listed, vec![standard()]);
}

#[tokio::test]
async fn test_should_not_return_operation_with_read_no_access_predicate() {
    let registry = create_registry();
    let no_read_access = NamedOperationDetail::builder()
        .creator_id(standard_user().user_id)
        .description("an operation that does not allow read access")
        .operation_name("test")
        .writers([ADVANCED_GAFFER_USER])
        .operation_chain(standard_chain())
        .read_access_predicate(AccessPredicate::NoAccess)
        .build()
        .unwrap();
    registry
        .add(no_read_access, false, &standard_user())
        .await
        .unwrap();

    assert!(registry.list_all(&standard_user()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_all_with_admin_sees_everything_readable_by_override() {
    let registry = create_registry();
    registry.add(standard(), false, &standard_user()).await.unwrap();
    let private = NamedOperationDetail::builder()
        .operation_name("private")
        .creator_id(advanced_user().user_id)
        .operation_chain(alternative_chain())
        .build()
        .unwrap();
    registry.add(private, false, &advanced_user()).await.unwrap();

    let admin = user_with_admin_auth();
    assert!(registry.list_all(&admin).await.unwrap().is_empty());

    let listed = registry.list_all_with_admin(&admin, ADMIN_AUTH).await.unwrap();
    assert_eq!(
        names(&listed),
        HashSet::from([OPERATION_NAME.to_string(), "private".to_string()])
    );
}

#[tokio::test]
async fn test_clear_removes_everything() {
    let registry = create_registry();
    registry.add(standard(), false, &standard_user()).await.unwrap();

    registry.clear().await.unwrap();

    assert!(registry.list_all(&standard_user()).await.unwrap().is_empty());
    registry.add(standard(), false, &standard_user()).await.unwrap();
}

// == Concurrency ==

#[tokio::test]
async fn test_concurrent_creates_have_one_winner() {
    let registry = create_registry();

    let mut handles = Vec::new();
    for i in 0..8 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            let user = Identity::new(format!("user{}", i));
            let op = NamedOperationDetail::builder()
                .operation_name(OPERATION_NAME)
                .creator_id(user.user_id.clone())
                .operation_chain(standard_chain())
                .build()
                .unwrap();
            registry.add(op, false, &user).await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => winners += 1,
            Err(err) => assert!(matches!(err, RegistryError::Overwriting(_))),
        }
    }
    assert_eq!(winners, 1);
}

// == Backend Failures ==

/// Backend that is never reachable.
struct DownCache;

#[async_trait]
impl CacheService for DownCache {
    async fn put(&self, _key: &str, _value: String) -> CacheResult<()> {
        Err(CacheError::Unavailable("timed out".to_string()))
    }

    async fn put_if_absent(&self, _key: &str, _value: String) -> CacheResult<()> {
        Err(CacheError::Unavailable("timed out".to_string()))
    }

    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(CacheError::Unavailable("timed out".to_string()))
    }

    async fn remove(&self, _key: &str) -> CacheResult<bool> {
        Err(CacheError::Unavailable("timed out".to_string()))
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        Err(CacheError::Unavailable("timed out".to_string()))
    }

    async fn values(&self) -> CacheResult<Vec<String>> {
        Err(CacheError::Unavailable("timed out".to_string()))
    }

    async fn clear(&self) -> CacheResult<()> {
        Err(CacheError::Unavailable("timed out".to_string()))
    }

    async fn len(&self) -> CacheResult<usize> {
        Err(CacheError::Unavailable("timed out".to_string()))
    }
}

#[tokio::test]
async fn test_backend_failures_surface_as_backend_unavailable() {
    let registry = NamedOperationRegistry::new(Arc::new(DownCache), "namedOperation", ADMIN_AUTH);

    assert!(matches!(
        registry.add(standard(), false, &standard_user()).await,
        Err(RegistryError::BackendUnavailable(_))
    ));
    assert!(matches!(
        registry.get(OPERATION_NAME, &standard_user()).await,
        Err(RegistryError::BackendUnavailable(_))
    ));
    assert!(matches!(
        registry.delete(OPERATION_NAME, &standard_user()).await,
        Err(RegistryError::BackendUnavailable(_))
    ));
    assert!(matches!(
        registry.list_all(&standard_user()).await,
        Err(RegistryError::BackendUnavailable(_))
    ));
}

#[tokio::test]
async fn test_blank_key_rejected_before_backend() {
    let registry = NamedOperationRegistry::new(Arc::new(DownCache), "namedOperation", ADMIN_AUTH);

    assert!(matches!(
        registry.get("", &standard_user()).await,
        Err(RegistryError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn test_failed_add_writes_nothing() {
    let cache = Arc::new(HashMapCacheService::new(100));
    let registry = NamedOperationRegistry::new(cache.clone(), "namedOperation", ADMIN_AUTH);
    registry.add(alternative(), false, &advanced_user()).await.unwrap();
    let writes_before = cache.stats().await.writes;

    let _ = registry.add(standard(), false, &standard_user()).await;
    let _ = registry.add(standard(), true, &standard_user()).await;

    assert_eq!(cache.stats().await.writes, writes_before);
}
