use std::sync::Arc;

use super::*;
use crate::testutil::FailingRecordStore;

fn identity(email: &str) -> Identity {
    Identity { id: Uuid::new_v4(), email: email.to_owned() }
}

// =============================================================================
// Role
// =============================================================================

#[test]
fn admin_home_path() {
    assert_eq!(Role::Admin.home_path(), "/admin/dashboard");
}

#[test]
fn student_home_path() {
    assert_eq!(Role::Student.home_path(), "/student/dashboard");
}

#[test]
fn parse_admin() {
    assert_eq!(Role::parse("admin"), Some(Role::Admin));
}

#[test]
fn parse_student() {
    assert_eq!(Role::parse("student"), Some(Role::Student));
}

#[test]
fn parse_is_case_insensitive() {
    assert_eq!(Role::parse("Admin"), Some(Role::Admin));
    assert_eq!(Role::parse("STUDENT"), Some(Role::Student));
}

#[test]
fn parse_trims_whitespace() {
    assert_eq!(Role::parse("  admin "), Some(Role::Admin));
}

#[test]
fn parse_unknown_is_none() {
    assert_eq!(Role::parse("superuser"), None);
    assert_eq!(Role::parse(""), None);
}

#[test]
fn role_serde_lowercase() {
    assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    let role: Role = serde_json::from_str("\"student\"").unwrap();
    assert_eq!(role, Role::Student);
}

// =============================================================================
// static rule
// =============================================================================

#[tokio::test]
async fn static_rule_matches_admin_address() {
    let resolver = RoleResolver::StaticRule { admin_email: "alvn4407@gmail.com".into() };
    let role = resolver.resolve(&identity("alvn4407@gmail.com")).await;
    assert_eq!(role, Role::Admin);
}

#[tokio::test]
async fn static_rule_is_case_insensitive() {
    let resolver = RoleResolver::StaticRule { admin_email: "alvn4407@gmail.com".into() };
    let role = resolver.resolve(&identity("ALVN4407@GMAIL.COM")).await;
    assert_eq!(role, Role::Admin);
}

#[tokio::test]
async fn static_rule_other_address_is_student() {
    let resolver = RoleResolver::StaticRule { admin_email: "alvn4407@gmail.com".into() };
    let role = resolver.resolve(&identity("x@y.com")).await;
    assert_eq!(role, Role::Student);
}

#[test]
fn static_rule_from_env_reads_admin_email() {
    unsafe { std::env::set_var("ADMIN_EMAIL", "root@example.edu") };
    let resolver = RoleResolver::static_rule_from_env();
    unsafe { std::env::remove_var("ADMIN_EMAIL") };

    let Some(RoleResolver::StaticRule { admin_email }) = resolver else {
        panic!("expected static rule");
    };
    assert_eq!(admin_email, "root@example.edu");
}

// =============================================================================
// record lookup
// =============================================================================

fn lookup_with(store: MemoryRecordStore) -> RoleResolver {
    RoleResolver::RecordLookup { store: Arc::new(store) }
}

#[tokio::test]
async fn record_role_admin_resolves_admin() {
    let user = identity("dean@example.edu");
    let store = MemoryRecordStore::new();
    store.insert(UserRecord { id: user.id, email: user.email.clone(), role: Some("admin".into()) });

    assert_eq!(lookup_with(store).resolve(&user).await, Role::Admin);
}

#[tokio::test]
async fn record_role_student_resolves_student() {
    let user = identity("maya@example.edu");
    let store = MemoryRecordStore::new();
    store.insert(UserRecord { id: user.id, email: user.email.clone(), role: Some("student".into()) });

    assert_eq!(lookup_with(store).resolve(&user).await, Role::Student);
}

#[tokio::test]
async fn absent_role_field_defaults_student() {
    let user = identity("maya@example.edu");
    let store = MemoryRecordStore::new();
    store.insert(UserRecord { id: user.id, email: user.email.clone(), role: None });

    assert_eq!(lookup_with(store).resolve(&user).await, Role::Student);
}

#[tokio::test]
async fn unknown_role_string_defaults_student() {
    let user = identity("maya@example.edu");
    let store = MemoryRecordStore::new();
    store.insert(UserRecord { id: user.id, email: user.email.clone(), role: Some("root".into()) });

    assert_eq!(lookup_with(store).resolve(&user).await, Role::Student);
}

#[tokio::test]
async fn missing_record_defaults_student() {
    let store = MemoryRecordStore::new();
    assert_eq!(lookup_with(store).resolve(&identity("ghost@example.edu")).await, Role::Student);
}

#[tokio::test]
async fn lookup_failure_fails_open_to_student_never_admin() {
    let resolver = RoleResolver::RecordLookup { store: Arc::new(FailingRecordStore) };
    let role = resolver.resolve(&identity("dean@example.edu")).await;
    assert_eq!(role, Role::Student);
}

// =============================================================================
// memory store
// =============================================================================

#[tokio::test]
async fn memory_store_round_trip() {
    let user = identity("maya@example.edu");
    let store = MemoryRecordStore::new();
    let record = UserRecord { id: user.id, email: user.email.clone(), role: Some("student".into()) };
    store.insert(record.clone());

    assert_eq!(store.get_record(user.id).await.unwrap(), Some(record));
    assert_eq!(store.get_record(Uuid::new_v4()).await.unwrap(), None);
}

// =============================================================================
// REST row parsing
// =============================================================================

#[test]
fn parse_record_rows_single_row() {
    let id = Uuid::new_v4();
    let json = format!(r#"[{{"id":"{id}","email":"maya@example.edu","role":"admin"}}]"#);
    let record = parse_record_rows(&json).unwrap().unwrap();
    assert_eq!(record.id, id);
    assert_eq!(record.role.as_deref(), Some("admin"));
}

#[test]
fn parse_record_rows_empty_is_none() {
    assert_eq!(parse_record_rows("[]").unwrap(), None);
}

#[test]
fn parse_record_rows_null_role() {
    let id = Uuid::new_v4();
    let json = format!(r#"[{{"id":"{id}","email":"maya@example.edu","role":null}}]"#);
    let record = parse_record_rows(&json).unwrap().unwrap();
    assert!(record.role.is_none());
}

#[test]
fn parse_record_rows_malformed_is_lookup_failed() {
    let result = parse_record_rows("not json");
    assert!(matches!(result, Err(AuthError::LookupFailed(_))));
}
