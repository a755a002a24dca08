//! Behaviour of the in-memory store through the public `Store` trait.
//!
//! Payloads go through `parse_insert`/`parse_patch` so the tests follow the
//! same path as JSON arriving at the API.
//!
//! Run with: cargo test --package lexdesk-store --test memory_store

use chrono::{Duration, Utc};
use lexdesk_core::{
    Client, Contract, ContractStatus, EntityKind, ListQuery, Project, Transaction, User,
    ValidationError, parse_insert, parse_patch,
};
use lexdesk_store::{MemoryStore, Store, StoreError};
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;

async fn seed_owner(store: &MemoryStore) -> String {
    let input = parse_insert::<User>(json!({ "email": "socia@escritorio.com.br" })).unwrap();
    store.users().create(input, None).await.unwrap().id
}

async fn seed_client(store: &MemoryStore, name: &str) -> Client {
    let input = parse_insert::<Client>(json!({ "name": name })).unwrap();
    store.clients().create(input, None).await.unwrap()
}

#[tokio::test]
async fn test_reference_to_missing_client_is_rejected() {
    let store = MemoryStore::new();
    let owner = seed_owner(&store).await;
    let input = parse_insert::<Contract>(json!({
        "title": "Honorários",
        "clientId": "does-not-exist",
    }))
    .unwrap();

    let err = store.contracts().create(input, Some(&owner)).await.unwrap_err();
    match err {
        StoreError::ForeignKey { column, target, id } => {
            assert_eq!(column, "client_id");
            assert_eq!(target, EntityKind::Client);
            assert_eq!(id, "does-not-exist");
        }
        other => panic!("expected a foreign key error, got {other:?}"),
    }
    assert_eq!(store.contracts().count(&ListQuery::default()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_owned_records_require_a_creator() {
    let store = MemoryStore::new();
    let input = parse_insert::<Contract>(json!({ "title": "Sem criador" })).unwrap();

    let err = store.contracts().create(input, None).await.unwrap_err();
    match err {
        StoreError::Validation(ValidationError::MissingField(field)) => {
            assert_eq!(field, "createdBy")
        }
        other => panic!("expected a missing owner, got {other:?}"),
    }
    assert_eq!(store.contracts().count(&ListQuery::default()).await.unwrap(), 0);

    let input = parse_insert::<lexdesk_core::Document>(json!({ "name": "Procuração", "type": "pdf" }))
        .unwrap();
    let err = store.documents().create(input, None).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::MissingField(ref f)) if f == "uploadedBy"
    ));

    let owner = seed_owner(&store).await;
    let input = parse_insert::<Contract>(json!({ "title": "Com criador" })).unwrap();
    let contract = store.contracts().create(input, Some(&owner)).await.unwrap();
    assert_eq!(contract.created_by.as_deref(), Some(owner.as_str()));
}

#[tokio::test]
async fn test_referenced_client_cannot_be_deleted() {
    let store = MemoryStore::new();
    let owner = seed_owner(&store).await;
    let client = seed_client(&store, "Silva & Filhos").await;
    let input = parse_insert::<Project>(json!({
        "name": "Inventário",
        "clientId": client.id,
    }))
    .unwrap();
    let project = store.projects().create(input, Some(&owner)).await.unwrap();

    let err = store.clients().delete(&client.id).await.unwrap_err();
    match err {
        StoreError::InUse { referenced_by, .. } => assert_eq!(referenced_by, "projects.client_id"),
        other => panic!("expected InUse, got {other:?}"),
    }

    store.projects().delete(&project.id).await.unwrap();
    store.clients().delete(&client.id).await.unwrap();
    assert!(store.clients().get(&client.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_missing_row_is_not_found() {
    let store = MemoryStore::new();
    let err = store.documents().delete("nope").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: EntityKind::Document, .. }));
}

#[tokio::test]
async fn test_partial_update_keeps_other_fields() {
    let store = MemoryStore::new();
    let owner = seed_owner(&store).await;
    let input = parse_insert::<Contract>(json!({
        "title": "Consultoria",
        "description": "Assessoria mensal",
        "value": "1500.005",
    }))
    .unwrap();
    let created = store.contracts().create(input, Some(&owner)).await.unwrap();
    assert_eq!(created.status, ContractStatus::Draft);
    assert_eq!(created.value, Some(Decimal::from_str("1500.01").unwrap()));

    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    let patch = parse_patch::<Contract>(json!({ "status": "active" })).unwrap();
    let updated = store.contracts().update(&created.id, patch).await.unwrap();

    assert_eq!(updated.status, ContractStatus::Active);
    assert_eq!(updated.title, "Consultoria");
    assert_eq!(updated.description.as_deref(), Some("Assessoria mensal"));
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);
}

#[tokio::test]
async fn test_patch_can_clear_optional_field() {
    let store = MemoryStore::new();
    let owner = seed_owner(&store).await;
    let client = seed_client(&store, "Costa").await;
    let input = parse_insert::<Project>(json!({ "name": "Revisão", "clientId": client.id })).unwrap();
    let project = store.projects().create(input, Some(&owner)).await.unwrap();

    let patch = parse_patch::<Project>(json!({ "clientId": null })).unwrap();
    let updated = store.projects().update(&project.id, patch).await.unwrap();
    assert_eq!(updated.client_id, None);

    store.clients().delete(&client.id).await.unwrap();
}

#[tokio::test]
async fn test_update_missing_row_is_not_found() {
    let store = MemoryStore::new();
    let patch = parse_patch::<Client>(json!({ "name": "Outro" })).unwrap();
    let err = store.clients().update("ghost", patch).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn test_transactions_filter_by_type_and_date_window() {
    let store = MemoryStore::new();
    let owner = seed_owner(&store).await;
    let now = Utc::now();
    let rows = [
        ("Honorários", "5000", "income", now - Duration::days(3)),
        ("Custas", "350.40", "expense", now - Duration::days(2)),
        ("Parecer", "1200", "income", now - Duration::days(40)),
    ];
    for (description, amount, kind, date) in rows {
        let input = parse_insert::<Transaction>(json!({
            "description": description,
            "amount": amount,
            "type": kind,
            "date": date.to_rfc3339(),
        }))
        .unwrap();
        store.transactions().create(input, Some(&owner)).await.unwrap();
    }

    let last_month = ListQuery::default().between(now - Duration::days(30), now);
    let recent = store.transactions().list(&last_month).await.unwrap();
    let names: Vec<_> = recent.iter().map(|t| t.description.as_str()).collect();
    assert_eq!(names, ["Custas", "Honorários"]);

    let income = ListQuery::default().with_kind("income");
    assert_eq!(store.transactions().count(&income).await.unwrap(), 2);

    let bad = ListQuery::default().with_kind("refund");
    assert!(matches!(
        store.transactions().list(&bad).await,
        Err(StoreError::Validation(_))
    ));
}

#[tokio::test]
async fn test_status_filter_on_unfiltered_table_is_rejected() {
    let store = MemoryStore::new();
    let query = ListQuery::default().with_status("active");
    let err = store.clients().list(&query).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn test_user_lookup_ignores_email_case() {
    let store = MemoryStore::new();
    let input = parse_insert::<lexdesk_core::User>(json!({
        "email": "Maria@Escritorio.com.br",
        "firstName": "Maria",
    }))
    .unwrap();
    let user = store.users().create(input, None).await.unwrap();

    let found = store.user_by_email("maria@escritorio.com.br").await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(user.id));
    assert_eq!(store.backend_name(), "memory");
    store.ping().await.unwrap();
}
