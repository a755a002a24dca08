//! In-memory store.
//!
//! All tables live behind one lock so foreign-key checks see a consistent
//! snapshot. The same rules as the Postgres schema apply: references must
//! point at existing rows, rows still referenced cannot be deleted, user
//! emails are unique regardless of case, and deleting a user drops their
//! sessions and credentials.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lexdesk_core::model::{patch_references, require_owner};
use lexdesk_core::{
    Client, Contract, ContractClause, ContractTemplate, Document, EntityKind, ListQuery, Project,
    Record, Reference, Session, Transaction, User, new_id,
};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{CredentialStore, Repository, SessionStore, Store, StoreError};

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    clients: HashMap<String, Client>,
    contracts: HashMap<String, Contract>,
    contract_templates: HashMap<String, ContractTemplate>,
    contract_clauses: HashMap<String, ContractClause>,
    projects: HashMap<String, Project>,
    transactions: HashMap<String, Transaction>,
    documents: HashMap<String, Document>,
    sessions: HashMap<String, Session>,
    credentials: HashMap<String, String>,
}

impl Tables {
    fn contains(&self, kind: EntityKind, id: &str) -> bool {
        match kind {
            EntityKind::User => self.users.contains_key(id),
            EntityKind::Client => self.clients.contains_key(id),
            EntityKind::Contract => self.contracts.contains_key(id),
            EntityKind::ContractTemplate => self.contract_templates.contains_key(id),
            EntityKind::ContractClause => self.contract_clauses.contains_key(id),
            EntityKind::Project => self.projects.contains_key(id),
            EntityKind::Transaction => self.transactions.contains_key(id),
            EntityKind::Document => self.documents.contains_key(id),
        }
    }

    fn check_references(&self, refs: &[Reference]) -> Result<(), StoreError> {
        match refs.iter().find(|r| !self.contains(r.target, &r.id)) {
            Some(missing) => Err(StoreError::ForeignKey {
                column: missing.column.to_string(),
                target: missing.target,
                id: missing.id.clone(),
            }),
            None => Ok(()),
        }
    }

    /// First row (as `table.column`) that still points at `kind`/`id`.
    fn referenced_by(&self, kind: EntityKind, id: &str) -> Option<String> {
        fn scan<R: Record>(
            rows: &HashMap<String, R>,
            kind: EntityKind,
            id: &str,
        ) -> Option<String> {
            rows.values().find_map(|row| {
                row.references()
                    .into_iter()
                    .find(|r| r.target == kind && r.id == id)
                    .map(|r| format!("{}.{}", R::KIND.table(), r.column))
            })
        }

        scan(&self.contracts, kind, id)
            .or_else(|| scan(&self.contract_templates, kind, id))
            .or_else(|| scan(&self.contract_clauses, kind, id))
            .or_else(|| scan(&self.projects, kind, id))
            .or_else(|| scan(&self.transactions, kind, id))
            .or_else(|| scan(&self.documents, kind, id))
    }

    fn check_unique(&self, kind: EntityKind, row_id: &str, email: Option<&str>) -> Result<(), StoreError> {
        if kind != EntityKind::User {
            return Ok(());
        }
        let Some(email) = email else {
            return Ok(());
        };
        let taken = self.users.values().any(|u| {
            u.id != row_id && u.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email))
        });
        if taken {
            return Err(StoreError::Conflict(format!("email '{email}' is already in use")));
        }
        Ok(())
    }
}

/// Gives generic repositories access to their table.
trait MemoryTable: Record {
    fn table(tables: &Tables) -> &HashMap<String, Self>;
    fn table_mut(tables: &mut Tables) -> &mut HashMap<String, Self>;

    /// Value of a unique column, if the table has one.
    fn unique_email(&self) -> Option<&str> {
        None
    }
}

macro_rules! memory_table {
    ($($entity:ty => $field:ident),+ $(,)?) => {
        $(
            impl MemoryTable for $entity {
                fn table(tables: &Tables) -> &HashMap<String, Self> {
                    &tables.$field
                }

                fn table_mut(tables: &mut Tables) -> &mut HashMap<String, Self> {
                    &mut tables.$field
                }
            }
        )+
    };
}

memory_table! {
    Client => clients,
    Contract => contracts,
    ContractTemplate => contract_templates,
    ContractClause => contract_clauses,
    Project => projects,
    Transaction => transactions,
    Document => documents,
}

impl MemoryTable for User {
    fn table(tables: &Tables) -> &HashMap<String, Self> {
        &tables.users
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<String, Self> {
        &mut tables.users
    }

    fn unique_email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

#[derive(Clone, Default)]
struct Shared(Arc<RwLock<Tables>>);

impl Shared {
    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.0
            .read()
            .map_err(|e| StoreError::Backend(format!("failed to acquire read lock: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.0
            .write()
            .map_err(|e| StoreError::Backend(format!("failed to acquire write lock: {e}")))
    }
}

struct MemoryRepo<R> {
    shared: Shared,
    _entity: PhantomData<fn() -> R>,
}

impl<R> MemoryRepo<R> {
    fn new(shared: Shared) -> Self {
        Self {
            shared,
            _entity: PhantomData,
        }
    }
}

fn newest_first<R: Record>(rows: &mut [R]) {
    rows.sort_by(|a, b| {
        b.filter_values()
            .date
            .cmp(&a.filter_values().date)
            .then_with(|| a.id().cmp(b.id()))
    });
}

#[async_trait]
impl<R: MemoryTable> Repository<R> for MemoryRepo<R> {
    async fn list(&self, query: &ListQuery) -> Result<Vec<R>, StoreError> {
        query.check::<R>()?;
        let tables = self.shared.read()?;
        let mut rows: Vec<R> = R::table(&tables)
            .values()
            .filter(|row| query.matches(&row.filter_values()))
            .cloned()
            .collect();
        newest_first(&mut rows);
        let offset = query.offset.unwrap_or(0);
        Ok(rows
            .into_iter()
            .skip(offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<R>, StoreError> {
        let tables = self.shared.read()?;
        Ok(R::table(&tables).get(id).cloned())
    }

    async fn create(&self, input: R::Insert, owner: Option<&str>) -> Result<R, StoreError> {
        require_owner::<R>(owner)?;
        let row = R::from_insert(new_id(), input, owner, Utc::now());
        let mut tables = self.shared.write()?;
        tables.check_references(&row.references())?;
        tables.check_unique(R::KIND, row.id(), row.unique_email())?;
        R::table_mut(&mut tables).insert(row.id().to_string(), row.clone());
        tracing::debug!(entity = %R::KIND, id = row.id(), "row created");
        Ok(row)
    }

    async fn update(&self, id: &str, patch: R::Patch) -> Result<R, StoreError> {
        let mut tables = self.shared.write()?;
        tables.check_references(&patch_references::<R>(&patch))?;
        let mut row = R::table(&tables)
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(R::KIND, id))?;
        row.apply_patch(patch, Utc::now());
        tables.check_unique(R::KIND, id, row.unique_email())?;
        R::table_mut(&mut tables).insert(id.to_string(), row.clone());
        Ok(row)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut tables = self.shared.write()?;
        if !tables.contains(R::KIND, id) {
            return Err(StoreError::not_found(R::KIND, id));
        }
        if let Some(referenced_by) = tables.referenced_by(R::KIND, id) {
            return Err(StoreError::InUse {
                entity: R::KIND,
                id: id.to_string(),
                referenced_by,
            });
        }
        R::table_mut(&mut tables).remove(id);
        if R::KIND == EntityKind::User {
            tables.credentials.remove(id);
            tables.sessions.retain(|_, s| s.user_id() != id);
        }
        Ok(())
    }

    async fn count(&self, query: &ListQuery) -> Result<u64, StoreError> {
        query.check::<R>()?;
        let tables = self.shared.read()?;
        let n = R::table(&tables)
            .values()
            .filter(|row| query.matches(&row.filter_values()))
            .count();
        Ok(n as u64)
    }
}

struct MemorySessions(Shared);

#[async_trait]
impl SessionStore for MemorySessions {
    async fn create(&self, session: Session) -> Result<(), StoreError> {
        let mut tables = self.0.write()?;
        if !tables.users.contains_key(session.user_id()) {
            return Err(StoreError::ForeignKey {
                column: "sess.userId".to_string(),
                target: EntityKind::User,
                id: session.user_id().to_string(),
            });
        }
        tables.sessions.insert(session.sid.clone(), session);
        Ok(())
    }

    async fn get(&self, sid: &str, now: DateTime<Utc>) -> Result<Option<Session>, StoreError> {
        let tables = self.0.read()?;
        Ok(tables
            .sessions
            .get(sid)
            .filter(|s| !s.is_expired(now))
            .cloned())
    }

    async fn delete(&self, sid: &str) -> Result<(), StoreError> {
        self.0.write()?.sessions.remove(sid);
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut tables = self.0.write()?;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| !s.is_expired(now));
        Ok((before - tables.sessions.len()) as u64)
    }
}

struct MemoryCredentials(Shared);

#[async_trait]
impl CredentialStore for MemoryCredentials {
    async fn set_password_hash(&self, user_id: &str, hash: &str) -> Result<(), StoreError> {
        let mut tables = self.0.write()?;
        if !tables.users.contains_key(user_id) {
            return Err(StoreError::not_found(EntityKind::User, user_id));
        }
        tables
            .credentials
            .insert(user_id.to_string(), hash.to_string());
        Ok(())
    }

    async fn password_hash(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self.0.read()?.credentials.get(user_id).cloned())
    }
}

/// Process-local [`Store`].
pub struct MemoryStore {
    shared: Shared,
    users: MemoryRepo<User>,
    clients: MemoryRepo<Client>,
    contracts: MemoryRepo<Contract>,
    contract_templates: MemoryRepo<ContractTemplate>,
    contract_clauses: MemoryRepo<ContractClause>,
    projects: MemoryRepo<Project>,
    transactions: MemoryRepo<Transaction>,
    documents: MemoryRepo<Document>,
    sessions: MemorySessions,
    credentials: MemoryCredentials,
}

impl MemoryStore {
    pub fn new() -> Self {
        let shared = Shared::default();
        Self {
            users: MemoryRepo::new(shared.clone()),
            clients: MemoryRepo::new(shared.clone()),
            contracts: MemoryRepo::new(shared.clone()),
            contract_templates: MemoryRepo::new(shared.clone()),
            contract_clauses: MemoryRepo::new(shared.clone()),
            projects: MemoryRepo::new(shared.clone()),
            transactions: MemoryRepo::new(shared.clone()),
            documents: MemoryRepo::new(shared.clone()),
            sessions: MemorySessions(shared.clone()),
            credentials: MemoryCredentials(shared.clone()),
            shared,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn users(&self) -> &dyn Repository<User> {
        &self.users
    }

    fn clients(&self) -> &dyn Repository<Client> {
        &self.clients
    }

    fn contracts(&self) -> &dyn Repository<Contract> {
        &self.contracts
    }

    fn contract_templates(&self) -> &dyn Repository<ContractTemplate> {
        &self.contract_templates
    }

    fn contract_clauses(&self) -> &dyn Repository<ContractClause> {
        &self.contract_clauses
    }

    fn projects(&self) -> &dyn Repository<Project> {
        &self.projects
    }

    fn transactions(&self) -> &dyn Repository<Transaction> {
        &self.transactions
    }

    fn documents(&self) -> &dyn Repository<Document> {
        &self.documents
    }

    fn sessions(&self) -> &dyn SessionStore {
        &self.sessions
    }

    fn credentials(&self) -> &dyn CredentialStore {
        &self.credentials
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.shared.read()?;
        Ok(tables
            .users
            .values()
            .find(|u| u.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email)))
            .cloned())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.shared.read().map(|_| ())
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexdesk_core::{NewClient, NewContract, NewUser, UserPatch};

    fn client(name: &str) -> NewClient {
        NewClient {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn list_is_newest_first_and_paginated() {
        let store = MemoryStore::new();
        for name in ["A", "B", "C"] {
            store.clients().create(client(name), None).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        let all = store.clients().list(&ListQuery::default()).await.unwrap();
        let names: Vec<_> = all.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["C", "B", "A"]);

        let page = ListQuery {
            limit: Some(1),
            offset: Some(1),
            ..Default::default()
        };
        let rows = store.clients().list(&page).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "B");
        assert_eq!(store.clients().count(&page).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        let user = NewUser {
            email: Some("ana@example.com".to_string()),
            ..Default::default()
        };
        store.users().create(user.clone(), None).await.unwrap();
        let err = store.users().create(user, None).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn email_uniqueness_ignores_case() {
        let store = MemoryStore::new();
        let first = NewUser {
            email: Some("Ana@example.com".to_string()),
            ..Default::default()
        };
        let ana = store.users().create(first, None).await.unwrap();

        let second = NewUser {
            email: Some("ana@example.com".to_string()),
            ..Default::default()
        };
        let err = store.users().create(second, None).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let other = NewUser {
            email: Some("bia@example.com".to_string()),
            ..Default::default()
        };
        let bia = store.users().create(other, None).await.unwrap();
        let patch = UserPatch {
            email: Some(Some("ANA@EXAMPLE.COM".to_string())),
            ..Default::default()
        };
        let err = store.users().update(&bia.id, patch).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let found = store.user_by_email("ana@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(ana.id));
    }

    #[tokio::test]
    async fn deleting_a_user_drops_sessions_and_credentials() {
        let store = MemoryStore::new();
        let user = store.users().create(NewUser::default(), None).await.unwrap();
        store
            .credentials()
            .set_password_hash(&user.id, "$argon2id$stub")
            .await
            .unwrap();
        let now = Utc::now();
        store
            .sessions()
            .create(Session::new("s1".into(), &user.id, now, chrono::Duration::hours(1)))
            .await
            .unwrap();

        store.users().delete(&user.id).await.unwrap();
        assert!(store.sessions().get("s1", now).await.unwrap().is_none());
        assert!(store.credentials().password_hash(&user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn creator_must_exist() {
        let store = MemoryStore::new();
        let input = NewContract {
            title: "Prestação de serviços".to_string(),
            ..Default::default()
        };
        let err = store.contracts().create(input, Some("ghost")).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::ForeignKey { target: EntityKind::User, .. }
        ));
    }

    #[tokio::test]
    async fn expired_sessions_are_purged() {
        let store = MemoryStore::new();
        let user = store.users().create(NewUser::default(), None).await.unwrap();
        let now = Utc::now();
        let ttl = chrono::Duration::minutes(5);
        store
            .sessions()
            .create(Session::new("old".into(), &user.id, now - chrono::Duration::hours(1), ttl))
            .await
            .unwrap();
        store
            .sessions()
            .create(Session::new("fresh".into(), &user.id, now, ttl))
            .await
            .unwrap();

        assert!(store.sessions().get("old", now).await.unwrap().is_none());
        assert_eq!(store.sessions().purge_expired(now).await.unwrap(), 1);
        assert!(store.sessions().get("fresh", now).await.unwrap().is_some());
    }
}
