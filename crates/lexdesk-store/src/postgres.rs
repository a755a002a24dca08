//! Postgres store.
//!
//! SQL is generated from [`Record::columns`] so every entity shares one
//! repository implementation. Rows are read back as `to_jsonb(t)` and
//! decoded through the entity's serde shape.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lexdesk_core::{
    Client, Contract, ContractClause, ContractTemplate, DatabaseConfig, Document, EntityKind,
    FieldValue, ListQuery, Project, Record, Reference, Session, SessionData, Transaction, User,
    ValidationError, new_id,
};
use lexdesk_core::model::require_owner;
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{Arguments, PgPool, Row};
use std::marker::PhantomData;
use std::time::Duration;

use crate::{CredentialStore, Repository, SessionStore, Store, StoreError};

const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";

const DELETE_USER_SESSIONS: &str = "DELETE FROM sessions WHERE sess->>'userId' = $1";

fn args_add<T>(args: &mut PgArguments, v: T) -> Result<(), StoreError>
where
    T: Send + Sync + 'static,
    for<'q> T: sqlx::Encode<'q, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    args.add(v).map_err(|e| StoreError::Backend(e.to_string()))
}

fn quote_ident(ident: &str) -> Result<String, StoreError> {
    if ident.is_empty() || !ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(StoreError::Backend(format!("invalid identifier '{ident}'")));
    }
    Ok(format!("\"{ident}\""))
}

/// Positional arguments collected while a statement is assembled.
#[derive(Default)]
struct Binds {
    args: PgArguments,
    next: usize,
}

impl Binds {
    fn push<T>(&mut self, value: T) -> Result<String, StoreError>
    where
        T: Send + Sync + 'static,
        for<'q> T: sqlx::Encode<'q, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
    {
        args_add(&mut self.args, value)?;
        self.next += 1;
        Ok(format!("${}", self.next))
    }

    /// Bind a column value, casting enum values to their Postgres type.
    fn field(&mut self, value: FieldValue) -> Result<String, StoreError> {
        let cast = value.cast();
        let placeholder = match value {
            FieldValue::Text(v) => self.push(v)?,
            FieldValue::Enum(_, v) => self.push(v.map(str::to_string))?,
            FieldValue::Decimal(v) => self.push(v)?,
            FieldValue::Bool(v) => self.push(v)?,
            FieldValue::Timestamp(v) => self.push(v)?,
        };
        Ok(match cast {
            Some(type_name) => format!("{placeholder}::{type_name}"),
            None => placeholder,
        })
    }
}

/// `client_id` -> `clientId`.
fn camel_case(column: &str) -> String {
    let mut out = String::with_capacity(column.len());
    let mut upper = false;
    for ch in column.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn decode<R: Record>(row: &PgRow) -> Result<R, StoreError> {
    let value: Value = row.try_get("row")?;
    let Value::Object(columns) = value else {
        return Err(StoreError::Backend(format!("{} row is not an object", R::KIND)));
    };
    let renamed: Map<String, Value> = columns
        .into_iter()
        .map(|(k, v)| (camel_case(&k), v))
        .collect();
    serde_json::from_value(Value::Object(renamed))
        .map_err(|e| StoreError::Backend(format!("failed to decode {} row: {e}", R::KIND)))
}

/// `LIMIT`/`OFFSET` value as Postgres `bigint`.
fn page_bound(field: &str, value: usize) -> Result<i64, StoreError> {
    i64::try_from(value)
        .map_err(|_| ValidationError::invalid(field, format!("must be at most {}", i64::MAX)).into())
}

/// Translate constraint violations into store errors.
///
/// `refs` are the keys the statement tried to write, used to name the
/// missing row when a foreign key fails on insert or update.
fn map_write_error(err: sqlx::Error, refs: &[Reference]) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        match db.code().as_deref() {
            Some(FOREIGN_KEY_VIOLATION) => {
                let constraint = db.constraint().unwrap_or_default();
                if let Some(r) = refs.iter().find(|r| constraint.contains(r.column)) {
                    return StoreError::ForeignKey {
                        column: r.column.to_string(),
                        target: r.target,
                        id: r.id.clone(),
                    };
                }
                return StoreError::Conflict(db.message().to_string());
            }
            Some(UNIQUE_VIOLATION) => return StoreError::Conflict(db.message().to_string()),
            _ => {}
        }
    }
    StoreError::Database(err)
}

struct PgRepo<R> {
    pool: PgPool,
    _entity: PhantomData<fn() -> R>,
}

impl<R: Record> PgRepo<R> {
    fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    fn table() -> Result<String, StoreError> {
        quote_ident(R::KIND.table())
    }

    /// WHERE clause for the filters of `query`.
    fn filters(query: &ListQuery, binds: &mut Binds) -> Result<String, StoreError> {
        query.check::<R>()?;
        let f = R::FILTERS;
        let mut parts = Vec::new();

        if let (Some(column), Some(value)) = (f.status, &query.status) {
            parts.push(format!("t.{}::text = {}", quote_ident(column)?, binds.push(value.clone())?));
        }
        if let (Some(column), Some(value)) = (f.kind, &query.kind) {
            parts.push(format!("t.{}::text = {}", quote_ident(column)?, binds.push(value.clone())?));
        }
        for (column, value) in [
            ("client_id", &query.client_id),
            ("project_id", &query.project_id),
            ("contract_id", &query.contract_id),
        ] {
            if let Some(value) = value {
                parts.push(format!("t.{column} = {}", binds.push(value.clone())?));
            }
        }
        let date = quote_ident(f.date)?;
        if let Some(since) = query.since {
            parts.push(format!("t.{date} >= {}", binds.push(since)?));
        }
        if let Some(until) = query.until {
            parts.push(format!("t.{date} < {}", binds.push(until)?));
        }

        Ok(if parts.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", parts.join(" AND "))
        })
    }
}

#[async_trait]
impl<R: Record> Repository<R> for PgRepo<R> {
    async fn list(&self, query: &ListQuery) -> Result<Vec<R>, StoreError> {
        let mut binds = Binds::default();
        let where_sql = Self::filters(query, &mut binds)?;
        let mut sql = format!(
            "SELECT to_jsonb(t) AS row FROM {} AS t {} ORDER BY t.{} DESC, t.id",
            Self::table()?,
            where_sql,
            quote_ident(R::FILTERS.date)?
        );
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {}", binds.push(page_bound("limit", limit)?)?));
        }
        if let Some(offset) = query.offset {
            sql.push_str(&format!(" OFFSET {}", binds.push(page_bound("offset", offset)?)?));
        }

        let rows = sqlx::query_with(&sql, binds.args)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(decode::<R>).collect()
    }

    async fn get(&self, id: &str) -> Result<Option<R>, StoreError> {
        let sql = format!(
            "SELECT to_jsonb(t) AS row FROM {} AS t WHERE t.id = $1",
            Self::table()?
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(decode::<R>).transpose()
    }

    async fn create(&self, input: R::Insert, owner: Option<&str>) -> Result<R, StoreError> {
        require_owner::<R>(owner)?;
        let record = R::from_insert(new_id(), input, owner, Utc::now());
        let refs = record.references();

        let mut binds = Binds::default();
        let mut names = Vec::new();
        let mut values = Vec::new();
        for (column, value) in record.columns() {
            names.push(quote_ident(column)?);
            values.push(binds.field(value)?);
        }
        let sql = format!(
            "INSERT INTO {} AS t ({}) VALUES ({}) RETURNING to_jsonb(t) AS row",
            Self::table()?,
            names.join(", "),
            values.join(", ")
        );

        let row = sqlx::query_with(&sql, binds.args)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, &refs))?;
        let created = decode::<R>(&row)?;
        tracing::debug!(entity = %R::KIND, id = created.id(), "row created");
        Ok(created)
    }

    async fn update(&self, id: &str, patch: R::Patch) -> Result<R, StoreError> {
        let refs = lexdesk_core::model::patch_references::<R>(&patch);
        let mut binds = Binds::default();
        let mut sets = Vec::new();
        for (column, value) in R::patch_columns(&patch) {
            sets.push(format!("{} = {}", quote_ident(column)?, binds.field(value)?));
        }
        if R::HAS_UPDATED_AT {
            sets.push(format!("updated_at = {}", binds.push(Utc::now())?));
        }
        if sets.is_empty() {
            return self
                .get(id)
                .await?
                .ok_or_else(|| StoreError::not_found(R::KIND, id));
        }

        let sql = format!(
            "UPDATE {} AS t SET {} WHERE t.id = {} RETURNING to_jsonb(t) AS row",
            Self::table()?,
            sets.join(", "),
            binds.push(id.to_string())?
        );
        let row = sqlx::query_with(&sql, binds.args)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(e, &refs))?;
        match row {
            Some(row) => decode::<R>(&row),
            None => Err(StoreError::not_found(R::KIND, id)),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", Self::table()?);
        let mut tx = self.pool.begin().await?;
        if R::KIND == EntityKind::User {
            // Sessions hold the user id inside the JSON payload, outside any FK.
            sqlx::query(DELETE_USER_SESSIONS)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
                    StoreError::InUse {
                        entity: R::KIND,
                        id: id.to_string(),
                        referenced_by: db.table().unwrap_or("another table").to_string(),
                    }
                }
                _ => map_write_error(e, &[]),
            })?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(R::KIND, id));
        }
        tx.commit().await?;
        Ok(())
    }

    async fn count(&self, query: &ListQuery) -> Result<u64, StoreError> {
        let mut binds = Binds::default();
        let where_sql = Self::filters(query, &mut binds)?;
        let sql = format!("SELECT COUNT(*) AS n FROM {} AS t {}", Self::table()?, where_sql);
        let row = sqlx::query_with(&sql, binds.args)
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.try_get("n")?;
        Ok(n.max(0) as u64)
    }
}

struct PgSessions(PgPool);

#[async_trait]
impl SessionStore for PgSessions {
    async fn create(&self, session: Session) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO sessions (sid, sess, expire) VALUES ($1, $2, $3)")
            .bind(&session.sid)
            .bind(Json(&session.sess))
            .bind(session.expire)
            .execute(&self.0)
            .await
            .map_err(|e| map_write_error(e, &[]))?;
        Ok(())
    }

    async fn get(&self, sid: &str, now: DateTime<Utc>) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query("SELECT sid, sess, expire FROM sessions WHERE sid = $1 AND expire > $2")
            .bind(sid)
            .bind(now)
            .fetch_optional(&self.0)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let Json(sess): Json<SessionData> = row.try_get("sess")?;
        Ok(Some(Session {
            sid: row.try_get("sid")?,
            sess,
            expire: row.try_get("expire")?,
        }))
    }

    async fn delete(&self, sid: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE sid = $1")
            .bind(sid)
            .execute(&self.0)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expire <= $1")
            .bind(now)
            .execute(&self.0)
            .await?;
        Ok(result.rows_affected())
    }
}

struct PgCredentials(PgPool);

#[async_trait]
impl CredentialStore for PgCredentials {
    async fn set_password_hash(&self, user_id: &str, hash: &str) -> Result<(), StoreError> {
        let refs = [Reference {
            column: "user_id",
            target: EntityKind::User,
            id: user_id.to_string(),
        }];
        sqlx::query(
            "INSERT INTO user_credentials (user_id, password_hash, updated_at) VALUES ($1, $2, now()) \
             ON CONFLICT (user_id) DO UPDATE SET password_hash = EXCLUDED.password_hash, updated_at = now()",
        )
        .bind(user_id)
        .bind(hash)
        .execute(&self.0)
        .await
        .map_err(|e| map_write_error(e, &refs))?;
        Ok(())
    }

    async fn password_hash(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT password_hash FROM user_credentials WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.0)
            .await?;
        Ok(row
            .map(|r| r.try_get::<String, _>("password_hash"))
            .transpose()?)
    }
}

/// Postgres-backed [`Store`].
pub struct PgStore {
    pool: PgPool,
    users: PgRepo<User>,
    clients: PgRepo<Client>,
    contracts: PgRepo<Contract>,
    contract_templates: PgRepo<ContractTemplate>,
    contract_clauses: PgRepo<ContractClause>,
    projects: PgRepo<Project>,
    transactions: PgRepo<Transaction>,
    documents: PgRepo<Document>,
    sessions: PgSessions,
    credentials: PgCredentials,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .min_connections(config.pool.min_connections)
            .max_connections(config.pool.max_connections)
            .acquire_timeout(Duration::from_secs(config.pool.acquire_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.pool.idle_timeout_seconds))
            .connect(&config.connection_string())
            .await?;
        tracing::info!(database = %config.redacted_target(), "connected to Postgres");
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            users: PgRepo::new(pool.clone()),
            clients: PgRepo::new(pool.clone()),
            contracts: PgRepo::new(pool.clone()),
            contract_templates: PgRepo::new(pool.clone()),
            contract_clauses: PgRepo::new(pool.clone()),
            projects: PgRepo::new(pool.clone()),
            transactions: PgRepo::new(pool.clone()),
            documents: PgRepo::new(pool.clone()),
            sessions: PgSessions(pool.clone()),
            credentials: PgCredentials(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
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
        let row = sqlx::query(
            "SELECT to_jsonb(t) AS row FROM users AS t WHERE lower(t.email) = lower($1) LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(decode::<User>).transpose()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_map_to_wire_names() {
        assert_eq!(camel_case("client_id"), "clientId");
        assert_eq!(camel_case("profile_image_url"), "profileImageUrl");
        assert_eq!(camel_case("type"), "type");
    }

    #[test]
    fn enum_values_are_cast() {
        let mut binds = Binds::default();
        let first = binds.field(FieldValue::Text(Some("x".into()))).unwrap();
        let second = binds
            .field(FieldValue::Enum("contract_status", Some("draft")))
            .unwrap();
        assert_eq!(first, "$1");
        assert_eq!(second, "$2::contract_status");
    }

    #[test]
    fn page_bounds_fit_bigint() {
        assert_eq!(page_bound("limit", 50).unwrap(), 50);
        assert!(matches!(
            page_bound("offset", usize::MAX),
            Err(StoreError::Validation(ValidationError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn user_sessions_are_matched_on_the_payload_key() {
        let session = Session::new("s1".into(), "u1", Utc::now(), chrono::Duration::hours(1));
        let payload = serde_json::to_value(&session.sess).unwrap();
        let key = DELETE_USER_SESSIONS.split('\'').nth(1).unwrap();
        assert_eq!(payload[key], "u1");
    }

    #[test]
    fn identifiers_are_strict() {
        assert_eq!(quote_ident("created_at").unwrap(), "\"created_at\"");
        assert!(quote_ident("users; drop").is_err());
    }

    #[test]
    fn list_filters_follow_entity_columns() {
        let query = ListQuery {
            client_id: Some("c1".into()),
            ..ListQuery::default().with_status("active")
        };
        let mut binds = Binds::default();
        let sql = PgRepo::<Contract>::filters(&query, &mut binds).unwrap();
        assert_eq!(sql, "WHERE t.\"status\"::text = $1 AND t.client_id = $2");

        let mut binds = Binds::default();
        assert!(PgRepo::<Client>::filters(&query, &mut binds).is_err());
    }
}
