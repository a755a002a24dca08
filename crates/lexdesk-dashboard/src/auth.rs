//! Session authentication for the dashboard.
//!
//! Sessions live in the `sessions` table and are referenced by an HttpOnly
//! cookie. [`resolve_session`] runs on every request and attaches the signed
//! in [`CurrentUser`]; [`require_auth`] guards the protected routes.

use argon2::{
    Argon2, PasswordHash, PasswordVerifier,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::{FromRequestParts, OptionalFromRequestParts, Query, Request, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use base64::Engine;
use chrono::Utc;
use lexdesk_core::{AuthConfig, NewUser, Session, User, UserRole, ValidationError, parse_insert};
use lexdesk_store::{Store, StoreError};
use rand::RngCore;
use serde::Deserialize;
use std::convert::Infallible;

use crate::api::{Payload, guard, is_form, refresh_hint};
use crate::error::DashboardError;
use crate::state::AppState;
use crate::templates::public_layout;

/// Where unauthenticated page requests are sent.
pub const AUTH_REQUIRED_REDIRECT: &str = "/?notice=auth_required";

/// The user behind the request's session cookie.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = DashboardError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(DashboardError::Unauthenticated)
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<CurrentUser>().cloned())
    }
}

/// Attach the session's user to the request, if the cookie names a live
/// session.
pub async fn resolve_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(sid) = session_cookie(request.headers(), &state.auth().cookie_name) {
        match session_user(state.store().as_ref(), &sid).await {
            Ok(Some(user)) => {
                request.extensions_mut().insert(CurrentUser(user));
            }
            Ok(None) => tracing::debug!("session cookie without a live session"),
            Err(err) => tracing::warn!(error = %err, "session lookup failed"),
        }
    }
    next.run(request).await
}

/// Reject requests without a signed-in user.
///
/// API calls get `401`; pages are redirected to the landing page, which
/// tells the visitor to sign in.
pub async fn require_auth(request: Request, next: Next) -> Response {
    if request.extensions().get::<CurrentUser>().is_some() {
        return next.run(request).await;
    }
    if request.uri().path().starts_with("/api/") {
        DashboardError::Unauthenticated.into_response()
    } else {
        Redirect::to(AUTH_REQUIRED_REDIRECT).into_response()
    }
}

async fn session_user(store: &dyn Store, sid: &str) -> Result<Option<User>, StoreError> {
    let Some(session) = store.sessions().get(sid, Utc::now()).await? else {
        return Ok(None);
    };
    store.users().get(session.user_id()).await
}

/// Extract a cookie value from the `Cookie` header.
fn session_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .filter_map(|c| c.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

fn session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn session_cookie_header(config: &AuthConfig, sid: &str, max_age: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        config.cookie_name,
        sid,
        max_age,
        if config.secure_cookie { "; Secure" } else { "" }
    )
}

/// Login page query parameters
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub error: Option<String>,
}

/// Credentials posted to `/api/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// GET /api/login
pub async fn login_page(user: Option<CurrentUser>, Query(query): Query<LoginQuery>) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    Html(login_page_template(query.error.as_deref())).into_response()
}

/// POST /api/login
///
/// Form posts are redirected; JSON clients get the user back.
pub async fn login_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Payload(body): Payload,
) -> Result<Response, DashboardError> {
    let from_form = is_form(&headers);
    let rejected = || {
        if from_form {
            Redirect::to("/api/login?error=invalid").into_response()
        } else {
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "message": "Invalid email or password" })),
            )
                .into_response()
        }
    };

    let Ok(creds) = serde_json::from_value::<LoginRequest>(body) else {
        return Ok(rejected());
    };
    let Some(user) = authenticate(state.store().as_ref(), &creds.email, &creds.password).await?
    else {
        tracing::info!(email = %creds.email, "login rejected");
        return Ok(rejected());
    };

    let config = state.auth();
    let ttl = config.session_ttl().ok_or_else(|| {
        anyhow::anyhow!("auth.session_ttl_hours {} is out of range", config.session_ttl_hours)
    })?;
    let session = Session::new(session_id(), &user.id, Utc::now(), ttl);
    let cookie = session_cookie_header(config, &session.sid, ttl.num_seconds());
    state.store().sessions().create(session).await?;
    tracing::info!(user_id = %user.id, "signed in");

    let response = if from_form {
        Redirect::to("/").into_response()
    } else {
        Json(user).into_response()
    };
    Ok(([(header::SET_COOKIE, cookie)], response).into_response())
}

/// GET /api/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let config = state.auth();
    if let Some(sid) = session_cookie(&headers, &config.cookie_name) {
        if let Err(err) = state.store().sessions().delete(&sid).await {
            tracing::warn!(error = %err, "failed to delete session");
        }
    }
    let cookie = session_cookie_header(config, "", 0);
    ([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response()
}

/// GET /api/auth/user
pub async fn current_user(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

/// POST /api/users
///
/// Like the generic create, plus an optional initial `password`.
pub async fn create_user(
    State(state): State<AppState>,
    user: CurrentUser,
    headers: HeaderMap,
    Payload(mut body): Payload,
) -> Result<Response, DashboardError> {
    guard::<User>(&user)?;
    let password = body
        .as_object_mut()
        .and_then(|map| map.remove("password"))
        .and_then(|v| v.as_str().map(str::to_string))
        .filter(|p| !p.is_empty());
    let input = parse_insert::<User>(body)?;

    let created = match password {
        Some(password) => register_user(state.store().as_ref(), input, &password).await?,
        None => state.store().users().create(input, None).await?,
    };
    state.invalidate(lexdesk_core::EntityKind::User);
    tracing::info!(id = %created.id, user_id = %user.0.id, "user created");

    Ok(refresh_hint(&headers, (StatusCode::CREATED, Json(created)).into_response()))
}

/// Check an email and password pair.
pub async fn authenticate(
    store: &dyn Store,
    email: &str,
    password: &str,
) -> Result<Option<User>, DashboardError> {
    let Some(user) = store.user_by_email(email.trim()).await? else {
        return Ok(None);
    };
    let Some(hash) = store.credentials().password_hash(&user.id).await? else {
        return Ok(None);
    };
    Ok(verify_password(password, &hash).then_some(user))
}

/// Argon2 PHC hash of `password`.
pub fn hash_password(password: &str) -> Result<String, DashboardError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            tracing::warn!(error = %err, "stored password hash is not a PHC string");
            false
        }
    }
}

/// Create a user that can sign in with `password`.
pub async fn register_user(
    store: &dyn Store,
    input: NewUser,
    password: &str,
) -> Result<User, DashboardError> {
    if password.trim().is_empty() {
        return Err(ValidationError::Blank("password".to_string()).into());
    }
    let hash = hash_password(password)?;
    let user = store.users().create(input, None).await?;
    if let Err(err) = store.credentials().set_password_hash(&user.id, &hash).await {
        // A user without a password hash could never sign in.
        if let Err(cleanup) = store.users().delete(&user.id).await {
            tracing::warn!(user_id = %user.id, error = %cleanup, "failed to remove user without credentials");
        }
        return Err(err.into());
    }
    Ok(user)
}

/// Create the configured administrator unless a user with that email
/// already exists.
pub async fn bootstrap_admin(store: &dyn Store, config: &AuthConfig) -> Result<(), DashboardError> {
    let Some(admin) = &config.bootstrap_admin else {
        return Ok(());
    };
    if store.user_by_email(&admin.email).await?.is_some() {
        tracing::debug!(email = %admin.email, "bootstrap admin already exists");
        return Ok(());
    }
    let Some(password) = admin.get_password().filter(|p| !p.trim().is_empty()) else {
        return Err(DashboardError::StartupFailed(format!(
            "bootstrap admin '{}' has no password (set auth.bootstrap_admin.password_env)",
            admin.email
        )));
    };

    let input = NewUser {
        email: Some(admin.email.clone()),
        first_name: admin.first_name.clone(),
        role: Some(UserRole::Admin),
        ..Default::default()
    };
    register_user(store, input, &password).await?;
    tracing::warn!(email = %admin.email, "bootstrapped admin user");
    Ok(())
}

fn login_page_template(error: Option<&str>) -> String {
    let error_html = if error.is_some() {
        r##"<div class="mb-6 p-4 bg-red-50 border border-red-200 rounded-lg">
            <div class="flex items-center gap-3">
                <i class="fas fa-exclamation-circle text-red-500"></i>
                <span class="text-red-700">E-mail ou senha inválidos. Tente novamente.</span>
            </div>
        </div>"##
    } else {
        ""
    };

    let content = format!(
        r##"<div class="w-full max-w-md">
        <div class="text-center mb-8 text-white">
            <i class="fas fa-scale-balanced text-4xl mb-3"></i>
            <h1 class="text-2xl font-bold">Lexdesk</h1>
            <p class="text-primary-100">Gestão do escritório de advocacia</p>
        </div>

        <div class="bg-white rounded-2xl shadow-2xl p-8">
            <div class="text-center mb-6">
                <h2 class="text-xl font-semibold text-gray-900">Entrar</h2>
                <p class="text-gray-500 mt-1">Acesse o painel com sua conta</p>
            </div>

            {error_html}

            <form method="POST" action="/api/login" class="space-y-5">
                <div>
                    <label for="email" class="block text-sm font-medium text-gray-700 mb-2">E-mail</label>
                    <div class="relative">
                        <div class="absolute inset-y-0 left-0 pl-3 flex items-center pointer-events-none">
                            <i class="fas fa-envelope text-gray-400"></i>
                        </div>
                        <input type="email" id="email" name="email" required autofocus
                            class="block w-full pl-10 pr-4 py-3 border border-gray-300 rounded-lg focus:ring-2 focus:ring-primary-500 focus:border-primary-500"
                            placeholder="voce@escritorio.com.br">
                    </div>
                </div>

                <div>
                    <label for="password" class="block text-sm font-medium text-gray-700 mb-2">Senha</label>
                    <div class="relative" x-data="{{ show: false }}">
                        <div class="absolute inset-y-0 left-0 pl-3 flex items-center pointer-events-none">
                            <i class="fas fa-lock text-gray-400"></i>
                        </div>
                        <input :type="show ? 'text' : 'password'" id="password" name="password" required
                            class="block w-full pl-10 pr-12 py-3 border border-gray-300 rounded-lg focus:ring-2 focus:ring-primary-500 focus:border-primary-500">
                        <button type="button" @click="show = !show"
                            class="absolute inset-y-0 right-0 pr-3 flex items-center text-gray-400 hover:text-gray-600">
                            <i class="fas" :class="show ? 'fa-eye-slash' : 'fa-eye'"></i>
                        </button>
                    </div>
                </div>

                <button type="submit"
                    class="w-full py-3 px-4 bg-primary-600 hover:bg-primary-700 text-white font-medium rounded-lg shadow-lg transition-all">
                    <span class="flex items-center justify-center gap-2">
                        <i class="fas fa-sign-in-alt"></i> Entrar
                    </span>
                </button>
            </form>
        </div>
    </div>"##
    );
    public_layout("Entrar", &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use lexdesk_store::MemoryStore;

    #[test]
    fn password_hashes_verify() {
        let hash = hash_password("s3nha-forte").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3nha-forte", &hash));
        assert!(!verify_password("outra", &hash));
        assert!(!verify_password("s3nha-forte", "not-a-hash"));
    }

    #[test]
    fn reads_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; lexdesk.sid=abc123; other=1"),
        );
        assert_eq!(session_cookie(&headers, "lexdesk.sid").as_deref(), Some("abc123"));
        assert_eq!(session_cookie(&headers, "missing"), None);
    }

    #[test]
    fn cookie_header_flags() {
        let config = AuthConfig {
            secure_cookie: true,
            ..Default::default()
        };
        let cookie = session_cookie_header(&config, "sid1", 3600);
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.ends_with("; Secure"));
    }

    #[test]
    fn session_ids_are_random() {
        let a = session_id();
        assert_eq!(a.len(), 43);
        assert_ne!(a, session_id());
    }

    #[tokio::test]
    async fn authenticate_checks_the_stored_hash() {
        let store = MemoryStore::new();
        let input = NewUser {
            email: Some("ana@example.com".into()),
            ..Default::default()
        };
        register_user(&store, input, "segredo").await.unwrap();

        assert!(authenticate(&store, "ANA@example.com", "segredo").await.unwrap().is_some());
        assert!(authenticate(&store, "ana@example.com", "errada").await.unwrap().is_none());
        assert!(authenticate(&store, "bia@example.com", "segredo").await.unwrap().is_none());
    }

    /// Memory store whose credential table rejects every write.
    struct BrokenCredentials {
        inner: MemoryStore,
        credentials: RejectWrites,
    }

    struct RejectWrites;

    #[async_trait::async_trait]
    impl lexdesk_store::CredentialStore for RejectWrites {
        async fn set_password_hash(&self, _: &str, _: &str) -> Result<(), StoreError> {
            Err(StoreError::Backend("credential table unavailable".into()))
        }

        async fn password_hash(&self, _: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }
    }

    #[async_trait::async_trait]
    impl Store for BrokenCredentials {
        fn users(&self) -> &dyn lexdesk_store::Repository<User> {
            self.inner.users()
        }
        fn clients(&self) -> &dyn lexdesk_store::Repository<lexdesk_core::Client> {
            self.inner.clients()
        }
        fn contracts(&self) -> &dyn lexdesk_store::Repository<lexdesk_core::Contract> {
            self.inner.contracts()
        }
        fn contract_templates(&self) -> &dyn lexdesk_store::Repository<lexdesk_core::ContractTemplate> {
            self.inner.contract_templates()
        }
        fn contract_clauses(&self) -> &dyn lexdesk_store::Repository<lexdesk_core::ContractClause> {
            self.inner.contract_clauses()
        }
        fn projects(&self) -> &dyn lexdesk_store::Repository<lexdesk_core::Project> {
            self.inner.projects()
        }
        fn transactions(&self) -> &dyn lexdesk_store::Repository<lexdesk_core::Transaction> {
            self.inner.transactions()
        }
        fn documents(&self) -> &dyn lexdesk_store::Repository<lexdesk_core::Document> {
            self.inner.documents()
        }
        fn sessions(&self) -> &dyn lexdesk_store::SessionStore {
            self.inner.sessions()
        }
        fn credentials(&self) -> &dyn lexdesk_store::CredentialStore {
            &self.credentials
        }
        async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            self.inner.user_by_email(email).await
        }
        async fn ping(&self) -> Result<(), StoreError> {
            self.inner.ping().await
        }
        async fn migrate(&self) -> Result<(), StoreError> {
            self.inner.migrate().await
        }
        fn backend_name(&self) -> &'static str {
            "memory"
        }
    }

    #[tokio::test]
    async fn failed_credential_write_leaves_no_user_behind() {
        let store = BrokenCredentials {
            inner: MemoryStore::new(),
            credentials: RejectWrites,
        };
        let input = NewUser {
            email: Some("ana@example.com".into()),
            ..Default::default()
        };

        let err = register_user(&store, input, "segredo").await.unwrap_err();
        assert!(matches!(err, DashboardError::Store(StoreError::Backend(_))));
        assert!(store.user_by_email("ana@example.com").await.unwrap().is_none());
        assert_eq!(store.users().count(&Default::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn bootstrap_admin_is_idempotent() {
        let store = MemoryStore::new();
        let config = AuthConfig {
            bootstrap_admin: Some(lexdesk_core::BootstrapAdmin {
                email: "admin@example.com".into(),
                password: Some("admin-pass".into()),
                password_env: None,
                first_name: Some("Admin".into()),
            }),
            ..Default::default()
        };
        bootstrap_admin(&store, &config).await.unwrap();
        bootstrap_admin(&store, &config).await.unwrap();

        let admin = store.user_by_email("admin@example.com").await.unwrap().unwrap();
        assert!(admin.is_admin());
        assert_eq!(store.users().count(&Default::default()).await.unwrap(), 1);
    }
}
