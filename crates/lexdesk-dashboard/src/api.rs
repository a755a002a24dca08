//! JSON CRUD API shared by every entity.
//!
//! Each entity gets `GET|POST /api/{segment}` and
//! `GET|PATCH|DELETE /api/{segment}/{id}`. Payloads may be JSON or HTML form
//! fields; the latter arrive from the HTMX create forms on the pages.

use axum::body::Bytes;
use axum::extract::{Form, FromRequest, Path, Query, Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use lexdesk_core::{EntityKind, ListQuery, ValidationError, parse_insert, parse_patch};
use lexdesk_store::Stored;
use serde_json::{Map, Value};

use crate::auth::CurrentUser;
use crate::error::DashboardError;
use crate::state::AppState;

/// Whether the request carries an urlencoded form body.
pub fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

/// Whether the request was issued by HTMX.
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// A request body as loose JSON.
///
/// Form fields become a JSON object of strings, which the payload parsers
/// accept for every column type.
#[derive(Debug, Clone)]
pub struct Payload(pub Value);

impl<S: Send + Sync> FromRequest<S> for Payload {
    type Rejection = DashboardError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(req.headers()) {
            let Form(fields) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| DashboardError::InvalidRequest(e.body_text()))?;
            let object: Map<String, Value> = fields
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            return Ok(Payload(Value::Object(object)));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| DashboardError::InvalidRequest(e.body_text()))?;
        if bytes.is_empty() {
            return Ok(Payload(Value::Object(Map::new())));
        }
        let value = serde_json::from_slice(&bytes)
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;
        Ok(Payload(value))
    }
}

/// Register the CRUD routes of `R`.
pub fn crud<R: Stored>(router: Router<AppState>) -> Router<AppState> {
    let base = format!("/api/{}", R::KIND.segment());
    let item = format!("{base}/{{id}}");
    router
        .route(&base, get(list::<R>).post(create::<R>))
        .route(&item, get(fetch::<R>).patch(update::<R>).delete(remove::<R>))
}

/// User rows can only be changed by administrators.
pub fn guard<R: Stored>(user: &CurrentUser) -> Result<(), DashboardError> {
    if R::KIND == EntityKind::User && !user.0.is_admin() {
        tracing::warn!(user_id = %user.0.id, "non-admin attempted to modify users");
        return Err(DashboardError::Forbidden);
    }
    Ok(())
}

/// Ask HTMX to reload the page after a successful mutation.
pub fn refresh_hint(headers: &HeaderMap, mut response: Response) -> Response {
    if is_htmx(headers) {
        response
            .headers_mut()
            .insert("hx-refresh", HeaderValue::from_static("true"));
    }
    response
}

pub async fn list<R: Stored>(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<R>>, DashboardError> {
    Ok(Json(state.list::<R>(&query).await?))
}

pub async fn fetch<R: Stored>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<R>, DashboardError> {
    R::repository(state.store().as_ref())
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| DashboardError::NotFound(format!("{} '{id}' not found", R::KIND)))
}

pub async fn create<R: Stored>(
    State(state): State<AppState>,
    user: CurrentUser,
    headers: HeaderMap,
    Payload(body): Payload,
) -> Result<Response, DashboardError> {
    guard::<R>(&user)?;
    let input = parse_insert::<R>(body)?;
    let row = R::repository(state.store().as_ref())
        .create(input, Some(user.0.id.as_str()))
        .await?;
    state.invalidate(R::KIND);
    tracing::info!(entity = %R::KIND, id = row.id(), user_id = %user.0.id, "created");

    Ok(refresh_hint(&headers, (StatusCode::CREATED, Json(row)).into_response()))
}

pub async fn update<R: Stored>(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    headers: HeaderMap,
    Payload(body): Payload,
) -> Result<Response, DashboardError> {
    guard::<R>(&user)?;
    let patch = parse_patch::<R>(body)?;
    let row = R::repository(state.store().as_ref()).update(&id, patch).await?;
    state.invalidate(R::KIND);
    tracing::info!(entity = %R::KIND, id = %id, user_id = %user.0.id, "updated");

    Ok(refresh_hint(&headers, Json(row).into_response()))
}

pub async fn remove<R: Stored>(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, DashboardError> {
    guard::<R>(&user)?;
    R::repository(state.store().as_ref()).delete(&id).await?;
    state.invalidate(R::KIND);
    tracing::info!(entity = %R::KIND, id = %id, user_id = %user.0.id, "deleted");

    Ok(refresh_hint(&headers, StatusCode::NO_CONTENT.into_response()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[tokio::test]
    async fn form_fields_become_json_strings() {
        let req = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("name=Silva+%26+Filhos&type=company"))
            .unwrap();
        let Payload(value) = Payload::from_request(req, &()).await.unwrap();
        assert_eq!(value["name"], "Silva & Filhos");
        assert_eq!(value["type"], "company");
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let req = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let err = Payload::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn htmx_requests_get_a_refresh_hint() {
        let mut headers = HeaderMap::new();
        headers.insert("hx-request", HeaderValue::from_static("true"));
        let response = refresh_hint(&headers, StatusCode::NO_CONTENT.into_response());
        assert_eq!(response.headers()["hx-refresh"], "true");

        let plain = refresh_hint(&HeaderMap::new(), StatusCode::NO_CONTENT.into_response());
        assert!(plain.headers().get("hx-refresh").is_none());
    }
}
