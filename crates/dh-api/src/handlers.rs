//! # dh-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the core
//! components: search sessions, the submission workflow, and the moderation
//! queue.

use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use dh_core::enrich::{self, DealView};
use dh_core::error::AppError;
use dh_core::models::{collections, DealDraft, Identity, UploaderProfile};
use dh_core::moderation::ModerationQueue;
use dh_core::reference::ReferenceData;
use dh_core::search::{SearchFilters, SearchMode, SearchOutcome};
use dh_core::traits::{AuthProvider, DocumentStore};
use dh_core::workflow::Submissions;

use crate::error::{ApiError, ApiResult};
use crate::session::{session_id, SessionRegistry};

/// State shared across all workers.
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub reference: Arc<ReferenceData>,
    pub sessions: SessionRegistry,
    pub submissions: Submissions,
    pub moderation: ModerationQueue,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthProvider>,
        reference: Arc<ReferenceData>,
        mode: SearchMode,
    ) -> Self {
        Self {
            sessions: SessionRegistry::new(store.clone(), reference.clone(), mode),
            submissions: Submissions::new(store.clone()),
            moderation: ModerationQueue::new(store.clone()),
            store,
            auth,
            reference,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Serialize)]
pub struct SearchResponse {
    pub deals: Vec<DealView>,
    pub exhausted: bool,
    pub busy: bool,
}

impl From<SearchOutcome> for SearchResponse {
    fn from(outcome: SearchOutcome) -> Self {
        match outcome {
            SearchOutcome::Results { deals, exhausted } => Self { deals, exhausted, busy: false },
            // Missing filters stay a silent no-op; the form just waits.
            SearchOutcome::NotReady => Self::default(),
            SearchOutcome::Busy => Self { busy: true, ..Self::default() },
        }
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn require_identity(state: &AppState, req: &HttpRequest) -> ApiResult<Identity> {
    let token = bearer_token(req)
        .ok_or_else(|| ApiError(AppError::Unauthorized("missing bearer token".into())))?;
    state
        .auth
        .identity(token)
        .await?
        .ok_or_else(|| ApiError(AppError::Unauthorized("session expired".into())))
}

/// POST /api/auth/signup
pub async fn signup(
    state: web::Data<AppState>,
    body: web::Json<Credentials>,
) -> ApiResult<HttpResponse> {
    // 1. Register with the auth service.
    let identity = state.auth.create_account(&body.email, &body.password).await?;

    // 2. Seed the uploader document keyed by email; the profile fields come
    //    later through the profile endpoint.
    state
        .store
        .put(
            collections::UPLOADERS,
            &identity.email,
            json!({ "email": identity.email, "created_at": Utc::now().to_rfc3339() }),
        )
        .await?;

    // 3. Signup doubles as login.
    let session = state.auth.sign_in(&body.email, &body.password).await?;
    Ok(HttpResponse::Created().json(session))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<Credentials>,
) -> ApiResult<HttpResponse> {
    let session = state.auth.sign_in(&body.email, &body.password).await?;
    Ok(HttpResponse::Ok().json(session))
}

/// POST /api/auth/logout
pub async fn logout(state: web::Data<AppState>, req: HttpRequest) -> ApiResult<HttpResponse> {
    if let Some(token) = bearer_token(&req) {
        state.auth.sign_out(token).await?;
    }
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/reference — dropdown data for the search form.
pub async fn reference(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.reference.as_ref())
}

/// POST /api/deals/search — resets this session's filters, first page.
pub async fn search(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<SearchFilters>,
) -> HttpResponse {
    let outcome = state.sessions.search_for(&session_id(&req)).search(&body).await;
    HttpResponse::Ok().json(SearchResponse::from(outcome))
}

/// POST /api/deals/more — next page under the session's current filters.
pub async fn load_more(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let outcome = state.sessions.search_for(&session_id(&req)).load_more().await;
    HttpResponse::Ok().json(SearchResponse::from(outcome))
}

/// POST /api/deals
pub async fn submit_deal(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<DealDraft>,
) -> ApiResult<HttpResponse> {
    let who = require_identity(&state, &req).await?;
    let doc = state.submissions.submit(&who, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({ "id": doc.id })))
}

/// PUT /api/deals/{id}
pub async fn edit_deal(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<DealDraft>,
) -> ApiResult<HttpResponse> {
    let who = require_identity(&state, &req).await?;
    state.submissions.edit(&who, &path, body.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// DELETE /api/deals/{id}
pub async fn delete_deal(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let who = require_identity(&state, &req).await?;
    state.submissions.delete(&who, &path).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/deals/mine — the uploader's own submissions, any status.
pub async fn my_deals(state: web::Data<AppState>, req: HttpRequest) -> ApiResult<HttpResponse> {
    let who = require_identity(&state, &req).await?;
    let docs = state.submissions.my_deals(&who).await?;
    Ok(HttpResponse::Ok().json(enrich::enrich_all(&docs, &state.reference)))
}

/// GET /api/profile
pub async fn get_profile(state: web::Data<AppState>, req: HttpRequest) -> ApiResult<HttpResponse> {
    let who = require_identity(&state, &req).await?;
    match state.submissions.profile(&who).await? {
        Some(profile) => Ok(HttpResponse::Ok().json(profile)),
        None => Err(ApiError(AppError::NotFound("uploader profile".into(), who.email))),
    }
}

/// PUT /api/profile
pub async fn save_profile(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<UploaderProfile>,
) -> ApiResult<HttpResponse> {
    let who = require_identity(&state, &req).await?;
    let profile = state.submissions.save_profile(&who, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// GET /api/moderation/pending — refreshes and returns the review queue.
pub async fn pending_deals(state: web::Data<AppState>, req: HttpRequest) -> ApiResult<HttpResponse> {
    let who = require_identity(&state, &req).await?;
    let docs = state.moderation.refresh(&who).await?;
    Ok(HttpResponse::Ok().json(enrich::enrich_all(&docs, &state.reference)))
}

/// POST /api/moderation/{id}/approve
pub async fn approve_deal(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let who = require_identity(&state, &req).await?;
    state.moderation.approve(&who, &path).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/moderation/{id}/reject
pub async fn reject_deal(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let who = require_identity(&state, &req).await?;
    state.moderation.reject(&who, &path).await?;
    Ok(HttpResponse::NoContent().finish())
}
