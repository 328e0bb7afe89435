//! Feature listing, voting, and submission endpoints.
//!
//! The roadmap front end is a static page; it calls these four operations
//! and renders the envelopes it gets back. Identity is derived per request
//! from client-reported attributes (see `identity`); there is no login.
//!
//! ## Endpoints
//!
//! - GET /features - The public feature list, sorted by votes
//! - POST /features - Submit a new feature request
//! - POST /features/{id}/vote - Cast a vote
//! - POST /features/{id}/unvote - Retract a vote
//!
//! `userAgent` and `ipAddress` arrive as query parameters on mutations, the
//! way the legacy client sends them.

use axum::{
    debug_handler,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use shared::api::{ApiResponse, ClientInfo, SubmitFeaturePayload, SubmittedFeature, VoteReceipt};

use crate::{error::AppError, identity, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_features).post(submit_feature))
        .route("/{id}/vote", post(vote_feature))
        .route("/{id}/unvote", post(unvote_feature))
}

#[debug_handler]
async fn list_features(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state.roadmap.list().await.map_err(AppError::domain)?;

    // The body is the (possibly cached) serialized envelope, returned
    // verbatim so cache hits cost nothing beyond the Redis read.
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

#[debug_handler]
async fn vote_feature(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(client): Query<ClientInfo>,
) -> Result<impl IntoResponse, AppError> {
    if id < 1 {
        return Err(AppError::Validation("Invalid feature ID".to_string()));
    }

    let user_key =
        identity::derive_user_key(client.user_agent.as_deref(), client.ip_address.as_deref());
    let new_votes = state
        .roadmap
        .vote(id, &user_key)
        .await
        .map_err(AppError::domain)?;

    Ok(Json(ApiResponse::ok(
        "Vote recorded!",
        VoteReceipt {
            feature_id: id,
            new_votes,
        },
    )))
}

#[debug_handler]
async fn unvote_feature(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(client): Query<ClientInfo>,
) -> Result<impl IntoResponse, AppError> {
    if id < 1 {
        return Err(AppError::Validation("Invalid feature ID".to_string()));
    }

    let user_key =
        identity::derive_user_key(client.user_agent.as_deref(), client.ip_address.as_deref());
    let new_votes = state
        .roadmap
        .unvote(id, &user_key)
        .await
        .map_err(AppError::domain)?;

    Ok(Json(ApiResponse::ok(
        "Vote removed!",
        VoteReceipt {
            feature_id: id,
            new_votes,
        },
    )))
}

#[debug_handler]
async fn submit_feature(
    State(state): State<AppState>,
    Query(client): Query<ClientInfo>,
    Json(payload): Json<SubmitFeaturePayload>,
) -> Result<impl IntoResponse, AppError> {
    let user_key =
        identity::derive_user_key(client.user_agent.as_deref(), client.ip_address.as_deref());
    let id = state
        .roadmap
        .submit(payload, &user_key)
        .await
        .map_err(AppError::domain)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "Feature submitted successfully!",
            SubmittedFeature { id },
        )),
    ))
}
