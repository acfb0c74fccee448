// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    mint::MintState,
    models::{
        AuthenticateRequest, AuthenticateResponse, CreateSessionRequest, MintStatusResponse,
        ProfileResponse, SessionResponse, SignInPayload, TransactionRecord, TransferRequest,
        UserLookupRequest,
    },
    state::AppState,
};

pub mod authenticate;
pub mod health;
pub mod session;
pub mod user;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/authenticate", post(authenticate::authenticate))
        .route("/user", get(user::get_user))
        .route("/session", post(session::create_session))
        .route(
            "/session/{id}",
            get(session::get_session).delete(session::delete_session),
        )
        .route("/session/{id}/profile", get(session::session_profile))
        .route("/session/{id}/mint", post(session::mint))
        .route("/session/{id}/transfer", post(session::transfer));

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        authenticate::authenticate,
        user::get_user,
        session::create_session,
        session::get_session,
        session::delete_session,
        session::session_profile,
        session::mint,
        session::transfer,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            AuthenticateRequest,
            SignInPayload,
            AuthenticateResponse,
            UserLookupRequest,
            CreateSessionRequest,
            SessionResponse,
            MintState,
            MintStatusResponse,
            TransactionRecord,
            TransferRequest,
            ProfileResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Sign-in", description = "Sign In With Farcaster verification"),
        (name = "Sessions", description = "Signed-in sessions, wallet binding and NFT claims"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;
