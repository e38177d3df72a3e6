use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use cowork_auth::Principal;
use cowork_core::Error;
use cowork_infra::{
    Handle,
    handlers::{Authenticate, RegisterUser},
};

use crate::app::{
    dto::{LoginRequest, RegisterRequest, TokenResponse, UserResponse},
    errors::{failure_to_response, json_rejection},
    services::AppServices,
};

use super::respond;

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };

    let outcome = services
        .handlers
        .handle(RegisterUser { input: req.into() })
        .await;
    respond::<_, UserResponse>(outcome, StatusCode::CREATED)
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };

    let user = match services
        .handlers
        .handle(Authenticate {
            email: req.email,
            password: req.password,
        })
        .await
    {
        Ok(user) => user,
        Err(failure) => return failure_to_response(failure),
    };

    let principal = Principal::new(user.id, user.role);
    match services.tokens.issue(&principal, Utc::now()) {
        Ok(issued) => Json(TokenResponse::bearer(issued, user)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, user_id = %user.id, "failed to issue token");
            failure_to_response(
                Error::unexpected("Auth.TokenIssueFailed", "could not issue an access token").into(),
            )
        }
    }
}
