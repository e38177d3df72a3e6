use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
    routing::get,
};

use cowork_core::UserId;
use cowork_infra::{
    Handle,
    handlers::{DeleteUser, GetUser, ListUsers, UpdateUser},
};

use crate::{
    app::{
        dto::{UpdateUserRequest, UserResponse},
        errors::json_rejection,
        services::AppServices,
    },
    context::PrincipalContext,
};

use super::{parse_id, respond, respond_empty, respond_list};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    let outcome = services
        .handlers
        .handle(ListUsers { actor: principal.into_principal() })
        .await;
    respond_list::<_, UserResponse>(outcome)
}

async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    let id: UserId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let outcome = services
        .handlers
        .handle(GetUser { actor: principal.into_principal(), id })
        .await;
    respond::<_, UserResponse>(outcome, StatusCode::OK)
}

async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Response {
    let id: UserId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };
    let outcome = services
        .handlers
        .handle(UpdateUser {
            actor: principal.into_principal(),
            id,
            changes: req.into(),
        })
        .await;
    respond::<_, UserResponse>(outcome, StatusCode::OK)
}

async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    let id: UserId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let outcome = services
        .handlers
        .handle(DeleteUser { actor: principal.into_principal(), id })
        .await;
    respond_empty(outcome)
}
