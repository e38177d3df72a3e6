use axum::{Extension, Json, response::IntoResponse};

use crate::{app::dto::WhoAmIResponse, context::PrincipalContext};

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn whoami(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    Json(WhoAmIResponse {
        user_id: principal.user_id(),
        role: principal.role(),
    })
}
