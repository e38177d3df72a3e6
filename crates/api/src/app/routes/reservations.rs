use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
    routing::get,
};
use chrono::Utc;

use cowork_core::ReservationId;
use cowork_infra::{
    Handle,
    handlers::{
        CancelReservation, CreateReservation, GetReservation, ListReservations, UpdateReservation,
    },
};

use crate::{
    app::{
        dto::{CreateReservationRequest, ReservationResponse, UpdateReservationRequest},
        errors::json_rejection,
        services::AppServices,
    },
    context::PrincipalContext,
};

use super::{parse_id, respond, respond_empty, respond_list};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_reservations).post(create_reservation))
        .route(
            "/:id",
            get(get_reservation)
                .put(update_reservation)
                .delete(cancel_reservation),
        )
}

async fn list_reservations(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    let outcome = services
        .handlers
        .handle(ListReservations { actor: principal.into_principal() })
        .await;
    respond_list::<_, ReservationResponse>(outcome)
}

async fn create_reservation(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<CreateReservationRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };
    let outcome = services
        .handlers
        .handle(CreateReservation {
            actor: principal.into_principal(),
            input: req.into(),
            today: Utc::now().date_naive(),
        })
        .await;
    respond::<_, ReservationResponse>(outcome, StatusCode::CREATED)
}

async fn get_reservation(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    let id: ReservationId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let outcome = services
        .handlers
        .handle(GetReservation { actor: principal.into_principal(), id })
        .await;
    respond::<_, ReservationResponse>(outcome, StatusCode::OK)
}

async fn update_reservation(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<UpdateReservationRequest>, JsonRejection>,
) -> Response {
    let id: ReservationId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };
    let outcome = services
        .handlers
        .handle(UpdateReservation {
            actor: principal.into_principal(),
            id,
            changes: req.into(),
            today: Utc::now().date_naive(),
        })
        .await;
    respond::<_, ReservationResponse>(outcome, StatusCode::OK)
}

async fn cancel_reservation(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    let id: ReservationId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let outcome = services
        .handlers
        .handle(CancelReservation {
            actor: principal.into_principal(),
            id,
            today: Utc::now().date_naive(),
        })
        .await;
    respond_empty(outcome)
}
