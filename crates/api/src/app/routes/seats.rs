use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{
        Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::Response,
    routing::get,
};
use chrono::Utc;

use cowork_core::SeatId;
use cowork_infra::{
    Handle,
    handlers::{CreateSeat, DeleteSeat, GetSeat, ListAvailableSeats, ListSeats, UpdateSeat},
};

use crate::{
    app::{
        dto::{AvailabilityQuery, CreateSeatRequest, SeatResponse, UpdateSeatRequest},
        errors::{json_rejection, query_rejection},
        services::AppServices,
    },
    context::PrincipalContext,
};

use super::{parse_id, respond, respond_empty, respond_list};

pub fn router() -> Router {
    // `/available` must be registered before the `/:id` capture.
    Router::new()
        .route("/", get(list_seats).post(create_seat))
        .route("/available", get(available_seats))
        .route("/:id", get(get_seat).put(update_seat).delete(delete_seat))
}

async fn list_seats(Extension(services): Extension<Arc<AppServices>>) -> Response {
    let outcome = services.handlers.handle(ListSeats).await;
    respond_list::<_, SeatResponse>(outcome)
}

async fn available_seats(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<AvailabilityQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return query_rejection(rejection),
    };
    let outcome = services
        .handlers
        .handle(ListAvailableSeats { date: query.date })
        .await;
    respond_list::<_, SeatResponse>(outcome)
}

async fn create_seat(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<CreateSeatRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };
    let outcome = services
        .handlers
        .handle(CreateSeat {
            actor: principal.into_principal(),
            input: req.into(),
        })
        .await;
    respond::<_, SeatResponse>(outcome, StatusCode::CREATED)
}

async fn get_seat(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id: SeatId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let outcome = services.handlers.handle(GetSeat { id }).await;
    respond::<_, SeatResponse>(outcome, StatusCode::OK)
}

async fn update_seat(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<UpdateSeatRequest>, JsonRejection>,
) -> Response {
    let id: SeatId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };
    let outcome = services
        .handlers
        .handle(UpdateSeat {
            actor: principal.into_principal(),
            id,
            changes: req.into(),
        })
        .await;
    respond::<_, SeatResponse>(outcome, StatusCode::OK)
}

async fn delete_seat(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    let id: SeatId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let outcome = services
        .handlers
        .handle(DeleteSeat {
            actor: principal.into_principal(),
            id,
            today: Utc::now().date_naive(),
        })
        .await;
    respond_empty(outcome)
}
