use core::str::FromStr;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;

use cowork_core::{Error, Outcome};

use crate::app::errors::failure_to_response;

pub mod auth;
pub mod reservations;
pub mod seats;
pub mod system;
pub mod users;

/// Routes that require an authenticated principal.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/users", users::router())
        .nest("/seats", seats::router())
        .nest("/reservations", reservations::router())
}

/// Map an outcome onto a JSON response: `status` with the converted body on
/// success, the failure rendering otherwise.
pub(crate) fn respond<T, R>(outcome: Outcome<T>, status: StatusCode) -> Response
where
    R: Serialize + From<T>,
{
    match outcome {
        Ok(value) => (status, Json(R::from(value))).into_response(),
        Err(failure) => failure_to_response(failure),
    }
}

pub(crate) fn respond_list<T, R>(outcome: Outcome<Vec<T>>) -> Response
where
    R: Serialize + From<T>,
{
    match outcome {
        Ok(items) => Json(crate::app::dto::to_responses::<T, R>(items)).into_response(),
        Err(failure) => failure_to_response(failure),
    }
}

pub(crate) fn respond_empty(outcome: Outcome<()>) -> Response {
    match outcome {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(failure) => failure_to_response(failure),
    }
}

pub(crate) fn parse_id<I>(raw: &str) -> Result<I, Response>
where
    I: FromStr<Err = Error>,
{
    raw.parse::<I>()
        .map_err(|err| failure_to_response(err.into()))
}
