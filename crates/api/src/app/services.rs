//! Service wiring: repositories, handlers and the token issuer.

use std::sync::Arc;

use thiserror::Error;

use cowork_auth::{Hs256JwtIssuer, JwtIssuer};
use cowork_infra::{
    AppConfig, Handlers, Repositories, RepositoryError,
    repository::{connect, migrate},
};
use cowork_reservations::BookingPolicy;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("storage initialisation failed: {0}")]
    Storage(#[from] RepositoryError),
}

/// Everything a route needs to serve a request.
pub struct AppServices {
    pub handlers: Handlers,
    pub tokens: Arc<dyn JwtIssuer>,
}

impl core::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppServices")
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}

/// Postgres when `DATABASE_URL` is configured, in-memory otherwise.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, StartupError> {
    let repos = match &config.database_url {
        Some(url) => {
            let pool = connect(url).await?;
            migrate(&pool).await?;
            tracing::info!("using postgres storage");
            Repositories::postgres(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory storage");
            Repositories::in_memory()
        }
    };

    let policy = BookingPolicy::new(config.reservation_horizon_days);
    let tokens = Arc::new(Hs256JwtIssuer::new(
        config.jwt_secret.as_bytes(),
        config.jwt_ttl,
    ));

    Ok(AppServices {
        handlers: Handlers::new(repos, policy),
        tokens,
    })
}
