//! Infrastructure layer: repositories, command/query handlers, configuration.

pub mod config;
pub mod handlers;
pub mod repository;

pub use config::{AppConfig, ConfigError};
pub use handlers::{Handle, Handlers};
pub use repository::{
    InMemoryRepository, Repositories, Repository, RepositoryError, ReservationRepository,
    SeatRepository, UserRepository,
};
