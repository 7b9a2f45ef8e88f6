// Multi-user todo service: registration, single-session token auth and
// owner-scoped todo CRUD over HTTP.

pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod model;
pub mod route;
pub mod schema;
pub mod store;
pub mod todo;
pub mod token;

use sqlx::{Pool, Sqlite};

pub use route::create_router;
pub use token::TokenService;

// Shared handles passed to every handler and to the auth middleware
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub tokens: TokenService,
}
