//! # bizhub-api
//!
//! HTTP API layer for BizHub built on Axum.
//!
//! Every request that reaches a business handler has passed through the
//! [`AuthGateway`](bizhub_auth::AuthGateway): the [`AuthUser`](extractors::AuthUser)
//! extractor authenticates the bearer token, and route-guarded handlers
//! call `authorize` before touching data.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
