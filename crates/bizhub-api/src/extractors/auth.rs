//! `AuthUser` extractor: pulls the bearer token from the Authorization
//! header and authenticates it through the gateway.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use bizhub_auth::{AuthError, AuthGateway, ClientContext, Principal};

use super::client::client_context;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub principal: Principal,
    /// The raw bearer token of this request.
    pub token: String,
    pub client: ClientContext,
}

impl std::ops::Deref for AuthUser {
    type Target = Principal;
    fn deref(&self) -> &Self::Target {
        &self.principal
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_parts(parts)?;
        let principal = state.gateway.authenticate_token(&token).await?;

        Ok(Self {
            principal,
            token,
            client: client_context(parts, state),
        })
    }
}

/// The raw bearer token, not yet verified.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl BearerToken {
    fn from_parts(parts: &Parts) -> Result<Self, AuthError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        AuthGateway::bearer_token(header)
            .map(|token| Self(token.to_string()))
            .ok_or(AuthError::MissingToken)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts)?)
    }
}
