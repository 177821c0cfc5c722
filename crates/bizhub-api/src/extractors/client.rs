//! `ClientInfo` extractor: caller address and user agent.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;

use bizhub_auth::ClientContext;

use crate::state::AppState;

/// Network identity of the caller, always available.
#[derive(Debug, Clone)]
pub struct ClientInfo(pub ClientContext);

impl FromRequestParts<AppState> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(client_context(parts, state)))
    }
}

/// Builds a [`ClientContext`] for a request.
pub fn client_context(parts: &Parts, state: &AppState) -> ClientContext {
    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());
    from_headers(&parts.headers, peer, state.server.trust_forwarded_headers)
}

/// With `trust_forwarded` the first `X-Forwarded-For` hop wins, then
/// `X-Real-IP`. The socket peer comes next, then `"unknown"`.
fn from_headers(headers: &HeaderMap, peer: Option<String>, trust_forwarded: bool) -> ClientContext {
    let header_ip = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let proxied = if trust_forwarded {
        header_ip("x-forwarded-for").or_else(|| header_ip("x-real-ip"))
    } else {
        None
    };

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match proxied.or(peer) {
        Some(ip) => ClientContext::new(ip, user_agent),
        None => ClientContext {
            user_agent,
            ..ClientContext::unknown()
        },
    }
}
