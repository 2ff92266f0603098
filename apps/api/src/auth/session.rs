use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::access::Caller;
use crate::state::AppState;

/// Resolves the caller from the bearer token. Never rejects: a missing or
/// invalid token yields [`Caller::Anonymous`] and the authorization layer
/// turns that into a 401 where it matters.
#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            return Ok(Caller::Anonymous);
        };
        match state.sessions.verify(token) {
            Ok(claims) => Ok(claims.into_caller()),
            Err(e) => {
                debug!("Ignoring session token: {e}");
                Ok(Caller::Anonymous)
            }
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
