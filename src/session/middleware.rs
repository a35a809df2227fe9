use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
        HeaderMap,
    },
    middleware::Next,
    response::{Redirect, Response},
};
use cookie::{time::Duration, Cookie, SameSite};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{
    service::SessionService,
    types::{CurrentUser, SessionContext},
};
use crate::shared::AppState;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// Where anonymous callers of protected endpoints are sent
pub const LOGIN_PATH: &str = "/login/";

/// Session middleware - resolves the caller's token into a `SessionContext` request extension.
/// Usage: .layer(middleware::from_fn_with_state(app_state.clone(), session::resolve_session))
///
/// A missing, invalid, expired or revoked token never fails the request; it
/// simply yields an anonymous context.
#[instrument(skip(state, req, next), fields(uri = %req.uri()))]
pub async fn resolve_session(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let context = match extract_token(req.headers()) {
        Some(token) => {
            let service = SessionService::new(
                Arc::clone(&state.session_repository),
                state.token_config.clone(),
            );
            match service.validate_session(&token).await {
                Ok(claims) => {
                    debug!(username = %claims.username, "Request authenticated");
                    SessionContext::authenticated(claims.into())
                }
                Err(e) => {
                    debug!(error = %e, "Ignoring unusable session token");
                    SessionContext::anonymous()
                }
            }
        }
        None => SessionContext::anonymous(),
    };

    req.extensions_mut().insert(context);
    next.run(req).await
}

/// Reads the token from `Authorization: Bearer` or, failing that, the session cookie
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    if let Some(token) = bearer {
        return Some(token.trim().to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Cookie that hands the token to the browser for `expiration_days`
pub fn session_cookie(token: &str, expiration_days: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(Duration::days(expiration_days))
        .build()
}

/// Cookie that makes the browser drop its session cookie
pub fn cleared_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(Duration::ZERO)
        .build()
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Extracting `CurrentUser` makes a handler login-only: anonymous callers are redirected
#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let context = SessionContext::from_request_parts(parts, state)
            .await
            .unwrap_or_default();

        context.user.ok_or_else(|| {
            debug!(uri = %parts.uri, "Anonymous request to protected endpoint");
            Redirect::to(LOGIN_PATH)
        })
    }
}
