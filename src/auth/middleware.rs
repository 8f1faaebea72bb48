//! Authentication middleware that checks the bearer token on each request.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{AppState, Error, auth::AuthConfig, user::UserId};

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    /// How bearer tokens are verified.
    pub config: Arc<AuthConfig>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            config: state.auth_config.clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token.
///
/// The user ID and the token claims are placed into the request and then the
/// request executed normally if the token is valid, otherwise a 401 response is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserId>` to receive the user ID.
pub async fn auth_guard(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Result<Response, Error> {
    let (mut parts, body) = request.into_parts();

    let TypedHeader(Authorization(bearer)) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(&mut parts, &state)
            .await
            .map_err(|error| {
                tracing::warn!("Rejected request to {} without a bearer token: {error}", parts.uri);
                Error::MissingToken
            })?;

    let claims = state.config.verify(bearer.token())?;
    tracing::debug!("Authenticated user {}", claims.sub);

    parts.extensions.insert(UserId::new(&claims.sub));
    parts.extensions.insert(claims);

    Ok(next.run(Request::from_parts(parts, body)).await)
}
