use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::error::Error;
use crate::models::user::Role;
use crate::utils::token::decode_token;
use crate::AppState;

/// Caller identity taken from a verified bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

fn not_authorized() -> Response {
    Error::Unauthorized("Not authorized to access this route".to_string()).into_response()
}

pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(auth_header) = req.headers().get(AUTHORIZATION) else {
        return not_authorized();
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return not_authorized();
    };
    let Some(token) = auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
    else {
        return not_authorized();
    };

    let claims = match decode_token(token, &state.config.jwt_secret) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            return not_authorized();
        }
    };
    let Ok(id) = Uuid::parse_str(&claims.sub) else {
        return not_authorized();
    };

    req.extensions_mut().insert(AuthUser {
        id,
        role: claims.role.parse().unwrap_or_default(),
    });
    next.run(req).await
}
