use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::utils::api_response::ApiResponse;
use crate::workflow::context::AuthContext;

/// Claims of an access token minted by the hosted auth provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
    #[serde(default)]
    pub aud: Option<String>,
}

/// Resolved auth contexts keyed by user id.
pub type ContextCache = Arc<Cache<Uuid, AuthContext>>;

pub fn create_context_cache() -> ContextCache {
    Arc::new(
        Cache::builder()
            .time_to_live(Duration::from_secs(600))
            .max_capacity(10_000)
            .build(),
    )
}

fn reject(status: StatusCode, message: &str) -> Response {
    ApiResponse::<()>::error(status, message, None).into_response()
}

/// Verifies the bearer token and stores its `Claims` on the request.
pub async fn jwt_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let header = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Missing Authorization header"))?;

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Invalid Authorization header format"))?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[state.config.jwt_audience.as_str()]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        warn!(error = %e, "JWT rejected");
        ApiResponse::<()>::error(StatusCode::UNAUTHORIZED, "Invalid token", Some(json!({ "error": e.to_string() })))
            .into_response()
    })?;

    debug!(sub = %token_data.claims.sub, "JWT accepted");
    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}

/// Turns `Claims` into an `AuthContext` from the caller's profile, with a
/// short-lived cache in front of the lookup.
pub async fn auth_context_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .cloned()
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Missing JWT claims in request"))?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| reject(StatusCode::UNAUTHORIZED, "Invalid user ID format in JWT claims"))?;

    if let Some(ctx) = state.contexts.get(&user_id) {
        req.extensions_mut().insert(ctx);
        return Ok(next.run(req).await);
    }

    let profile = match state.store.get_profile(user_id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            warn!(%user_id, "authenticated user has no profile");
            return Err(reject(StatusCode::FORBIDDEN, "No profile found for this user"));
        }
        Err(e) => {
            error!(%user_id, error = %e, "profile lookup failed");
            return Err(ApiResponse::<()>::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load user profile",
                Some(json!({ "error": e.to_string() })),
            )
            .into_response());
        }
    };

    let ctx = AuthContext::new(profile.id, profile.role, profile.team_id);
    state.contexts.insert(user_id, ctx.clone());
    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}
