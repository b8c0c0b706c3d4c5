use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Extension, Json, Router,
};
use tracing::info;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::models::profile::{Profile, ProfileUpdate};
use crate::utils::api_response::{ApiResponse, ApiResult};
use crate::workflow::context::AuthContext;
use crate::workflow::directory;
use crate::workflow::status::Role;

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profiles", get(list_profiles))
        .route("/profiles/me", get(my_profile))
        .route("/profiles/{user_id}", patch(update_profile))
}

#[utoipa::path(
    get,
    path = "/profiles/me",
    responses((status = 200, description = "The caller's profile", body = Profile)),
    tag = "Profiles",
    security(("bearerAuth" = []))
)]
pub async fn my_profile(State(state): State<AppState>, Extension(ctx): Extension<AuthContext>) -> ApiResult<Profile> {
    let profile = directory::my_profile(state.store.as_ref(), &ctx).await?;
    Ok(ApiResponse::ok("Profile retrieved", profile))
}

#[utoipa::path(
    get,
    path = "/profiles",
    responses(
        (status = 200, description = "All profiles", body = [Profile]),
        (status = 403, description = "Admins only")
    ),
    tag = "Profiles",
    security(("bearerAuth" = []))
)]
pub async fn list_profiles(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Vec<Profile>> {
    let profiles = directory::list_profiles(state.store.as_ref(), &ctx).await?;
    Ok(ApiResponse::ok("Profiles retrieved", profiles))
}

/// Change a user's role or team
#[utoipa::path(
    patch,
    path = "/profiles/{user_id}",
    params(("user_id" = Uuid, Path, description = "Profile ID")),
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Profile updated", body = Profile),
        (status = 400, description = "Unknown team"),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Profile not found")
    ),
    tag = "Profiles",
    security(("bearerAuth" = []))
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<ProfileUpdate>,
) -> ApiResult<Profile> {
    let profile = directory::update_profile(state.store.as_ref(), &ctx, user_id, payload).await?;
    state.contexts.invalidate(&user_id);
    info!(%user_id, role = %profile.role, by = %ctx.user_id, "profile updated");
    Ok(ApiResponse::ok("Profile updated", profile))
}

#[derive(OpenApi)]
#[openapi(
    paths(my_profile, list_profiles, update_profile),
    components(schemas(Profile, ProfileUpdate, Role)),
    tags((name = "Profiles", description = "User profiles and role assignment"))
)]
pub struct ProfileDoc;
