use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::models::team::{NewTeam, Team};
use crate::utils::api_response::{ApiResponse, ApiResult};
use crate::workflow::context::AuthContext;
use crate::workflow::directory;

pub fn team_routes() -> Router<AppState> {
    Router::new()
        .route("/teams", get(list_teams).post(create_team))
        .route("/teams/{team_id}", delete(delete_team))
}

#[utoipa::path(
    get,
    path = "/teams",
    responses((status = 200, description = "All teams by name", body = [Team])),
    tag = "Teams",
    security(("bearerAuth" = []))
)]
pub async fn list_teams(State(state): State<AppState>) -> ApiResult<Vec<Team>> {
    let teams = directory::list_teams(state.store.as_ref()).await?;
    Ok(ApiResponse::ok("Teams retrieved", teams))
}

/// Create a new team
#[utoipa::path(
    post,
    path = "/teams",
    request_body = NewTeam,
    responses(
        (status = 201, description = "Team created successfully", body = Team),
        (status = 403, description = "Admins only")
    ),
    tag = "Teams",
    security(("bearerAuth" = []))
)]
pub async fn create_team(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<NewTeam>,
) -> ApiResult<Team> {
    let team = directory::create_team(state.store.as_ref(), &ctx, payload).await?;
    Ok(ApiResponse::success(StatusCode::CREATED, "Team created successfully", team))
}

#[utoipa::path(
    delete,
    path = "/teams/{team_id}",
    params(("team_id" = Uuid, Path, description = "Team ID to delete")),
    responses(
        (status = 200, description = "Team deleted"),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Team not found")
    ),
    tag = "Teams",
    security(("bearerAuth" = []))
)]
pub async fn delete_team(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(team_id): Path<Uuid>,
) -> ApiResult<()> {
    directory::delete_team(state.store.as_ref(), &ctx, team_id).await?;
    Ok(ApiResponse::ok("Team deleted", ()))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_teams, create_team, delete_team),
    components(schemas(Team, NewTeam)),
    tags((name = "Teams", description = "Team management"))
)]
pub struct TeamDoc;
