use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::profile::{Profile, ProfileUpdate};
use crate::db::store::{StoreError, StoreResult};

const PROFILE_COLUMNS: &str = "id, full_name, role, team_id, created_at";

pub async fn get_profile(pool: &PgPool, id: Uuid) -> StoreResult<Option<Profile>> {
    let row = sqlx::query_as::<_, Profile>(&format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn list_profiles(pool: &PgPool) -> StoreResult<Vec<Profile>> {
    let rows = sqlx::query_as::<_, Profile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY full_name NULLS LAST, created_at"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Absent fields keep their stored value.
pub async fn update_profile(pool: &PgPool, id: Uuid, update: ProfileUpdate) -> StoreResult<Profile> {
    let row = sqlx::query_as::<_, Profile>(&format!(
        r#"
        UPDATE profiles
        SET role = COALESCE($1, role),
            team_id = COALESCE($2, team_id),
            full_name = COALESCE($3, full_name)
        WHERE id = $4
        RETURNING {PROFILE_COLUMNS}
        "#
    ))
    .bind(update.role.map(|role| role.db_value()))
    .bind(update.team_id)
    .bind(update.full_name)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.ok_or_else(|| StoreError::NotFound("profile".into()))
}
