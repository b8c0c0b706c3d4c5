use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::team::{NewTeam, Team};
use crate::db::store::{StoreError, StoreResult};

pub async fn list_teams(pool: &PgPool) -> StoreResult<Vec<Team>> {
    let rows = sqlx::query_as::<_, Team>("SELECT id, name, description, created_at FROM teams ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn create_team(pool: &PgPool, id: Uuid, team: NewTeam) -> StoreResult<Team> {
    let row = sqlx::query_as::<_, Team>(
        r#"
        INSERT INTO teams (id, name, description)
        VALUES ($1, $2, $3)
        RETURNING id, name, description, created_at
        "#,
    )
    .bind(id)
    .bind(team.name)
    .bind(team.description)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn delete_team(pool: &PgPool, id: Uuid) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM teams WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::InUse(_) => StoreError::InUse("team is still referenced by procurement requests".into()),
            other => other,
        })?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound("team".into()));
    }
    Ok(())
}
