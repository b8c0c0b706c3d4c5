use sqlx::PgPool;

use crate::db::models::payment::SetupMarker;
use crate::db::store::StoreResult;

pub async fn setup_marker(pool: &PgPool, setup_name: &str) -> StoreResult<Option<SetupMarker>> {
    let row = sqlx::query_as::<_, SetupMarker>(
        "SELECT setup_name, completed_at, version FROM app_setup_status WHERE setup_name = $1",
    )
    .bind(setup_name)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn mark_setup_complete(pool: &PgPool, setup_name: &str, version: &str) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO app_setup_status (setup_name, completed_at, version)
        VALUES ($1, now(), $2)
        ON CONFLICT (setup_name) DO UPDATE
        SET completed_at = EXCLUDED.completed_at, version = EXCLUDED.version
        "#,
    )
    .bind(setup_name)
    .bind(version)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn table_exists(pool: &PgPool, table: &str) -> StoreResult<bool> {
    let exists: bool = sqlx::query_scalar("SELECT to_regclass($1::text) IS NOT NULL")
        .bind(table)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

pub async fn columns_exist(pool: &PgPool, table: &str, columns: &[&str]) -> StoreResult<bool> {
    let wanted: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
    let found: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM information_schema.columns
        WHERE table_schema = current_schema() AND table_name = $1 AND column_name = ANY($2)
        "#,
    )
    .bind(table)
    .bind(&wanted)
    .fetch_one(pool)
    .await?;
    Ok(found as usize == wanted.len())
}
