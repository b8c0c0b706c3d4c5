use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::vendor::{NewVendor, Vendor};
use crate::db::store::{StoreError, StoreResult};

const VENDOR_COLUMNS: &str = "id, name, contact_info, contact_person, email, phone, address, created_at";

pub async fn list_vendors(pool: &PgPool) -> StoreResult<Vec<Vendor>> {
    let rows = sqlx::query_as::<_, Vendor>(&format!("SELECT {VENDOR_COLUMNS} FROM vendors ORDER BY name"))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn get_vendor(pool: &PgPool, id: Uuid) -> StoreResult<Option<Vendor>> {
    let row = sqlx::query_as::<_, Vendor>(&format!("SELECT {VENDOR_COLUMNS} FROM vendors WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create_vendor(pool: &PgPool, id: Uuid, vendor: NewVendor) -> StoreResult<Vendor> {
    let row = sqlx::query_as::<_, Vendor>(&format!(
        r#"
        INSERT INTO vendors (id, name, contact_info, contact_person, email, phone, address)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {VENDOR_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(vendor.name)
    .bind(vendor.contact_info)
    .bind(vendor.contact_person)
    .bind(vendor.email)
    .bind(vendor.phone)
    .bind(vendor.address)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn delete_vendor(pool: &PgPool, id: Uuid) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM vendors WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::InUse(_) => StoreError::InUse("vendor is still referenced by purchase orders".into()),
            other => other,
        })?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound("vendor".into()));
    }
    Ok(())
}
