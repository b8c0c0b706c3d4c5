use sqlx::PgPool;

use crate::db::models::inventory::InventoryItem;
use crate::db::store::StoreResult;

pub async fn list_inventory(pool: &PgPool) -> StoreResult<Vec<InventoryItem>> {
    let rows = sqlx::query_as::<_, InventoryItem>(
        r#"
        SELECT id, item_name, current_stock, unit_of_measure, last_received_at, created_at
        FROM inventory_items
        ORDER BY item_name
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
