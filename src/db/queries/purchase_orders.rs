use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::models::purchase_order::{PurchaseOrder, PurchaseOrderDetail, PurchaseOrderFilter, Receipt};
use crate::db::queries::requests::{status_key, transition_request};
use crate::db::store::{PurchaseOrderInsert, ReceiptWrite, RequestTransition, StoreError, StoreResult};
use crate::workflow::status::{PaymentStatus, PurchaseOrderStatus};

/// Select list for `PurchaseOrder`. Without the payment-tracking columns the
/// payment fields read as pending/NULL instead of failing the query.
fn order_columns(prefix: &str, payment_columns: bool) -> String {
    let payment = if payment_columns {
        format!(
            "COALESCE({prefix}payment_status, 'pending') AS payment_status, {prefix}payment_terms, \
             {prefix}payment_due_date, {prefix}payment_completed_at"
        )
    } else {
        "'pending' AS payment_status, NULL::text AS payment_terms, NULL::date AS payment_due_date, \
         NULL::timestamptz AS payment_completed_at"
            .to_string()
    };
    format!(
        "{prefix}id, {prefix}request_id, {prefix}vendor_id, {prefix}po_number, {prefix}total_amount, \
         {prefix}status, {prefix}issued_by, {payment}, {prefix}created_at, {prefix}updated_at"
    )
}

/// Inserts the order and advances its request inside one transaction.
pub async fn issue_purchase_order(
    pool: &PgPool,
    order: PurchaseOrderInsert,
    request: RequestTransition,
    payment_columns: bool,
) -> StoreResult<PurchaseOrder> {
    let mut tx = pool.begin().await?;

    // the guarded request update runs first so a lost race writes nothing
    transition_request(&mut tx, &request).await?;

    let (extra_columns, extra_values) = if payment_columns {
        (", payment_status, payment_terms, payment_due_date", ", 'pending', $10, $11")
    } else {
        ("", "")
    };
    let sql = format!(
        r#"
        INSERT INTO purchase_orders
            (id, request_id, vendor_id, po_number, total_amount, status, issued_by, created_at, updated_at{extra_columns})
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9{extra_values})
        RETURNING {}
        "#,
        order_columns("", payment_columns)
    );
    let mut insert = sqlx::query_as::<_, PurchaseOrder>(&sql)
    .bind(order.id)
    .bind(order.request_id)
    .bind(order.vendor_id)
    .bind(&order.po_number)
    .bind(&order.total_amount)
    .bind(PurchaseOrderStatus::Issued.as_str())
    .bind(order.issued_by)
    .bind(order.created_at)
    .bind(order.created_at);
    if payment_columns {
        insert = insert.bind(&order.payment_terms).bind(order.payment_due_date);
    }
    let row = insert.fetch_one(&mut *tx).await?;

    tx.commit().await?;
    Ok(row)
}

pub async fn get_purchase_order(pool: &PgPool, id: Uuid, payment_columns: bool) -> StoreResult<Option<PurchaseOrder>> {
    let row = sqlx::query_as::<_, PurchaseOrder>(&format!(
        "SELECT {} FROM purchase_orders WHERE id = $1",
        order_columns("", payment_columns)
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn purchase_order_for_request(
    pool: &PgPool,
    request_id: Uuid,
    payment_columns: bool,
) -> StoreResult<Option<PurchaseOrder>> {
    let row = sqlx::query_as::<_, PurchaseOrder>(&format!(
        "SELECT {} FROM purchase_orders WHERE request_id = $1",
        order_columns("", payment_columns)
    ))
    .bind(request_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn list_purchase_orders(
    pool: &PgPool,
    filter: PurchaseOrderFilter,
    payment_columns: bool,
) -> StoreResult<Vec<PurchaseOrderDetail>> {
    let mut query = QueryBuilder::<Postgres>::new(format!(
        r#"
        SELECT {},
               pr.request_name AS item_name, pr.quantity, pr.currency,
               pr.submitted_by AS requester_id, v.name AS vendor_name
        FROM purchase_orders po
        JOIN procurement_requests pr ON pr.id = po.request_id
        JOIN vendors v ON v.id = po.vendor_id
        WHERE TRUE
        "#,
        order_columns("po.", payment_columns)
    ));

    if !filter.statuses.is_empty() {
        let statuses: Vec<String> = filter.statuses.iter().map(|s| s.as_str().to_string()).collect();
        query.push(format!(" AND {} = ANY(", status_key("po.status"))).push_bind(statuses).push(")");
    }
    if filter.unpaid_only && payment_columns {
        query
            .push(" AND COALESCE(po.payment_status, 'pending') <> ")
            .push_bind(PaymentStatus::Paid.as_str());
    }
    query.push(" ORDER BY po.created_at DESC");

    let rows = query.build_query_as::<PurchaseOrderDetail>().fetch_all(pool).await?;
    Ok(rows)
}

pub async fn transition_purchase_order(
    pool: &PgPool,
    id: Uuid,
    from: &[PurchaseOrderStatus],
    to: PurchaseOrderStatus,
    payment_columns: bool,
) -> StoreResult<PurchaseOrder> {
    let mut conn = pool.acquire().await?;
    transition_order(&mut conn, id, from, to, payment_columns).await
}

async fn transition_order(
    conn: &mut sqlx::PgConnection,
    id: Uuid,
    from: &[PurchaseOrderStatus],
    to: PurchaseOrderStatus,
    payment_columns: bool,
) -> StoreResult<PurchaseOrder> {
    let from: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();
    let updated = sqlx::query_as::<_, PurchaseOrder>(&format!(
        r#"
        UPDATE purchase_orders
        SET status = $1, updated_at = now()
        WHERE id = $2 AND {} = ANY($3)
        RETURNING {}
        "#,
        status_key("status"),
        order_columns("", payment_columns)
    ))
    .bind(to.as_str())
    .bind(id)
    .bind(from)
    .fetch_optional(&mut *conn)
    .await?;

    match updated {
        Some(row) => Ok(row),
        None => {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM purchase_orders WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut *conn)
                .await?;
            if exists {
                Err(StoreError::StaleState("purchase order".into()))
            } else {
                Err(StoreError::NotFound("purchase order".into()))
            }
        }
    }
}

/// Receives the order and completes its request; both or neither.
pub async fn receive_purchase_order(pool: &PgPool, receipt: ReceiptWrite, payment_columns: bool) -> StoreResult<Receipt> {
    let mut tx = pool.begin().await?;

    let purchase_order = transition_order(
        &mut tx,
        receipt.purchase_order_id,
        &receipt.order_from,
        PurchaseOrderStatus::Received,
        payment_columns,
    )
    .await?;
    let request = transition_request(&mut tx, &receipt.request).await?;

    tx.commit().await?;
    Ok(Receipt { purchase_order, request })
}

pub async fn mark_purchase_order_paid(pool: &PgPool, id: Uuid, paid_at: DateTime<Utc>) -> StoreResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE purchase_orders
        SET payment_status = $1, payment_completed_at = $2, updated_at = now()
        WHERE id = $3
        "#,
    )
    .bind(PaymentStatus::Paid.as_str())
    .bind(paid_at)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound("purchase order".into()));
    }
    Ok(())
}
