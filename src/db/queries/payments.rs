use sqlx::PgPool;

use crate::db::models::payment::PaymentTransaction;
use crate::db::store::StoreResult;

pub async fn insert_payment_transaction(
    pool: &PgPool,
    transaction: PaymentTransaction,
) -> StoreResult<PaymentTransaction> {
    let row = sqlx::query_as::<_, PaymentTransaction>(
        r#"
        INSERT INTO payment_transactions
            (id, purchase_order_id, amount, currency, payment_method, payment_status,
             stripe_payment_intent_id, payment_terms, due_date, paid_at, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id, purchase_order_id, amount, currency, payment_method, payment_status,
                  stripe_payment_intent_id AS payment_intent_id, payment_terms, due_date, paid_at, created_by
        "#,
    )
    .bind(transaction.id)
    .bind(transaction.purchase_order_id)
    .bind(&transaction.amount)
    .bind(&transaction.currency)
    .bind(&transaction.payment_method)
    .bind(&transaction.payment_status)
    .bind(&transaction.payment_intent_id)
    .bind(&transaction.payment_terms)
    .bind(transaction.due_date)
    .bind(transaction.paid_at)
    .bind(transaction.created_by)
    .fetch_one(pool)
    .await?;
    Ok(row)
}
