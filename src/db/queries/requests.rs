use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::models::requests::{ProcurementRequest, RequestFilter};
use crate::db::store::{RequestInsert, RequestTransition, StoreError, StoreResult};

/// Column list mapping the table's legacy names onto `ProcurementRequest`.
pub(crate) const REQUEST_COLUMNS: &str = r#"
    id, submitted_by AS requester_id, team_id, request_name AS item_name, quantity,
    unit_price, currency, total_estimated_price AS total_estimate, description AS justification,
    status, approved_by_team_lead, rejected_by_team_lead, approved_by_admin, rejected_by_admin,
    created_at, updated_at
"#;

pub async fn insert_request(pool: &PgPool, request: RequestInsert) -> StoreResult<ProcurementRequest> {
    let row = sqlx::query_as::<_, ProcurementRequest>(&format!(
        r#"
        INSERT INTO procurement_requests
            (id, submitted_by, team_id, request_name, quantity, unit_price, currency,
             total_estimated_price, description, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending', $10, $10)
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(request.id)
    .bind(request.requester_id)
    .bind(request.team_id)
    .bind(&request.item_name)
    .bind(request.quantity)
    .bind(&request.unit_price)
    .bind(&request.currency)
    .bind(&request.total_estimate)
    .bind(&request.justification)
    .bind(request.created_at)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn get_request(pool: &PgPool, id: Uuid) -> StoreResult<Option<ProcurementRequest>> {
    let row = sqlx::query_as::<_, ProcurementRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM procurement_requests WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn list_requests(pool: &PgPool, filter: RequestFilter) -> StoreResult<Vec<ProcurementRequest>> {
    let mut query = QueryBuilder::<Postgres>::new(format!(
        "SELECT {REQUEST_COLUMNS} FROM procurement_requests WHERE TRUE"
    ));

    if let Some(requester_id) = filter.requester_id {
        query.push(" AND submitted_by = ").push_bind(requester_id);
    }
    if let Some(team_id) = filter.team_id {
        query.push(" AND team_id = ").push_bind(team_id);
    }
    if !filter.statuses.is_empty() {
        let statuses: Vec<String> = filter.statuses.iter().map(|s| s.as_str().to_string()).collect();
        query.push(format!(" AND {} = ANY(", status_key("status"))).push_bind(statuses).push(")");
    }
    query.push(" ORDER BY created_at DESC");

    let rows = query.build_query_as::<ProcurementRequest>().fetch_all(pool).await?;
    Ok(rows)
}

/// SQL form of the status parser's folding: legacy rows such as `Completed`
/// or `approved_by_admin` compare equal to the canonical string.
pub(crate) fn status_key(column: &str) -> String {
    format!("regexp_replace(lower(btrim({column})), '[_[:space:]]+', ' ', 'g')")
}

fn transition_sql(audit: &str) -> String {
    format!(
        r#"
        UPDATE procurement_requests
        SET status = $1, updated_at = now(){audit}
        WHERE id = $2 AND {} = $3
        RETURNING {REQUEST_COLUMNS}
        "#,
        status_key("status")
    )
}

/// Compare-and-set status change. Runs on a borrowed connection so it can
/// join a caller's transaction.
pub async fn transition_request(
    conn: &mut PgConnection,
    transition: &RequestTransition,
) -> StoreResult<ProcurementRequest> {
    let audit = transition
        .audit
        .map(|flag| format!(", {} = TRUE", flag.column()))
        .unwrap_or_default();

    let updated = sqlx::query_as::<_, ProcurementRequest>(&transition_sql(&audit))
    .bind(transition.to.as_str())
    .bind(transition.request_id)
    .bind(transition.from.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    match updated {
        Some(row) => Ok(row),
        None => {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM procurement_requests WHERE id = $1)")
                .bind(transition.request_id)
                .fetch_one(&mut *conn)
                .await?;
            if exists {
                Err(StoreError::StaleState("procurement request".into()))
            } else {
                Err(StoreError::NotFound("procurement request".into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::transitions::AuditFlag;

    #[test]
    fn status_key_folds_case_and_underscores() {
        assert_eq!(
            status_key("po.status"),
            "regexp_replace(lower(btrim(po.status)), '[_[:space:]]+', ' ', 'g')"
        );
    }

    #[test]
    fn transition_guard_compares_folded_status() {
        let sql = transition_sql(&format!(", {} = TRUE", AuditFlag::ApprovedByAdmin.column()));
        assert!(sql.contains(&format!("WHERE id = $2 AND {} = $3", status_key("status"))));
        assert!(!sql.contains("lower(status) = $3"));
        assert!(sql.contains("approved_by_admin = TRUE"));
    }
}
