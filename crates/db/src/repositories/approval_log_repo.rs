//! Repository for the append-only `approval_logs` table.
//!
//! There is deliberately no update or delete here: log rows disappear only
//! through the cascade when their application is removed.

use careflow_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::approval_log::{ApprovalLog, CreateApprovalLog};

/// Column list for approval_logs queries.
const COLUMNS: &str =
    "id, application_id, approver_id, approval_level, action, comments, created_at";

pub struct ApprovalLogRepo;

impl ApprovalLogRepo {
    /// Append a log entry, returning the created row.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateApprovalLog,
    ) -> Result<ApprovalLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO approval_logs
                (application_id, approver_id, approval_level, action, comments)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ApprovalLog>(&query)
            .bind(input.application_id)
            .bind(input.approver_id)
            .bind(&input.approval_level)
            .bind(&input.action)
            .bind(&input.comments)
            .fetch_one(conn)
            .await
    }

    /// The full audit trail of an application, oldest first.
    pub async fn list_for_application(
        pool: &PgPool,
        application_id: DbId,
    ) -> Result<Vec<ApprovalLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM approval_logs
             WHERE application_id = $1
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, ApprovalLog>(&query)
            .bind(application_id)
            .fetch_all(pool)
            .await
    }
}
