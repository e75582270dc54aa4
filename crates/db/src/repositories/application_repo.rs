//! Repositories for the `applications` and `application_documents` tables.

use careflow_core::approval::{ApplicationState, ApprovalLevel};
use careflow_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::application::{
    Application, ApplicationDocument, CreateApplication, CreateApplicationDocument,
    DisbursementStamp,
};
use crate::models::approval_log::ApprovalLog;

/// Column list for applications queries.
const COLUMNS: &str = "id, reference, user_id, application_type, comment, status, \
    current_approval_level, amount, cheque_number, disbursement_status, \
    disbursement_confirmed, disbursement_confirmed_at, disbursement_confirmed_by, \
    disbursement_comment, receipt_confirmation, approval_history, created_at, updated_at";

/// Column list for application_documents queries.
const DOCUMENT_COLUMNS: &str = "id, application_id, file_name, file_path, mime_type, created_at";

/// Provides CRUD and transition persistence for applications.
pub struct ApplicationRepo;

impl ApplicationRepo {
    /// Insert a freshly submitted application (status and level take their
    /// column defaults), returning the created row.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateApplication,
    ) -> Result<Application, sqlx::Error> {
        let query = format!(
            "INSERT INTO applications (reference, user_id, application_type, comment)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(&input.reference)
            .bind(input.user_id)
            .bind(&input.application_type)
            .bind(&input.comment)
            .fetch_one(conn)
            .await
    }

    /// Find an application by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Application>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM applications WHERE id = $1");
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Load and row-lock an application for the rest of the transaction.
    ///
    /// Concurrent transitions on the same application block here until the
    /// holder commits or rolls back, so every decision is taken against the
    /// latest committed state.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Application>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM applications WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Every application, newest first.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Application>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM applications ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Application>(&query).fetch_all(pool).await
    }

    /// Applications currently waiting at `level`, newest first.
    pub async fn list_at_level(
        pool: &PgPool,
        level: ApprovalLevel,
    ) -> Result<Vec<Application>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM applications
             WHERE current_approval_level = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(level.as_str())
            .fetch_all(pool)
            .await
    }

    /// Applications submitted by `user_id`, newest first.
    pub async fn list_for_owner(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Application>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM applications
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Write the rule-relevant columns of `state` back to the row.
    pub async fn update_state(
        conn: &mut PgConnection,
        id: DbId,
        state: &ApplicationState,
    ) -> Result<Application, sqlx::Error> {
        let query = format!(
            "UPDATE applications SET
                status = $2,
                current_approval_level = $3,
                amount = $4,
                cheque_number = $5,
                disbursement_status = $6,
                disbursement_confirmed = $7,
                receipt_confirmation = $8
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .bind(state.status.as_str())
            .bind(state.level.as_str())
            .bind(state.amount)
            .bind(&state.cheque_number)
            .bind(state.disbursement_status.map(|s| s.as_str()))
            .bind(state.disbursement_confirmed)
            .bind(state.receipt_confirmation.as_str())
            .fetch_one(conn)
            .await
    }

    /// Stamp (or clear) who confirmed the disbursement and when.
    ///
    /// Must run after [`ApplicationRepo::update_state`]: the stamp follows the
    /// row's `disbursement_confirmed` flag.
    pub async fn stamp_disbursement(
        conn: &mut PgConnection,
        id: DbId,
        stamp: &DisbursementStamp,
    ) -> Result<Application, sqlx::Error> {
        let query = format!(
            "UPDATE applications SET
                disbursement_confirmed_at =
                    CASE WHEN disbursement_confirmed THEN NOW() ELSE NULL END,
                disbursement_confirmed_by =
                    CASE WHEN disbursement_confirmed THEN $2 ELSE NULL END,
                disbursement_comment = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .bind(stamp.officer_id)
            .bind(&stamp.comment)
            .fetch_one(conn)
            .await
    }

    /// Append a copy of `log` to the denormalized `approval_history` array.
    pub async fn append_history(
        conn: &mut PgConnection,
        id: DbId,
        log: &ApprovalLog,
    ) -> Result<Application, sqlx::Error> {
        let entry = serde_json::json!({
            "id": log.id,
            "approver_id": log.approver_id,
            "approval_level": log.approval_level,
            "action": log.action,
            "comments": log.comments,
            "created_at": log.created_at,
        });
        let query = format!(
            "UPDATE applications
             SET approval_history = approval_history || jsonb_build_array($2::jsonb)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .bind(entry)
            .fetch_one(conn)
            .await
    }

    /// Remove an application. Documents and logs go with it by cascade.
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Provides access to document references attached to applications.
pub struct ApplicationDocumentRepo;

impl ApplicationDocumentRepo {
    /// Attach a document reference, returning the created row.
    pub async fn create(
        conn: &mut PgConnection,
        application_id: DbId,
        input: &CreateApplicationDocument,
    ) -> Result<ApplicationDocument, sqlx::Error> {
        let query = format!(
            "INSERT INTO application_documents (application_id, file_name, file_path, mime_type)
             VALUES ($1, $2, $3, $4)
             RETURNING {DOCUMENT_COLUMNS}"
        );
        sqlx::query_as::<_, ApplicationDocument>(&query)
            .bind(application_id)
            .bind(&input.file_name)
            .bind(&input.file_path)
            .bind(&input.mime_type)
            .fetch_one(conn)
            .await
    }

    /// Documents of an application, in upload order.
    pub async fn list_for_application(
        pool: &PgPool,
        application_id: DbId,
    ) -> Result<Vec<ApplicationDocument>, sqlx::Error> {
        let query = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM application_documents
             WHERE application_id = $1
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, ApplicationDocument>(&query)
            .bind(application_id)
            .fetch_all(pool)
            .await
    }
}
