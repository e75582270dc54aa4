//! Multi-write operations.
//!
//! Each workflow opens one transaction, row-locks what it is about to change,
//! asks `careflow_core` for the decision on the locked snapshot, then writes
//! every row the decision implies before committing. An early `?` drops the
//! transaction, which rolls back.
//!
//! - [`approval`] -- application submission and the approver chain.
//! - [`disbursement`] -- disbursement and receipt confirmation.
//! - [`payment_verifier`] -- payment evidence checks for onboarding.
//! - [`onboarding_activation`] -- payment-gated onboarding lifecycle.

pub mod approval;
pub mod disbursement;
pub mod onboarding_activation;
pub mod payment_verifier;

use careflow_core::approval::Transition;
use careflow_core::error::CoreError;
use careflow_core::types::DbId;
use careflow_db::models::application::{Application, ApplicationDetail};
use careflow_db::models::approval_log::{ApprovalLog, CreateApprovalLog};
use careflow_db::repositories::{ApplicationDocumentRepo, ApplicationRepo, ApprovalLogRepo};
use careflow_db::DbPool;
use sqlx::PgConnection;

use crate::error::AppResult;

/// Lock an application row or fail with 404.
pub(crate) async fn lock_application(
    conn: &mut PgConnection,
    id: DbId,
) -> AppResult<Application> {
    ApplicationRepo::find_for_update(conn, id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: "Application",
                id,
            }
            .into()
        })
}

/// Write a transition: the audit row first, then its copy in
/// `approval_history`, then the new application state.
pub(crate) async fn persist_transition(
    conn: &mut PgConnection,
    application_id: DbId,
    actor_id: DbId,
    transition: &Transition,
) -> Result<(Application, ApprovalLog), sqlx::Error> {
    let log = ApprovalLogRepo::create(
        &mut *conn,
        &CreateApprovalLog::from_entry(application_id, actor_id, &transition.log),
    )
    .await?;
    ApplicationRepo::append_history(&mut *conn, application_id, &log).await?;
    let application =
        ApplicationRepo::update_state(&mut *conn, application_id, &transition.state).await?;
    Ok((application, log))
}

/// Load an application with its documents and ordered audit trail.
pub async fn load_detail(pool: &DbPool, id: DbId) -> AppResult<ApplicationDetail> {
    let application = ApplicationRepo::find_by_id(pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Application",
            id,
        })?;
    let documents = ApplicationDocumentRepo::list_for_application(pool, id).await?;
    let approval_logs = ApprovalLogRepo::list_for_application(pool, id).await?;
    Ok(ApplicationDetail {
        application,
        documents,
        approval_logs,
    })
}
