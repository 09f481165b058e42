use actix_web::{HttpResponse, Responder, web};

use crate::auth::auth::AuthUser;
use crate::workflow::{ApprovalWorkflow, PurgeSummary};

/* =========================
User removal cascade (Admin)
========================= */
/// Called by the directory service after it deletes a user account
#[utoipa::path(
    delete,
    path = "/api/admin/users/{user_id}/records",
    params(
        ("user_id" = u64, Path, description = "Deleted user whose leave records are removed")
    ),
    responses(
        (status = 200, description = "Number of removed records per collection", body = PurgeSummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn purge_user(
    auth: AuthUser,
    workflow: web::Data<ApprovalWorkflow>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();
    let summary = workflow.purge_user(user_id).await?;

    tracing::info!(user_id, admin = auth.user_id, admin_name = %auth.username, "User leave records purged");
    Ok(HttpResponse::Ok().json(summary))
}
