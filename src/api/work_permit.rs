use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::model::status::RequestStatus;
use crate::model::work_permit::{LeaveType, NewWorkPermit, PermitFilter, Session, WorkPermit};
use crate::workflow::ApprovalWorkflow;

#[derive(Deserialize, ToSchema)]
pub struct CreateWorkPermit {
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Full Day")]
    pub session: Session,
    /// Annual, Personal, Sick (or Sakit); other labels are accepted as is
    #[schema(example = "Annual")]
    pub leave_type: String,
    #[schema(example = "Family event")]
    pub reason: String,
    /// Required for sick leave
    #[schema(example = "doctor-note.pdf")]
    pub supporting_file: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PermitQuery {
    /// Filter by permit status
    #[schema(example = "pending")]
    pub status: Option<RequestStatus>,
    /// Filter by leave type label
    #[schema(example = "Annual")]
    pub leave_type: Option<String>,
}

/* =========================
Submit a work permit
========================= */
#[utoipa::path(
    post,
    path = "/api/work-permits",
    request_body(
        content = CreateWorkPermit,
        description = "Leave application",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Work permit filed and queued for review", body = WorkPermit),
        (status = 400, description = "Sick leave without a supporting file"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Leave quota exhausted", body = Object, example = json!({
            "error": "quota_exhausted",
            "message": "annual leave quota for 2026 is exhausted"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Work Permit"
)]
pub async fn submit_work_permit(
    auth: AuthUser,
    workflow: web::Data<ApprovalWorkflow>,
    payload: web::Json<CreateWorkPermit>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();

    let permit = workflow
        .submit_work_permit(NewWorkPermit {
            user_id: auth.user_id,
            date: payload.date,
            session: payload.session,
            leave_type: LeaveType::from(payload.leave_type),
            reason: payload.reason,
            supporting_file: payload.supporting_file,
        })
        .await?;

    Ok(HttpResponse::Created().json(permit))
}

#[utoipa::path(
    get,
    path = "/api/work-permits",
    responses(
        (status = 200, description = "The caller's work permits", body = [WorkPermit]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Work Permit"
)]
pub async fn list_my_permits(
    auth: AuthUser,
    workflow: web::Data<ApprovalWorkflow>,
) -> actix_web::Result<impl Responder> {
    let permits = workflow.list_user_permits(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(permits))
}

/* =========================
Withdraw a pending permit (owner)
========================= */
#[utoipa::path(
    delete,
    path = "/api/work-permits/{permit_id}",
    params(
        ("permit_id" = u64, Path, description = "ID of the work permit to withdraw")
    ),
    responses(
        (status = 200, description = "Work permit withdrawn", body = Object, example = json!({
            "message": "Work permit withdrawn"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner of this permit"),
        (status = 404, description = "Work permit not found"),
        (status = 409, description = "Permit already approved or rejected")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Work Permit"
)]
pub async fn withdraw_work_permit(
    auth: AuthUser,
    workflow: web::Data<ApprovalWorkflow>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let permit_id = path.into_inner();

    workflow.withdraw_work_permit(auth.user_id, permit_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Work permit withdrawn"
    })))
}

/* =========================
All permits (HR/Admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/admin/work-permits",
    params(PermitQuery),
    responses(
        (status = 200, description = "Work permits matching the filter", body = [WorkPermit]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Work Permit"
)]
pub async fn list_permits(
    auth: AuthUser,
    workflow: web::Data<ApprovalWorkflow>,
    query: web::Query<PermitQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;

    let query = query.into_inner();
    let filter = PermitFilter {
        status: query.status,
        leave_type: query.leave_type.map(LeaveType::from),
    };

    let permits = workflow.list_permits(&filter).await?;
    Ok(HttpResponse::Ok().json(permits))
}
