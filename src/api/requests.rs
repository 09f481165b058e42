use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::model::pending_request::{PendingRequest, RequestKind};
use crate::workflow::{ApprovalWorkflow, RequestSubmission, Resolution};

#[derive(Deserialize, ToSchema)]
pub struct CreateRequest {
    /// Request type, e.g. `delete_attendance`
    #[serde(rename = "type")]
    #[schema(example = "delete_attendance")]
    pub kind: String,
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Logged the wrong day")]
    pub reason: String,
    #[serde(default)]
    #[schema(example = "Teaching - Morning")]
    pub details: String,
    /// Record the request acts on
    #[schema(example = 3)]
    pub ref_id: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectRequest {
    #[schema(example = "insufficient documentation")]
    pub reason: String,
}

#[utoipa::path(
    post,
    path = "/api/requests",
    request_body(
        content = CreateRequest,
        description = "Request for a reviewer",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Request queued", body = PendingRequest),
        (status = 400, description = "Missing reason or work permit sent as a generic request"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn submit_request(
    auth: AuthUser,
    workflow: web::Data<ApprovalWorkflow>,
    payload: web::Json<CreateRequest>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();

    let request = workflow
        .submit_request(
            auth.user_id,
            RequestSubmission {
                kind: RequestKind::from(payload.kind),
                date: payload.date,
                reason: payload.reason,
                details: payload.details,
                ref_id: payload.ref_id,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(request))
}

#[utoipa::path(
    get,
    path = "/api/notifications",
    responses(
        (status = 200, description = "The caller's approved and rejected requests, newest first", body = [PendingRequest]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn list_notifications(
    auth: AuthUser,
    workflow: web::Data<ApprovalWorkflow>,
) -> actix_web::Result<impl Responder> {
    let resolved = workflow.list_notifications(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(resolved))
}

/* =========================
Review inbox (HR/Admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/admin/requests",
    responses(
        (status = 200, description = "Requests awaiting review", body = [PendingRequest]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn list_pending_requests(
    auth: AuthUser,
    workflow: web::Data<ApprovalWorkflow>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;

    let pending = workflow.list_pending_requests().await?;
    Ok(HttpResponse::Ok().json(pending))
}

#[utoipa::path(
    put,
    path = "/api/admin/requests/{request_id}/approve",
    params(
        ("request_id" = u64, Path, description = "ID of the request to approve")
    ),
    responses(
        (status = 200, description = "Request approved (or already was)", body = Object, example = json!({
            "message": "Request approved"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request was already rejected")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn approve_request(
    auth: AuthUser,
    workflow: web::Data<ApprovalWorkflow>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;

    let request_id = path.into_inner();
    let message = match workflow.approve_request(request_id).await? {
        Resolution::Applied => "Request approved",
        Resolution::AlreadyResolved => "Request was already approved",
    };

    tracing::info!(request_id, reviewer = auth.user_id, reviewer_name = %auth.username, "Approve handled");
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": message })))
}

#[utoipa::path(
    put,
    path = "/api/admin/requests/{request_id}/reject",
    params(
        ("request_id" = u64, Path, description = "ID of the request to reject")
    ),
    request_body(
        content = RejectRequest,
        description = "Why the request is refused",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Request rejected (or already was)", body = Object, example = json!({
            "message": "Request rejected"
        })),
        (status = 400, description = "Missing reason"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request was already approved")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn reject_request(
    auth: AuthUser,
    workflow: web::Data<ApprovalWorkflow>,
    path: web::Path<u64>,
    payload: web::Json<RejectRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;

    let request_id = path.into_inner();
    let message = match workflow.reject_request(request_id, &payload.reason).await? {
        Resolution::Applied => "Request rejected",
        Resolution::AlreadyResolved => "Request was already rejected",
    };

    tracing::info!(request_id, reviewer = auth.user_id, reviewer_name = %auth.username, "Reject handled");
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": message })))
}
