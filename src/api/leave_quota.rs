use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::model::leave_quota::LeaveQuota;
use crate::workflow::ApprovalWorkflow;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct QuotaQuery {
    /// Calendar year, defaults to the current one
    #[schema(example = 2026)]
    pub year: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct ResetQuotas {
    #[schema(example = 2026)]
    pub year: i32,
}

#[derive(Deserialize, ToSchema)]
pub struct AdjustQuota {
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 14)]
    pub total: i32,
}

#[utoipa::path(
    get,
    path = "/api/leave-quota",
    params(QuotaQuery),
    responses(
        (status = 200, description = "The caller's quota for the year", body = LeaveQuota),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Quota"
)]
pub async fn get_my_quota(
    auth: AuthUser,
    workflow: web::Data<ApprovalWorkflow>,
    query: web::Query<QuotaQuery>,
) -> actix_web::Result<impl Responder> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let quota = workflow.get_quota(auth.user_id, year).await?;
    Ok(HttpResponse::Ok().json(quota))
}

/* =========================
Rollover and overrides (Admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/admin/leave-quota/reset",
    request_body(
        content = ResetQuotas,
        description = "Year whose quotas fall back to the default",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Quotas reset", body = Object, example = json!({
            "message": "Leave quotas reset",
            "removed": 42
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Quota"
)]
pub async fn reset_quotas(
    auth: AuthUser,
    workflow: web::Data<ApprovalWorkflow>,
    payload: web::Json<ResetQuotas>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let removed = workflow.reset_quotas(payload.year).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave quotas reset",
        "removed": removed
    })))
}

#[utoipa::path(
    put,
    path = "/api/admin/leave-quota/{user_id}",
    params(
        ("user_id" = u64, Path, description = "User whose entitlement changes")
    ),
    request_body(
        content = AdjustQuota,
        description = "New total for the year",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Quota after the change", body = LeaveQuota),
        (status = 400, description = "Negative total"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Quota"
)]
pub async fn adjust_quota(
    auth: AuthUser,
    workflow: web::Data<ApprovalWorkflow>,
    path: web::Path<u64>,
    payload: web::Json<AdjustQuota>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();
    let quota = workflow
        .adjust_quota(user_id, payload.year, payload.total)
        .await?;

    Ok(HttpResponse::Ok().json(quota))
}
