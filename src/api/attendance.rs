use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::model::attendance::{ActivityDetails, Attendance};
use crate::model::work_permit::Session;
use crate::workflow::{ApprovalWorkflow, AttendanceEntry};

#[derive(Deserialize, ToSchema)]
pub struct RecordAttendance {
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Teaching")]
    pub activity_type: String,
    pub session: Option<Session>,
    #[serde(flatten)]
    pub activity: ActivityDetails,
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    responses(
        (status = 200, description = "The caller's attendance entries", body = [Attendance]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_my_attendance(
    auth: AuthUser,
    workflow: web::Data<ApprovalWorkflow>,
) -> actix_web::Result<impl Responder> {
    let records = workflow.list_attendance(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(records))
}

/// Manual entry; always recorded as `present`
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body(
        content = RecordAttendance,
        description = "Attendance entry",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Attendance recorded", body = Attendance),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn record_attendance(
    auth: AuthUser,
    workflow: web::Data<ApprovalWorkflow>,
    payload: web::Json<RecordAttendance>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();

    let record = workflow
        .record_attendance(
            auth.user_id,
            AttendanceEntry {
                date: payload.date,
                activity_type: payload.activity_type,
                session: payload.session,
                activity: payload.activity,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(record))
}

#[utoipa::path(
    get,
    path = "/api/admin/attendance",
    responses(
        (status = 200, description = "Every attendance entry", body = [Attendance]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_all_attendance(
    auth: AuthUser,
    workflow: web::Data<ApprovalWorkflow>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;

    let records = workflow.list_all_attendance().await?;
    Ok(HttpResponse::Ok().json(records))
}
