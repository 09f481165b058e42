use crate::api::attendance::RecordAttendance;
use crate::api::leave_quota::{AdjustQuota, QuotaQuery, ResetQuotas};
use crate::api::requests::{CreateRequest, RejectRequest};
use crate::api::work_permit::{CreateWorkPermit, PermitQuery};
use crate::model::attendance::{ActivityDetails, Attendance, AttendanceStatus};
use crate::model::leave_quota::LeaveQuota;
use crate::model::pending_request::{LeaveTerms, PendingRequest};
use crate::model::status::RequestStatus;
use crate::model::work_permit::{Session, WorkPermit};
use crate::workflow::PurgeSummary;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Approval API",
        version = "0.1.0",
        description = r#"
## Leave & Work-Permit Approval

Employees file work permits (leave applications) which land in a review
queue. HR and Admin reviewers approve or reject them.

### 🔹 Key Features
- **Work Permits**
  - Apply for Annual, Personal or Sick leave, full or half day
  - Withdraw a permit while it is still pending
- **Review Queue**
  - Approve or reject pending requests, with a reason on rejection
- **Leave Quota**
  - Annual entitlement of 12 days, charged on approval of full-day non-sick leave
- **Attendance**
  - Approved leave shows up as an `ijin` or `sakit` attendance entry

### 🔐 Security
Every endpoint requires a **JWT Bearer** access token.
Reviewer endpoints under `/admin` need the **HR** or **Admin** role.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::work_permit::submit_work_permit,
        crate::api::work_permit::list_my_permits,
        crate::api::work_permit::withdraw_work_permit,
        crate::api::work_permit::list_permits,

        crate::api::requests::submit_request,
        crate::api::requests::list_notifications,
        crate::api::requests::list_pending_requests,
        crate::api::requests::approve_request,
        crate::api::requests::reject_request,

        crate::api::leave_quota::get_my_quota,
        crate::api::leave_quota::reset_quotas,
        crate::api::leave_quota::adjust_quota,

        crate::api::attendance::list_my_attendance,
        crate::api::attendance::record_attendance,
        crate::api::attendance::list_all_attendance,

        crate::api::admin::purge_user
    ),
    components(
        schemas(
            CreateWorkPermit,
            PermitQuery,
            WorkPermit,
            Session,
            RequestStatus,
            CreateRequest,
            RejectRequest,
            PendingRequest,
            LeaveTerms,
            LeaveQuota,
            QuotaQuery,
            ResetQuotas,
            AdjustQuota,
            RecordAttendance,
            Attendance,
            AttendanceStatus,
            ActivityDetails,
            PurgeSummary
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Work Permit", description = "Leave applications"),
        (name = "Requests", description = "Review queue and notifications"),
        (name = "Leave Quota", description = "Annual leave entitlement"),
        (name = "Attendance", description = "Attendance entries"),
        (name = "Admin", description = "Administrative maintenance"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
