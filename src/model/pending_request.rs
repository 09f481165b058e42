use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::status::RequestStatus;
use super::work_permit::{LeaveType, Session};

/// What a pending request asks the reviewer to sign off on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestKind {
    WorkPermit,
    DeleteAttendance,
    Other(String),
}

impl RequestKind {
    pub fn as_str(&self) -> &str {
        match self {
            RequestKind::WorkPermit => "work_permit",
            RequestKind::DeleteAttendance => "delete_attendance",
            RequestKind::Other(kind) => kind,
        }
    }
}

impl From<String> for RequestKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "work_permit" => RequestKind::WorkPermit,
            "delete_attendance" => RequestKind::DeleteAttendance,
            _ => RequestKind::Other(value),
        }
    }
}

impl From<&str> for RequestKind {
    fn from(value: &str) -> Self {
        RequestKind::from(value.to_string())
    }
}

impl From<RequestKind> for String {
    fn from(value: RequestKind) -> Self {
        match value {
            RequestKind::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Leave terms captured on a work-permit request when it is queued, so the
/// approval never has to re-derive them from display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LeaveTerms {
    #[schema(value_type = String, example = "Annual")]
    pub leave_type: LeaveType,
    pub session: Session,
}

impl LeaveTerms {
    /// Full-day, non-sick leave is charged against the annual quota.
    pub fn consumes_quota(&self) -> bool {
        !self.session.is_half_day() && !self.leave_type.is_sick()
    }

    /// The conventional `"<leave type> - <session>"` summary.
    pub fn details(&self) -> String {
        format!("{} - {}", self.leave_type, self.session)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 12,
    "type": "work_permit",
    "user_id": 7,
    "user_name": "Rina",
    "date": "2026-03-02",
    "reason": "Family event",
    "details": "Annual - Full Day",
    "status": "pending",
    "reject_reason": null,
    "created_at": "2026-02-20T08:00:00Z",
    "ref_id": 41,
    "supporting_file": null,
    "leave": { "leave_type": "Annual", "session": "Full Day" }
}))]
pub struct PendingRequest {
    pub id: u64,
    #[serde(rename = "type")]
    #[schema(value_type = String, example = "work_permit")]
    pub kind: RequestKind,
    pub user_id: u64,
    /// Snapshot of the applicant's name at creation time.
    pub user_name: String,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub reason: String,
    pub details: String,
    pub status: RequestStatus,
    pub reject_reason: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    /// The permit or attendance row this request acts on.
    pub ref_id: Option<u64>,
    pub supporting_file: Option<String>,
    pub leave: Option<LeaveTerms>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPendingRequest {
    pub kind: RequestKind,
    pub user_id: u64,
    pub user_name: String,
    pub date: NaiveDate,
    pub reason: String,
    pub details: String,
    pub created_at: DateTime<Utc>,
    pub ref_id: Option<u64>,
    pub supporting_file: Option<String>,
    pub leave: Option<LeaveTerms>,
}

impl NewPendingRequest {
    pub fn into_request(self, id: u64) -> PendingRequest {
        PendingRequest {
            id,
            kind: self.kind,
            user_id: self.user_id,
            user_name: self.user_name,
            date: self.date,
            reason: self.reason,
            details: self.details,
            status: RequestStatus::Pending,
            reject_reason: None,
            created_at: self.created_at,
            ref_id: self.ref_id,
            supporting_file: self.supporting_file,
            leave: self.leave,
        }
    }
}
