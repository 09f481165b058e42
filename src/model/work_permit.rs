use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::status::RequestStatus;

/// Kind of absence being applied for.
///
/// `Sick` also accepts the Indonesian spelling `Sakit`; unknown labels are
/// kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LeaveType {
    Annual,
    Personal,
    Sick,
    Other(String),
}

impl LeaveType {
    /// Types that may only be submitted while the applicant has quota left.
    pub fn requires_quota(&self) -> bool {
        matches!(self, LeaveType::Annual | LeaveType::Personal)
    }

    pub fn is_sick(&self) -> bool {
        matches!(self, LeaveType::Sick)
    }

    pub fn as_str(&self) -> &str {
        match self {
            LeaveType::Annual => "Annual",
            LeaveType::Personal => "Personal",
            LeaveType::Sick => "Sick",
            LeaveType::Other(label) => label,
        }
    }
}

impl From<String> for LeaveType {
    fn from(value: String) -> Self {
        match value.trim() {
            "Annual" => LeaveType::Annual,
            "Personal" => LeaveType::Personal,
            "Sick" | "Sakit" => LeaveType::Sick,
            _ => LeaveType::Other(value),
        }
    }
}

impl From<&str> for LeaveType {
    fn from(value: &str) -> Self {
        LeaveType::from(value.to_string())
    }
}

impl From<LeaveType> for String {
    fn from(value: LeaveType) -> Self {
        match value {
            LeaveType::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for LeaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
pub enum Session {
    #[serde(rename = "Full Day")]
    #[strum(serialize = "Full Day")]
    FullDay,
    #[serde(rename = "Half Day")]
    #[strum(serialize = "Half Day")]
    HalfDay,
    Morning,
    Afternoon,
}

impl Session {
    pub fn is_half_day(self) -> bool {
        matches!(self, Session::HalfDay)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 41,
    "user_id": 7,
    "date": "2026-03-02",
    "session": "Full Day",
    "leave_type": "Annual",
    "reason": "Family event",
    "supporting_file": null,
    "status": "pending"
}))]
pub struct WorkPermit {
    pub id: u64,
    pub user_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub session: Session,
    #[schema(value_type = String, example = "Annual")]
    pub leave_type: LeaveType,
    pub reason: String,
    pub supporting_file: Option<String>,
    pub status: RequestStatus,
}

/// A permit as submitted; the store assigns the id and the `pending` status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkPermit {
    pub user_id: u64,
    pub date: NaiveDate,
    pub session: Session,
    pub leave_type: LeaveType,
    pub reason: String,
    pub supporting_file: Option<String>,
}

impl NewWorkPermit {
    pub fn has_supporting_file(&self) -> bool {
        self.supporting_file
            .as_deref()
            .is_some_and(|file| !file.trim().is_empty())
    }

    pub fn into_permit(self, id: u64) -> WorkPermit {
        WorkPermit {
            id,
            user_id: self.user_id,
            date: self.date,
            session: self.session,
            leave_type: self.leave_type,
            reason: self.reason,
            supporting_file: self.supporting_file,
            status: RequestStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermitFilter {
    pub status: Option<RequestStatus>,
    pub leave_type: Option<LeaveType>,
}

impl PermitFilter {
    pub fn matches(&self, permit: &WorkPermit) -> bool {
        self.status.is_none_or(|status| permit.status == status)
            && self
                .leave_type
                .as_ref()
                .is_none_or(|leave_type| &permit.leave_type == leave_type)
    }
}
