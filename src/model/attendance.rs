use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::work_permit::{LeaveType, Session};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
    /// Logged activity.
    Present,
    /// Approved leave or permission.
    Ijin,
    /// Approved sick leave.
    Sakit,
}

impl AttendanceStatus {
    pub fn for_leave(leave_type: &LeaveType) -> Self {
        if leave_type.is_sick() {
            AttendanceStatus::Sakit
        } else {
            AttendanceStatus::Ijin
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Attendance {
    pub id: u64,
    pub user_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub activity_type: String,
    pub session: Option<Session>,
    pub status: AttendanceStatus,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub activity: ActivityDetails,
}

/// Free-form fields an employee fills in when logging a working day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ActivityDetails {
    #[serde(default)]
    pub activity_categories: Vec<String>,
    pub activity_details: Option<String>,
    pub starting_time: Option<String>,
    pub ending_time: Option<String>,
    pub activity_docs: Option<String>,
    pub activity_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendance {
    pub user_id: u64,
    pub date: NaiveDate,
    pub activity_type: String,
    pub session: Option<Session>,
    pub status: AttendanceStatus,
    pub created_at: DateTime<Utc>,
    pub activity: ActivityDetails,
}

impl NewAttendance {
    pub fn into_record(self, id: u64) -> Attendance {
        Attendance {
            id,
            user_id: self.user_id,
            date: self.date,
            activity_type: self.activity_type,
            session: self.session,
            status: self.status,
            created_at: self.created_at,
            activity: self.activity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sick_leave_is_recorded_as_sakit_everything_else_as_ijin() {
        assert_eq!(AttendanceStatus::for_leave(&LeaveType::Sick), AttendanceStatus::Sakit);
        assert_eq!(AttendanceStatus::for_leave(&LeaveType::Annual), AttendanceStatus::Ijin);
        assert_eq!(
            AttendanceStatus::for_leave(&LeaveType::from("Izin Lainnya")),
            AttendanceStatus::Ijin
        );
        assert_eq!(AttendanceStatus::Sakit.as_ref(), "sakit");
    }
}
