use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool};

use super::{
    AttendanceStore, LeaveQuotaLedger, PendingRequestQueue, StoreError, StoreResult,
    UserDirectory, WorkPermitStore,
};
use crate::model::attendance::{ActivityDetails, Attendance, AttendanceStatus, NewAttendance};
use crate::model::leave_quota::{DEFAULT_ANNUAL_QUOTA, LeaveQuota};
use crate::model::pending_request::{
    LeaveTerms, NewPendingRequest, PendingRequest, RequestKind,
};
use crate::model::status::RequestStatus;
use crate::model::work_permit::{LeaveType, NewWorkPermit, PermitFilter, Session, WorkPermit};

/// sqlx-backed implementation of every store trait over one MySQL pool.
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn parse_enum<T: FromStr>(column: &str, value: &str) -> StoreResult<T> {
    value
        .parse()
        .map_err(|_| StoreError::Corrupt(format!("{column}: unexpected value '{value}'")))
}

fn parse_optional<T: FromStr>(column: &str, value: Option<&str>) -> StoreResult<Option<T>> {
    value.map(|v| parse_enum(column, v)).transpose()
}

#[derive(FromRow)]
struct QuotaRow {
    user_id: u64,
    year: i32,
    total: i32,
    used: i32,
    remaining: i32,
}

impl From<QuotaRow> for LeaveQuota {
    fn from(row: QuotaRow) -> Self {
        LeaveQuota {
            user_id: row.user_id,
            year: row.year,
            total: row.total,
            used: row.used,
            remaining: row.remaining,
        }
    }
}

#[derive(FromRow)]
struct PermitRow {
    id: u64,
    user_id: u64,
    date: NaiveDate,
    session: String,
    leave_type: String,
    reason: String,
    supporting_file: Option<String>,
    status: String,
}

impl TryFrom<PermitRow> for WorkPermit {
    type Error = StoreError;

    fn try_from(row: PermitRow) -> StoreResult<Self> {
        Ok(WorkPermit {
            id: row.id,
            user_id: row.user_id,
            date: row.date,
            session: parse_enum("work_permits.session", &row.session)?,
            leave_type: LeaveType::from(row.leave_type),
            reason: row.reason,
            supporting_file: row.supporting_file,
            status: parse_enum("work_permits.status", &row.status)?,
        })
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    user_id: u64,
    date: NaiveDate,
    activity_type: String,
    session: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    activity_categories: String,
    activity_details: Option<String>,
    starting_time: Option<String>,
    ending_time: Option<String>,
    activity_docs: Option<String>,
    activity_notes: Option<String>,
}

impl TryFrom<AttendanceRow> for Attendance {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> StoreResult<Self> {
        let activity_categories: Vec<String> = serde_json::from_str(&row.activity_categories)
            .map_err(|e| StoreError::Corrupt(format!("attendance_records.activity_categories: {e}")))?;

        Ok(Attendance {
            id: row.id,
            user_id: row.user_id,
            date: row.date,
            activity_type: row.activity_type,
            session: parse_optional("attendance_records.session", row.session.as_deref())?,
            status: parse_enum::<AttendanceStatus>("attendance_records.status", &row.status)?,
            created_at: row.created_at,
            activity: ActivityDetails {
                activity_categories,
                activity_details: row.activity_details,
                starting_time: row.starting_time,
                ending_time: row.ending_time,
                activity_docs: row.activity_docs,
                activity_notes: row.activity_notes,
            },
        })
    }
}

#[derive(FromRow)]
struct RequestRow {
    id: u64,
    #[sqlx(rename = "type")]
    kind: String,
    user_id: u64,
    user_name: String,
    date: NaiveDate,
    reason: String,
    details: String,
    status: String,
    reject_reason: Option<String>,
    created_at: DateTime<Utc>,
    ref_id: Option<u64>,
    supporting_file: Option<String>,
    leave_type: Option<String>,
    session: Option<String>,
}

impl TryFrom<RequestRow> for PendingRequest {
    type Error = StoreError;

    fn try_from(row: RequestRow) -> StoreResult<Self> {
        let session: Option<Session> =
            parse_optional("pending_requests.session", row.session.as_deref())?;
        let leave = match (row.leave_type, session) {
            (Some(leave_type), Some(session)) => Some(LeaveTerms {
                leave_type: LeaveType::from(leave_type),
                session,
            }),
            _ => None,
        };

        Ok(PendingRequest {
            id: row.id,
            kind: RequestKind::from(row.kind),
            user_id: row.user_id,
            user_name: row.user_name,
            date: row.date,
            reason: row.reason,
            details: row.details,
            status: parse_enum("pending_requests.status", &row.status)?,
            reject_reason: row.reject_reason,
            created_at: row.created_at,
            ref_id: row.ref_id,
            supporting_file: row.supporting_file,
            leave,
        })
    }
}

fn collect<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

const PERMIT_COLUMNS: &str =
    "id, user_id, date, session, leave_type, reason, supporting_file, status";

const ATTENDANCE_COLUMNS: &str = "id, user_id, date, activity_type, session, status, created_at, \
     activity_categories, activity_details, starting_time, ending_time, activity_docs, activity_notes";

const REQUEST_COLUMNS: &str = "id, type, user_id, user_name, date, reason, details, status, \
     reject_reason, created_at, ref_id, supporting_file, leave_type, session";

#[async_trait]
impl LeaveQuotaLedger for MySqlStore {
    async fn get(&self, user_id: u64, year: i32) -> StoreResult<LeaveQuota> {
        let row = sqlx::query_as::<_, QuotaRow>(
            r#"
            SELECT user_id, year, total, used, remaining
            FROM leave_quotas
            WHERE user_id = ? AND year = ?
            "#,
        )
        .bind(user_id)
        .bind(year)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .map(LeaveQuota::from)
            .unwrap_or_else(|| LeaveQuota::default_for(user_id, year)))
    }

    async fn upsert(&self, quota: &LeaveQuota) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO leave_quotas (user_id, year, total, used, remaining)
            VALUES (?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE total = ?, used = ?, remaining = ?
            "#,
        )
        .bind(quota.user_id)
        .bind(quota.year)
        .bind(quota.total)
        .bind(quota.used)
        .bind(quota.remaining)
        .bind(quota.total)
        .bind(quota.used)
        .bind(quota.remaining)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn consume(&self, user_id: u64, year: i32, days: i32) -> StoreResult<LeaveQuota> {
        let mut tx = self.pool.begin().await?;

        // MySQL evaluates the assignments left to right, so `remaining`
        // sees the incremented `used`.
        sqlx::query(
            r#"
            INSERT INTO leave_quotas (user_id, year, total, used, remaining)
            VALUES (?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE used = used + ?, remaining = total - used
            "#,
        )
        .bind(user_id)
        .bind(year)
        .bind(DEFAULT_ANNUAL_QUOTA)
        .bind(days)
        .bind(DEFAULT_ANNUAL_QUOTA - days)
        .bind(days)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, QuotaRow>(
            r#"
            SELECT user_id, year, total, used, remaining
            FROM leave_quotas
            WHERE user_id = ? AND year = ?
            "#,
        )
        .bind(user_id)
        .bind(year)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn reset_all(&self, year: i32) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM leave_quotas WHERE year = ?")
            .bind(year)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_for_user(&self, user_id: u64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM leave_quotas WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl WorkPermitStore for MySqlStore {
    async fn create(&self, permit: NewWorkPermit) -> StoreResult<WorkPermit> {
        let result = sqlx::query(
            r#"
            INSERT INTO work_permits
                (user_id, date, session, leave_type, reason, supporting_file, status)
            VALUES (?, ?, ?, ?, ?, ?, 'pending')
            "#,
        )
        .bind(permit.user_id)
        .bind(permit.date)
        .bind(permit.session.to_string())
        .bind(permit.leave_type.as_str())
        .bind(&permit.reason)
        .bind(permit.supporting_file.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(permit.into_permit(result.last_insert_id()))
    }

    async fn get(&self, id: u64) -> StoreResult<WorkPermit> {
        let sql = format!("SELECT {PERMIT_COLUMNS} FROM work_permits WHERE id = ?");
        let row = sqlx::query_as::<_, PermitRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "work permit",
                id,
            })?;
        row.try_into()
    }

    async fn list_by_user(&self, user_id: u64) -> StoreResult<Vec<WorkPermit>> {
        let sql = format!(
            "SELECT {PERMIT_COLUMNS} FROM work_permits WHERE user_id = ? ORDER BY date DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, PermitRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        collect(rows)
    }

    async fn list(&self, filter: &PermitFilter) -> StoreResult<Vec<WorkPermit>> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<String> = Vec::new();

        if let Some(status) = filter.status {
            where_sql.push_str(" AND status = ?");
            args.push(status.to_string());
        }

        if let Some(leave_type) = filter.leave_type.as_ref() {
            where_sql.push_str(" AND leave_type = ?");
            args.push(leave_type.to_string());
        }

        let sql = format!(
            "SELECT {PERMIT_COLUMNS} FROM work_permits{where_sql} ORDER BY date DESC, id DESC"
        );
        let mut query = sqlx::query_as::<_, PermitRow>(&sql);
        for arg in args {
            query = query.bind(arg);
        }

        collect(query.fetch_all(&self.pool).await?)
    }

    async fn set_status(&self, id: u64, status: RequestStatus) -> StoreResult<()> {
        let result = sqlx::query("UPDATE work_permits SET status = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(id)
            .execute(&self.pool)
            .await?;

        // MySQL reports 0 affected rows when the value is unchanged, so
        // only a missing row is an error.
        if result.rows_affected() == 0 {
            WorkPermitStore::get(self, id).await?;
        }
        Ok(())
    }

    async fn delete(&self, id: u64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM work_permits WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_user(&self, user_id: u64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM work_permits WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn create(&self, record: NewAttendance) -> StoreResult<Attendance> {
        let categories = serde_json::to_string(&record.activity.activity_categories)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO attendance_records
                (user_id, date, activity_type, session, status, created_at,
                 activity_categories, activity_details, starting_time, ending_time,
                 activity_docs, activity_notes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.user_id)
        .bind(record.date)
        .bind(&record.activity_type)
        .bind(record.session.map(|s| s.to_string()))
        .bind(record.status.to_string())
        .bind(record.created_at)
        .bind(categories)
        .bind(record.activity.activity_details.as_deref())
        .bind(record.activity.starting_time.as_deref())
        .bind(record.activity.ending_time.as_deref())
        .bind(record.activity.activity_docs.as_deref())
        .bind(record.activity.activity_notes.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(record.into_record(result.last_insert_id()))
    }

    async fn list_by_user(&self, user_id: u64) -> StoreResult<Vec<Attendance>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance_records WHERE user_id = ? ORDER BY date DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        collect(rows)
    }

    async fn list_all(&self) -> StoreResult<Vec<Attendance>> {
        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance_records ORDER BY date DESC, id DESC");
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        collect(rows)
    }

    async fn delete(&self, id: u64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM attendance_records WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_user(&self, user_id: u64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM attendance_records WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl PendingRequestQueue for MySqlStore {
    async fn create(&self, request: NewPendingRequest) -> StoreResult<PendingRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO pending_requests
                (type, user_id, user_name, date, reason, details, status, created_at,
                 ref_id, supporting_file, leave_type, session)
            VALUES (?, ?, ?, ?, ?, ?, 'pending', ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.kind.as_str())
        .bind(request.user_id)
        .bind(&request.user_name)
        .bind(request.date)
        .bind(&request.reason)
        .bind(&request.details)
        .bind(request.created_at)
        .bind(request.ref_id)
        .bind(request.supporting_file.as_deref())
        .bind(request.leave.as_ref().map(|l| l.leave_type.as_str()))
        .bind(request.leave.as_ref().map(|l| l.session.to_string()))
        .execute(&self.pool)
        .await?;

        Ok(request.into_request(result.last_insert_id()))
    }

    async fn get(&self, id: u64) -> StoreResult<PendingRequest> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM pending_requests WHERE id = ?");
        let row = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "pending request",
                id,
            })?;
        row.try_into()
    }

    async fn list_pending(&self) -> StoreResult<Vec<PendingRequest>> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM pending_requests WHERE status = 'pending' ORDER BY created_at, id"
        );
        let rows = sqlx::query_as::<_, RequestRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        collect(rows)
    }

    async fn list_resolved_by_user(&self, user_id: u64) -> StoreResult<Vec<PendingRequest>> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM pending_requests \
             WHERE user_id = ? AND status IN ('approved', 'rejected') \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        collect(rows)
    }

    async fn compare_and_set_status(
        &self,
        id: u64,
        expected: RequestStatus,
        next: RequestStatus,
        reject_reason: Option<&str>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE pending_requests
            SET status = ?, reject_reason = ?
            WHERE id = ?
            AND status = ?
            "#,
        )
        .bind(next.to_string())
        .bind(reject_reason)
        .bind(id)
        .bind(expected.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // distinguishes "lost the race" from "no such request"
            PendingRequestQueue::get(self, id).await?;
            return Ok(false);
        }
        Ok(true)
    }

    async fn delete_pending_by_ref(&self, kind: &RequestKind, ref_id: u64) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM pending_requests
            WHERE type = ?
            AND ref_id = ?
            AND status = 'pending'
            "#,
        )
        .bind(kind.as_str())
        .bind(ref_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_by_user(&self, user_id: u64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM pending_requests WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl UserDirectory for MySqlStore {
    async fn lookup_user_name(&self, user_id: u64) -> StoreResult<Option<String>> {
        let name = sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(name)
    }
}
