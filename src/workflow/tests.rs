use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};

use super::*;
use crate::model::attendance::{Attendance, AttendanceStatus, NewAttendance};
use crate::model::work_permit::{LeaveType, Session};
use crate::store::memory::MemoryStore;
use crate::store::{
    AttendanceStore, LeaveQuotaLedger, PendingRequestQueue, StoreError, StoreResult,
    WorkPermitStore,
};

const APPLICANT: u64 = 7;
const COLLEAGUE: u64 = 8;
const CHARGED_YEAR: i32 = 2026;

fn leave_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn application(leave_type: &str, session: Session, file: Option<&str>) -> NewWorkPermit {
    NewWorkPermit {
        user_id: APPLICANT,
        date: leave_day(),
        session,
        leave_type: LeaveType::from(leave_type),
        reason: "Family event".to_string(),
        supporting_file: file.map(str::to_string),
    }
}

fn workflow_over(store: &Arc<MemoryStore>) -> ApprovalWorkflow {
    ApprovalWorkflow::new(Stores::memory(store.clone()), QuotaYear::Fixed(CHARGED_YEAR))
}

fn setup() -> (Arc<MemoryStore>, ApprovalWorkflow) {
    let store = Arc::new(MemoryStore::new());
    store.insert_user(APPLICANT, "Rina");
    store.insert_user(COLLEAGUE, "Budi");
    let workflow = workflow_over(&store);
    (store, workflow)
}

async fn queued_request(store: &MemoryStore, permit_id: u64) -> PendingRequest {
    store
        .list_pending()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.ref_id == Some(permit_id))
        .expect("permit has a queue entry")
}

async fn charged_quota(store: &MemoryStore) -> LeaveQuota {
    LeaveQuotaLedger::get(store, APPLICANT, CHARGED_YEAR).await.unwrap()
}

#[actix_web::test]
async fn unseen_user_and_year_get_the_default_quota() {
    let (_, workflow) = setup();
    let quota = workflow.get_quota(404, 2031).await.unwrap();
    assert_eq!(quota, LeaveQuota::default_for(404, 2031));
}

#[actix_web::test]
async fn annual_leave_is_refused_once_quota_is_used_up() {
    let (store, workflow) = setup();
    let year = Utc::now().year();
    store
        .upsert(&LeaveQuota {
            user_id: APPLICANT,
            year,
            total: 12,
            used: 12,
            remaining: 0,
        })
        .await
        .unwrap();

    let result = workflow
        .submit_work_permit(application("Annual", Session::FullDay, None))
        .await;

    assert!(matches!(result, Err(WorkflowError::QuotaExhausted { year: y }) if y == year));
    assert!(workflow.list_user_permits(APPLICANT).await.unwrap().is_empty());
    assert!(workflow.list_pending_requests().await.unwrap().is_empty());
}

#[actix_web::test]
async fn sick_leave_needs_a_supporting_file() {
    let (_, workflow) = setup();

    let missing = workflow
        .submit_work_permit(application("Sakit", Session::FullDay, Some("")))
        .await;
    assert!(matches!(missing, Err(WorkflowError::Validation(_))));

    let permit = workflow
        .submit_work_permit(application("Sakit", Session::FullDay, Some("doctor-note.pdf")))
        .await
        .unwrap();
    assert_eq!(permit.status, RequestStatus::Pending);
    assert_eq!(permit.leave_type, LeaveType::Sick);
}

#[actix_web::test]
async fn submission_queues_a_linked_request_with_a_name_snapshot() {
    let (store, workflow) = setup();

    let permit = workflow
        .submit_work_permit(application("Annual", Session::FullDay, None))
        .await
        .unwrap();
    let request = queued_request(&store, permit.id).await;

    assert_eq!(request.kind, RequestKind::WorkPermit);
    assert_eq!(request.user_name, "Rina");
    assert_eq!(request.details, "Annual - Full Day");
    assert_eq!(request.date, leave_day());
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(
        request.leave,
        Some(LeaveTerms {
            leave_type: LeaveType::Annual,
            session: Session::FullDay
        })
    );
}

#[actix_web::test]
async fn unknown_applicants_are_queued_as_unknown() {
    let store = Arc::new(MemoryStore::new());
    let workflow = workflow_over(&store);

    let permit = workflow
        .submit_work_permit(application("Personal", Session::Morning, None))
        .await
        .unwrap();

    assert_eq!(queued_request(&store, permit.id).await.user_name, "Unknown");
}

#[actix_web::test]
async fn approving_full_day_annual_leave_charges_one_day() {
    let (store, workflow) = setup();
    let permit = workflow
        .submit_work_permit(application("Annual", Session::FullDay, None))
        .await
        .unwrap();
    let request = queued_request(&store, permit.id).await;

    let resolution = workflow.approve_request(request.id).await.unwrap();

    assert_eq!(resolution, Resolution::Applied);
    let quota = charged_quota(&store).await;
    assert_eq!(quota.used, 1);
    assert_eq!(quota.remaining, quota.total - quota.used);

    let attendance = workflow.list_attendance(APPLICANT).await.unwrap();
    assert_eq!(attendance.len(), 1);
    assert_eq!(attendance[0].status, AttendanceStatus::Ijin);
    assert_eq!(attendance[0].date, leave_day());
    assert_eq!(attendance[0].session, Some(Session::FullDay));
    assert_eq!(attendance[0].activity_type, "Annual");

    let stored_permit = WorkPermitStore::get(&*store, permit.id).await.unwrap();
    assert_eq!(stored_permit.status, RequestStatus::Approved);
    let stored_request = PendingRequestQueue::get(&*store, request.id).await.unwrap();
    assert_eq!(stored_request.status, RequestStatus::Approved);
    assert_eq!(stored_request.reject_reason, None);
}

#[actix_web::test]
async fn half_day_leave_is_not_charged() {
    let (store, workflow) = setup();
    let permit = workflow
        .submit_work_permit(application("Annual", Session::HalfDay, None))
        .await
        .unwrap();
    let request = queued_request(&store, permit.id).await;
    assert_eq!(request.details, "Annual - Half Day");

    workflow.approve_request(request.id).await.unwrap();

    assert_eq!(charged_quota(&store).await, LeaveQuota::default_for(APPLICANT, CHARGED_YEAR));
    assert_eq!(workflow.list_attendance(APPLICANT).await.unwrap().len(), 1);
}

#[actix_web::test]
async fn sick_leave_is_recorded_as_sakit_and_not_charged() {
    let (store, workflow) = setup();
    let permit = workflow
        .submit_work_permit(application("Sakit", Session::FullDay, Some("note.jpg")))
        .await
        .unwrap();
    let request = queued_request(&store, permit.id).await;

    workflow.approve_request(request.id).await.unwrap();

    assert_eq!(charged_quota(&store).await.used, 0);
    let attendance = workflow.list_attendance(APPLICANT).await.unwrap();
    assert_eq!(attendance[0].status, AttendanceStatus::Sakit);
}

#[actix_web::test]
async fn charged_year_can_follow_the_request_date() {
    let store = Arc::new(MemoryStore::new());
    let workflow = ApprovalWorkflow::new(Stores::memory(store.clone()), QuotaYear::RequestDate);
    let mut next_year = application("Annual", Session::FullDay, None);
    next_year.date = NaiveDate::from_ymd_opt(2027, 1, 4).unwrap();
    let permit = workflow.submit_work_permit(next_year).await.unwrap();
    let request = queued_request(&store, permit.id).await;

    workflow.approve_request(request.id).await.unwrap();

    assert_eq!(workflow.get_quota(APPLICANT, 2027).await.unwrap().used, 1);
    assert_eq!(workflow.get_quota(APPLICANT, 2026).await.unwrap().used, 0);
}

#[actix_web::test]
async fn rejection_records_the_reason_without_side_effects() {
    let (store, workflow) = setup();
    let permit = workflow
        .submit_work_permit(application("Annual", Session::FullDay, None))
        .await
        .unwrap();
    let request = queued_request(&store, permit.id).await;

    let resolution = workflow
        .reject_request(request.id, "insufficient documentation")
        .await
        .unwrap();

    assert_eq!(resolution, Resolution::Applied);
    assert_eq!(
        WorkPermitStore::get(&*store, permit.id).await.unwrap().status,
        RequestStatus::Rejected
    );
    let stored = PendingRequestQueue::get(&*store, request.id).await.unwrap();
    assert_eq!(stored.status, RequestStatus::Rejected);
    assert_eq!(stored.reject_reason.as_deref(), Some("insufficient documentation"));
    assert_eq!(charged_quota(&store).await.used, 0);
    assert!(store.list_all().await.unwrap().is_empty());

    let notifications = workflow.list_notifications(APPLICANT).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].id, request.id);
}

#[actix_web::test]
async fn rejection_requires_a_reason() {
    let (store, workflow) = setup();
    let permit = workflow
        .submit_work_permit(application("Annual", Session::FullDay, None))
        .await
        .unwrap();
    let request = queued_request(&store, permit.id).await;

    let result = workflow.reject_request(request.id, "   ").await;

    assert!(matches!(result, Err(WorkflowError::Validation(_))));
    assert_eq!(
        PendingRequestQueue::get(&*store, request.id).await.unwrap().status,
        RequestStatus::Pending
    );
}

#[actix_web::test]
async fn resolving_a_missing_request_is_not_found() {
    let (_, workflow) = setup();
    assert!(matches!(
        workflow.approve_request(999).await,
        Err(WorkflowError::NotFound(_))
    ));
    assert!(matches!(
        workflow.reject_request(999, "nope").await,
        Err(WorkflowError::NotFound(_))
    ));
}

#[actix_web::test]
async fn approving_twice_does_not_repeat_side_effects() {
    let (store, workflow) = setup();
    let permit = workflow
        .submit_work_permit(application("Annual", Session::FullDay, None))
        .await
        .unwrap();
    let request = queued_request(&store, permit.id).await;

    assert_eq!(workflow.approve_request(request.id).await.unwrap(), Resolution::Applied);
    assert_eq!(
        workflow.approve_request(request.id).await.unwrap(),
        Resolution::AlreadyResolved
    );

    assert_eq!(charged_quota(&store).await.used, 1);
    assert_eq!(workflow.list_attendance(APPLICANT).await.unwrap().len(), 1);
}

#[actix_web::test]
async fn terminal_requests_cannot_flip() {
    let (store, workflow) = setup();
    let first = workflow
        .submit_work_permit(application("Annual", Session::FullDay, None))
        .await
        .unwrap();
    let second = workflow
        .submit_work_permit(application("Personal", Session::FullDay, None))
        .await
        .unwrap();
    let approved = queued_request(&store, first.id).await;
    let rejected = queued_request(&store, second.id).await;

    workflow.approve_request(approved.id).await.unwrap();
    workflow.reject_request(rejected.id, "team offsite").await.unwrap();

    assert!(matches!(
        workflow.reject_request(approved.id, "changed my mind").await,
        Err(WorkflowError::InvalidState(_))
    ));
    assert!(matches!(
        workflow.approve_request(rejected.id).await,
        Err(WorkflowError::InvalidState(_))
    ));
    assert_eq!(
        workflow.reject_request(rejected.id, "again").await.unwrap(),
        Resolution::AlreadyResolved
    );
    assert_eq!(charged_quota(&store).await.used, 1);
}

#[actix_web::test]
async fn withdrawal_rules() {
    let (store, workflow) = setup();
    let approved = workflow
        .submit_work_permit(application("Annual", Session::FullDay, None))
        .await
        .unwrap();
    let request = queued_request(&store, approved.id).await;
    workflow.approve_request(request.id).await.unwrap();

    assert!(matches!(
        workflow.withdraw_work_permit(APPLICANT, approved.id).await,
        Err(WorkflowError::InvalidState(_))
    ));

    let pending = workflow
        .submit_work_permit(application("Personal", Session::HalfDay, None))
        .await
        .unwrap();
    assert!(matches!(
        workflow.withdraw_work_permit(COLLEAGUE, pending.id).await,
        Err(WorkflowError::Forbidden(_))
    ));
    assert!(matches!(
        workflow.withdraw_work_permit(APPLICANT, 999).await,
        Err(WorkflowError::NotFound(_))
    ));

    workflow.withdraw_work_permit(APPLICANT, pending.id).await.unwrap();

    assert!(matches!(
        WorkPermitStore::get(&*store, pending.id).await,
        Err(StoreError::NotFound { .. })
    ));
    assert!(workflow.list_pending_requests().await.unwrap().is_empty());
}

#[actix_web::test]
async fn approving_an_attendance_removal_deletes_the_entry() {
    let (store, workflow) = setup();
    let entry = workflow
        .record_attendance(
            APPLICANT,
            AttendanceEntry {
                date: leave_day(),
                activity_type: "Teaching".to_string(),
                session: Some(Session::Morning),
                activity: ActivityDetails::default(),
            },
        )
        .await
        .unwrap();
    assert_eq!(entry.status, AttendanceStatus::Present);

    let request = workflow
        .submit_request(
            APPLICANT,
            RequestSubmission {
                kind: RequestKind::DeleteAttendance,
                date: leave_day(),
                reason: "Logged the wrong day".to_string(),
                details: String::new(),
                ref_id: Some(entry.id),
            },
        )
        .await
        .unwrap();
    assert_eq!(request.user_name, "Rina");

    workflow.approve_request(request.id).await.unwrap();

    assert!(store.list_all().await.unwrap().is_empty());
    assert_eq!(charged_quota(&store).await.used, 0);
}

#[actix_web::test]
async fn generic_requests_cannot_smuggle_work_permits() {
    let (_, workflow) = setup();
    let result = workflow
        .submit_request(
            APPLICANT,
            RequestSubmission {
                kind: RequestKind::WorkPermit,
                date: leave_day(),
                reason: "Trip".to_string(),
                details: "Annual - Full Day".to_string(),
                ref_id: Some(1),
            },
        )
        .await;
    assert!(matches!(result, Err(WorkflowError::Validation(_))));
}

#[actix_web::test]
async fn reset_adjust_and_purge() {
    let (store, workflow) = setup();
    let adjusted = workflow.adjust_quota(APPLICANT, CHARGED_YEAR, 15).await.unwrap();
    assert_eq!((adjusted.total, adjusted.remaining), (15, 15));
    assert!(workflow.adjust_quota(APPLICANT, CHARGED_YEAR, -1).await.is_err());

    let permit = workflow
        .submit_work_permit(application("Annual", Session::FullDay, None))
        .await
        .unwrap();
    let request = queued_request(&store, permit.id).await;
    workflow.approve_request(request.id).await.unwrap();
    assert_eq!(charged_quota(&store).await.remaining, 14);

    assert_eq!(workflow.reset_quotas(CHARGED_YEAR).await.unwrap(), 1);
    assert_eq!(
        charged_quota(&store).await,
        LeaveQuota::default_for(APPLICANT, CHARGED_YEAR)
    );

    store.consume(APPLICANT, CHARGED_YEAR, 1).await.unwrap();
    let summary = workflow.purge_user(APPLICANT).await.unwrap();
    assert_eq!(
        summary,
        PurgeSummary {
            attendance: 1,
            work_permits: 1,
            pending_requests: 1,
            leave_quotas: 1,
        }
    );
    assert!(workflow.list_user_permits(APPLICANT).await.unwrap().is_empty());
}

/// Ledger whose `consume` fails while `failing` is set.
struct FlakyLedger {
    inner: Arc<MemoryStore>,
    failing: AtomicBool,
}

#[async_trait]
impl LeaveQuotaLedger for FlakyLedger {
    async fn get(&self, user_id: u64, year: i32) -> StoreResult<LeaveQuota> {
        LeaveQuotaLedger::get(&*self.inner, user_id, year).await
    }

    async fn upsert(&self, quota: &LeaveQuota) -> StoreResult<()> {
        self.inner.upsert(quota).await
    }

    async fn consume(&self, user_id: u64, year: i32, days: i32) -> StoreResult<LeaveQuota> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        self.inner.consume(user_id, year, days).await
    }

    async fn reset_all(&self, year: i32) -> StoreResult<u64> {
        self.inner.reset_all(year).await
    }

    async fn delete_for_user(&self, user_id: u64) -> StoreResult<u64> {
        self.inner.delete_for_user(user_id).await
    }
}

#[actix_web::test]
async fn failed_quota_charge_rolls_the_approval_back() {
    let store = Arc::new(MemoryStore::new());
    let ledger = Arc::new(FlakyLedger {
        inner: store.clone(),
        failing: AtomicBool::new(true),
    });
    let stores = Stores {
        quotas: ledger.clone(),
        ..Stores::memory(store.clone())
    };
    let workflow = ApprovalWorkflow::new(stores, QuotaYear::Fixed(CHARGED_YEAR));

    let permit = workflow
        .submit_work_permit(application("Annual", Session::FullDay, None))
        .await
        .unwrap();
    let request = queued_request(&store, permit.id).await;

    let failed = workflow.approve_request(request.id).await;

    assert!(matches!(failed, Err(WorkflowError::Storage(_))));
    assert!(store.list_all().await.unwrap().is_empty());
    assert_eq!(
        WorkPermitStore::get(&*store, permit.id).await.unwrap().status,
        RequestStatus::Pending
    );
    assert_eq!(
        PendingRequestQueue::get(&*store, request.id).await.unwrap().status,
        RequestStatus::Pending
    );

    ledger.failing.store(false, Ordering::SeqCst);
    assert_eq!(workflow.approve_request(request.id).await.unwrap(), Resolution::Applied);
    assert_eq!(charged_quota(&store).await.used, 1);
    assert_eq!(store.list_all().await.unwrap().len(), 1);
}

/// Queue that cannot accept new entries.
struct FullQueue {
    inner: Arc<MemoryStore>,
}

#[async_trait]
impl PendingRequestQueue for FullQueue {
    async fn create(&self, _request: NewPendingRequest) -> StoreResult<PendingRequest> {
        Err(StoreError::Backend("queue unavailable".to_string()))
    }

    async fn get(&self, id: u64) -> StoreResult<PendingRequest> {
        PendingRequestQueue::get(&*self.inner, id).await
    }

    async fn list_pending(&self) -> StoreResult<Vec<PendingRequest>> {
        self.inner.list_pending().await
    }

    async fn list_resolved_by_user(&self, user_id: u64) -> StoreResult<Vec<PendingRequest>> {
        self.inner.list_resolved_by_user(user_id).await
    }

    async fn compare_and_set_status(
        &self,
        id: u64,
        expected: RequestStatus,
        next: RequestStatus,
        reject_reason: Option<&str>,
    ) -> StoreResult<bool> {
        self.inner
            .compare_and_set_status(id, expected, next, reject_reason)
            .await
    }

    async fn delete_pending_by_ref(&self, kind: &RequestKind, ref_id: u64) -> StoreResult<u64> {
        self.inner.delete_pending_by_ref(kind, ref_id).await
    }

    async fn delete_by_user(&self, user_id: u64) -> StoreResult<u64> {
        PendingRequestQueue::delete_by_user(&*self.inner, user_id).await
    }
}

#[actix_web::test]
async fn permit_is_dropped_when_it_cannot_be_queued() {
    let store = Arc::new(MemoryStore::new());
    let stores = Stores {
        requests: Arc::new(FullQueue {
            inner: store.clone(),
        }),
        ..Stores::memory(store.clone())
    };
    let workflow = ApprovalWorkflow::new(stores, QuotaYear::Fixed(CHARGED_YEAR));

    let result = workflow
        .submit_work_permit(application("Annual", Session::FullDay, None))
        .await;

    assert!(matches!(result, Err(WorkflowError::Storage(_))));
    assert!(workflow.list_user_permits(APPLICANT).await.unwrap().is_empty());
}

/// Permit store whose reads still show every permit as pending, as a read
/// taken just before a reviewer approved it would.
struct StalePermits {
    inner: Arc<MemoryStore>,
}

#[async_trait]
impl WorkPermitStore for StalePermits {
    async fn create(&self, permit: NewWorkPermit) -> StoreResult<WorkPermit> {
        WorkPermitStore::create(&*self.inner, permit).await
    }

    async fn get(&self, id: u64) -> StoreResult<WorkPermit> {
        let mut permit = WorkPermitStore::get(&*self.inner, id).await?;
        permit.status = RequestStatus::Pending;
        Ok(permit)
    }

    async fn list_by_user(&self, user_id: u64) -> StoreResult<Vec<WorkPermit>> {
        WorkPermitStore::list_by_user(&*self.inner, user_id).await
    }

    async fn list(&self, filter: &PermitFilter) -> StoreResult<Vec<WorkPermit>> {
        self.inner.list(filter).await
    }

    async fn set_status(&self, id: u64, status: RequestStatus) -> StoreResult<()> {
        WorkPermitStore::set_status(&*self.inner, id, status).await
    }

    async fn delete(&self, id: u64) -> StoreResult<bool> {
        WorkPermitStore::delete(&*self.inner, id).await
    }

    async fn delete_by_user(&self, user_id: u64) -> StoreResult<u64> {
        WorkPermitStore::delete_by_user(&*self.inner, user_id).await
    }
}

#[actix_web::test]
async fn withdrawal_cannot_undo_a_claimed_approval() {
    let store = Arc::new(MemoryStore::new());
    let stores = Stores {
        permits: Arc::new(StalePermits {
            inner: store.clone(),
        }),
        ..Stores::memory(store.clone())
    };
    let workflow = ApprovalWorkflow::new(stores, QuotaYear::Fixed(CHARGED_YEAR));

    let permit = workflow
        .submit_work_permit(application("Annual", Session::FullDay, None))
        .await
        .unwrap();
    let request = queued_request(&store, permit.id).await;
    workflow.approve_request(request.id).await.unwrap();

    let withdrawn = workflow.withdraw_work_permit(APPLICANT, permit.id).await;

    assert!(matches!(withdrawn, Err(WorkflowError::InvalidState(_))));
    assert_eq!(
        WorkPermitStore::get(&*store, permit.id).await.unwrap().status,
        RequestStatus::Approved
    );
    assert_eq!(
        PendingRequestQueue::get(&*store, request.id).await.unwrap().status,
        RequestStatus::Approved
    );
    assert_eq!(store.list_all().await.unwrap().len(), 1);
    assert_eq!(charged_quota(&store).await.used, 1);
}

/// Attendance store whose `delete` fails while `failing` is set.
struct BrokenAttendance {
    inner: Arc<MemoryStore>,
    failing: AtomicBool,
}

#[async_trait]
impl AttendanceStore for BrokenAttendance {
    async fn create(&self, record: NewAttendance) -> StoreResult<Attendance> {
        AttendanceStore::create(&*self.inner, record).await
    }

    async fn list_by_user(&self, user_id: u64) -> StoreResult<Vec<Attendance>> {
        AttendanceStore::list_by_user(&*self.inner, user_id).await
    }

    async fn list_all(&self) -> StoreResult<Vec<Attendance>> {
        self.inner.list_all().await
    }

    async fn delete(&self, id: u64) -> StoreResult<bool> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("disk full".to_string()));
        }
        AttendanceStore::delete(&*self.inner, id).await
    }

    async fn delete_by_user(&self, user_id: u64) -> StoreResult<u64> {
        AttendanceStore::delete_by_user(&*self.inner, user_id).await
    }
}

#[actix_web::test]
async fn failed_attendance_removal_leaves_the_request_pending() {
    let store = Arc::new(MemoryStore::new());
    let attendance = Arc::new(BrokenAttendance {
        inner: store.clone(),
        failing: AtomicBool::new(true),
    });
    let stores = Stores {
        attendance: attendance.clone(),
        ..Stores::memory(store.clone())
    };
    let workflow = ApprovalWorkflow::new(stores, QuotaYear::Fixed(CHARGED_YEAR));

    let entry = workflow
        .record_attendance(
            APPLICANT,
            AttendanceEntry {
                date: leave_day(),
                activity_type: "Teaching".to_string(),
                session: None,
                activity: ActivityDetails::default(),
            },
        )
        .await
        .unwrap();
    let request = workflow
        .submit_request(
            APPLICANT,
            RequestSubmission {
                kind: RequestKind::DeleteAttendance,
                date: leave_day(),
                reason: "Duplicate entry".to_string(),
                details: String::new(),
                ref_id: Some(entry.id),
            },
        )
        .await
        .unwrap();

    let failed = workflow.approve_request(request.id).await;

    assert!(matches!(failed, Err(WorkflowError::Storage(_))));
    assert_eq!(
        PendingRequestQueue::get(&*store, request.id).await.unwrap().status,
        RequestStatus::Pending
    );
    assert_eq!(store.list_all().await.unwrap().len(), 1);

    attendance.failing.store(false, Ordering::SeqCst);
    assert_eq!(workflow.approve_request(request.id).await.unwrap(), Resolution::Applied);
    assert!(store.list_all().await.unwrap().is_empty());
}
