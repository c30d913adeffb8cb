use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use futures::TryStreamExt;
use futures::stream::BoxStream;
use tracing::{info, instrument};

use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendanceRecord, NewAttendance};
use crate::model::leave_request::LeaveStatus;
use crate::policy::AttendancePolicy;
use crate::store::{AttendanceFilter, LeaveFilter, Store, Window};

const ENTITY: &str = "attendance";

/// Check-in / check-out state machine: Open on check-in, Closed on
/// check-out, never reopened.
pub struct AttendanceTracker {
    store: Arc<dyn Store>,
    policy: AttendancePolicy,
}

/// Why `record` cannot be closed at `at`, if it cannot.
fn ensure_closable(
    id: u64,
    record: Option<AttendanceRecord>,
    at: NaiveDateTime,
) -> AppResult<AttendanceRecord> {
    let record = record.ok_or(AppError::NotFound { entity: ENTITY, id })?;
    if !record.is_open() {
        return Err(AppError::AlreadyCheckedOut { id });
    }
    if at < record.check_in {
        return Err(AppError::InvalidOrder {
            check_in: record.check_in,
            check_out: at,
        });
    }
    Ok(record)
}

impl AttendanceTracker {
    pub fn new(store: Arc<dyn Store>, policy: AttendancePolicy) -> Self {
        Self { store, policy }
    }

    #[instrument(name = "attendance_check_in", skip(self))]
    pub async fn check_in(&self, employee_id: u64, at: NaiveDateTime) -> AppResult<AttendanceRecord> {
        if let Some(open) = self.store.find_open_attendance(employee_id).await? {
            info!(record_id = open.id, "Check-in rejected: already checked in");
            return Err(AppError::AlreadyCheckedIn { employee_id });
        }

        let on_leave = self.on_approved_leave(employee_id, at.date()).await?;
        let status = self.policy.status_at_check_in(at, on_leave);

        let record = self
            .store
            .insert_attendance(NewAttendance {
                employee_id,
                check_in: at,
                status,
            })
            .await?;

        info!(record_id = record.id, status = %record.status, "Checked in");
        Ok(record)
    }

    #[instrument(name = "attendance_check_out", skip(self))]
    pub async fn check_out(&self, id: u64, at: NaiveDateTime) -> AppResult<AttendanceRecord> {
        let record = ensure_closable(id, self.store.find_attendance(id).await?, at)?;
        let status = self
            .policy
            .status_at_check_out(record.status, record.check_in, at);

        if !self.store.close_attendance(id, at, status).await? {
            // another request changed the row after we read it
            let current = self.store.find_attendance(id).await?;
            ensure_closable(id, current, at)?;
            return Err(AppError::Corrupt(format!(
                "attendance {id} stayed open after a rejected check-out"
            )));
        }

        info!(employee_id = record.employee_id, status = %status, "Checked out");
        Ok(AttendanceRecord {
            check_out: Some(at),
            status,
            ..record
        })
    }

    pub async fn get(&self, id: u64) -> AppResult<AttendanceRecord> {
        self.store
            .find_attendance(id)
            .await?
            .ok_or(AppError::NotFound { entity: ENTITY, id })
    }

    /// Lazily streams matching records inside `window`; call again to start over.
    pub fn list(
        &self,
        filter: AttendanceFilter,
        window: Window,
    ) -> BoxStream<'_, AppResult<AttendanceRecord>> {
        self.store.stream_attendance(filter, window)
    }

    #[instrument(name = "attendance_remove", skip(self))]
    pub async fn remove(&self, id: u64) -> AppResult<()> {
        if !self.store.soft_delete_attendance(id).await? {
            return Err(AppError::NotFound { entity: ENTITY, id });
        }
        info!("Attendance soft-deleted");
        Ok(())
    }

    async fn on_approved_leave(&self, employee_id: u64, date: NaiveDate) -> AppResult<bool> {
        let filter = LeaveFilter {
            employee_id: Some(employee_id),
            status: Some(LeaveStatus::Approved),
            from: Some(date),
            to: Some(date),
        };
        let mut leaves = self.store.stream_leave(filter, Window { offset: 0, limit: 1 });
        Ok(leaves.try_next().await?.is_some())
    }
}
