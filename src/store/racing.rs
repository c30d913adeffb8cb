//! Memory store that lets one other writer act between a read and the
//! guarded write that follows it.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use futures::stream::BoxStream;

use super::{AttendanceFilter, LeaveFilter, MemoryStore, Store, Window};
use crate::error::AppResult;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, NewAttendance};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, NewLeave};
use crate::model::payroll::{PayrollRecord, PayrollTotals};

/// What the other writer does right before the next guarded write.
#[derive(Debug, Clone, Copy)]
pub enum Interference {
    /// Closes the attendance row, or denies the leave request.
    Transition,
    SoftDelete,
    /// Rejects the write without touching the row.
    DropWrite,
}

#[derive(Default)]
pub struct RacingStore {
    inner: MemoryStore,
    next: Mutex<Option<Interference>>,
}

impl RacingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Arms the interference for the next guarded write only.
    pub fn interfere(&self, interference: Interference) {
        *self.next.lock().unwrap() = Some(interference);
    }

    fn take(&self) -> Option<Interference> {
        self.next.lock().unwrap().take()
    }
}

#[async_trait]
impl Store for RacingStore {
    async fn insert_attendance(&self, new: NewAttendance) -> AppResult<AttendanceRecord> {
        self.inner.insert_attendance(new).await
    }

    async fn find_attendance(&self, id: u64) -> AppResult<Option<AttendanceRecord>> {
        self.inner.find_attendance(id).await
    }

    async fn find_open_attendance(&self, employee_id: u64) -> AppResult<Option<AttendanceRecord>> {
        self.inner.find_open_attendance(employee_id).await
    }

    async fn close_attendance(
        &self,
        id: u64,
        check_out: NaiveDateTime,
        status: AttendanceStatus,
    ) -> AppResult<bool> {
        match self.take() {
            Some(Interference::Transition) => {
                self.inner
                    .close_attendance(id, check_out, AttendanceStatus::Present)
                    .await?;
            }
            Some(Interference::SoftDelete) => {
                self.inner.soft_delete_attendance(id).await?;
            }
            Some(Interference::DropWrite) => return Ok(false),
            None => {}
        }
        self.inner.close_attendance(id, check_out, status).await
    }

    async fn soft_delete_attendance(&self, id: u64) -> AppResult<bool> {
        self.inner.soft_delete_attendance(id).await
    }

    fn stream_attendance(
        &self,
        filter: AttendanceFilter,
        window: Window,
    ) -> BoxStream<'_, AppResult<AttendanceRecord>> {
        self.inner.stream_attendance(filter, window)
    }

    async fn insert_leave(&self, new: NewLeave) -> AppResult<LeaveRequest> {
        self.inner.insert_leave(new).await
    }

    async fn find_leave(&self, id: u64) -> AppResult<Option<LeaveRequest>> {
        self.inner.find_leave(id).await
    }

    async fn decide_leave(
        &self,
        id: u64,
        outcome: LeaveStatus,
        approver_id: u64,
        decided_at: NaiveDateTime,
    ) -> AppResult<bool> {
        match self.take() {
            Some(Interference::Transition) => {
                self.inner
                    .decide_leave(id, LeaveStatus::Denied, 99, decided_at)
                    .await?;
            }
            Some(Interference::SoftDelete) => {
                self.inner.soft_delete_leave(id).await?;
            }
            Some(Interference::DropWrite) => return Ok(false),
            None => {}
        }
        self.inner.decide_leave(id, outcome, approver_id, decided_at).await
    }

    async fn soft_delete_leave(&self, id: u64) -> AppResult<bool> {
        self.inner.soft_delete_leave(id).await
    }

    fn stream_leave(&self, filter: LeaveFilter, window: Window) -> BoxStream<'_, AppResult<LeaveRequest>> {
        self.inner.stream_leave(filter, window)
    }

    async fn upsert_payroll(
        &self,
        employee_id: u64,
        period_start: NaiveDate,
        period_end: NaiveDate,
        totals: &PayrollTotals,
    ) -> AppResult<PayrollRecord> {
        self.inner
            .upsert_payroll(employee_id, period_start, period_end, totals)
            .await
    }

    async fn find_payroll(&self, id: u64) -> AppResult<Option<PayrollRecord>> {
        self.inner.find_payroll(id).await
    }

    async fn list_payroll(&self, employee_id: Option<u64>, window: Window) -> AppResult<Vec<PayrollRecord>> {
        self.inner.list_payroll(employee_id, window).await
    }

    async fn count_payroll(&self, employee_id: Option<u64>) -> AppResult<u64> {
        self.inner.count_payroll(employee_id).await
    }
}
