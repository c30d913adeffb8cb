//! Persistence boundary for the lifecycle.
//!
//! The store only offers the transitions the lifecycle needs: there is no
//! generic update, so attendance and leave status can only change through
//! [`Store::close_attendance`] and [`Store::decide_leave`]. Both are guarded
//! writes that return `false` when the row was not in the expected state.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use futures::stream::BoxStream;

use crate::error::AppResult;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, NewAttendance};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, NewLeave};
use crate::model::payroll::{PayrollRecord, PayrollTotals};

pub mod memory;
pub mod mysql;
#[cfg(test)]
pub mod racing;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

/// Attendance rows by employee and check-in date (inclusive).
#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub employee_id: Option<u64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl AttendanceFilter {
    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        let date = record.date();
        self.employee_id.is_none_or(|id| record.employee_id == id)
            && self.from.is_none_or(|from| date >= from)
            && self.to.is_none_or(|to| date <= to)
    }
}

/// Leave rows by employee, status and overlap with a date range.
#[derive(Debug, Clone, Default)]
pub struct LeaveFilter {
    pub employee_id: Option<u64>,
    pub status: Option<LeaveStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl LeaveFilter {
    pub fn matches(&self, leave: &LeaveRequest) -> bool {
        self.employee_id.is_none_or(|id| leave.employee_id == id)
            && self.status.is_none_or(|s| leave.status == s)
            && self.from.is_none_or(|from| leave.end_date >= from)
            && self.to.is_none_or(|to| leave.start_date <= to)
    }
}

/// Row window applied by the store itself (`LIMIT` / `OFFSET` in SQL).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

impl Window {
    pub const ALL: Window = Window {
        offset: 0,
        limit: u64::MAX,
    };

    fn apply<I: Iterator>(&self, rows: I) -> impl Iterator<Item = I::Item> {
        let offset = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        rows.skip(offset).take(limit)
    }
}

#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Fails with `AlreadyCheckedIn` when the employee already has an open row.
    async fn insert_attendance(&self, new: NewAttendance) -> AppResult<AttendanceRecord>;

    async fn find_attendance(&self, id: u64) -> AppResult<Option<AttendanceRecord>>;

    async fn find_open_attendance(&self, employee_id: u64) -> AppResult<Option<AttendanceRecord>>;

    /// Sets check-out only if the row is still open and `check_out >= check_in`.
    async fn close_attendance(
        &self,
        id: u64,
        check_out: NaiveDateTime,
        status: AttendanceStatus,
    ) -> AppResult<bool>;

    async fn soft_delete_attendance(&self, id: u64) -> AppResult<bool>;

    /// Fresh stream on every call, ordered by check-in.
    fn stream_attendance(
        &self,
        filter: AttendanceFilter,
        window: Window,
    ) -> BoxStream<'_, AppResult<AttendanceRecord>>;

    async fn insert_leave(&self, new: NewLeave) -> AppResult<LeaveRequest>;

    async fn find_leave(&self, id: u64) -> AppResult<Option<LeaveRequest>>;

    /// Moves a pending request to `outcome`; `false` when it was not pending.
    async fn decide_leave(
        &self,
        id: u64,
        outcome: LeaveStatus,
        approver_id: u64,
        decided_at: NaiveDateTime,
    ) -> AppResult<bool>;

    async fn soft_delete_leave(&self, id: u64) -> AppResult<bool>;

    /// Fresh stream on every call, ordered by start date.
    fn stream_leave(&self, filter: LeaveFilter, window: Window) -> BoxStream<'_, AppResult<LeaveRequest>>;

    /// Inserts or overwrites the row for (employee, period).
    async fn upsert_payroll(
        &self,
        employee_id: u64,
        period_start: NaiveDate,
        period_end: NaiveDate,
        totals: &PayrollTotals,
    ) -> AppResult<PayrollRecord>;

    async fn find_payroll(&self, id: u64) -> AppResult<Option<PayrollRecord>>;

    /// Newest period first.
    async fn list_payroll(&self, employee_id: Option<u64>, window: Window) -> AppResult<Vec<PayrollRecord>>;

    async fn count_payroll(&self, employee_id: Option<u64>) -> AppResult<u64>;
}
