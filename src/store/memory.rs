use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use futures::stream::{self, BoxStream, StreamExt};

use super::{AttendanceFilter, LeaveFilter, Store, Window};
use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, NewAttendance};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, NewLeave};
use crate::model::payroll::{PayrollRecord, PayrollTotals};

struct Row<T> {
    value: T,
    deleted: bool,
}

#[derive(Default)]
struct Tables {
    attendance: Vec<Row<AttendanceRecord>>,
    leave: Vec<Row<LeaveRequest>>,
    payroll: Vec<PayrollRecord>,
}

/// In-process store used when no database is configured, and by tests.
///
/// All tables sit behind one mutex and every primitive runs entirely under
/// it, which gives the same guarantees as the unique index and guarded
/// updates of the MySQL store. Ids are row positions plus one.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::Corrupt("memory store lock poisoned".into()))
    }
}

fn live<T>(rows: &[Row<T>], id: u64) -> Option<&T> {
    let idx = (id as usize).checked_sub(1)?;
    rows.get(idx).filter(|r| !r.deleted).map(|r| &r.value)
}

fn live_mut<T>(rows: &mut [Row<T>], id: u64) -> Option<&mut T> {
    let idx = (id as usize).checked_sub(1)?;
    rows.get_mut(idx).filter(|r| !r.deleted).map(|r| &mut r.value)
}

fn soft_delete<T>(rows: &mut [Row<T>], id: u64) -> bool {
    let Some(idx) = (id as usize).checked_sub(1) else {
        return false;
    };
    match rows.get_mut(idx) {
        Some(row) if !row.deleted => {
            row.deleted = true;
            true
        }
        _ => false,
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_attendance(&self, new: NewAttendance) -> AppResult<AttendanceRecord> {
        let mut tables = self.lock()?;
        let open = tables
            .attendance
            .iter()
            .any(|r| !r.deleted && r.value.employee_id == new.employee_id && r.value.is_open());
        if open {
            return Err(AppError::AlreadyCheckedIn {
                employee_id: new.employee_id,
            });
        }

        let record = AttendanceRecord {
            id: tables.attendance.len() as u64 + 1,
            employee_id: new.employee_id,
            check_in: new.check_in,
            check_out: None,
            status: new.status,
        };
        tables.attendance.push(Row {
            value: record.clone(),
            deleted: false,
        });
        Ok(record)
    }

    async fn find_attendance(&self, id: u64) -> AppResult<Option<AttendanceRecord>> {
        Ok(live(&self.lock()?.attendance, id).cloned())
    }

    async fn find_open_attendance(&self, employee_id: u64) -> AppResult<Option<AttendanceRecord>> {
        let tables = self.lock()?;
        Ok(tables
            .attendance
            .iter()
            .filter(|r| !r.deleted)
            .map(|r| &r.value)
            .find(|a| a.employee_id == employee_id && a.is_open())
            .cloned())
    }

    async fn close_attendance(
        &self,
        id: u64,
        check_out: NaiveDateTime,
        status: AttendanceStatus,
    ) -> AppResult<bool> {
        let mut tables = self.lock()?;
        match live_mut(&mut tables.attendance, id) {
            Some(record) if record.is_open() && check_out >= record.check_in => {
                record.check_out = Some(check_out);
                record.status = status;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn soft_delete_attendance(&self, id: u64) -> AppResult<bool> {
        Ok(soft_delete(&mut self.lock()?.attendance, id))
    }

    fn stream_attendance(
        &self,
        filter: AttendanceFilter,
        window: Window,
    ) -> BoxStream<'_, AppResult<AttendanceRecord>> {
        let snapshot = self.lock().map(|tables| {
            let mut rows: Vec<_> = tables
                .attendance
                .iter()
                .filter(|r| !r.deleted && filter.matches(&r.value))
                .map(|r| r.value.clone())
                .collect();
            rows.sort_by_key(|a| (a.check_in, a.id));
            window.apply(rows.into_iter()).collect::<Vec<_>>()
        });

        match snapshot {
            Ok(rows) => stream::iter(rows.into_iter().map(Ok)).boxed(),
            Err(e) => stream::once(async move { Err(e) }).boxed(),
        }
    }

    async fn insert_leave(&self, new: NewLeave) -> AppResult<LeaveRequest> {
        let mut tables = self.lock()?;
        let leave = LeaveRequest {
            id: tables.leave.len() as u64 + 1,
            employee_id: new.employee_id,
            start_date: new.start_date,
            end_date: new.end_date,
            leave_type: new.leave_type,
            status: LeaveStatus::Pending,
            approver_id: None,
            decided_at: None,
        };
        tables.leave.push(Row {
            value: leave.clone(),
            deleted: false,
        });
        Ok(leave)
    }

    async fn find_leave(&self, id: u64) -> AppResult<Option<LeaveRequest>> {
        Ok(live(&self.lock()?.leave, id).cloned())
    }

    async fn decide_leave(
        &self,
        id: u64,
        outcome: LeaveStatus,
        approver_id: u64,
        decided_at: NaiveDateTime,
    ) -> AppResult<bool> {
        let mut tables = self.lock()?;
        match live_mut(&mut tables.leave, id) {
            Some(leave) if leave.status == LeaveStatus::Pending => {
                leave.status = outcome;
                leave.approver_id = Some(approver_id);
                leave.decided_at = Some(decided_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn soft_delete_leave(&self, id: u64) -> AppResult<bool> {
        Ok(soft_delete(&mut self.lock()?.leave, id))
    }

    fn stream_leave(&self, filter: LeaveFilter, window: Window) -> BoxStream<'_, AppResult<LeaveRequest>> {
        let snapshot = self.lock().map(|tables| {
            let mut rows: Vec<_> = tables
                .leave
                .iter()
                .filter(|r| !r.deleted && filter.matches(&r.value))
                .map(|r| r.value.clone())
                .collect();
            rows.sort_by_key(|l| (l.start_date, l.id));
            window.apply(rows.into_iter()).collect::<Vec<_>>()
        });

        match snapshot {
            Ok(rows) => stream::iter(rows.into_iter().map(Ok)).boxed(),
            Err(e) => stream::once(async move { Err(e) }).boxed(),
        }
    }

    async fn upsert_payroll(
        &self,
        employee_id: u64,
        period_start: NaiveDate,
        period_end: NaiveDate,
        totals: &PayrollTotals,
    ) -> AppResult<PayrollRecord> {
        let mut tables = self.lock()?;
        let existing = tables.payroll.iter().position(|p| {
            p.employee_id == employee_id && p.period_start == period_start && p.period_end == period_end
        });

        let record = match existing {
            Some(idx) => {
                let id = tables.payroll[idx].id;
                let record = PayrollRecord::from_totals(id, employee_id, period_start, period_end, totals);
                tables.payroll[idx] = record.clone();
                record
            }
            None => {
                let id = tables.payroll.len() as u64 + 1;
                let record = PayrollRecord::from_totals(id, employee_id, period_start, period_end, totals);
                tables.payroll.push(record.clone());
                record
            }
        };
        Ok(record)
    }

    async fn find_payroll(&self, id: u64) -> AppResult<Option<PayrollRecord>> {
        let tables = self.lock()?;
        Ok(tables.payroll.iter().find(|p| p.id == id).cloned())
    }

    async fn list_payroll(&self, employee_id: Option<u64>, window: Window) -> AppResult<Vec<PayrollRecord>> {
        let tables = self.lock()?;
        let mut rows: Vec<_> = tables
            .payroll
            .iter()
            .filter(|p| employee_id.is_none_or(|id| p.employee_id == id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.period_start.cmp(&a.period_start).then(a.id.cmp(&b.id)));
        Ok(window.apply(rows.into_iter()).collect())
    }

    async fn count_payroll(&self, employee_id: Option<u64>) -> AppResult<u64> {
        let tables = self.lock()?;
        Ok(tables
            .payroll
            .iter()
            .filter(|p| employee_id.is_none_or(|id| p.employee_id == id))
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::LeaveType;
    use futures::TryStreamExt;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").unwrap()
    }

    fn open(employee_id: u64, ts: &str) -> NewAttendance {
        NewAttendance {
            employee_id,
            check_in: at(ts),
            status: AttendanceStatus::Present,
        }
    }

    #[actix_web::test]
    async fn deleted_open_row_frees_the_employee() {
        let store = MemoryStore::new();
        let first = store.insert_attendance(open(3, "2024-01-10T09:00")).await.unwrap();
        assert!(store.insert_attendance(open(3, "2024-01-10T09:05")).await.is_err());

        assert!(store.soft_delete_attendance(first.id).await.unwrap());
        assert!(!store.soft_delete_attendance(first.id).await.unwrap());
        assert!(store.find_attendance(first.id).await.unwrap().is_none());
        assert!(store.insert_attendance(open(3, "2024-01-10T09:05")).await.is_ok());
    }

    #[actix_web::test]
    async fn guarded_close_rejects_reversed_timestamps() {
        let store = MemoryStore::new();
        let rec = store.insert_attendance(open(1, "2024-01-10T09:00")).await.unwrap();

        let closed = store
            .close_attendance(rec.id, at("2024-01-10T08:00"), AttendanceStatus::Present)
            .await
            .unwrap();
        assert!(!closed);
        assert!(store.find_attendance(rec.id).await.unwrap().unwrap().is_open());
    }

    #[actix_web::test]
    async fn streams_restart_from_the_beginning() {
        let store = MemoryStore::new();
        for worker in 1..=3 {
            let rec = store.insert_attendance(open(worker, "2024-01-10T09:00")).await.unwrap();
            store
                .close_attendance(rec.id, at("2024-01-10T17:00"), AttendanceStatus::Present)
                .await
                .unwrap();
        }

        let filter = AttendanceFilter::default();
        let first: Vec<_> = store
            .stream_attendance(filter.clone(), Window::ALL)
            .try_collect()
            .await
            .unwrap();
        let second: Vec<_> = store
            .stream_attendance(filter, Window::ALL)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[actix_web::test]
    async fn window_is_applied_after_ordering() {
        let store = MemoryStore::new();
        for worker in [3, 1, 2] {
            store
                .insert_attendance(open(worker, &format!("2024-01-1{worker}T09:00")))
                .await
                .unwrap();
        }

        let window = Window { offset: 1, limit: 1 };
        let page: Vec<_> = store
            .stream_attendance(AttendanceFilter::default(), window)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].employee_id, 2);

        let past_the_end = Window { offset: u64::MAX, limit: 10 };
        let empty: Vec<_> = store
            .stream_attendance(AttendanceFilter::default(), past_the_end)
            .try_collect()
            .await
            .unwrap();
        assert!(empty.is_empty());
    }

    #[actix_web::test]
    async fn upsert_keeps_the_payroll_id() {
        let store = MemoryStore::new();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();

        let first = store
            .upsert_payroll(7, start, end, &PayrollTotals::default())
            .await
            .unwrap();
        let totals = PayrollTotals {
            minutes_worked: 60,
            ..Default::default()
        };
        let second = store.upsert_payroll(7, start, end, &totals).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.minutes_worked, 60);
        assert_eq!(store.list_payroll(Some(7), Window::ALL).await.unwrap().len(), 1);
        assert_eq!(store.count_payroll(Some(7)).await.unwrap(), 1);
        assert_eq!(store.count_payroll(Some(8)).await.unwrap(), 0);
    }

    #[actix_web::test]
    async fn decided_leave_is_not_pending_anymore() {
        let store = MemoryStore::new();
        let leave = store
            .insert_leave(NewLeave {
                employee_id: 7,
                start_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(),
                leave_type: LeaveType::Sick,
            })
            .await
            .unwrap();

        let now = at("2024-01-09T10:00");
        assert!(store.decide_leave(leave.id, LeaveStatus::Denied, 1, now).await.unwrap());
        assert!(!store.decide_leave(leave.id, LeaveStatus::Approved, 1, now).await.unwrap());
    }
}
