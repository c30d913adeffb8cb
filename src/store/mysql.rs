use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use sqlx::{FromRow, MySqlPool};

use super::{AttendanceFilter, LeaveFilter, Store, Window};
use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, NewAttendance};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType, NewLeave};
use crate::model::payroll::{PayrollRecord, PayrollTotals};

// SQLSTATE for duplicate keys in MySQL
const SQLSTATE_INTEGRITY: &str = "23000";

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    check_in: NaiveDateTime,
    check_out: Option<NaiveDateTime>,
    status: String,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = AppError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<AttendanceStatus>()
            .map_err(|_| AppError::Corrupt(format!("attendance {} status '{}'", row.id, row.status)))?;
        Ok(Self {
            id: row.id,
            employee_id: row.employee_id,
            check_in: row.check_in,
            check_out: row.check_out,
            status,
        })
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    leave_type: String,
    status: String,
    approver_id: Option<u64>,
    decided_at: Option<NaiveDateTime>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = AppError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        let leave_type = row
            .leave_type
            .parse::<LeaveType>()
            .map_err(|_| AppError::Corrupt(format!("leave {} type '{}'", row.id, row.leave_type)))?;
        let status = row
            .status
            .parse::<LeaveStatus>()
            .map_err(|_| AppError::Corrupt(format!("leave {} status '{}'", row.id, row.status)))?;
        Ok(Self {
            id: row.id,
            employee_id: row.employee_id,
            start_date: row.start_date,
            end_date: row.end_date,
            leave_type,
            status,
            approver_id: row.approver_id,
            decided_at: row.decided_at,
        })
    }
}

#[derive(FromRow)]
struct PayrollRow {
    id: u64,
    employee_id: u64,
    period_start: NaiveDate,
    period_end: NaiveDate,
    minutes_worked: u64,
    days_attended: u32,
    late_days: u32,
    absent_days: u32,
    paid_leave_days: u32,
    unpaid_leave_days: u32,
    gross_pay_cents: i64,
}

impl From<PayrollRow> for PayrollRecord {
    fn from(row: PayrollRow) -> Self {
        Self {
            id: row.id,
            employee_id: row.employee_id,
            period_start: row.period_start,
            period_end: row.period_end,
            minutes_worked: row.minutes_worked,
            days_attended: row.days_attended,
            late_days: row.late_days,
            absent_days: row.absent_days,
            paid_leave_days: row.paid_leave_days,
            unpaid_leave_days: row.unpaid_leave_days,
            gross_pay_cents: row.gross_pay_cents,
        }
    }
}

const ATTENDANCE_COLUMNS: &str = "id, employee_id, check_in, check_out, status";
const LEAVE_COLUMNS: &str =
    "id, employee_id, start_date, end_date, leave_type, status, approver_id, decided_at";

/// MySQL-backed store.
///
/// "One open record per employee" is enforced by the unique index on the
/// generated `open_employee_id` column (see `migrations/`); status changes
/// are guarded single-row updates.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// Half-open `[from, until)` check-in bounds for a date filter. `None` on
/// either side means unbounded.
fn check_in_bounds(filter: &AttendanceFilter) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
    let from = filter.from.map(|d| d.and_time(NaiveTime::MIN));
    // the last representable date has no successor, so nothing is after it
    let until = filter
        .to
        .and_then(|d| d.succ_opt())
        .map(|d| d.and_time(NaiveTime::MIN));
    (from, until)
}

fn is_integrity_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(SQLSTATE_INTEGRITY))
}

#[async_trait]
impl Store for MySqlStore {
    async fn insert_attendance(&self, new: NewAttendance) -> AppResult<AttendanceRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, check_in, status)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(new.check_in)
        .bind(new.status.to_string())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(AttendanceRecord {
                id: done.last_insert_id(),
                employee_id: new.employee_id,
                check_in: new.check_in,
                check_out: None,
                status: new.status,
            }),
            // the open-record unique index lost a race
            Err(e) if is_integrity_violation(&e) => Err(AppError::AlreadyCheckedIn {
                employee_id: new.employee_id,
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_attendance(&self, id: u64) -> AppResult<Option<AttendanceRecord>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = ? AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(AttendanceRecord::try_from)
            .transpose()
    }

    async fn find_open_attendance(&self, employee_id: u64) -> AppResult<Option<AttendanceRecord>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE open_employee_id = ?"
        );
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?
            .map(AttendanceRecord::try_from)
            .transpose()
    }

    async fn close_attendance(
        &self,
        id: u64,
        check_out: NaiveDateTime,
        status: AttendanceStatus,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out = ?, status = ?
            WHERE id = ?
            AND check_out IS NULL
            AND deleted_at IS NULL
            AND check_in <= ?
            "#,
        )
        .bind(check_out)
        .bind(status.to_string())
        .bind(id)
        .bind(check_out)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn soft_delete_attendance(&self, id: u64) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE attendance SET deleted_at = NOW() WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    fn stream_attendance(
        &self,
        filter: AttendanceFilter,
        window: Window,
    ) -> BoxStream<'_, AppResult<AttendanceRecord>> {
        let (from, until) = check_in_bounds(&filter);
        sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT id, employee_id, check_in, check_out, status
            FROM attendance
            WHERE deleted_at IS NULL
            AND (? IS NULL OR employee_id = ?)
            AND (? IS NULL OR check_in >= ?)
            AND (? IS NULL OR check_in < ?)
            ORDER BY check_in, id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(filter.employee_id)
        .bind(filter.employee_id)
        .bind(from)
        .bind(from)
        .bind(until)
        .bind(until)
        .bind(window.limit)
        .bind(window.offset)
        .fetch(&self.pool)
        .map_err(AppError::from)
        .and_then(|row| futures::future::ready(AttendanceRecord::try_from(row)))
        .boxed()
    }

    async fn insert_leave(&self, new: NewLeave) -> AppResult<LeaveRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, start_date, end_date, leave_type, status)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.leave_type.to_string())
        .bind(LeaveStatus::Pending.to_string())
        .execute(&self.pool)
        .await?;

        Ok(LeaveRequest {
            id: result.last_insert_id(),
            employee_id: new.employee_id,
            start_date: new.start_date,
            end_date: new.end_date,
            leave_type: new.leave_type,
            status: LeaveStatus::Pending,
            approver_id: None,
            decided_at: None,
        })
    }

    async fn find_leave(&self, id: u64) -> AppResult<Option<LeaveRequest>> {
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ? AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }

    async fn decide_leave(
        &self,
        id: u64,
        outcome: LeaveStatus,
        approver_id: u64,
        decided_at: NaiveDateTime,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, approver_id = ?, decided_at = ?
            WHERE id = ?
            AND status = 'pending'
            AND deleted_at IS NULL
            "#,
        )
        .bind(outcome.to_string())
        .bind(approver_id)
        .bind(decided_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn soft_delete_leave(&self, id: u64) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE leave_requests SET deleted_at = NOW() WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    fn stream_leave(&self, filter: LeaveFilter, window: Window) -> BoxStream<'_, AppResult<LeaveRequest>> {
        // legacy rows may still carry the payment spelling of a decision
        let statuses: (Option<&'static str>, Option<&'static str>) = match filter.status {
            Some(LeaveStatus::Pending) => (Some("pending"), None),
            Some(LeaveStatus::Approved) => (Some("approved"), Some("paid")),
            Some(LeaveStatus::Denied) => (Some("denied"), Some("overdue")),
            None => (None, None),
        };

        sqlx::query_as::<_, LeaveRow>(
            r#"
            SELECT id, employee_id, start_date, end_date, leave_type, status, approver_id, decided_at
            FROM leave_requests
            WHERE deleted_at IS NULL
            AND (? IS NULL OR employee_id = ?)
            AND (? IS NULL OR status IN (?, ?))
            AND (? IS NULL OR end_date >= ?)
            AND (? IS NULL OR start_date <= ?)
            ORDER BY start_date, id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(filter.employee_id)
        .bind(filter.employee_id)
        .bind(statuses.0)
        .bind(statuses.0)
        .bind(statuses.1)
        .bind(filter.from)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.to)
        .bind(window.limit)
        .bind(window.offset)
        .fetch(&self.pool)
        .map_err(AppError::from)
        .and_then(|row| futures::future::ready(LeaveRequest::try_from(row)))
        .boxed()
    }

    async fn upsert_payroll(
        &self,
        employee_id: u64,
        period_start: NaiveDate,
        period_end: NaiveDate,
        totals: &PayrollTotals,
    ) -> AppResult<PayrollRecord> {
        sqlx::query(
            r#"
            INSERT INTO payroll
                (employee_id, period_start, period_end, minutes_worked, days_attended,
                 late_days, absent_days, paid_leave_days, unpaid_leave_days, gross_pay_cents)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                minutes_worked = VALUES(minutes_worked),
                days_attended = VALUES(days_attended),
                late_days = VALUES(late_days),
                absent_days = VALUES(absent_days),
                paid_leave_days = VALUES(paid_leave_days),
                unpaid_leave_days = VALUES(unpaid_leave_days),
                gross_pay_cents = VALUES(gross_pay_cents)
            "#,
        )
        .bind(employee_id)
        .bind(period_start)
        .bind(period_end)
        .bind(totals.minutes_worked)
        .bind(totals.days_attended)
        .bind(totals.late_days)
        .bind(totals.absent_days)
        .bind(totals.paid_leave_days)
        .bind(totals.unpaid_leave_days)
        .bind(totals.gross_pay_cents)
        .execute(&self.pool)
        .await?;

        // last_insert_id is unreliable when the row was updated
        let row = sqlx::query_as::<_, PayrollRow>(
            r#"
            SELECT id, employee_id, period_start, period_end, minutes_worked, days_attended,
                   late_days, absent_days, paid_leave_days, unpaid_leave_days, gross_pay_cents
            FROM payroll
            WHERE employee_id = ? AND period_start = ? AND period_end = ?
            "#,
        )
        .bind(employee_id)
        .bind(period_start)
        .bind(period_end)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_payroll(&self, id: u64) -> AppResult<Option<PayrollRecord>> {
        let row = sqlx::query_as::<_, PayrollRow>(
            r#"
            SELECT id, employee_id, period_start, period_end, minutes_worked, days_attended,
                   late_days, absent_days, paid_leave_days, unpaid_leave_days, gross_pay_cents
            FROM payroll
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PayrollRecord::from))
    }

    async fn list_payroll(&self, employee_id: Option<u64>, window: Window) -> AppResult<Vec<PayrollRecord>> {
        let rows = sqlx::query_as::<_, PayrollRow>(
            r#"
            SELECT id, employee_id, period_start, period_end, minutes_worked, days_attended,
                   late_days, absent_days, paid_leave_days, unpaid_leave_days, gross_pay_cents
            FROM payroll
            WHERE (? IS NULL OR employee_id = ?)
            ORDER BY period_start DESC, id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(employee_id)
        .bind(employee_id)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PayrollRecord::from).collect())
    }

    async fn count_payroll(&self, employee_id: Option<u64>) -> AppResult<u64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM payroll WHERE (? IS NULL OR employee_id = ?)",
        )
        .bind(employee_id)
        .bind(employee_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn date_filter_becomes_half_open_check_in_bounds() {
        let filter = AttendanceFilter {
            employee_id: None,
            from: Some(day("2024-01-01")),
            to: Some(day("2024-01-31")),
        };
        let (from, until) = check_in_bounds(&filter);
        assert_eq!(from, Some(day("2024-01-01").and_time(NaiveTime::MIN)));
        assert_eq!(until, Some(day("2024-02-01").and_time(NaiveTime::MIN)));
    }

    #[test]
    fn last_representable_date_leaves_the_upper_bound_open() {
        let filter = AttendanceFilter {
            employee_id: None,
            from: None,
            to: Some(NaiveDate::MAX),
        };
        assert_eq!(check_in_bounds(&filter), (None, None));
    }
}
