use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Payroll figures for one employee and period.
///
/// Purely derived from closed attendance and approved leave; regenerating
/// the same period overwrites these values and keeps `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRecord {
    pub id: u64,
    pub employee_id: u64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub minutes_worked: u64,
    pub days_attended: u32,
    pub late_days: u32,
    pub absent_days: u32,
    pub paid_leave_days: u32,
    pub unpaid_leave_days: u32,
    pub gross_pay_cents: i64,
}

/// Computed totals, before the store assigns an id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayrollTotals {
    pub minutes_worked: u64,
    pub days_attended: u32,
    pub late_days: u32,
    pub absent_days: u32,
    pub paid_leave_days: u32,
    pub unpaid_leave_days: u32,
    pub gross_pay_cents: i64,
}

impl PayrollRecord {
    pub fn from_totals(
        id: u64,
        employee_id: u64,
        period_start: NaiveDate,
        period_end: NaiveDate,
        totals: &PayrollTotals,
    ) -> Self {
        Self {
            id,
            employee_id,
            period_start,
            period_end,
            minutes_worked: totals.minutes_worked,
            days_attended: totals.days_attended,
            late_days: totals.late_days,
            absent_days: totals.absent_days,
            paid_leave_days: totals.paid_leave_days,
            unpaid_leave_days: totals.unpaid_leave_days,
            gross_pay_cents: totals.gross_pay_cents,
        }
    }
}
