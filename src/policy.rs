use chrono::{NaiveDateTime, NaiveTime};

use crate::model::attendance::AttendanceStatus;
use crate::model::payroll::PayrollTotals;

/// Rules that turn attendance timestamps into a status.
#[derive(Debug, Clone, Copy)]
pub struct AttendancePolicy {
    /// check-ins strictly after this time of day are late
    pub late_after: NaiveTime,
    /// shorter days are recorded as absent
    pub min_worked_minutes: u64,
}

impl AttendancePolicy {
    pub fn status_at_check_in(&self, check_in: NaiveDateTime, on_leave: bool) -> AttendanceStatus {
        if on_leave {
            AttendanceStatus::OnLeave
        } else if check_in.time() > self.late_after {
            AttendanceStatus::Late
        } else {
            AttendanceStatus::Present
        }
    }

    pub fn status_at_check_out(
        &self,
        opened_as: AttendanceStatus,
        check_in: NaiveDateTime,
        check_out: NaiveDateTime,
    ) -> AttendanceStatus {
        let worked = (check_out - check_in).num_minutes().max(0) as u64;
        match opened_as {
            AttendanceStatus::Present | AttendanceStatus::Late
                if worked < self.min_worked_minutes =>
            {
                AttendanceStatus::Absent
            }
            other => other,
        }
    }
}

/// Pay rates used when generating payroll.
#[derive(Debug, Clone, Copy)]
pub struct PayPolicy {
    pub hourly_rate_cents: i64,
    /// hours credited for each paid leave day
    pub paid_leave_hours: u32,
}

impl PayPolicy {
    /// Integer arithmetic only, rounding down to the cent.
    pub fn gross_pay_cents(&self, totals: &PayrollTotals) -> i64 {
        let worked = totals.minutes_worked as i64 * self.hourly_rate_cents / 60;
        let leave = totals.paid_leave_days as i64 * self.paid_leave_hours as i64 * self.hourly_rate_cents;
        worked + leave
    }
}
