use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::TryStreamExt;
use tracing::{info, instrument};

use crate::error::{AppError, AppResult};
use crate::model::attendance::AttendanceStatus;
use crate::model::leave_request::LeaveStatus;
use crate::model::payroll::{PayrollRecord, PayrollTotals};
use crate::policy::PayPolicy;
use crate::store::{AttendanceFilter, LeaveFilter, Store, Window};

pub struct PayrollGenerator {
    store: Arc<dyn Store>,
    pay: PayPolicy,
}

impl PayrollGenerator {
    pub fn new(store: Arc<dyn Store>, pay: PayPolicy) -> Self {
        Self { store, pay }
    }

    /// Rolls up closed attendance and approved leave for one employee and
    /// writes the period's payroll row, replacing any earlier run.
    ///
    /// Attendance belongs to the period by check-in date. Leave is clipped
    /// to the period and counted in distinct calendar days.
    #[instrument(name = "payroll_generate", skip(self))]
    pub async fn generate_for_period(
        &self,
        employee_id: u64,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> AppResult<PayrollRecord> {
        if period_end < period_start {
            return Err(AppError::InvalidRange {
                start: period_start,
                end: period_end,
            });
        }

        let totals = self.totals(employee_id, period_start, period_end).await?;
        let record = self
            .store
            .upsert_payroll(employee_id, period_start, period_end, &totals)
            .await?;

        info!(
            payroll_id = record.id,
            minutes = record.minutes_worked,
            gross_pay_cents = record.gross_pay_cents,
            "Payroll generated"
        );
        Ok(record)
    }

    async fn totals(
        &self,
        employee_id: u64,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> AppResult<PayrollTotals> {
        let mut totals = PayrollTotals::default();
        let mut attended = BTreeSet::new();
        let mut late = BTreeSet::new();
        let mut absent = BTreeSet::new();

        let filter = AttendanceFilter {
            employee_id: Some(employee_id),
            from: Some(period_start),
            to: Some(period_end),
        };
        let mut attendance = self.store.stream_attendance(filter, Window::ALL);
        while let Some(record) = attendance.try_next().await? {
            if record.is_open() {
                info!(record_id = record.id, "Payroll blocked by open attendance");
                return Err(AppError::IncompleteData {
                    open_record_id: record.id,
                });
            }

            totals.minutes_worked += record.worked_minutes();
            match record.status {
                AttendanceStatus::Present => {
                    attended.insert(record.date());
                }
                AttendanceStatus::Late => {
                    attended.insert(record.date());
                    late.insert(record.date());
                }
                AttendanceStatus::Absent => {
                    absent.insert(record.date());
                }
                AttendanceStatus::OnLeave => {}
            }
        }

        totals.days_attended = attended.len() as u32;
        totals.late_days = late.len() as u32;
        // a short record does not cancel a full one on the same day
        totals.absent_days = absent.difference(&attended).count() as u32;

        let filter = LeaveFilter {
            employee_id: Some(employee_id),
            status: Some(LeaveStatus::Approved),
            from: Some(period_start),
            to: Some(period_end),
        };
        let mut leaves = self.store.stream_leave(filter, Window::ALL);
        let mut paid = BTreeSet::new();
        let mut unpaid = BTreeSet::new();
        while let Some(leave) = leaves.try_next().await? {
            let dates = leave.dates_within(period_start, period_end);
            if leave.leave_type.is_paid() {
                paid.extend(dates);
            } else {
                unpaid.extend(dates);
            }
        }

        // overlapping requests count each date once, paid wins
        totals.paid_leave_days = paid.len() as u32;
        totals.unpaid_leave_days = unpaid.difference(&paid).count() as u32;

        totals.gross_pay_cents = self.pay.gross_pay_cents(&totals);
        Ok(totals)
    }

    pub async fn get(&self, id: u64) -> AppResult<PayrollRecord> {
        self.store
            .find_payroll(id)
            .await?
            .ok_or(AppError::NotFound { entity: "payroll", id })
    }

    pub async fn list(&self, employee_id: Option<u64>, window: Window) -> AppResult<Vec<PayrollRecord>> {
        self.store.list_payroll(employee_id, window).await
    }

    pub async fn count(&self, employee_id: Option<u64>) -> AppResult<u64> {
        self.store.count_payroll(employee_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::NewAttendance;
    use crate::model::leave_request::{LeaveType, NewLeave};
    use crate::store::MemoryStore;
    use chrono::NaiveDateTime;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn pay() -> PayPolicy {
        PayPolicy {
            hourly_rate_cents: 1200,
            paid_leave_hours: 8,
        }
    }

    async fn worked(store: &MemoryStore, employee_id: u64, from: &str, to: &str, status: AttendanceStatus) {
        let rec = store
            .insert_attendance(NewAttendance {
                employee_id,
                check_in: at(from),
                status,
            })
            .await
            .unwrap();
        assert!(store.close_attendance(rec.id, at(to), status).await.unwrap());
    }

    async fn approved_leave(store: &MemoryStore, employee_id: u64, start: &str, end: &str, leave_type: LeaveType) {
        let leave = store
            .insert_leave(NewLeave {
                employee_id,
                start_date: day(start),
                end_date: day(end),
                leave_type,
            })
            .await
            .unwrap();
        store
            .decide_leave(leave.id, LeaveStatus::Approved, 1, at("2024-01-01T08:00"))
            .await
            .unwrap();
    }

    #[actix_web::test]
    async fn totals_cover_attendance_and_clipped_leave() {
        let store = Arc::new(MemoryStore::new());
        worked(&store, 7, "2024-01-10T09:00", "2024-01-10T17:00", AttendanceStatus::Present).await;
        worked(&store, 7, "2024-01-11T09:30", "2024-01-11T17:30", AttendanceStatus::Late).await;
        worked(&store, 7, "2024-01-12T09:00", "2024-01-12T10:00", AttendanceStatus::Absent).await;
        // outside the period and another employee
        worked(&store, 7, "2024-02-01T09:00", "2024-02-01T17:00", AttendanceStatus::Present).await;
        worked(&store, 8, "2024-01-10T09:00", "2024-01-10T17:00", AttendanceStatus::Present).await;
        approved_leave(&store, 7, "2024-01-30", "2024-02-02", LeaveType::Annual).await;
        approved_leave(&store, 7, "2024-01-20", "2024-01-20", LeaveType::Unpaid).await;

        let generator = PayrollGenerator::new(store, pay());
        let record = generator
            .generate_for_period(7, day("2024-01-01"), day("2024-01-31"))
            .await
            .unwrap();

        assert_eq!(record.minutes_worked, 8 * 60 + 8 * 60 + 60);
        assert_eq!(record.days_attended, 2);
        assert_eq!(record.late_days, 1);
        assert_eq!(record.absent_days, 1);
        assert_eq!(record.paid_leave_days, 2);
        assert_eq!(record.unpaid_leave_days, 1);
        assert_eq!(record.gross_pay_cents, 1020 * 1200 / 60 + 2 * 8 * 1200);
    }

    #[actix_web::test]
    async fn overlapping_leave_counts_each_date_once() {
        let store = Arc::new(MemoryStore::new());
        approved_leave(&store, 7, "2024-01-10", "2024-01-12", LeaveType::Annual).await;
        approved_leave(&store, 7, "2024-01-11", "2024-01-13", LeaveType::Annual).await;
        // fully inside the paid dates, and one date after them
        approved_leave(&store, 7, "2024-01-12", "2024-01-14", LeaveType::Unpaid).await;

        let generator = PayrollGenerator::new(store, pay());
        let record = generator
            .generate_for_period(7, day("2024-01-01"), day("2024-01-31"))
            .await
            .unwrap();

        assert_eq!(record.paid_leave_days, 4);
        assert_eq!(record.unpaid_leave_days, 1);
        assert_eq!(record.gross_pay_cents, 4 * 8 * 1200);
    }

    #[actix_web::test]
    async fn regeneration_is_byte_identical() {
        let store = Arc::new(MemoryStore::new());
        worked(&store, 7, "2024-01-10T09:00", "2024-01-10T17:00", AttendanceStatus::Present).await;
        approved_leave(&store, 7, "2024-01-15", "2024-01-16", LeaveType::Sick).await;

        let generator = PayrollGenerator::new(store, pay());
        let first = generator
            .generate_for_period(7, day("2024-01-01"), day("2024-01-31"))
            .await
            .unwrap();
        let second = generator
            .generate_for_period(7, day("2024-01-01"), day("2024-01-31"))
            .await
            .unwrap();

        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
        assert_eq!(generator.list(Some(7), Window::ALL).await.unwrap(), vec![second.clone()]);
        assert_eq!(generator.get(second.id).await.unwrap(), second);
    }

    #[actix_web::test]
    async fn open_attendance_blocks_the_period() {
        let store = Arc::new(MemoryStore::new());
        let open = store
            .insert_attendance(NewAttendance {
                employee_id: 7,
                check_in: at("2024-01-31T09:00"),
                status: AttendanceStatus::Present,
            })
            .await
            .unwrap();

        let generator = PayrollGenerator::new(store.clone(), pay());
        let err = generator
            .generate_for_period(7, day("2024-01-01"), day("2024-01-31"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::IncompleteData { open_record_id } if open_record_id == open.id));
        assert!(generator.list(Some(7), Window::ALL).await.unwrap().is_empty());

        // the next period is unaffected
        generator
            .generate_for_period(7, day("2024-02-01"), day("2024-02-29"))
            .await
            .unwrap();
    }

    #[actix_web::test]
    async fn pending_and_denied_leave_are_ignored() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_leave(NewLeave {
                employee_id: 7,
                start_date: day("2024-01-10"),
                end_date: day("2024-01-12"),
                leave_type: LeaveType::Annual,
            })
            .await
            .unwrap();

        let generator = PayrollGenerator::new(store, pay());
        let record = generator
            .generate_for_period(7, day("2024-01-01"), day("2024-01-31"))
            .await
            .unwrap();
        assert_eq!(record.paid_leave_days, 0);
        assert_eq!(record.gross_pay_cents, 0);
    }

    #[actix_web::test]
    async fn reversed_period_is_invalid() {
        let generator = PayrollGenerator::new(Arc::new(MemoryStore::new()), pay());
        let err = generator
            .generate_for_period(7, day("2024-01-31"), day("2024-01-01"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRange { .. }));
    }
}
