use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Annual,
    Sick,
    Unpaid,
}

impl LeaveType {
    pub fn is_paid(&self) -> bool {
        !matches!(self, LeaveType::Unpaid)
    }
}

/// Decision state of a leave request.
///
/// Older rows stored the outcome as `paid` / `overdue`; those still parse
/// as approved / denied but are always written back in the new spelling.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    #[strum(to_string = "pending")]
    Pending,
    #[strum(to_string = "approved", serialize = "paid")]
    Approved,
    #[strum(to_string = "denied", serialize = "overdue")]
    Denied,
}

impl LeaveStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveDecision {
    Approve,
    Deny,
}

impl LeaveDecision {
    pub fn outcome(&self) -> LeaveStatus {
        match self {
            LeaveDecision::Approve => LeaveStatus::Approved,
            LeaveDecision::Deny => LeaveStatus::Denied,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub leave_type: LeaveType,
    pub status: LeaveStatus,
    pub approver_id: Option<u64>,
    pub decided_at: Option<NaiveDateTime>,
}

impl LeaveRequest {
    /// Calendar days of this leave that fall inside `from..=to`.
    pub fn dates_within(&self, from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
        let end = self.end_date.min(to);
        self.start_date
            .max(from)
            .iter_days()
            .take_while(move |d| *d <= end)
    }
}

#[derive(Debug, Clone)]
pub struct NewLeave {
    pub employee_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub leave_type: LeaveType,
}
