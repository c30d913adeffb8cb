use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Status of a day's attendance. Only the tracker assigns it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    OnLeave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceState {
    /// checked in, not yet checked out
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: u64,
    pub employee_id: u64,
    pub check_in: NaiveDateTime,
    pub check_out: Option<NaiveDateTime>,
    pub status: AttendanceStatus,
}

impl AttendanceRecord {
    pub fn state(&self) -> AttendanceState {
        match self.check_out {
            Some(_) => AttendanceState::Closed,
            None => AttendanceState::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == AttendanceState::Open
    }

    pub fn date(&self) -> NaiveDate {
        self.check_in.date()
    }

    /// Whole minutes between check-in and check-out, zero while open.
    pub fn worked_minutes(&self) -> u64 {
        self.check_out
            .map(|out| (out - self.check_in).num_minutes().max(0) as u64)
            .unwrap_or(0)
    }
}

/// Values for a freshly opened record.
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub employee_id: u64,
    pub check_in: NaiveDateTime,
    pub status: AttendanceStatus,
}
