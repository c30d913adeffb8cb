use crate::api::attendance::{
    AttendanceListResponse, AttendanceQuery, AttendanceResponse, CheckIn, CheckOut,
};
use crate::api::leave_request::{
    CreateLeave, DecideLeave, LeaveListResponse, LeaveQuery, LeaveResponse,
};
use crate::api::payroll::{
    GeneratePayroll, PaginatedPayrollResponse, PayrollQuery, PayrollResponse,
};
use crate::model::attendance::{AttendanceState, AttendanceStatus};
use crate::model::leave_request::{LeaveStatus, LeaveType};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Lifecycle API",
        version = "1.0.0",
        description = r#"
## Attendance, Leave and Payroll

- **Attendance**: check-in opens a record, check-out closes it. An employee has
  at most one open record. Status (present, late, absent, on_leave) is derived
  from the timestamps and the configured policy.
- **Leave**: requests start pending and are approved or denied exactly once.
- **Payroll**: generated per employee and period from closed attendance and
  approved leave. Regenerating a period overwrites it.

Timestamps (`at`) may be supplied by the caller; the server clock is used otherwise.

Errors are returned as `{"message": "..."}` with 400, 404, 409 or 422.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::get_attendance,
        crate::api::attendance::list_attendance,
        crate::api::attendance::delete_attendance,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::deny_leave,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::delete_leave,

        crate::api::payroll::generate_payroll,
        crate::api::payroll::get_payroll,
        crate::api::payroll::list_payrolls
    ),
    components(
        schemas(
            CheckIn,
            CheckOut,
            AttendanceResponse,
            AttendanceListResponse,
            AttendanceQuery,
            AttendanceStatus,
            AttendanceState,
            CreateLeave,
            DecideLeave,
            LeaveResponse,
            LeaveListResponse,
            LeaveQuery,
            LeaveStatus,
            LeaveType,
            GeneratePayroll,
            PayrollResponse,
            PaginatedPayrollResponse,
            PayrollQuery
        )
    ),
    tags(
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Payroll", description = "Payroll management APIs"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();
        for expected in [
            "/api/v1/attendance/check-in",
            "/api/v1/attendance/{attendance_id}/check-out",
            "/api/v1/leave/{leave_id}/approve",
            "/api/v1/leave/{leave_id}/deny",
            "/api/v1/payroll/generate",
        ] {
            assert!(paths.iter().any(|p| p == expected), "missing {expected}");
        }
    }
}
