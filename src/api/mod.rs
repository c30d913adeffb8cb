use chrono::NaiveDateTime;

pub mod attendance;
pub mod leave_request;
pub mod payroll;

/// Wall clock for requests that do not carry their own timestamp.
fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
