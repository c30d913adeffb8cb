//! Lifecycle operations. These are the only callers of the store's status
//! transitions, and they never read the wall clock: every timestamp comes
//! in as a parameter.

pub mod attendance;
pub mod leave;
pub mod payroll;

pub use attendance::AttendanceTracker;
pub use leave::LeaveWorkflow;
pub use payroll::PayrollGenerator;
