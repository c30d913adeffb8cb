use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, NaiveDateTime};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppResult;
use crate::model::attendance::{AttendanceRecord, AttendanceState, AttendanceStatus};
use crate::service::AttendanceTracker;
use crate::store::AttendanceFilter;
use crate::utils::pagination::Page;

#[derive(Deserialize, ToSchema)]
pub struct CheckIn {
    #[schema(example = 3)]
    pub employee_id: u64,
    /// Defaults to the server clock
    #[schema(example = "2024-01-10T09:00:00")]
    pub at: Option<NaiveDateTime>,
}

#[derive(Deserialize, ToSchema)]
pub struct CheckOut {
    /// Defaults to the server clock
    #[schema(example = "2024-01-10T17:30:00")]
    pub at: Option<NaiveDateTime>,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 3,
    "check_in": "2024-01-10T09:00:00",
    "check_out": "2024-01-10T17:30:00",
    "status": "present",
    "state": "closed"
}))]
pub struct AttendanceResponse {
    pub id: u64,
    pub employee_id: u64,
    pub check_in: NaiveDateTime,
    pub check_out: Option<NaiveDateTime>,
    pub status: AttendanceStatus,
    pub state: AttendanceState,
}

impl From<AttendanceRecord> for AttendanceResponse {
    fn from(record: AttendanceRecord) -> Self {
        let state = record.state();
        Self {
            id: record.id,
            employee_id: record.employee_id,
            check_in: record.check_in,
            check_out: record.check_out,
            status: record.status,
            state,
        }
    }
}

#[derive(Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AttendanceQuery {
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    /// First check-in date to include
    pub from: Option<NaiveDate>,
    /// Last check-in date to include
    pub to: Option<NaiveDate>,
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<AttendanceResponse>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-in",
    request_body = CheckIn,
    responses(
        (status = 201, description = "Checked in", body = AttendanceResponse),
        (status = 409, description = "Already checked in", body = Object, example = json!({
            "message": "employee 3 is already checked in"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    tracker: web::Data<AttendanceTracker>,
    payload: web::Json<CheckIn>,
) -> AppResult<impl Responder> {
    let at = payload.at.unwrap_or_else(super::now);
    let record = tracker.check_in(payload.employee_id, at).await?;

    Ok(HttpResponse::Created().json(AttendanceResponse::from(record)))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/{attendance_id}/check-out",
    params(
        ("attendance_id" = u64, Path, description = "ID of the open attendance record")
    ),
    request_body = CheckOut,
    responses(
        (status = 200, description = "Checked out", body = AttendanceResponse),
        (status = 400, description = "Check-out before check-in"),
        (status = 404, description = "Attendance not found"),
        (status = 409, description = "Already checked out", body = Object, example = json!({
            "message": "attendance 1 is already checked out"
        }))
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    tracker: web::Data<AttendanceTracker>,
    path: web::Path<u64>,
    payload: web::Json<CheckOut>,
) -> AppResult<impl Responder> {
    let id = path.into_inner();
    let at = payload.at.unwrap_or_else(super::now);
    let record = tracker.check_out(id, at).await?;

    Ok(HttpResponse::Ok().json(AttendanceResponse::from(record)))
}

#[utoipa::path(
    get,
    path = "/api/v1/attendance/{attendance_id}",
    params(
        ("attendance_id" = u64, Path, description = "ID of the attendance record")
    ),
    responses(
        (status = 200, description = "Attendance found", body = AttendanceResponse),
        (status = 404, description = "Attendance not found")
    ),
    tag = "Attendance"
)]
pub async fn get_attendance(
    tracker: web::Data<AttendanceTracker>,
    path: web::Path<u64>,
) -> AppResult<impl Responder> {
    let record = tracker.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(AttendanceResponse::from(record)))
}

#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Paginated attendance list", body = AttendanceListResponse)
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    tracker: web::Data<AttendanceTracker>,
    query: web::Query<AttendanceQuery>,
) -> AppResult<impl Responder> {
    let page = Page::new(query.page, query.per_page);
    let filter = AttendanceFilter {
        employee_id: query.employee_id,
        from: query.from,
        to: query.to,
    };

    let data: Vec<AttendanceResponse> = tracker
        .list(filter, page.window())
        .map_ok(AttendanceResponse::from)
        .try_collect()
        .await?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data,
        page: page.page,
        per_page: page.per_page,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/attendance/{attendance_id}",
    params(
        ("attendance_id" = u64, Path, description = "ID of the attendance record")
    ),
    responses(
        (status = 204, description = "Attendance removed"),
        (status = 404, description = "Attendance not found")
    ),
    tag = "Attendance"
)]
pub async fn delete_attendance(
    tracker: web::Data<AttendanceTracker>,
    path: web::Path<u64>,
) -> AppResult<impl Responder> {
    tracker.remove(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
