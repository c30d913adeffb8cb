use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, NaiveDateTime};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppResult;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use crate::service::LeaveWorkflow;
use crate::store::LeaveFilter;
use crate::utils::pagination::Page;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = 7)]
    pub employee_id: u64,
    #[schema(example = "2024-01-10")]
    pub start_date: NaiveDate,
    #[schema(example = "2024-01-12")]
    pub end_date: NaiveDate,
    #[schema(example = "sick")]
    pub leave_type: LeaveType, // enum ensures Swagger dropdown
}

#[derive(Deserialize, ToSchema)]
pub struct DecideLeave {
    /// Employee or user deciding the request
    #[schema(example = 1)]
    pub approver_id: u64,
    /// Defaults to the server clock
    pub at: Option<NaiveDateTime>,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 7,
    "start_date": "2024-01-10",
    "end_date": "2024-01-12",
    "leave_type": "annual",
    "status": "approved",
    "approver_id": 1,
    "decided_at": "2024-01-09T10:00:00"
}))]
pub struct LeaveResponse {
    /// leave application id
    pub id: u64,
    /// employee id for whom the leave is applied
    pub employee_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub leave_type: LeaveType,
    pub status: LeaveStatus,
    pub approver_id: Option<u64>,
    pub decided_at: Option<NaiveDateTime>,
}

impl From<LeaveRequest> for LeaveResponse {
    fn from(leave: LeaveRequest) -> Self {
        Self {
            id: leave.id,
            employee_id: leave.employee_id,
            start_date: leave.start_date,
            end_date: leave.end_date,
            leave_type: leave.leave_type,
            status: leave.status,
            approver_id: leave.approver_id,
            decided_at: leave.decided_at,
        }
    }
}

#[derive(Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LeaveQuery {
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    /// Only leave ending on or after this date
    pub from: Option<NaiveDate>,
    /// Only leave starting on or before this date
    pub to: Option<NaiveDate>,
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveResponse>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
}

/* =========================
Submit leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveResponse),
        (status = 400, description = "end_date before start_date", body = Object, example = json!({
            "message": "end date 2024-01-10 is before start date 2024-01-12"
        }))
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    workflow: web::Data<LeaveWorkflow>,
    payload: web::Json<CreateLeave>,
) -> AppResult<impl Responder> {
    let leave = workflow
        .submit(
            payload.employee_id,
            payload.start_date,
            payload.end_date,
            payload.leave_type,
        )
        .await?;

    Ok(HttpResponse::Created().json(LeaveResponse::from(leave)))
}

/* =========================
Approve leave
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    request_body = DecideLeave,
    responses(
        (status = 200, description = "Leave approved", body = LeaveResponse),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already decided", body = Object, example = json!({
            "message": "leave request 1 has already been decided"
        }))
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    workflow: web::Data<LeaveWorkflow>,
    path: web::Path<u64>,
    payload: web::Json<DecideLeave>,
) -> AppResult<impl Responder> {
    let at = payload.at.unwrap_or_else(super::now);
    let leave = workflow
        .approve(path.into_inner(), payload.approver_id, at)
        .await?;

    Ok(HttpResponse::Ok().json(LeaveResponse::from(leave)))
}

/* =========================
Deny leave
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/deny",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to deny")
    ),
    request_body = DecideLeave,
    responses(
        (status = 200, description = "Leave denied", body = LeaveResponse),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already decided")
    ),
    tag = "Leave"
)]
pub async fn deny_leave(
    workflow: web::Data<LeaveWorkflow>,
    path: web::Path<u64>,
    payload: web::Json<DecideLeave>,
) -> AppResult<impl Responder> {
    let at = payload.at.unwrap_or_else(super::now);
    let leave = workflow
        .deny(path.into_inner(), payload.approver_id, at)
        .await?;

    Ok(HttpResponse::Ok().json(LeaveResponse::from(leave)))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveResponse),
        (status = 404, description = "Leave request not found")
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    workflow: web::Data<LeaveWorkflow>,
    path: web::Path<u64>,
) -> AppResult<impl Responder> {
    let leave = workflow.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(LeaveResponse::from(leave)))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveQuery),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse)
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    workflow: web::Data<LeaveWorkflow>,
    query: web::Query<LeaveQuery>,
) -> AppResult<impl Responder> {
    let page = Page::new(query.page, query.per_page);
    let filter = LeaveFilter {
        employee_id: query.employee_id,
        status: query.status,
        from: query.from,
        to: query.to,
    };

    let data: Vec<LeaveResponse> = workflow
        .list(filter, page.window())
        .map_ok(LeaveResponse::from)
        .try_collect()
        .await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page: page.page,
        per_page: page.per_page,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to remove")
    ),
    responses(
        (status = 204, description = "Leave request removed"),
        (status = 404, description = "Leave request not found")
    ),
    tag = "Leave"
)]
pub async fn delete_leave(
    workflow: web::Data<LeaveWorkflow>,
    path: web::Path<u64>,
) -> AppResult<impl Responder> {
    workflow.remove(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
