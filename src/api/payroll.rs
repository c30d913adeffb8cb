use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppResult;
use crate::model::payroll::PayrollRecord;
use crate::service::PayrollGenerator;
use crate::utils::pagination::Page;

#[derive(Deserialize, ToSchema)]
pub struct GeneratePayroll {
    #[schema(example = 7)]
    pub employee_id: u64,

    #[schema(example = "2024-01-01")]
    pub period_start: NaiveDate,

    #[schema(example = "2024-01-31")]
    pub period_end: NaiveDate,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct PayrollResponse {
    pub id: u64,
    pub employee_id: u64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,

    #[schema(example = 9600)]
    pub minutes_worked: u64,
    pub days_attended: u32,
    pub late_days: u32,
    pub absent_days: u32,
    pub paid_leave_days: u32,
    pub unpaid_leave_days: u32,

    /// Gross pay in cents
    #[schema(example = 240000)]
    pub gross_pay_cents: i64,
}

impl From<PayrollRecord> for PayrollResponse {
    fn from(p: PayrollRecord) -> Self {
        Self {
            id: p.id,
            employee_id: p.employee_id,
            period_start: p.period_start,
            period_end: p.period_end,
            minutes_worked: p.minutes_worked,
            days_attended: p.days_attended,
            late_days: p.late_days,
            absent_days: p.absent_days,
            paid_leave_days: p.paid_leave_days,
            unpaid_leave_days: p.unpaid_leave_days,
            gross_pay_cents: p.gross_pay_cents,
        }
    }
}

#[derive(Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PayrollQuery {
    #[schema(example = 1)]
    pub page: Option<u64>,

    #[schema(example = 10)]
    pub per_page: Option<u64>,

    #[schema(example = 7)]
    pub employee_id: Option<u64>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct PaginatedPayrollResponse {
    pub data: Vec<PayrollResponse>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

#[utoipa::path(
    post,
    path = "/api/v1/payroll/generate",
    request_body = GeneratePayroll,
    responses(
        (status = 200, description = "Payroll generated (or regenerated)", body = PayrollResponse),
        (status = 400, description = "period_end before period_start"),
        (status = 422, description = "Open attendance inside the period", body = Object, example = json!({
            "message": "attendance 12 in the period is still open"
        }))
    ),
    tag = "Payroll"
)]
pub async fn generate_payroll(
    generator: web::Data<PayrollGenerator>,
    payload: web::Json<GeneratePayroll>,
) -> AppResult<impl Responder> {
    let record = generator
        .generate_for_period(payload.employee_id, payload.period_start, payload.period_end)
        .await?;

    Ok(HttpResponse::Ok().json(PayrollResponse::from(record)))
}

#[utoipa::path(
    get,
    path = "/api/v1/payroll/{payroll_id}",
    params(
        ("payroll_id" = u64, Path, description = "Payroll ID")
    ),
    responses(
        (status = 200, body = PayrollResponse),
        (status = 404)
    ),
    tag = "Payroll"
)]
pub async fn get_payroll(
    generator: web::Data<PayrollGenerator>,
    path: web::Path<u64>,
) -> AppResult<impl Responder> {
    let record = generator.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PayrollResponse::from(record)))
}

#[utoipa::path(
    get,
    path = "/api/v1/payroll",
    params(PayrollQuery),
    responses(
        (status = 200, body = PaginatedPayrollResponse)
    ),
    tag = "Payroll"
)]
pub async fn list_payrolls(
    generator: web::Data<PayrollGenerator>,
    query: web::Query<PayrollQuery>,
) -> AppResult<impl Responder> {
    let page = Page::new(query.page, query.per_page);

    let total = generator.count(query.employee_id).await?;
    let data = generator
        .list(query.employee_id, page.window())
        .await?
        .into_iter()
        .map(PayrollResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(PaginatedPayrollResponse {
        data,
        page: page.page,
        per_page: page.per_page,
        total,
    }))
}
