use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Failures of the attendance, leave and payroll lifecycle.
///
/// Everything except `Database` and `Corrupt` is a local validation or
/// state-conflict error and is returned to the caller as a 4xx.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("end date {end} is before start date {start}")]
    InvalidRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("check-out {check_out} is before check-in {check_in}")]
    InvalidOrder {
        check_in: chrono::NaiveDateTime,
        check_out: chrono::NaiveDateTime,
    },

    #[error("employee {employee_id} is already checked in")]
    AlreadyCheckedIn { employee_id: u64 },

    #[error("attendance {id} is already checked out")]
    AlreadyCheckedOut { id: u64 },

    #[error("leave request {id} has already been decided")]
    AlreadyDecided { id: u64 },

    #[error("attendance {open_record_id} in the period is still open")]
    IncompleteData { open_record_id: u64 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt stored value: {0}")]
    Corrupt(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::InvalidRange { .. } | AppError::InvalidOrder { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::AlreadyCheckedIn { .. }
            | AppError::AlreadyCheckedOut { .. }
            | AppError::AlreadyDecided { .. } => StatusCode::CONFLICT,
            AppError::IncompleteData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(_) | AppError::Corrupt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        // internals stay in the log
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(json!({ "message": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_map_to_409() {
        for err in [
            AppError::AlreadyCheckedIn { employee_id: 3 },
            AppError::AlreadyCheckedOut { id: 1 },
            AppError::AlreadyDecided { id: 1 },
        ] {
            assert_eq!(err.status_code(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn storage_failures_hide_details() {
        let err = AppError::Corrupt("status 'bogus'".into());
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn incomplete_period_is_unprocessable() {
        let err = AppError::IncompleteData { open_record_id: 9 };
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "attendance 9 in the period is still open");
    }
}
