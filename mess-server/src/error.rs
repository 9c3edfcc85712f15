//! Service-layer error type
//!
//! `ServiceError` bridges store errors and the API-facing `AppError`, so
//! handlers and the billing service can use `?` on both.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::db::StoreError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// - `Db`: storage/infrastructure failure (logged, mapped to a generic 500)
/// - `App`: business-rule error, passed through to the client as is
#[derive(Debug)]
pub enum ServiceError {
    Db(BoxError),
    App(AppError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Database(err) => ServiceError::Db(err.into()),
            StoreError::Conflict(msg) => {
                ServiceError::App(AppError::with_message(ErrorCode::PaymentConflict, msg))
            }
            StoreError::NotFound(what) => ServiceError::App(AppError::not_found(what)),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Billing store error");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn conflict_maps_to_409() {
        let err: AppError = ServiceError::from(StoreError::Conflict("taken".into())).into();
        assert_eq!(err.code, ErrorCode::PaymentConflict);
        assert_eq!(err.http_status(), StatusCode::CONFLICT);
    }

    #[test]
    fn database_error_is_not_leaked() {
        let err: AppError = ServiceError::from(StoreError::Database(sqlx::Error::PoolTimedOut)).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.message, ErrorCode::DatabaseError.message());
        assert_eq!(err.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn app_errors_pass_through() {
        let err: AppError = ServiceError::from(AppError::new(ErrorCode::BillNotFound)).into();
        assert_eq!(err.code, ErrorCode::BillNotFound);
    }
}
