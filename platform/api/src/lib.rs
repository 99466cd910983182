use std::sync::Arc;

use async_graphql::{Error, ErrorExtensions};
use products_hr::HrError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Shared GraphQL result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error, Clone)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    LimitExceeded(String),
    #[error("{0}")]
    InsufficientBalance(String),
    #[error("{0}")]
    InvalidTransition(String),
    #[error("internal server error")]
    Internal(Arc<anyhow::Error>),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated => "UNAUTHENTICATED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Validation(_) => "VALIDATION",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::LimitExceeded(_) => "LIMIT_EXCEEDED",
            ApiError::InsufficientBalance(_) => "INSUFFICIENT_BALANCE",
            ApiError::InvalidTransition(_) => "INVALID_TRANSITION",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self::Internal(Arc::new(err))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::internal(value)
    }
}

impl From<HrError> for ApiError {
    fn from(value: HrError) -> Self {
        let message = value.to_string();
        match value {
            HrError::InsufficientLeaveBalance { .. } => ApiError::InsufficientBalance(message),
            HrError::InvalidTransition { .. } => ApiError::InvalidTransition(message),
            HrError::InvalidDateRange { .. }
            | HrError::OutOfRange { .. }
            | HrError::NegativeNetPay { .. }
            | HrError::TreeCycle(_)
            | HrError::MissingTemplateVariable(_)
            | HrError::Validation(_) => ApiError::Validation(message),
        }
    }
}

impl From<DbErr> for ApiError {
    fn from(value: DbErr) -> Self {
        match value.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                tracing::debug!(%detail, "unique constraint violated");
                ApiError::Conflict("a record with the same key already exists".into())
            }
            _ => {
                tracing::error!(error = %value, "database error");
                ApiError::internal(value.into())
            }
        }
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> Error {
        Error::new(self.to_string()).extend_with(|_err, e| {
            e.set("code", self.code());
        })
    }
}

/// Lift domain and database failures into coded GraphQL errors.
pub trait ResultExt<T> {
    fn api(self) -> async_graphql::Result<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<ApiError>,
{
    fn api(self) -> async_graphql::Result<T> {
        self.map_err(|err| Into::<ApiError>::into(err).extend())
    }
}

/// Convert any error into a GraphQL error payload while hiding internals.
pub fn internal_error(err: impl Into<anyhow::Error>) -> Error {
    ApiError::internal(err.into()).extend()
}
