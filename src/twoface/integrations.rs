//! Integrate twoface with other libraries, like Actix-web or Diesel.

use crate::twoface::{Cause, ExternalError, Fallible, TfError};
use actix_web::{
    error::BlockingError,
    http::{header, StatusCode},
    HttpResponse,
};
use anyhow::anyhow;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Serialize;
use tracing::error;

// Twoface errors can be used as Actix-web errors.
// If a handler returns a Twoface error, the external portion will be shown to the user.
// The internal portion will only be logged.
impl actix_web::ResponseError for TfError {
    fn status_code(&self) -> StatusCode {
        self.external.cause.into()
    }

    fn error_response(&self) -> HttpResponse {
        match self.external.cause {
            Cause::ServerError => error!("{:#}", self.internal),
            _ => tracing::info!(error = %self.internal, "rejected request"),
        }
        let resp = serde_json::to_string(&ErrBody {
            error: self.to_string(),
        })
        .unwrap_or_else(|e| {
            error!("Serde error: {}", e.to_string());
            "{\"error\": \"ServerError: internal server error\"}".to_owned()
        });
        HttpResponse::build(self.external.cause.into())
            .header(header::CONTENT_TYPE, "application/json")
            .body(resp)
    }
}

#[derive(Serialize)]
struct ErrBody {
    error: String,
}

/// Describe a Diesel error, turning constraint violations into the matching user-facing cause.
/// Anything else stays a server error.
pub fn describe_diesel(
    err: DieselError,
    on_unique: ExternalError,
    on_foreign_key: ExternalError,
) -> TfError {
    use crate::twoface::Describe;
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => err.describe(on_unique),
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            err.describe(on_foreign_key)
        }
        other => other.into(),
    }
}

/// Convenience extension used to extract errors from `web::block`.
pub trait BlockingResp<T> {
    /// Convert the return from a web::block into a normal `Fallible<T>`.
    fn to_resp(self) -> Fallible<T>;
}

impl<T, I: std::fmt::Debug + Into<TfError>> BlockingResp<T> for Result<T, BlockingError<I>> {
    fn to_resp(self) -> Fallible<T> {
        match self {
            Ok(t) => Ok(t),
            Err(BlockingError::Error(err)) => Err(err.into()),
            Err(BlockingError::Canceled) => Err(TfError {
                internal: anyhow!("DB operation cancelled"),
                external: ExternalError::default(),
            }),
        }
    }
}
