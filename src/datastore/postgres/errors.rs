use crate::twoface::{Fallible, TfError};
use actix_web::error::BlockingError;
use diesel::result::Error as DieselError;

type DbPoolErr = BlockingError<DieselError>;
pub type DbPoolResult<T> = Result<T, DbPoolErr>;

/// Name the storage operation that failed. Only the internal half of the error changes, so users
/// still see the same description.
pub trait During<T> {
    fn during(self, operation: &'static str) -> Fallible<T>;
}

impl<T, E: Into<TfError>> During<T> for Result<T, E> {
    fn during(self, operation: &'static str) -> Fallible<T> {
        self.map_err(|e| {
            let TfError { internal, external } = e.into();
            TfError {
                internal: internal.context(operation),
                external,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twoface::{BlockingResp, Cause};

    #[test]
    fn test_during_keeps_external_half() {
        let result: Result<(), DieselError> = Err(DieselError::NotFound);
        let err = result.during("failed to get posts").unwrap_err();
        assert_eq!(err.cause(), Cause::ServerError);
        assert_eq!(err.internal.to_string(), "failed to get posts");
        assert!(format!("{:#}", err.internal).starts_with("failed to get posts: "));
    }

    #[test]
    fn test_cancelled_block_is_a_server_error() {
        let result: DbPoolResult<()> = Err(BlockingError::Canceled);
        assert_eq!(result.to_resp().unwrap_err().cause(), Cause::ServerError);
    }
}
