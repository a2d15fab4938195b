//! Convenience methods to turn any error (from any library) into twoface errors.
use crate::twoface::{ExternalError, TfError};
use anyhow::anyhow;

pub trait Describe {
    /// Convert an error into a twoface::Error by describing it to your users.
    fn describe(self, external: ExternalError) -> TfError;
}

impl<Internal: Into<anyhow::Error>> Describe for Internal {
    fn describe(self, external: ExternalError) -> TfError {
        TfError {
            internal: self.into(),
            external,
        }
    }
}

/// Any regular internal error can be turned into a twoface Error, using the default external error.
/// If you want to give an internal error a custom external error, use `internal.describe(ExternalError)`
impl<Internal: Into<anyhow::Error>> From<Internal> for TfError {
    fn from(internal: Internal) -> TfError {
        internal.describe(Default::default())
    }
}

impl From<ExternalError> for TfError {
    /// For failures that have no underlying library error, e.g. a rejected filter value.
    /// The internal half repeats the external text so it still shows up in logs.
    fn from(external: ExternalError) -> TfError {
        TfError {
            internal: anyhow!("{}", external),
            external,
        }
    }
}

pub trait DescribeErr<T> {
    /// Convert a result's error into a twoface::Error by describing it to your users.
    /// ```rust,ignore
    /// // These two are equivalent:
    /// let result: Result<i32, _> = Err(private_err).map_err(|e| e.describe(external));
    /// let result: Result<i32, _> = Err(private_err).describe_err(external);
    /// ```
    fn describe_err(self, external: ExternalError) -> Result<T, TfError>;
}

impl<T, E> DescribeErr<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn describe_err(self, external: ExternalError) -> Result<T, TfError> {
        self.map_err(|e| e.describe(external))
    }
}
