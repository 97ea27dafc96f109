use http::{Response, StatusCode};
use std::{fmt, time::Duration};

/// Error produced by [`RequestTimeout`] when no response was produced before
/// the deadline.
///
/// It is returned boxed as a [`BoxError`]. Error handlers can get at it with
/// `err.downcast_ref::<ResponseTimeoutError>()`.
///
/// [`RequestTimeout`]: crate::RequestTimeout
/// [`BoxError`]: crate::BoxError
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseTimeoutError {
    timeout: Duration,
}

impl ResponseTimeoutError {
    const CODE: &'static str = "ETIMEDOUT";

    pub(crate) fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Always `503 Service Unavailable`.
    pub fn status(&self) -> StatusCode {
        StatusCode::SERVICE_UNAVAILABLE
    }

    /// Machine readable error code, always `"ETIMEDOUT"`.
    pub fn code(&self) -> &'static str {
        Self::CODE
    }

    /// The delay that was in force when the deadline was hit.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build the response a server would send for this error.
    pub fn to_response<B>(&self) -> Response<B>
    where
        B: From<&'static str>,
    {
        let mut res = Response::new(B::from("Response timeout"));
        *res.status_mut() = self.status();
        res
    }
}

impl fmt::Display for ResponseTimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Response timeout")
    }
}

impl std::error::Error for ResponseTimeoutError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_timeout() {
        let err = ResponseTimeoutError::new(Duration::from_millis(100));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code(), "ETIMEDOUT");
        assert_eq!(err.timeout(), Duration::from_millis(100));
        assert_eq!(err.to_string(), "Response timeout");
    }

    #[test]
    fn converts_to_response() {
        let res = ResponseTimeoutError::new(Duration::from_secs(1)).to_response::<String>();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(res.body(), "Response timeout");
    }
}
