use super::RequestTimeout;
use crate::{
    duration::{or_default, IntoDelay, ParseDurationError, DEFAULT_TIMEOUT},
    timer::{Timer, TokioTimer},
};
use std::{str::FromStr, sync::Arc, time::Duration};
use tower_layer::Layer;

/// Layer that applies the [`RequestTimeout`] middleware.
///
/// See the [module docs](crate::request_timeout) for an example.
#[derive(Debug, Clone)]
pub struct RequestTimeoutLayer {
    timeout: Duration,
    respond: bool,
    timer: Arc<dyn Timer>,
}

impl RequestTimeoutLayer {
    /// Create a new `RequestTimeoutLayer` with the given deadline.
    ///
    /// A zero `timeout` means "not given" and is replaced with
    /// [`DEFAULT_TIMEOUT`].
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout: or_default(timeout),
            respond: true,
            timer: Arc::new(TokioTimer::new()),
        }
    }

    /// Create a new `RequestTimeoutLayer` from anything that resolves to a
    /// delay, such as a number of milliseconds or a string like `"5s"`.
    ///
    /// Fails if `delay` is a string that isn't a valid duration.
    pub fn try_new<D>(delay: D) -> Result<Self, ParseDurationError>
    where
        D: IntoDelay,
    {
        let timeout = delay.into_delay()?;
        Ok(Self {
            timeout,
            ..Self::default()
        })
    }

    /// Whether hitting the deadline fails the response with a
    /// [`ResponseTimeoutError`]. Defaults to `true`.
    ///
    /// When disabled, the request is only marked as timed out and the
    /// handler is expected to check [`TimeoutHandle::timed_out`] itself.
    ///
    /// [`ResponseTimeoutError`]: crate::ResponseTimeoutError
    /// [`TimeoutHandle::timed_out`]: crate::TimeoutHandle::timed_out
    pub fn respond(mut self, respond: bool) -> Self {
        self.respond = respond;
        self
    }

    /// Use `timer` to schedule deadlines instead of [`TokioTimer`].
    pub fn timer<T>(mut self, timer: T) -> Self
    where
        T: Timer,
    {
        self.timer = Arc::new(timer);
        self
    }

    /// The deadline applied to every request.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for RequestTimeoutLayer {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl FromStr for RequestTimeoutLayer {
    type Err = ParseDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_new(s)
    }
}

impl<S> Layer<S> for RequestTimeoutLayer {
    type Service = RequestTimeout<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestTimeout {
            inner,
            timeout: self.timeout,
            respond: self.respond,
            timer: self.timer.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let layer = RequestTimeoutLayer::default();
        assert_eq!(layer.timeout(), Duration::from_millis(5000));
        assert!(layer.respond);
    }

    #[test]
    fn zero_means_default() {
        assert_eq!(RequestTimeoutLayer::new(Duration::ZERO).timeout(), DEFAULT_TIMEOUT);
        assert_eq!(RequestTimeoutLayer::try_new(0u64).unwrap().timeout(), DEFAULT_TIMEOUT);
        assert_eq!(RequestTimeoutLayer::try_new(None::<&str>).unwrap().timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn plain_numbers_are_milliseconds() {
        assert_eq!(RequestTimeoutLayer::try_new(100).unwrap().timeout(), Duration::from_millis(100));
        assert_eq!(RequestTimeoutLayer::try_new(0).unwrap().timeout(), DEFAULT_TIMEOUT);
        assert_eq!(RequestTimeoutLayer::try_new(-5).unwrap().timeout(), Duration::ZERO);
        assert_eq!(RequestTimeoutLayer::try_new(1.5e3).unwrap().timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn parses_strings() {
        let layer: RequestTimeoutLayer = "1s".parse().unwrap();
        assert_eq!(layer.timeout(), Duration::from_secs(1));

        let layer = RequestTimeoutLayer::try_new(String::from("2 minutes")).unwrap();
        assert_eq!(layer.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn invalid_strings_fail_at_configuration() {
        let err = RequestTimeoutLayer::try_new("eventually").unwrap_err();
        assert_eq!(err.input(), "eventually");
        assert!("".parse::<RequestTimeoutLayer>().is_err());
    }

    #[test]
    fn respond_can_be_disabled() {
        let layer = RequestTimeoutLayer::try_new(100).unwrap().respond(false);
        assert!(!layer.respond);
        assert_eq!(layer.timeout(), Duration::from_millis(100));
    }
}
