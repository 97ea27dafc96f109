//! Middleware that fails or flags requests that don't produce a response in
//! time.
//!
//! A timer is started for every request as it enters [`RequestTimeout`]. If
//! the inner service hasn't produced a response by the deadline, the request
//! is marked as timed out and, unless disabled with
//! [`RequestTimeoutLayer::respond`], the response future fails with a
//! [`ResponseTimeoutError`] (`503 Service Unavailable`, code `ETIMEDOUT`).
//!
//! The timer is cancelled as soon as the inner service produces a response,
//! and again once the response body has been sent or dropped.
//!
//! Handlers find a [`TimeoutHandle`] in the request extensions and can use it
//! to inspect, clear, reset or extend the deadline of their request.
//!
//! Unlike `tower::timeout::Timeout`, the deadline is not fixed when the
//! middleware is built.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use http::{Request, Response, StatusCode};
//! use http_body_util::Full;
//! use std::{convert::Infallible, time::Duration};
//! use tower::{ServiceBuilder, ServiceExt};
//! use tower_request_timeout::{RequestTimeoutLayer, ResponseTimeoutError, TimeoutHandle};
//!
//! async fn handle(request: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
//!     let timeout = request.extensions().get::<TimeoutHandle>().unwrap().clone();
//!
//!     if request.uri().path() == "/report" {
//!         // Reports are slow, give them another 10 seconds on top of what's left.
//!         timeout.add_timeout(Duration::from_secs(10));
//!     }
//!     tokio::time::sleep(Duration::from_secs(12)).await;
//!
//!     Ok(Response::new(Full::new(Bytes::from_static(b"done"))))
//! }
//!
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() -> Result<(), tower_request_timeout::BoxError> {
//! let service = ServiceBuilder::new()
//!     .layer(RequestTimeoutLayer::try_new("5s")?)
//!     .service_fn(handle);
//!
//! let request = Request::get("/report").body(Full::default())?;
//! let response = service.clone().oneshot(request).await?;
//! assert_eq!(response.status(), StatusCode::OK);
//!
//! let request = Request::get("/").body(Full::default())?;
//! let err = service.oneshot(request).await.unwrap_err();
//! let err = err.downcast_ref::<ResponseTimeoutError>().unwrap();
//! assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
//! assert_eq!(err.timeout(), Duration::from_secs(5));
//! # Ok(())
//! # }
//! ```

mod body;
mod error;
mod future;
mod guard;
mod handle;
mod layer;
mod service;


pub use self::{
    body::TimeoutGuardBody, error::ResponseTimeoutError, future::ResponseFuture,
    handle::TimeoutHandle, layer::RequestTimeoutLayer, service::RequestTimeout,
};
