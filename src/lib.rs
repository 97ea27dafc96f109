//! Tower middleware that guards HTTP requests with an adjustable response
//! deadline.
//!
//! [`RequestTimeoutLayer`] starts a timer for every request. If no response
//! has been produced when it fires, the request is flagged as timed out and
//! the response fails with a [`ResponseTimeoutError`]. Handlers reach the
//! per-request [`TimeoutHandle`] through the request extensions and may
//! clear, reset or extend their own deadline at any time.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use http::{Request, Response, StatusCode};
//! use http_body_util::Full;
//! use std::convert::Infallible;
//! use tower::{ServiceBuilder, ServiceExt};
//! use tower_request_timeout::{RequestTimeoutLayer, TimeoutHandle};
//!
//! async fn handle(request: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
//!     let timeout = request.extensions().get::<TimeoutHandle>().unwrap();
//!
//!     // This endpoint streams its response itself and manages its own deadline.
//!     timeout.clear_timeout();
//!
//!     Ok(Response::new(Full::default()))
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), tower_request_timeout::BoxError> {
//! let service = ServiceBuilder::new()
//!     // Fail requests that take longer than 30 seconds with `503 Service Unavailable`.
//!     .layer(RequestTimeoutLayer::try_new("30s")?)
//!     .service_fn(handle);
//!
//! let response = service.oneshot(Request::new(Full::default())).await?;
//! assert_eq!(response.status(), StatusCode::OK);
//! # Ok(())
//! # }
//! ```
//!
//! # Feature flags
//!
//! - `util`: adds `ServiceBuilderExt`, which adds `request_timeout` to
//!   `tower::ServiceBuilder`.

#![warn(
    clippy::all,
    clippy::dbg_macro,
    clippy::todo,
    clippy::empty_enum,
    clippy::enum_glob_use,
    clippy::mem_forget,
    clippy::unused_self,
    clippy::filter_map_next,
    clippy::needless_continue,
    clippy::needless_borrow,
    clippy::match_wildcard_for_single_variants,
    clippy::if_let_mutex,
    clippy::await_holding_lock,
    clippy::imprecise_flops,
    clippy::suboptimal_flops,
    clippy::lossy_float_literal,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::fn_params_excessive_bools,
    clippy::exit,
    clippy::inefficient_to_string,
    clippy::linkedlist,
    clippy::macro_use_imports,
    clippy::option_option,
    clippy::verbose_file_reads,
    clippy::unnested_or_patterns,
    rust_2018_idioms,
    future_incompatible,
    nonstandard_style,
    missing_docs,
    missing_debug_implementations
)]
#![deny(unreachable_pub)]
#![allow(elided_lifetimes_in_paths, clippy::type_complexity)]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(test, allow(clippy::float_cmp))]

#[macro_use]
pub(crate) mod macros;

pub mod duration;
pub mod request_timeout;
pub mod timer;

#[cfg(feature = "util")]
mod builder;

#[cfg(test)]
mod test_helpers;

#[doc(inline)]
pub use self::{
    duration::{parse_duration, IntoDelay, ParseDurationError, DEFAULT_TIMEOUT},
    request_timeout::{
        RequestTimeout, RequestTimeoutLayer, ResponseTimeoutError, TimeoutGuardBody,
        TimeoutHandle,
    },
    timer::{Timer, TimerHandle, TokioTimer},
};

#[cfg(feature = "util")]
#[cfg_attr(docsrs, doc(cfg(feature = "util")))]
#[doc(inline)]
pub use self::builder::ServiceBuilderExt;

/// Alias for a type-erased error type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

mod sealed {
    #[allow(unreachable_pub, unused)]
    pub trait Sealed<T> {}
}
