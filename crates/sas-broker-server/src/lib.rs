//! HTTP host for `sas-broker`
//!
//! Serves `POST /api/resources/{type}` with a JSON request body and answers
//! with `{"uri": ...}`. Errors carry `{"code", "message"}` and the status of
//! the underlying [`sas_broker::BrokerError`]. Messages of server-side
//! failures are logged and replaced by a generic text.
//!
//! `GET /health` answers `OK`.

#![allow(
    clippy::bool_assert_comparison, // I don't like `assert!(!expression)`. It's very misleading.
    clippy::multiple_crate_versions, // Sometimes not fixable
    clippy::module_name_repetitions,
)]

pub mod access;

mod error;
mod service;

pub use self::error::ApiError;
pub use self::service::{BrokerServiceBuilder, RESOURCE_ROUTE};
