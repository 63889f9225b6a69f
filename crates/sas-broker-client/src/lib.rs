//! Client for `sas-broker`
//!
//! [`BrokerClient`] asks a broker host for tokens, and [`upload_blob`] uses a
//! blob token to store data directly in storage.
//!
//! ```no_run
//! use sas_broker_client::{BrokerClient, ReqwestTransport};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), sas_broker_client::ClientError> {
//! let client = BrokerClient::new("https://app.example.com/", Arc::new(ReqwestTransport::default()))?;
//! let uri = client.upload_file("photos", "cat.png", "image/png", bytes::Bytes::from_static(b"...")).await?;
//! println!("stored at {uri}");
//! # Ok(())
//! # }
//! ```

#![allow(
    clippy::multiple_crate_versions, // Sometimes not fixable
    clippy::module_name_repetitions,
)]

mod client;
mod error;
mod transport;

pub use self::client::{BrokerClient, UPLOAD_TOKEN_LIFETIME, upload_blob};
pub use self::error::{ClientError, StdError, TransportError};
pub use self::transport::{HttpTransport, ReqwestTransport};
