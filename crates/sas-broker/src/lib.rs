//! Shared Access Signature Broker
//!
//! `sas-broker` issues short-lived, narrowly scoped access tokens for blob,
//! table and queue storage. A client never sees the account key: it asks the
//! broker for a signed URI covering one resource and a set of rights, then
//! talks to storage directly.
//!
//! # Architecture
//!
//! - [`ResourceRequestManager`] is the entry point. It resolves the resource
//!   type, validates the request, resolves the connection string and asks the
//!   matching broker for a token.
//! - [`ResourceTypeRegistry`] maps case-insensitive type tokens to brokers.
//! - [`broker`] holds one [`ResourceBroker`] per storage kind.
//! - [`codec`] converts between permission letters and [`PermissionSet`]s.
//! - [`signer`] computes the signature. [`SharedKeySigner`] signs with the
//!   account key from the connection string.
//! - [`settings`] and [`config`] hold connection strings and tunables, both
//!   with hot-reload providers.
//!
//! # Example
//!
//! ```
//! use sas_broker::{ConnectionSettings, CredentialSource, ResourceRequestManager};
//! use serde_json::json;
//!
//! let settings: ConnectionSettings = [(
//!     "ResourceBrokerStorageConnectionString",
//!     "DefaultEndpointsProtocol=https;AccountName=test;AccountKey=a2V5",
//! )]
//! .into_iter()
//! .collect();
//!
//! let manager = ResourceRequestManager::default();
//! let token = manager
//!     .generate(
//!         "blob",
//!         &json!({"container": "photos", "name": "cat.png", "permissions": "rw"}),
//!         CredentialSource::Settings(&settings),
//!     )
//!     .unwrap();
//!
//! assert_eq!(token.resource_uri(), "https://test.blob.core.windows.net/photos/cat.png");
//! assert_eq!(token.query_param("sp"), Some("rw"));
//! ```
//!
//! # Security
//!
//! Tokens are bearer credentials. The broker does not authenticate callers;
//! put it behind whatever authentication your host already has, and use the
//! access hook of the HTTP host to restrict who may ask for what.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(
    clippy::bool_assert_comparison,  // I don't like `assert!(!expression)`. It's very misleading.
    clippy::multiple_crate_versions, // Sometimes not fixable
    clippy::module_name_repetitions,
    clippy::single_match_else,
    clippy::wildcard_imports,
    clippy::let_underscore_untyped,
)]

#[macro_use]
mod error;

mod manager;
mod registry;
mod token;

pub mod account;
pub mod broker;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod kind;
pub mod params;
pub mod permission;
pub mod settings;
pub mod signer;
pub mod timestamp;

pub use self::error::*;

pub use self::broker::ResourceBroker;
pub use self::kind::ResourceKind;
pub use self::manager::{CredentialSource, ResourceRequestManager, ValidatedRequest};
pub use self::params::{BlobRequest, DefaultRequest, ResourceParameters};
pub use self::permission::{AllowedPermissions, PermissionSet};
pub use self::registry::ResourceTypeRegistry;
pub use self::settings::{ConnectionSettings, StorageCredentialResolver};
pub use self::signer::{AccessSigner, SharedKeySigner};
pub use self::token::ResourceToken;
