//! Router and builder

use crate::access::{AllowAll, BrokerAccess, BrokerAccessContext};
use crate::error::ApiError;

use sas_broker::settings::SettingsProvider;
use sas_broker::{BrokerError, BrokerErrorCode, CredentialSource, ResourceRequestManager, ResourceToken};

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use http::HeaderMap;
use serde_json::Value;
use tracing::{debug, info};

/// Path under which token requests are served. The resource type follows.
pub const RESOURCE_ROUTE: &str = "/api/resources/{type}";

/// Builder for the broker [`Router`].
///
/// ```
/// use sas_broker::ResourceRequestManager;
/// use sas_broker::settings::StaticSettingsProvider;
/// use sas_broker_server::BrokerServiceBuilder;
///
/// let router = BrokerServiceBuilder::new(ResourceRequestManager::default(), StaticSettingsProvider::default()).build();
/// # let _: axum::Router = router;
/// ```
pub struct BrokerServiceBuilder {
    manager: ResourceRequestManager,
    settings: Arc<dyn SettingsProvider>,
    access: Option<Arc<dyn BrokerAccess>>,
}

impl BrokerServiceBuilder {
    #[must_use]
    pub fn new(manager: ResourceRequestManager, settings: impl SettingsProvider) -> Self {
        Self {
            manager,
            settings: Arc::new(settings),
            access: None,
        }
    }

    /// Uses an already shared settings provider, e.g. one the host reloads.
    #[must_use]
    pub fn with_shared_settings(manager: ResourceRequestManager, settings: Arc<dyn SettingsProvider>) -> Self {
        Self {
            manager,
            settings,
            access: None,
        }
    }

    pub fn set_access(&mut self, access: impl BrokerAccess) {
        self.access = Some(Arc::new(access));
    }

    #[must_use]
    pub fn build(self) -> Router {
        let state = AppState {
            manager: self.manager,
            settings: self.settings,
            access: self.access.unwrap_or_else(|| Arc::new(AllowAll)),
        };
        Router::new()
            .route("/health", get(health_check))
            .route(RESOURCE_ROUTE, post(request_token))
            .with_state(state)
    }
}

#[derive(Clone)]
struct AppState {
    manager: ResourceRequestManager,
    settings: Arc<dyn SettingsProvider>,
    access: Arc<dyn BrokerAccess>,
}

async fn health_check() -> &'static str {
    "OK"
}

async fn request_token(
    State(state): State<AppState>,
    Path(resource_type): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ResourceToken>, ApiError> {
    // The path segment comes from the caller, so a blank one is their fault.
    if resource_type.trim().is_empty() {
        let err = BrokerError::with_message(BrokerErrorCode::UnknownResourceType, "resource type must not be blank");
        return Err(err.into());
    }
    let raw = parse_body(&body)?;

    let request = state.manager.validate(&resource_type, &raw)?;

    let mut cx = BrokerAccessContext {
        kind: request.kind(),
        parameters: request.parameters(),
        headers: &headers,
    };
    state.access.check(&mut cx).await?;
    debug!(kind = %request.kind(), "access granted");

    let settings = state.settings.snapshot();
    let token = state.manager.issue(&request, CredentialSource::Settings(&settings))?;
    info!(kind = %request.kind(), name = %request.parameters().name, "token issued");

    Ok(Json(token))
}

/// The body must be a JSON document other than `null`.
fn parse_body(body: &[u8]) -> Result<Value, ApiError> {
    let raw: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(body).map_err(ApiError::MalformedBody)?
    };
    if raw.is_null() {
        return Err(BrokerError::with_message(BrokerErrorCode::MissingParameter, "request body is required").into());
    }
    Ok(raw)
}
