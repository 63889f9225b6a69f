use sas_broker::settings::{HotReloadSettingsProvider, SettingsProvider, StaticSettingsProvider};
use sas_broker::{ConnectionSettings, PermissionSet, ResourceKind, ResourceRequestManager, ResourceToken};
use sas_broker_server::BrokerServiceBuilder;
use sas_broker_server::access::{AccessDenied, BrokerAccess, BrokerAccessContext};

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

const CONN: &str = "DefaultEndpointsProtocol=https;AccountName=test;AccountKey=3w1OwI/N6dqvmN0Iaa0/y6zlqL81H42K/mfIbIIKeFQkNpHSNvOcnWpucvrX5rbKGm+WKEUxaOZikeTMWpXfxA==";

fn settings() -> ConnectionSettings {
    [("ResourceBrokerStorageConnectionString", CONN)].into_iter().collect()
}

fn router() -> Router {
    BrokerServiceBuilder::new(ResourceRequestManager::default(), StaticSettingsProvider::new(Arc::new(settings()))).build()
}

fn post(path: &str, body: impl Into<Body>) -> Request<Body> {
    Request::post(path)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn send(router: Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = router.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn health() {
    let res = router()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn issues_blob_token() {
    let body = json!({"container": "photos", "name": "cat.png", "permissions": "rw"}).to_string();
    let (status, body) = send(router(), post("/api/resources/Blob", body)).await;
    assert_eq!(status, StatusCode::OK);

    let token: ResourceToken = serde_json::from_value(body).unwrap();
    assert_eq!(token.resource_uri(), "https://test.blob.core.windows.net/photos/cat.png");
    assert_eq!(token.query_param("sp"), Some("rw"));
}

#[tokio::test]
async fn input_errors_are_bad_requests() {
    let cases = [
        ("/api/resources/file", json!({"name": "x"}).to_string(), "UnknownResourceType"),
        (
            "/api/resources/%20",
            json!({"name": "q", "permissions": "r"}).to_string(),
            "UnknownResourceType",
        ),
        (
            "/api/resources/queue",
            json!({"name": "q", "permissions": "r", "expiry": "9999-12-31T23:59:59-01:00"}).to_string(),
            "InvalidExpiry",
        ),
        (
            "/api/resources/blob",
            json!({"container": "c", "name": "b", "permissions": "rd"}).to_string(),
            "InvalidPermissionString",
        ),
        ("/api/resources/queue", json!({"permissions": "r"}).to_string(), "MissingParameter"),
        ("/api/resources/queue", "{not json".to_owned(), "InvalidParameter"),
        ("/api/resources/queue", String::new(), "MissingParameter"),
        ("/api/resources/queue", "null".to_owned(), "MissingParameter"),
    ];
    for (path, body, code) in cases {
        let (status, body) = send(router(), post(path, body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path} {code}");
        assert_eq!(body["code"], code);
        assert!(body["message"].is_string());
    }
}

#[tokio::test]
async fn configuration_errors_hide_details() {
    let router = BrokerServiceBuilder::new(ResourceRequestManager::default(), StaticSettingsProvider::default()).build();
    let (status, body) = send(router, post("/api/resources/table", json!({"name": "t", "permissions": "r"}).to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "ConfigurationMissing");
    assert!(!body["message"].as_str().unwrap().contains("ResourceBroker"));
}

#[tokio::test]
async fn settings_reload_without_restart() {
    let provider = Arc::new(HotReloadSettingsProvider::default());
    let router = BrokerServiceBuilder::with_shared_settings(
        ResourceRequestManager::default(),
        Arc::clone(&provider) as Arc<dyn SettingsProvider>,
    )
    .build();
    let body = json!({"name": "jobs", "permissions": "p"}).to_string();

    let (status, _) = send(router.clone(), post("/api/resources/queue", body.clone())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    provider.update(Arc::new(settings()));
    let (status, body) = send(router, post("/api/resources/queue", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["uri"].as_str().unwrap().split('?').next(), Some("https://test.queue.core.windows.net/jobs"));
}

struct ReadOnlyTablesForGuests;

#[async_trait::async_trait]
impl BrokerAccess for ReadOnlyTablesForGuests {
    async fn check(&self, cx: &mut BrokerAccessContext<'_>) -> Result<(), AccessDenied> {
        let is_guest = cx.headers().get("x-user").is_none_or(|v| v == "guest");
        if is_guest && cx.kind() == ResourceKind::Table && cx.parameters().permissions != PermissionSet::READ {
            return Err(AccessDenied::new("guests may only read tables"));
        }
        Ok(())
    }
}

#[tokio::test]
async fn access_hook_can_deny() {
    let router = {
        let mut builder =
            BrokerServiceBuilder::new(ResourceRequestManager::default(), StaticSettingsProvider::new(Arc::new(settings())));
        builder.set_access(ReadOnlyTablesForGuests);
        builder.build()
    };
    let write = json!({"name": "orders", "permissions": "raud"}).to_string();

    let (status, body) = send(router.clone(), post("/api/resources/table", write.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "AccessDenied");
    assert_eq!(body["message"], "guests may only read tables");

    let req = Request::post("/api/resources/table")
        .header("x-user", "alice")
        .body(Body::from(write))
        .unwrap();
    let (status, _) = send(router.clone(), req).await;
    assert_eq!(status, StatusCode::OK);

    let read = json!({"name": "orders", "permissions": "r"}).to_string();
    let (status, _) = send(router, post("/api/resources/table", read)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn invalid_requests_never_reach_access_hook() {
    struct DenyAll;

    #[async_trait::async_trait]
    impl BrokerAccess for DenyAll {
        async fn check(&self, _: &mut BrokerAccessContext<'_>) -> Result<(), AccessDenied> {
            Err(AccessDenied::new("no"))
        }
    }

    let router = {
        let mut builder =
            BrokerServiceBuilder::new(ResourceRequestManager::default(), StaticSettingsProvider::new(Arc::new(settings())));
        builder.set_access(DenyAll);
        builder.build()
    };
    let (status, body) = send(router, post("/api/resources/queue", json!({"name": "q", "permissions": "x"}).to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "InvalidPermissionString");
}
