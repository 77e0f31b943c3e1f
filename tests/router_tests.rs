//! HTTP-level tests for the dispatch endpoint.
//!
//! Drives the axum router directly with `tower::ServiceExt::oneshot` and
//! asserts the transport contract: status codes per error kind and the
//! uniform `{ "msg": ... }` envelope.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use serde_json::{Value, json};
use tower::ServiceExt;

use certgate::Error;
use certgate::backend::CaBackend;
use certgate::gateway::{AppState, Dispatcher, TARGET_HEADER, create_router};
use certgate::operation::{ISSUE_PRIVATE_CA_CERTIFICATE, LIST_CERTIFICATE_AUTHORITIES};
use certgate::policy::{ConfigPolicyStore, ZoneConfig};

const MAX_BODY: usize = 1024 * 1024;

// ── stubs and helpers ─────────────────────────────────────────────────

struct StubBackend {
    calls: Mutex<usize>,
    result: certgate::Result<Value>,
}

impl StubBackend {
    fn ok(response: Value) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(0),
            result: Ok(response),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(0),
            result: Err(Error::Backend(message.to_owned())),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl CaBackend for StubBackend {
    async fn invoke(&self, _operation: &str, _payload: &[u8]) -> certgate::Result<Value> {
        *self.calls.lock().unwrap() += 1;
        match &self.result {
            Ok(value) => Ok(value.clone()),
            Err(Error::Backend(msg)) => Err(Error::Backend(msg.clone())),
            Err(_) => unreachable!("stub only fails with backend errors"),
        }
    }
}

fn router_with(backend: Arc<StubBackend>, allowed: &[&str]) -> axum::Router {
    let mut zones = HashMap::new();
    zones.insert(
        "Default".to_owned(),
        ZoneConfig {
            allowed_domains: allowed.iter().map(|d| (*d).to_owned()).collect(),
            allowed_key_algorithms: Vec::new(),
        },
    );
    let store = Arc::new(ConfigPolicyStore::from_zones(zones));
    let dispatcher = Arc::new(Dispatcher::new(store, backend));
    create_router(Arc::new(AppState { dispatcher }), MAX_BODY)
}

fn csr_base64(cn: &str) -> String {
    let mut params = CertificateParams::default();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, cn);
    params.distinguished_name = dn;
    let key = KeyPair::generate().unwrap();
    let csr = params.serialize_request(&key).unwrap();
    BASE64.encode(csr.der())
}

fn dispatch_request(operation: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(TARGET_HEADER, operation)
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), MAX_BODY)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ── health ────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let router = router_with(StubBackend::ok(json!({})), &[]);
    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok"}));
}

// ── dispatch key handling ─────────────────────────────────────────────

#[tokio::test]
async fn missing_target_header_is_method_not_allowed() {
    let backend = StubBackend::ok(json!({}));
    let router = router_with(backend.clone(), &[]);
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body = body_json(response).await;
    assert!(body["msg"].as_str().unwrap().contains("Unsupported operation"));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn unknown_operation_is_method_not_allowed() {
    let backend = StubBackend::ok(json!({}));
    let router = router_with(backend.clone(), &[]);
    let response = router
        .oneshot(dispatch_request("revoke-certificate", b"{}".to_vec()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(backend.calls(), 0);
}

// ── gated issuance over HTTP ──────────────────────────────────────────

#[tokio::test]
async fn allowed_issuance_relays_backend_response_with_200() {
    let backend_response = json!({"CertificateArn": "arn:aws:acm-pca:eu-west-1:1:certificate/ok"});
    let backend = StubBackend::ok(backend_response.clone());
    let router = router_with(backend.clone(), &["*.example.com"]);

    let body = serde_json::to_vec(&json!({
        "Csr": csr_base64("test.example.com"),
        "VenafiZone": "Default"
    }))
    .unwrap();

    let response = router
        .oneshot(dispatch_request(ISSUE_PRIVATE_CA_CERTIFICATE, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, backend_response);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn policy_violation_is_forbidden_with_reason_in_envelope() {
    let backend = StubBackend::ok(json!({}));
    let router = router_with(backend.clone(), &["*.other.com"]);

    let body = serde_json::to_vec(&json!({
        "Csr": csr_base64("test.example.com"),
        "VenafiZone": "Default"
    }))
    .unwrap();

    let response = router
        .oneshot(dispatch_request(ISSUE_PRIVATE_CA_CERTIFICATE, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert!(body["msg"].as_str().unwrap().contains("test.example.com"));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn undecodable_csr_is_unprocessable() {
    let backend = StubBackend::ok(json!({}));
    let router = router_with(backend.clone(), &[]);

    let body = br#"{"Csr":"not-base64!!","VenafiZone":"Default"}"#.to_vec();
    let response = router
        .oneshot(dispatch_request(ISSUE_PRIVATE_CA_CERTIFICATE, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["msg"].as_str().unwrap().contains("base64"));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn unknown_zone_is_failed_dependency() {
    let backend = StubBackend::ok(json!({}));
    let router = router_with(backend.clone(), &["*.example.com"]);

    let body = serde_json::to_vec(&json!({
        "Csr": csr_base64("test.example.com"),
        "VenafiZone": "Ghost"
    }))
    .unwrap();

    let response = router
        .oneshot(dispatch_request(ISSUE_PRIVATE_CA_CERTIFICATE, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FAILED_DEPENDENCY);
    assert_eq!(backend.calls(), 0);
}

// ── pass-through and backend failures ─────────────────────────────────

#[tokio::test]
async fn pass_through_relays_backend_json() {
    let listing = json!({"CertificateAuthorities": []});
    let backend = StubBackend::ok(listing.clone());
    let router = router_with(backend.clone(), &[]);

    let response = router
        .oneshot(dispatch_request(
            LIST_CERTIFICATE_AUTHORITIES,
            b"{}".to_vec(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, listing);
}

#[tokio::test]
async fn backend_failure_is_bad_gateway_with_message_passed_through() {
    let backend = StubBackend::failing("issuing CA is unavailable");
    let router = router_with(backend, &[]);

    let response = router
        .oneshot(dispatch_request(
            LIST_CERTIFICATE_AUTHORITIES,
            b"{}".to_vec(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert!(
        body["msg"]
            .as_str()
            .unwrap()
            .contains("issuing CA is unavailable")
    );
}
