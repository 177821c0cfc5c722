//! End-to-end HTTP tests over in-memory stores.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use bizhub_api::{AppState, build_router};
use bizhub_auth::{
    AccessAdmin, AuditRecorder, AuthGateway, MemoryRateLimiter, PasswordHasher,
    PermissionResolver, RevocationStore, SessionRegistry, TokenCodec,
};
use bizhub_cache::CacheManager;
use bizhub_cache::memory::MemoryCacheProvider;
use bizhub_core::config::{AuthConfig, MemoryCacheConfig, ServerConfig};
use bizhub_core::error::AppError;
use bizhub_core::traits::SystemClock;
use bizhub_database::{MemoryAuditSink, MemoryDirectory, MemorySessionStore};
use bizhub_entity::business::Business;

#[derive(Debug)]
struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, AppError> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        Ok(hash == format!("plain:{password}"))
    }
}

struct TestApp {
    router: Router,
    directory: Arc<MemoryDirectory>,
}

impl TestApp {
    /// An app that sits behind a trusted proxy.
    fn new() -> Self {
        Self::with_server(ServerConfig {
            trust_forwarded_headers: true,
            ..ServerConfig::default()
        })
    }

    fn with_server(server: ServerConfig) -> Self {
        let clock = Arc::new(SystemClock);
        let directory = Arc::new(MemoryDirectory::new());
        let sessions = Arc::new(MemorySessionStore::new(directory.clone()));
        let audit = Arc::new(MemoryAuditSink::new());
        let cache = Arc::new(CacheManager::from_provider(Arc::new(
            MemoryCacheProvider::new(&MemoryCacheConfig { max_capacity: 1_000 }, 300),
        )));
        let config = AuthConfig {
            jwt_secret: "http-test-secret".to_string(),
            ..AuthConfig::default()
        };

        let recorder = Arc::new(AuditRecorder::new(audit.clone(), config.audit_timeout()));
        let gateway = Arc::new(AuthGateway::new(
            Arc::new(TokenCodec::new(&config.jwt_secret, clock.clone())),
            Arc::new(RevocationStore::new(cache.clone(), clock.clone())),
            Arc::new(SessionRegistry::new(sessions, clock.clone())),
            Arc::new(PermissionResolver::new(directory.clone(), directory.clone())),
            directory.clone(),
            Arc::new(PlainHasher),
            Arc::new(MemoryRateLimiter::new(
                clock,
                config.login_rate_limit.sweep_interval(),
            )),
            recorder.clone(),
            &config,
        ));
        let admin = Arc::new(AccessAdmin::new(
            gateway.clone(),
            directory.clone(),
            directory.clone(),
            recorder,
        ));

        let state = AppState {
            server: Arc::new(server),
            database: None,
            cache,
            gateway,
            admin,
            audit_log: audit,
        };

        Self {
            router: build_router(state),
            directory,
        }
    }

    async fn business(&self, name: &str) -> Business {
        self.directory.add_business(name).await
    }

    async fn account(&self, business: &Business, email: &str, owner: bool) -> uuid::Uuid {
        self.directory
            .add_account(business.id, email, "plain:pw", owner)
            .await
            .unwrap()
            .id
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        self.send_from("203.0.113.10", method, uri, token, body).await
    }

    async fn send_from(
        &self,
        forwarded_for: &str,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", forwarded_for);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, json)
    }

    async fn login(&self, email: &str) -> String {
        let (status, _, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": "pw" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_login_me_logout() {
    let app = TestApp::new();
    let acme = app.business("Acme").await;
    app.account(&acme, "boss@acme.test", true).await;

    let (status, _, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "  BOSS@acme.test", "password": "pw" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["account"]["email"], json!("boss@acme.test"));
    assert_eq!(body["data"]["business"]["name"], json!("Acme"));
    assert_eq!(body["data"]["preferences"]["theme"], json!("light"));
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, _, body) = app.send(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["account"]["is_company_owner"], json!(true));

    let (status, _, _) = app
        .send(Method::POST, "/api/auth/logout", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = app.send(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!("UNAUTHORIZED"));

    // Logging out twice is harmless.
    let (status, _, _) = app
        .send(Method::POST, "/api/auth/logout", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::new();
    let acme = app.business("Acme").await;
    app.account(&acme, "clerk@acme.test", false).await;

    let (s1, _, wrong_password) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "clerk@acme.test", "password": "nope" })),
        )
        .await;
    let (s2, _, unknown) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ghost@acme.test", "password": "pw" })),
        )
        .await;
    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s2, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown);
}

#[tokio::test]
async fn test_login_validation() {
    let app = TestApp::new();
    let (status, _, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "not-an-email", "password": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn test_login_rate_limited_with_retry_after() {
    let app = TestApp::new();
    let acme = app.business("Acme").await;
    app.account(&acme, "clerk@acme.test", false).await;

    for _ in 0..5 {
        let (status, _, _) = app
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "clerk@acme.test", "password": "nope" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    // The correct password is refused too while the window lasts.
    let (status, headers, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "clerk@acme.test", "password": "pw" })),
        )
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], json!("RATE_LIMITED"));
    let retry_after: u64 = headers[header::RETRY_AFTER].to_str().unwrap().parse().unwrap();
    assert!(retry_after >= 1);
}

#[tokio::test]
async fn test_spoofed_forwarded_for_does_not_reset_limit() {
    let app = TestApp::with_server(ServerConfig::default());
    let acme = app.business("Acme").await;
    app.account(&acme, "clerk@acme.test", false).await;
    let attempt = json!({ "email": "clerk@acme.test", "password": "nope" });

    for n in 0..5 {
        let (status, _, _) = app
            .send_from(
                &format!("198.51.100.{n}"),
                Method::POST,
                "/api/auth/login",
                None,
                Some(attempt.clone()),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, _, _) = app
        .send_from("198.51.100.99", Method::POST, "/api/auth/login", None, Some(attempt))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_trusted_proxy_limits_per_forwarded_client() {
    let app = TestApp::new();
    let acme = app.business("Acme").await;
    app.account(&acme, "clerk@acme.test", false).await;
    let attempt = json!({ "email": "clerk@acme.test", "password": "nope" });

    for _ in 0..5 {
        app.send_from("198.51.100.1", Method::POST, "/api/auth/login", None, Some(attempt.clone()))
            .await;
    }
    let (status, _, _) = app
        .send_from("198.51.100.1", Method::POST, "/api/auth/login", None, Some(attempt.clone()))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let (status, _, _) = app
        .send_from("198.51.100.2", Method::POST, "/api/auth/login", None, Some(attempt))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::new();
    for uri in ["/api/auth/me", "/api/auth/routes", "/api/roles", "/api/audit-logs"] {
        let (status, _, _) = app.send(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    }
    let (status, _, _) = app
        .send(Method::GET, "/api/auth/me", Some("garbage"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_owner_grants_route_to_clerk() {
    let app = TestApp::new();
    let acme = app.business("Acme").await;
    app.account(&acme, "boss@acme.test", true).await;
    let clerk_id = app.account(&acme, "clerk@acme.test", false).await;
    let boss = app.login("boss@acme.test").await;
    let clerk = app.login("clerk@acme.test").await;

    let (status, _, _) = app
        .send(Method::GET, "/api/auth/access?route=/audit-logs", Some(&clerk), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _, _) = app
        .send(Method::GET, "/api/audit-logs", Some(&clerk), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Role administration is owner-only.
    let (status, _, _) = app
        .send(
            Method::POST,
            "/api/roles",
            Some(&clerk),
            Some(json!({ "name": "Auditors" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, body) = app
        .send(
            Method::POST,
            "/api/roles",
            Some(&boss),
            Some(json!({ "name": "Auditors", "color": "#112233" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let role_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _, _) = app
        .send(
            Method::POST,
            &format!("/api/users/{clerk_id}/roles"),
            Some(&boss),
            Some(json!({ "role_id": role_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = app
        .send(
            Method::POST,
            "/api/route-permissions",
            Some(&boss),
            Some(json!({ "route": "/audit-logs", "role_id": role_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = app
        .send(Method::GET, "/api/auth/access?route=/audit-logs", Some(&clerk), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["source"], json!("role"));

    let (status, _, body) = app
        .send(Method::GET, "/api/audit-logs?limit=3", Some(&clerk), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["context"], json!("role_update"));

    let (status, _, body) = app
        .send(Method::GET, "/api/auth/routes", Some(&clerk), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["routes"], json!(["/audit-logs", "/profile"]));

    let (status, _, _) = app
        .send(
            Method::DELETE,
            &format!("/api/route-permissions/{role_id}?route=/audit-logs"),
            Some(&boss),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = app
        .send(Method::GET, "/api/audit-logs", Some(&clerk), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_audit_limit_out_of_range() {
    let app = TestApp::new();
    let acme = app.business("Acme").await;
    app.account(&acme, "boss@acme.test", true).await;
    let boss = app.login("boss@acme.test").await;

    let (status, _, _) = app
        .send(Method::GET, "/api/audit-logs?limit=500", Some(&boss), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = app
        .send(Method::GET, "/api/audit-logs", Some(&boss), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["context"], json!("auth_login"));
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();

    let (status, _, body) = app.send(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("ok"));

    let (status, _, body) = app.send(Method::GET, "/api/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["database"], json!("memory"));
    assert_eq!(body["data"]["cache"], json!("connected"));
}

#[tokio::test]
async fn test_register_then_sign_in_as_owner() {
    let app = TestApp::new();
    let registration = json!({
        "business_name": "Padaria Sol",
        "name": "Bia",
        "email": "Bia@Sol.test",
        "password": "s3cret!",
        "confirm_password": "s3cret!",
    });

    let (status, _, body) = app
        .send(Method::POST, "/api/auth/create", None, Some(registration.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["business"]["name"], json!("Padaria Sol"));
    assert_eq!(body["data"]["account"]["email"], json!("bia@sol.test"));
    assert_eq!(body["data"]["account"]["is_company_owner"], json!(true));
    assert_eq!(body["data"]["preferences"]["theme"], json!("light"));
    assert!(body["data"]["account"].get("password_hash").is_none());

    let (status, _, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "bia@sol.test", "password": "s3cret!" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, _, _) = app
        .send(Method::GET, "/api/auth/access?route=/business-admin", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = app
        .send(Method::POST, "/api/auth/create", None, Some(registration))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], json!("CONFLICT"));
}

#[tokio::test]
async fn test_register_validates_input() {
    let app = TestApp::new();
    let (status, _, body) = app
        .send(
            Method::POST,
            "/api/auth/create",
            None,
            Some(json!({
                "business_name": "Acme",
                "name": "Bia",
                "email": "bia@acme.test",
                "password": "12345",
                "confirm_password": "54321",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("VALIDATION_ERROR"));
    assert!(body["details"].get("password").is_some());
    assert!(body["details"].get("confirm_password").is_some());
}
