//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`; unknown paths fall through to a JSON
//! 404 with no tenant-branded payload.
//!
//! Protected routes run Extension → Auth → Handler. Public routes
//! (health, catalog, tenant resolution, signup/signin) skip auth.

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::error::ApiError;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::state::AppState;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost
/// layer). Endpoint handlers use `State<ApiContext>` via `with_state`.
pub fn api_router(state: Arc<AppState>) -> Router {
    build_router(ApiContext::new(state))
}

/// Build router from a pre-constructed `ApiContext`.
///
/// Used by integration tests that need access to the shared context.
#[cfg(test)]
pub(crate) fn api_router_with_ctx(ctx: ApiContext) -> Router {
    build_router(ctx)
}

fn build_router(ctx: ApiContext) -> Router {
    // Protected routes — bearer token required.
    //
    // Layers are applied from bottom (innermost) to top (outermost):
    //   Extension (outermost) → Auth → Handler.
    // Extension must be outermost so the auth middleware can access
    // ApiContext. `.with_state()` converts Router<ApiContext> → Router<()>
    // so the from_fn middleware layers are compatible.
    let protected = Router::new()
        .route("/auth/signout", post(endpoints::auth::signout))
        .route("/auth/me", get(endpoints::auth::me))
        .route("/clinics", post(endpoints::clinics::create))
        .route(
            "/clinics/:id/branding",
            put(endpoints::clinics::update_branding),
        )
        .route(
            "/reports",
            get(endpoints::reports::list).post(endpoints::reports::upload),
        )
        .route(
            "/reports/:id",
            get(endpoints::reports::detail).delete(endpoints::reports::remove),
        )
        .route("/reports/:id/analyze", post(endpoints::reports::analyze))
        .route("/checkout", post(endpoints::checkout::create))
        .route("/orders/:id/confirm", post(endpoints::checkout::confirm))
        .route("/dispensary/provision", post(endpoints::dispensary::provision))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx.clone()));

    // Public routes — no auth, tenant resolution included
    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/catalog", get(endpoints::catalog::public_catalog))
        .route("/t/:slug", get(endpoints::tenants::landing))
        .route("/t/:slug/catalog", get(endpoints::tenants::tenant_catalog))
        .route("/auth/signup", post(endpoints::auth::signup))
        .route("/auth/signin", post(endpoints::auth::signin))
        .with_state(ctx.clone())
        .layer(axum::Extension(ctx));

    Router::new()
        .nest("/api", protected)
        .nest("/api", public)
        .fallback(not_found)
        .layer(CorsLayer::permissive())
}

/// Catch-all: JSON 404, no partial chrome.
async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use axum::routing::post as stub_post;
    use axum::Json;
    use base64::Engine;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::catalog::Catalog;
    use crate::config::AppConfig;

    fn test_config(data_dir: &std::path::Path) -> AppConfig {
        AppConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            data_dir: data_dir.to_path_buf(),
            catalog_path: None,
            analysis_base_url: "http://127.0.0.1:1".into(),
            checkout_base_url: "http://127.0.0.1:1".into(),
            dispensary_base_url: "http://127.0.0.1:1".into(),
            dispensary_discount_percent: 15,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }

    fn test_router(config: AppConfig) -> Router {
        let state = Arc::new(AppState::new(config, Catalog::builtin().unwrap()));
        api_router_with_ctx(ApiContext::new(state))
    }

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn send(
        router: &Router,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = builder
            .body(match body {
                Some(value) => Body::from(serde_json::to_vec(&value).unwrap()),
                None => Body::empty(),
            })
            .unwrap();

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn signup(router: &Router, email: &str, data_consent: bool) -> String {
        let (status, body) = send(
            router,
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({
                "email": email,
                "password": "hunter2hunter2",
                "display_name": "Pat",
                "accept_terms": true,
                "data_consent": data_consent,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "signup failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    fn pdf_upload_body() -> Value {
        let data = base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.7 fixture body");
        json!({ "file_name": "panel.pdf", "data": data })
    }

    #[tokio::test]
    async fn health_is_public() {
        let tmp = tempfile::tempdir().unwrap();
        let router = test_router(test_config(tmp.path()));

        let (status, body) = send(&router, Method::GET, "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let tmp = tempfile::tempdir().unwrap();
        let router = test_router(test_config(tmp.path()));

        let (status, body) = send(&router, Method::GET, "/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn protected_routes_require_auth() {
        let tmp = tempfile::tempdir().unwrap();
        let router = test_router(test_config(tmp.path()));

        let (status, body) = send(&router, Method::GET, "/api/reports", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "AUTH_REQUIRED");

        let (status, _) = send(
            &router,
            Method::GET,
            "/api/reports",
            Some("bogus-token"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn signup_signin_signout_flow() {
        let tmp = tempfile::tempdir().unwrap();
        let router = test_router(test_config(tmp.path()));

        let token = signup(&router, "pat@example.com", true).await;

        let (status, body) =
            send(&router, Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "pat@example.com");

        // Fresh sign-in issues a new token
        let (status, body) = send(
            &router,
            Method::POST,
            "/api/auth/signin",
            None,
            Some(json!({ "email": "pat@example.com", "password": "hunter2hunter2" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let second = body["token"].as_str().unwrap().to_string();
        assert_ne!(second, token);

        // Sign out invalidates exactly the presented token
        let (status, _) =
            send(&router, Method::POST, "/api/auth/signout", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&router, Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(&router, Method::GET, "/api/auth/me", Some(&second), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let tmp = tempfile::tempdir().unwrap();
        let router = test_router(test_config(tmp.path()));
        signup(&router, "pat@example.com", true).await;

        let (status, _) = send(
            &router,
            Method::POST,
            "/api/auth/signin",
            None,
            Some(json!({ "email": "pat@example.com", "password": "wrong-password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn duplicate_signup_conflicts() {
        let tmp = tempfile::tempdir().unwrap();
        let router = test_router(test_config(tmp.path()));
        signup(&router, "pat@example.com", true).await;

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({
                "email": "Pat@Example.com",
                "password": "hunter2hunter2",
                "display_name": "Pat Again",
                "accept_terms": true,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn public_catalog_hides_advanced_panels() {
        let tmp = tempfile::tempdir().unwrap();
        let router = test_router(test_config(tmp.path()));

        let (status, body) = send(&router, Method::GET, "/api/catalog", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["currency"], "USD");
        assert_eq!(body["capabilities"]["payment_mode"], "pay_per_report");

        let panels = body["panels"].as_array().unwrap();
        assert!(!panels.is_empty());
        assert!(panels.iter().all(|p| p["advanced"] != true));

        // Spot-check the pricing engine through the API: cbc 1100 * 1.45
        let cbc = panels.iter().find(|p| p["id"] == "cbc").unwrap();
        assert_eq!(cbc["price_cents"], 1595);
        assert_eq!(cbc["breakdown"]["base_cost_cents"], 1100);
    }

    #[tokio::test]
    async fn unknown_tenant_is_404_with_no_branding() {
        let tmp = tempfile::tempdir().unwrap();
        let router = test_router(test_config(tmp.path()));

        let (status, body) =
            send(&router, Method::GET, "/api/t/ghost-clinic", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        // No clinic-branded payload alongside the error
        assert!(body.get("clinic").is_none());
        assert!(body.get("capabilities").is_none());
    }

    #[tokio::test]
    async fn clinic_signup_and_tenant_resolution() {
        let tmp = tempfile::tempdir().unwrap();
        let router = test_router(test_config(tmp.path()));
        let token = signup(&router, "admin@vital.example", true).await;

        let (status, clinic) = send(
            &router,
            Method::POST,
            "/api/clinics",
            Some(&token),
            Some(json!({
                "slug": "vital-health",
                "name": "Vital Health",
                "primary_color": "#0f766e",
                "dispensary_url": "https://store.example/vital",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "clinic create failed: {clinic}");

        // Tenant landing carries branding + full capability set
        let (status, body) =
            send(&router, Method::GET, "/api/t/vital-health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["clinic"]["name"], "Vital Health");
        assert_eq!(body["capabilities"]["advanced_panels"], true);
        assert_eq!(body["capabilities"]["detailed_dosage"], true);
        assert_eq!(
            body["capabilities"]["dispensary_url"],
            "https://store.example/vital"
        );
        assert_eq!(body["capabilities"]["dispensary_discount_percent"], 15);
        assert_eq!(body["capabilities"]["payment_mode"], "subscription_covered");

        // Tenant catalog includes advanced panels
        let (status, body) = send(
            &router,
            Method::GET,
            "/api/t/vital-health/catalog",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let panels = body["panels"].as_array().unwrap();
        assert!(panels.iter().any(|p| p["advanced"] == true));
    }

    #[tokio::test]
    async fn duplicate_clinic_slug_conflicts() {
        let tmp = tempfile::tempdir().unwrap();
        let router = test_router(test_config(tmp.path()));
        let first = signup(&router, "a@example.com", true).await;
        let second = signup(&router, "b@example.com", true).await;

        let payload = json!({ "slug": "vital-health", "name": "Vital" });
        let (status, _) = send(
            &router,
            Method::POST,
            "/api/clinics",
            Some(&first),
            Some(payload.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &router,
            Method::POST,
            "/api/clinics",
            Some(&second),
            Some(payload),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn branding_update_is_admin_only() {
        let tmp = tempfile::tempdir().unwrap();
        let router = test_router(test_config(tmp.path()));
        let admin = signup(&router, "admin@vital.example", true).await;
        let stranger = signup(&router, "stranger@example.com", true).await;

        let (_, clinic) = send(
            &router,
            Method::POST,
            "/api/clinics",
            Some(&admin),
            Some(json!({ "slug": "vital-health", "name": "Vital" })),
        )
        .await;
        let clinic_id = clinic["id"].as_str().unwrap().to_string();

        let update = json!({ "name": "Rebranded" });
        let (status, body) = send(
            &router,
            Method::PUT,
            &format!("/api/clinics/{clinic_id}/branding"),
            Some(&stranger),
            Some(update.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");

        let (status, body) = send(
            &router,
            Method::PUT,
            &format!("/api/clinics/{clinic_id}/branding"),
            Some(&admin),
            Some(update),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Rebranded");
    }

    #[tokio::test]
    async fn upload_list_and_delete_report() {
        let tmp = tempfile::tempdir().unwrap();
        let router = test_router(test_config(tmp.path()));
        let token = signup(&router, "pat@example.com", true).await;

        let (status, report) = send(
            &router,
            Method::POST,
            "/api/reports",
            Some(&token),
            Some(pdf_upload_body()),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "upload failed: {report}");
        assert_eq!(report["status"], "pending");
        assert_eq!(report["content_type"], "application/pdf");
        let report_id = report["id"].as_str().unwrap().to_string();

        // Stored file exists on disk
        let stored = tmp
            .path()
            .join("uploads")
            .join(report["file_path"].as_str().unwrap());
        assert!(stored.exists());

        let (status, body) = send(&router, Method::GET, "/api/reports", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, _) = send(
            &router,
            Method::DELETE,
            &format!("/api/reports/{report_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(!stored.exists());

        let (status, body) = send(&router, Method::GET, "/api/reports", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_requires_consent() {
        let tmp = tempfile::tempdir().unwrap();
        let router = test_router(test_config(tmp.path()));
        let token = signup(&router, "pat@example.com", false).await;

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/reports",
            Some(&token),
            Some(pdf_upload_body()),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "CONSENT_REQUIRED");
    }

    #[tokio::test]
    async fn upload_rejects_unsupported_type() {
        let tmp = tempfile::tempdir().unwrap();
        let router = test_router(test_config(tmp.path()));
        let token = signup(&router, "pat@example.com", true).await;

        let data = base64::engine::general_purpose::STANDARD.encode(b"MZ\x90\x00 executable");
        let (status, body) = send(
            &router,
            Method::POST,
            "/api/reports",
            Some(&token),
            Some(json!({ "file_name": "evil.exe", "data": data })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Unsupported file type"));
    }

    #[tokio::test]
    async fn upload_rejects_oversize_file() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = test_config(tmp.path());
        config.max_upload_bytes = 16;
        let router = test_router(config);
        let token = signup(&router, "pat@example.com", true).await;

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/reports",
            Some(&token),
            Some(pdf_upload_body()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("size limit"));
    }

    #[tokio::test]
    async fn reports_are_not_visible_across_profiles() {
        let tmp = tempfile::tempdir().unwrap();
        let router = test_router(test_config(tmp.path()));
        let owner = signup(&router, "owner@example.com", true).await;
        let stranger = signup(&router, "stranger@example.com", true).await;

        let (_, report) = send(
            &router,
            Method::POST,
            "/api/reports",
            Some(&owner),
            Some(pdf_upload_body()),
        )
        .await;
        let report_id = report["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &router,
            Method::GET,
            &format!("/api/reports/{report_id}"),
            Some(&stranger),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn analyze_completes_report_via_stub() {
        let stub = Router::new().route(
            "/v1/analyze",
            stub_post(|Json(body): Json<Value>| async move {
                assert_eq!(body["patient"]["age"], 42);
                Json(json!({
                    "status": "ok",
                    "analysis": { "summary": "ferritin low-normal, supplement iron" }
                }))
            }),
        );
        let stub_base = spawn_stub(stub).await;

        let tmp = tempfile::tempdir().unwrap();
        let mut config = test_config(tmp.path());
        config.analysis_base_url = stub_base;
        let router = test_router(config);
        let token = signup(&router, "pat@example.com", true).await;

        let (_, report) = send(
            &router,
            Method::POST,
            "/api/reports",
            Some(&token),
            Some(pdf_upload_body()),
        )
        .await;
        let report_id = report["id"].as_str().unwrap().to_string();

        let (status, analyzed) = send(
            &router,
            Method::POST,
            &format!("/api/reports/{report_id}/analyze"),
            Some(&token),
            Some(json!({
                "patient": { "age": 42, "sex": "female" },
                "observations": [
                    { "name": "Ferritin", "value": 22.0, "units": "ng/mL",
                      "ref_low": 15.0, "ref_high": 150.0 }
                ],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "analyze failed: {analyzed}");
        assert_eq!(analyzed["status"], "completed");
        assert!(analyzed["analysis"]
            .as_str()
            .unwrap()
            .contains("supplement iron"));

        // Re-analyzing a completed report is rejected, not retried
        let (status, _) = send(
            &router,
            Method::POST,
            &format!("/api/reports/{report_id}/analyze"),
            Some(&token),
            Some(json!({ "patient": { "age": 42, "sex": "female" }, "observations": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn analyze_failure_marks_report_failed() {
        let stub = Router::new().route(
            "/v1/analyze",
            stub_post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded") }),
        );
        let stub_base = spawn_stub(stub).await;

        let tmp = tempfile::tempdir().unwrap();
        let mut config = test_config(tmp.path());
        config.analysis_base_url = stub_base;
        let router = test_router(config);
        let token = signup(&router, "pat@example.com", true).await;

        let (_, report) = send(
            &router,
            Method::POST,
            "/api/reports",
            Some(&token),
            Some(pdf_upload_body()),
        )
        .await;
        let report_id = report["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &router,
            Method::POST,
            &format!("/api/reports/{report_id}/analyze"),
            Some(&token),
            Some(json!({ "patient": { "age": 42, "sex": "female" }, "observations": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "UPSTREAM_FAILED");

        // Terminal failure state, reason recorded
        let (_, report) = send(
            &router,
            Method::GET,
            &format!("/api/reports/{report_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(report["status"], "failed");
        assert!(report["failure_reason"].as_str().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn checkout_prices_order_and_returns_redirect() {
        let stub = Router::new().route(
            "/v1/checkout/sessions",
            stub_post(|Json(body): Json<Value>| async move {
                // cbc 1595 + hba1c 1600
                assert_eq!(body["amount_cents"], 3195);
                Json(json!({ "checkout_url": "https://pay.example/cs_42" }))
            }),
        );
        let stub_base = spawn_stub(stub).await;

        let tmp = tempfile::tempdir().unwrap();
        let mut config = test_config(tmp.path());
        config.checkout_base_url = stub_base;
        let router = test_router(config);
        let token = signup(&router, "pat@example.com", true).await;

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/checkout",
            Some(&token),
            Some(json!({
                "panel_ids": ["cbc", "hba1c"],
                "return_url": "https://app.example/return",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "checkout failed: {body}");
        assert_eq!(body["amount_cents"], 3195);
        assert_eq!(body["checkout_url"], "https://pay.example/cs_42");
        let order_id = body["order_id"].as_str().unwrap().to_string();

        let (status, order) = send(
            &router,
            Method::POST,
            &format!("/api/orders/{order_id}/confirm"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(order["status"], "paid");
    }

    #[tokio::test]
    async fn checkout_rejects_unknown_panel() {
        let tmp = tempfile::tempdir().unwrap();
        let router = test_router(test_config(tmp.path()));
        let token = signup(&router, "pat@example.com", true).await;

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/checkout",
            Some(&token),
            Some(json!({
                "panel_ids": ["not-a-panel"],
                "return_url": "https://app.example/return",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Unknown panel"));
    }

    #[tokio::test]
    async fn dispensary_provision_links_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        let stub = Router::new().route(
            "/v1/accounts",
            stub_post(|| async {
                CALLS.fetch_add(1, Ordering::SeqCst);
                Json(json!({
                    "account_id": "FS-777",
                    "dispensary_url": "https://store.example/u/FS-777"
                }))
            }),
        );
        let stub_base = spawn_stub(stub).await;

        let tmp = tempfile::tempdir().unwrap();
        let mut config = test_config(tmp.path());
        config.dispensary_base_url = stub_base;
        let router = test_router(config);
        let token = signup(&router, "pat@example.com", true).await;

        let payload = json!({ "account_type": "patient" });
        let (status, body) = send(
            &router,
            Method::POST,
            "/api/dispensary/provision",
            Some(&token),
            Some(payload.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "provision failed: {body}");
        assert_eq!(body["account_id"], "FS-777");
        assert_eq!(body["discount_percent"], 15);

        // Second call surfaces the stored linkage without a remote call
        let (status, body) = send(
            &router,
            Method::POST,
            "/api/dispensary/provision",
            Some(&token),
            Some(payload),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["account_id"], "FS-777");
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }
}
