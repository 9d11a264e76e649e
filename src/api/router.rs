use axum::{middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth;
use super::health;
use super::middleware::{logging_middleware, metrics_middleware};
use super::state::AppState;
use super::tryon;
use super::widget;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

/// Minimal router without state; /ready needs state and is absent here
pub fn create_router() -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        .layer(TraceLayer::new_for_http())
}

/// Full router with application state
///
/// The widget is embedded on merchant storefronts, so every route allows any origin.
pub fn create_router_with_state(state: AppState, metrics: Option<PrometheusMetrics>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .route("/widget.js", get(widget::widget_script))
        .nest("/api", tryon::create_tryon_router())
        .nest("/api/auth", auth::create_auth_router())
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    if let Some(metrics) = metrics {
        router = router.merge(create_metrics_router(metrics));
    }

    router
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::domain::generation::MockGenerationProvider;
    use crate::domain::merchant::{MerchantId, MerchantProfile, MerchantRepository};
    use crate::domain::product::Product;
    use crate::domain::{DomainError, TaskState};
    use crate::infrastructure::email::mock::RecordingEmailSender;
    use crate::infrastructure::image_store::InMemoryImageStore;
    use crate::infrastructure::provider::PAYLOAD_TOO_LARGE_MESSAGE;
    use crate::infrastructure::services::{
        AdmissionController, AdmissionPolicy, GenerationOrchestrator, MerchantResolver,
        PollSchedule, Settlement, TryOnService, TryOnServiceDeps, TryOnSettings, UsageLedger,
        VerificationService,
    };
    use crate::infrastructure::storage::{
        InMemoryMerchantRepository, InMemoryProductRepository, InMemoryUsageLogRepository,
        InMemoryVerificationCodeRepository,
    };

    struct TestApp {
        router: Router,
        merchants: Arc<InMemoryMerchantRepository>,
        sender: Arc<RecordingEmailSender>,
    }

    fn app(merchants: Vec<MerchantProfile>, provider: MockGenerationProvider) -> TestApp {
        let merchants = Arc::new(InMemoryMerchantRepository::with_merchants(merchants));
        let products = Arc::new(InMemoryProductRepository::with_products(vec![Product::new(
            "p-1", "m-1",
        )]));
        let usage = Arc::new(InMemoryUsageLogRepository::default());
        let sender = Arc::new(RecordingEmailSender::default());

        let tryon = TryOnService::new(TryOnServiceDeps {
            resolver: MerchantResolver::new(merchants.clone(), products.clone()),
            admission: AdmissionController::new(
                merchants.clone(),
                usage.clone(),
                AdmissionPolicy::default(),
            ),
            ledger: UsageLedger::new(usage),
            orchestrator: Arc::new(GenerationOrchestrator::new(
                Arc::new(provider),
                PollSchedule {
                    interval: Duration::from_millis(1),
                    max_attempts: 5,
                },
            )),
            settlement: Settlement::new(merchants.clone(), products),
            image_store: Arc::new(InMemoryImageStore::default()),
            settings: TryOnSettings::default(),
        });

        let verification = VerificationService::new(
            Arc::new(InMemoryVerificationCodeRepository::new()),
            sender.clone(),
        );

        let state = AppState::new(Arc::new(tryon), Arc::new(verification), merchants.clone())
            .with_public_url(Some("https://app.droutfit.test/".to_string()));

        TestApp {
            router: create_router_with_state(state, None),
            merchants,
            sender,
        }
    }

    fn provider() -> MockGenerationProvider {
        let mut provider = MockGenerationProvider::new();
        provider.expect_provider_name().return_const("kie");
        provider
    }

    fn merchant(credits: i64) -> Vec<MerchantProfile> {
        vec![MerchantProfile::new("m-1", credits).with_rate_limit(5)]
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-forwarded-for", "198.51.100.4")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, value)
    }

    fn try_on_body() -> Value {
        json!({
            "imageUrls": ["https://img/subject.png", "https://img/garment.png"],
            "productId": "p-1"
        })
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = create_router().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_with_merchant() {
        let app = app(merchant(1), provider());
        let (status, body) = send(app.router, get("/ready")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_try_on_happy_path() {
        let mut provider = provider();
        provider
            .expect_submit()
            .times(1)
            .returning(|_| Ok("task-1".to_string()));
        provider.expect_poll().times(1).returning(|_| {
            Ok(TaskState::Succeeded {
                result_url: "https://cdn/out.png".to_string(),
            })
        });
        let app = app(merchant(10), provider);

        let (status, body) = send(app.router, post_json("/api/virtual-try-on", try_on_body())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "status": "success", "result_url": "https://cdn/out.png", "taskId": "task-1" })
        );
        let merchant = app.merchants.get(&MerchantId::new("m-1")).await.unwrap().unwrap();
        assert_eq!(merchant.credits(), 9);
    }

    #[tokio::test]
    async fn test_try_on_without_credits_is_forbidden() {
        let mut provider = provider();
        provider.expect_submit().times(0);
        let app = app(merchant(0), provider);

        let (status, body) = send(app.router, post_json("/api/virtual-try-on", try_on_body())).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].as_str().unwrap().contains("credits"));
    }

    #[tokio::test]
    async fn test_provider_error_message_surfaces() {
        let mut provider = provider();
        provider
            .expect_submit()
            .returning(|_| Err(DomainError::provider("kie", "internal")));
        let app = app(merchant(10), provider);

        let (status, body) = send(app.router, post_json("/api/virtual-try-on", try_on_body())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "internal" }));
    }

    #[tokio::test]
    async fn test_oversized_upload_message() {
        let mut provider = provider();
        provider
            .expect_submit()
            .returning(|_| Err(DomainError::payload_too_large(PAYLOAD_TOO_LARGE_MESSAGE)));
        let app = app(merchant(10), provider);

        let (status, body) = send(app.router, post_json("/api/virtual-try-on", try_on_body())).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"], PAYLOAD_TOO_LARGE_MESSAGE);
    }

    #[tokio::test]
    async fn test_uninitialized_system() {
        let mut provider = provider();
        provider.expect_submit().times(0);
        let app = app(Vec::new(), provider);
        let body = json!({
            "imageUrls": ["https://img/subject.png", "https://img/garment.png"],
            "productId": "unknown"
        });

        let (status, body) = send(app.router, post_json("/api/virtual-try-on", body)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "System not initialized");
    }

    #[tokio::test]
    async fn test_malformed_body_returns_json_error() {
        let app = app(merchant(10), provider());
        let request = Request::builder()
            .method("POST")
            .uri("/api/virtual-try-on")
            .header("content-type", "application/json")
            .body(Body::from("{"))
            .unwrap();

        let (status, body) = send(app.router, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_quota_requires_product_id() {
        let app = app(merchant(10), provider());
        let (status, body) = send(app.router, get("/api/virtual-try-on")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Product ID required" }));
    }

    #[tokio::test]
    async fn test_quota_status_shape() {
        let app = app(merchant(10), provider());
        let (status, body) = send(app.router, get("/api/virtual-try-on?productId=p-1")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "limit": 5, "used": 0, "remaining": 5, "hasAccess": true })
        );
    }

    #[tokio::test]
    async fn test_demo_placeholder_on_failure() {
        let mut provider = provider();
        provider
            .expect_submit()
            .returning(|_| Err(DomainError::provider("kie", "internal")));
        let app = app(merchant(10), provider);

        let (status, body) = send(
            app.router,
            post_json(
                "/api/generate-demo",
                json!({ "userImageUrl": "https://img/me.png", "garmentUrl": "https://img/garment.png" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result_url"], "https://img/garment.png");
        assert_eq!(body["status"], "success");
    }

    fn demo_provider(runs: usize) -> MockGenerationProvider {
        let mut provider = provider();
        provider
            .expect_submit()
            .times(runs)
            .returning(|_| Ok("task-1".to_string()));
        provider.expect_poll().times(runs).returning(|_| {
            Ok(TaskState::Succeeded {
                result_url: "https://cdn/out.png".to_string(),
            })
        });
        provider
    }

    #[tokio::test]
    async fn test_demo_accepts_three_megabyte_upload() {
        use base64::{engine::general_purpose::STANDARD, Engine as _};

        let app = app(merchant(10), demo_provider(1));
        let image = format!(
            "data:image/png;base64,{}",
            STANDARD.encode(vec![7u8; 3 * 1024 * 1024])
        );

        let (status, body) = send(
            app.router,
            post_json(
                "/api/generate-demo",
                json!({ "userImageUrl": image, "garmentUrl": "https://img/garment.png" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result_url"], "https://cdn/out.png");
    }

    #[tokio::test]
    async fn test_demo_body_over_limit_uses_image_message() {
        let mut provider = provider();
        provider.expect_submit().times(0);
        let app = app(merchant(10), provider);
        let image = format!("data:image/png;base64,{}", "A".repeat(8 * 1024 * 1024));

        let (status, body) = send(
            app.router,
            post_json(
                "/api/generate-demo",
                json!({ "userImageUrl": image, "garmentUrl": "https://img/garment.png" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"], PAYLOAD_TOO_LARGE_MESSAGE);
    }

    #[tokio::test]
    async fn test_demo_runs_do_not_use_storefront_quota() {
        let app = app(merchant(10), demo_provider(6));

        for _ in 0..5 {
            let (status, _) = send(
                app.router.clone(),
                post_json(
                    "/api/generate-demo",
                    json!({ "userImageUrl": "https://img/me.png", "garmentUrl": "https://img/garment.png" }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) =
            send(app.router, post_json("/api/virtual-try-on", try_on_body())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result_url"], "https://cdn/out.png");
    }

    #[tokio::test]
    async fn test_otp_send_and_verify() {
        let app = app(merchant(10), provider());

        let (status, _) = send(
            app.router.clone(),
            post_json("/api/auth/otp/send", json!({ "email": "shop@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let code = app.sender.last_code().unwrap();
        let (status, body) = send(
            app.router.clone(),
            post_json(
                "/api/auth/otp/verify",
                json!({ "email": "shop@example.com", "code": code }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));

        // Codes are single use
        let (status, _) = send(
            app.router,
            post_json(
                "/api/auth/otp/verify",
                json!({ "email": "shop@example.com", "code": code }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_widget_script_served_with_origin() {
        let app = app(merchant(10), provider());
        let response = app.router.oneshot(get("/widget.js")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "application/javascript; charset=utf-8"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let source = String::from_utf8(body.to_vec()).unwrap();
        assert!(source.contains("https://app.droutfit.test"));
        assert!(!source.contains("https://app.droutfit.test/\""));
    }

    #[tokio::test]
    async fn test_cors_allows_storefront_origin() {
        let app = app(merchant(10), provider());
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/virtual-try-on")
            .header("origin", "https://shop.example")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();

        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }
}
