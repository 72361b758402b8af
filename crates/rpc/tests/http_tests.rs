use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use neuromesh_engine::policy::MaintenanceOutcome;
use neuromesh_engine::{
    DomainService, FastRandSource, OrganizationService, RandomSource, ScriptedSource,
    ServiceKind, ServiceRuntime,
};
use neuromesh_rpc::{
    HostState, MESSAGE_DESTINATION_HEADER, MESSAGE_TYPE_HEADER, Metrics, create_router,
};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Helper to create a router around an initialized service
fn create_test_router(kind: ServiceKind) -> Router {
    let mut service = kind.instantiate(Box::new(FastRandSource::seeded(42)));
    service.initialize();
    create_router(HostState::new_with_metrics(service, Metrics::new().unwrap()))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn read_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn read_text(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn test_process_returns_response_payload() {
    let app = create_test_router(ServiceKind::Treasury);

    let response = app
        .oneshot(post_json(
            "/process",
            json!({"type": "RETRIEVE_MOTOR_MEMORY", "payload": {"skillName": "reflex"}, "source": "cortex"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[&MESSAGE_TYPE_HEADER],
        "RETRIEVE_MOTOR_MEMORY_RESPONSE"
    );
    assert_eq!(response.headers()[&MESSAGE_DESTINATION_HEADER], "cortex");

    let body = read_json(response).await;
    assert_eq!(body["found"], true);
    assert_eq!(body["skill"]["skillName"], "reflex-response");
    assert_eq!(body["source"], "treasury");
    assert!(body["processingTime"].is_number());
    assert!(body.get("payload").is_none());
}

#[tokio::test]
async fn test_soft_error_is_ok() {
    let app = create_test_router(ServiceKind::Organization);

    let response = app
        .oneshot(post_json(
            "/messages/EXECUTE_MAINTENANCE",
            json!({"taskId": "nonexistent-id"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[&MESSAGE_DESTINATION_HEADER], "gateway");

    let body = read_json(response).await;
    assert_eq!(body["error"], "Maintenance task not found");
    assert_eq!(body["taskId"], "nonexistent-id");
}

#[tokio::test]
async fn test_concurrent_writes_are_serialized() {
    const REQUESTS: usize = 20;
    let app = create_test_router(ServiceKind::Treasury);

    let skill = read_json(
        app.clone()
            .oneshot(post_json(
                "/messages/RETRIEVE_MOTOR_MEMORY",
                json!({"skillName": "reflex-response"}),
            ))
            .await
            .unwrap(),
    )
    .await;
    let skill_id = skill["skill"]["id"].as_str().unwrap().to_string();
    let starting = skill["skill"]["proficiency"].as_f64().unwrap();

    let handles: Vec<_> = (0..REQUESTS)
        .map(|_| {
            let app = app.clone();
            let request = post_json(
                "/messages/RECORD_FEEDBACK",
                json!({"skillId": skill_id, "success": false}),
            );
            tokio::spawn(async move { app.oneshot(request).await.unwrap().status() })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    let info = read_json(app.clone().oneshot(get("/info")).await.unwrap()).await;
    assert_eq!(info["entityCounts"]["feedback"], REQUESTS);

    let skill = read_json(
        app.oneshot(post_json(
            "/messages/RETRIEVE_MOTOR_MEMORY",
            json!({"skillId": skill_id}),
        ))
        .await
        .unwrap(),
    )
    .await;
    let expected = starting - 0.02 * REQUESTS as f64;
    assert!((skill["skill"]["proficiency"].as_f64().unwrap() - expected).abs() < 1e-9);
}

#[tokio::test]
async fn test_unrecognized_type_is_no_content() {
    let app = create_test_router(ServiceKind::Sales);

    let response = app
        .oneshot(post_json("/process", json!({"type": "NOT_A_MESSAGE"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_blank_type_is_rejected() {
    let app = create_test_router(ServiceKind::Sales);

    let response = app
        .oneshot(post_json("/process", json!({"type": "  "})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_fault_is_generic_500() {
    fn overclaiming(_: &[String], _: &mut dyn RandomSource) -> MaintenanceOutcome {
        MaintenanceOutcome {
            issues_found: 1,
            issues_resolved: 5,
            success: true,
        }
    }

    let mut service = ServiceRuntime::new(
        OrganizationService::new(Box::new(ScriptedSource::default()))
            .with_maintenance_policy(overclaiming),
    );
    service.initialize();
    let service: Box<dyn DomainService> = Box::new(service);
    let app = create_router(HostState::new(service));

    let scheduled = app
        .clone()
        .oneshot(post_json(
            "/messages/SCHEDULE_MAINTENANCE",
            json!({"id": "task-1"}),
        ))
        .await
        .unwrap();
    assert_eq!(scheduled.status(), StatusCode::OK);

    let response = app
        .oneshot(post_json(
            "/messages/EXECUTE_MAINTENANCE",
            json!({"taskId": "task-1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        read_json(response).await,
        json!({"error": "Internal server error"})
    );
}

#[tokio::test]
async fn test_health_and_info() {
    let app = create_test_router(ServiceKind::Development);

    let health = read_json(app.clone().oneshot(get("/health")).await.unwrap()).await;
    assert_eq!(health["service"], "development");
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["initialized"], true);
    assert!(health["uptimeSeconds"].is_u64());

    let info = read_json(app.oneshot(get("/info")).await.unwrap()).await;
    assert_eq!(info["name"], "development");
    assert_eq!(info["entityCounts"]["plans"], 1);
    assert!(
        info["messageTypes"]
            .as_array()
            .unwrap()
            .contains(&json!("ASSESS_QUALITY"))
    );
}

#[tokio::test]
async fn test_metrics_track_outcomes() {
    let app = create_test_router(ServiceKind::Market);

    for request in [
        post_json("/messages/GET_MARKET_STATUS", json!({})),
        post_json("/messages/UNKNOWN", json!({})),
    ] {
        app.clone().oneshot(request).await.unwrap();
    }

    let text = read_text(app.oneshot(get("/metrics")).await.unwrap()).await;
    assert!(text.contains(
        "neuromesh_messages_total{outcome=\"handled\",service=\"market\",type=\"GET_MARKET_STATUS\"} 1"
    ));
    assert!(text.contains("outcome=\"unrecognized\""));
    assert!(text.contains("neuromesh_entities{service=\"market\",store=\"opportunities\"} 2"));
    assert!(text.contains("neuromesh_processing_seconds_bucket"));
}

#[tokio::test]
async fn test_metrics_disabled() {
    let service = ServiceKind::Sales.instantiate(Box::new(FastRandSource::seeded(1)));
    let app = create_router(HostState::new(service));

    let text = read_text(app.oneshot(get("/metrics")).await.unwrap()).await;
    assert_eq!(text, "# Metrics not enabled\n");
}
