//! Circuit breaker behavior of the parameter client against a local stub
//! server. No external services required.

use axum::response::IntoResponse;
use axum::{extract::Path, http::StatusCode, routing::get, Json, Router};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use inventory_service::config::ParameterServiceConfig;
use inventory_service::params::{BreakerState, CallError, ParamClient};

fn client_config(base_url: String, cooldown_secs: u64) -> ParameterServiceConfig {
    ParameterServiceConfig {
        base_url,
        request_timeout_secs: 2,
        failure_threshold: 3,
        open_cooldown_secs: cooldown_secs,
    }
}

/// Bind a stub parameter service on an ephemeral port.
async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_three_server_errors_open_breaker_and_short_circuit() {
    let hits = Arc::new(AtomicU32::new(0));
    let hits_handler = hits.clone();
    let router = Router::new().route(
        "/v1/console/parameters/value/attr/{name}",
        get(move || {
            let hits = hits_handler.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }),
    );

    let base_url = spawn_stub(router).await;
    let client = ParamClient::new(&client_config(base_url, 30)).unwrap();

    for _ in 0..3 {
        let err = client.parameter_value("max_rows").await.unwrap_err();
        assert!(matches!(err, CallError::UpstreamServer { status: 500 }));
    }
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert_eq!(
        client.param_value_endpoint().breaker().state(),
        BreakerState::Open
    );

    // Fourth call is rejected locally: no network traffic reaches the stub.
    let err = client.parameter_value("max_rows").await.unwrap_err();
    assert!(err.is_connectivity(), "expected connectivity error, got {err}");
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_client_errors_never_advance_the_breaker() {
    let router = Router::new().route(
        "/v1/console/parameters/value/attr/{name}",
        get(|| async { StatusCode::NOT_FOUND }),
    );

    let base_url = spawn_stub(router).await;
    let client = ParamClient::new(&client_config(base_url, 30)).unwrap();

    for _ in 0..5 {
        let err = client.parameter_value("missing").await.unwrap_err();
        assert!(matches!(err, CallError::UpstreamClient { status: 404 }));
    }

    let breaker = client.param_value_endpoint().breaker();
    assert_eq!(breaker.state(), BreakerState::Closed);
    assert_eq!(breaker.failure_count(), 0);
}

#[tokio::test]
async fn test_success_resets_consecutive_failure_count() {
    let hits = Arc::new(AtomicU32::new(0));
    let hits_handler = hits.clone();
    let router = Router::new().route(
        "/v1/console/parameters/value/attr/{name}",
        get(move || {
            let hits = hits_handler.clone();
            async move {
                // 500, 500, 200, 500, 500 — the success in the middle resets
                // the count, so the breaker never opens.
                let n = hits.fetch_add(1, Ordering::SeqCst);
                if n == 2 {
                    (
                        StatusCode::OK,
                        Json(serde_json::json!({"data": 1, "errors": []})),
                    )
                        .into_response()
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }
        }),
    );

    let base_url = spawn_stub(router).await;
    let client = ParamClient::new(&client_config(base_url, 30)).unwrap();

    assert!(client.parameter_value("p").await.is_err());
    assert!(client.parameter_value("p").await.is_err());
    assert!(client.parameter_value("p").await.is_ok());
    assert!(client.parameter_value("p").await.is_err());
    assert!(client.parameter_value("p").await.is_err());

    let breaker = client.param_value_endpoint().breaker();
    assert_eq!(breaker.state(), BreakerState::Closed);
    assert_eq!(breaker.failure_count(), 2);
}

#[tokio::test]
async fn test_breaker_closes_after_cooldown_and_successful_probe() {
    let hits = Arc::new(AtomicU32::new(0));
    let hits_handler = hits.clone();
    let router = Router::new().route(
        "/v1/console/parameters/value/attr/{name}",
        get(move |Path(name): Path<String>| {
            let hits = hits_handler.clone();
            async move {
                if hits.fetch_add(1, Ordering::SeqCst) < 3 {
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                } else {
                    (
                        StatusCode::OK,
                        Json(serde_json::json!({"data": name, "errors": []})),
                    )
                        .into_response()
                }
            }
        }),
    );

    let base_url = spawn_stub(router).await;
    let client = ParamClient::new(&client_config(base_url, 1)).unwrap();

    for _ in 0..3 {
        assert!(client.parameter_value("batch_size").await.is_err());
    }
    let breaker = client.param_value_endpoint().breaker();
    assert_eq!(breaker.state(), BreakerState::Open);

    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(breaker.state(), BreakerState::HalfOpen);

    let value = client.parameter_value("batch_size").await.unwrap();
    assert_eq!(value, serde_json::json!("batch_size"));
    assert_eq!(breaker.state(), BreakerState::Closed);
}

#[tokio::test]
async fn test_transport_failure_forces_breaker_open_on_first_call() {
    // Nothing listens on this address; the connection attempt fails at the
    // transport level.
    let client =
        ParamClient::new(&client_config("http://127.0.0.1:9".to_string(), 30)).unwrap();

    let breaker = client.param_value_endpoint().breaker();
    assert_eq!(breaker.state(), BreakerState::Closed);

    let err = client.parameter_value("anything").await.unwrap_err();
    assert!(err.is_connectivity(), "expected connectivity error, got {err}");
    assert_eq!(breaker.state(), BreakerState::Open);

    // Subsequent calls are rejected without a connection attempt.
    let err = client.parameter_value("anything").await.unwrap_err();
    assert!(err.is_connectivity());
}
