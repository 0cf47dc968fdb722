use pix_sentinel::application::system::Application;
use pix_sentinel::config::Config;
use pix_sentinel::infrastructure::observability::exposition::parse_text;
use pix_sentinel::infrastructure::observability::metrics::names::{
    COMPLIANCE_SCORE, HTTP_REQUEST_DURATION_SECONDS, PREDICTIONS_TOTAL, SCRAPE_REQUESTS_TOTAL,
};
use serde_json::{Value, json};
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;

fn test_config() -> Config {
    let mut config = Config::default();
    config.push.enabled = false;
    config.simulation.enabled = false;
    config
}

async fn spawn_server(app: &Application, cancel: CancellationToken) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router();
    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await
            .unwrap();
    });
    addr
}

/// Test: a prediction over the wire shows up on the scrape endpoint
#[tokio::test]
async fn test_predict_then_scrape() {
    let app = Application::build(test_config()).await.unwrap();
    let cancel = CancellationToken::new();
    let addr = spawn_server(&app, cancel.clone()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{}/predict", addr))
        .json(&json!({
            "transaction_id": "e2e-1",
            "amount": 150.0,
            "channel": "TED",
            "transaction_type": "transfer"
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["transaction_id"], "e2e-1");
    assert!(body["fraud_score"].as_f64().unwrap() <= 1.0);

    let scrape = client
        .get(format!("http://{}/metrics", addr))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let samples = parse_text(&scrape).unwrap();

    let predictions: f64 = samples
        .iter()
        .filter(|s| s.name == PREDICTIONS_TOTAL && s.labels.get("channel") == Some("TED"))
        .map(|s| s.value)
        .sum();
    assert_eq!(predictions, 1.0);
    assert!(samples.iter().any(|s| {
        s.name == format!("{}_count", HTTP_REQUEST_DURATION_SECONDS)
            && s.labels.get("route") == Some("/predict")
    }));
    assert!(
        samples
            .iter()
            .any(|s| s.name == SCRAPE_REQUESTS_TOTAL && s.value == 1.0)
    );

    cancel.cancel();
}

/// Test: compliance scores from the background cycle are scrapeable
#[tokio::test]
async fn test_compliance_scores_exported_after_start() {
    let app = Application::build(test_config()).await.unwrap();
    let cancel = CancellationToken::new();
    let handle = app.start(cancel.clone());
    let addr = spawn_server(&app, cancel.clone()).await;

    // The first cycle runs immediately; wait for it to publish
    let mut scores = Vec::new();
    for _ in 0..50 {
        let scrape = reqwest::get(format!("http://{}/metrics", addr))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        scores = parse_text(&scrape)
            .unwrap()
            .into_iter()
            .filter(|s| s.name == COMPLIANCE_SCORE)
            .collect();
        if scores.len() == 3 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    assert_eq!(scores.len(), 3);
    assert!(scores.iter().all(|s| s.value == 1.0));

    handle.shutdown().await;
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = Application::build(test_config()).await.unwrap();
    let cancel = CancellationToken::new();
    let addr = spawn_server(&app, cancel.clone()).await;

    let body: Value = reqwest::get(format!("http://{}/health", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "healthy");
    assert!(body["components"].as_object().unwrap().len() >= 9);

    cancel.cancel();
}
