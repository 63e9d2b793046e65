use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use stockcast_client::workflow;
use stockcast_client::{
    ApiClient, ErrorKind, HttpTransport, StatusPoller, TrainRequest, TrainingState,
    TrainingStatus, TransportSettings,
};
use tokio::sync::mpsc;
use tokio::time::timeout;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    let settings = TransportSettings {
        base_url: server.uri(),
        ..TransportSettings::default()
    };
    let transport = HttpTransport::new(settings).expect("transport");
    ApiClient::new(Arc::new(transport))
}

#[tokio::test]
async fn train_then_poll_to_completion() {
    client_logging::initialize_for_tests();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/train"))
        .and(body_json(json!({
            "symbol": "AAPL",
            "interval": "5min",
            "sequence_length": 60,
            "prediction_horizon": 1,
            "epochs": 50
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Training started for AAPL",
            "symbol": "AAPL",
            "check_status_url": "/training-status/AAPL"
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Two in-progress polls, then the terminal status.
    Mock::given(method("GET"))
        .and(path("/training-status/AAPL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "training",
            "current_epoch": 1,
            "total_epochs": 50,
            "message": "Training model..."
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/training-status/AAPL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "final_loss": 0.0023,
            "message": "Training completed successfully"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let outcome = workflow::train_model(&client, &TrainRequest::new("aapl")).await;
    assert!(outcome.success);
    assert_eq!(outcome.symbol.as_deref(), Some("AAPL"));
    assert_eq!(outcome.status_url.as_deref(), Some("/training-status/AAPL"));

    let poller = StatusPoller::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    workflow::watch_training(
        client,
        &poller,
        "AAPL",
        Duration::from_millis(10),
        move |status| {
            let _ = tx.send(status);
        },
    )
    .expect("watch starts");

    let mut statuses = Vec::new();
    while let Ok(Some(status)) = timeout(Duration::from_secs(5), rx.recv()).await {
        statuses.push(status);
    }

    assert_eq!(statuses.len(), 3);
    assert_eq!(statuses[0].status, TrainingState::Training);
    assert_eq!(statuses[1].status, TrainingState::Training);
    assert_eq!(statuses[2].status, TrainingState::Completed);
    assert_eq!(statuses[2].final_loss, Some(0.0023));
}

#[tokio::test]
async fn watch_training_synthesizes_failed_status_on_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/training-status/TSLA"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "detail": "No training status found for TSLA"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let poller = StatusPoller::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    workflow::watch_training(
        client,
        &poller,
        "TSLA",
        Duration::from_millis(10),
        move |status| {
            let _ = tx.send(status);
        },
    )
    .expect("watch starts");

    let mut statuses: Vec<TrainingStatus> = Vec::new();
    while let Ok(Some(status)) = timeout(Duration::from_secs(5), rx.recv()).await {
        statuses.push(status);
    }

    assert_eq!(statuses.len(), 1, "one synthesized terminal update");
    assert_eq!(statuses[0].status, TrainingState::Error);
    assert_eq!(
        statuses[0].message.as_deref(),
        Some("No training status found for TSLA")
    );
}

#[tokio::test]
async fn model_lookup_is_case_insensitive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                {"symbol": "AAPL", "files_present": true},
                {"symbol": "MSFT", "files_present": false}
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.model_exists("aapl").await);
    assert!(client.model_exists("AAPL").await);
    // Present but unusable: required files are missing.
    assert!(!client.model_exists("msft").await);
    assert!(!client.model_exists("NVDA").await);

    let info = client.model_info("aapl").await.expect("entry");
    assert_eq!(info.symbol, "AAPL");
}

#[tokio::test]
async fn predict_refuses_without_a_trained_model() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = workflow::predict_prices(&client, "aapl", 10, true)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(
        err.message,
        "No trained model found for AAPL. Please train a model first."
    );
}

#[tokio::test]
async fn predict_runs_when_a_model_exists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"symbol": "AAPL", "files_present": true}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(body_json(json!({
            "symbol": "AAPL",
            "steps": 5,
            "use_latest_data": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "symbol": "AAPL",
            "current_price": 187.32,
            "predictions": [
                {"step": 1, "predicted_price": 187.5},
                {"step": 2, "predicted_price": 187.9}
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = workflow::predict_prices(&client, "aapl", 5, true)
        .await
        .expect("prediction");
    assert_eq!(response.symbol, "AAPL");
    assert_eq!(response.predictions.len(), 2);
    assert_eq!(response.predictions[0].predicted_price, 187.5);
}

#[tokio::test]
async fn stock_data_decodes_series_and_uppercases_symbol() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stock-data/AAPL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "symbol": "AAPL",
            "interval": "5min",
            "data": [
                {"timestamp": "2026-08-21T15:55:00", "open": 187.1, "high": 187.6,
                 "low": 186.9, "close": 187.3, "volume": 120345.0}
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let series = client.stock_data("aapl", "5min", 100).await.expect("series");
    assert_eq!(series.symbol, "AAPL");
    assert_eq!(series.data.len(), 1);
    assert_eq!(series.data[0].close, 187.3);
}

#[tokio::test]
async fn delete_model_returns_confirmation() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/models/AAPL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Model for AAPL deleted successfully"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let confirmation = client.delete_model("aapl").await.expect("delete");
    assert_eq!(confirmation.message, "Model for AAPL deleted successfully");
}

#[tokio::test]
async fn dashboard_reduces_health_and_models() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "active_trainings": 2
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                {"symbol": "AAPL", "files_present": true},
                {"symbol": "MSFT", "files_present": false},
                {"symbol": "NVDA", "files_present": true}
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let dashboard = workflow::dashboard_data(&client).await.expect("dashboard");
    assert_eq!(dashboard.summary.total_models, 3);
    assert_eq!(dashboard.summary.healthy_models, 2);
    assert!(dashboard.summary.api_healthy);
    assert_eq!(dashboard.summary.active_trainings, 2);
}
