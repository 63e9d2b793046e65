use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Detailed service health, from `GET /health`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub active_trainings: u32,
    #[serde(default)]
    pub model_loaded: Option<bool>,
    #[serde(default)]
    pub memory_usage: Option<Value>,
    #[serde(default)]
    pub uptime: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// One OHLCV bar in a historical series.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StockBar {
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Historical series for a symbol, from `GET /stock-data/{SYMBOL}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StockSeries {
    pub symbol: String,
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    pub data: Vec<StockBar>,
}

/// Body of `POST /train`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainRequest {
    pub symbol: String,
    pub interval: String,
    pub sequence_length: u32,
    pub prediction_horizon: u32,
    pub epochs: u32,
}

impl TrainRequest {
    /// Service-side defaults: 5min bars, 60-step sequences, 1-step horizon,
    /// 50 epochs.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            interval: "5min".to_string(),
            sequence_length: 60,
            prediction_horizon: 1,
            epochs: 50,
        }
    }
}

/// Acknowledgement returned by `POST /train`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TrainAccepted {
    pub message: String,
    pub symbol: String,
    pub check_status_url: String,
}

/// Job state reported by `GET /training-status/{SYMBOL}`.
///
/// The service spells failure both "error" and "failed" depending on the
/// code path, so both decode to [`TrainingState::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingState {
    Training,
    Completed,
    #[serde(alias = "failed")]
    Error,
}

/// One observed training status, the unit a polling session delivers.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TrainingStatus {
    pub status: TrainingState,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub current_epoch: Option<u32>,
    #[serde(default)]
    pub total_epochs: Option<u32>,
    #[serde(default)]
    pub current_loss: Option<f64>,
    #[serde(default)]
    pub final_loss: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub metrics: Option<Value>,
}

impl TrainingStatus {
    /// True once no further updates are expected for this job.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TrainingState::Completed | TrainingState::Error)
    }

    /// Synthesized terminal status used when a status fetch itself fails.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: TrainingState::Error,
            symbol: None,
            progress: None,
            current_epoch: None,
            total_epochs: None,
            current_loss: None,
            final_loss: None,
            message: Some(message.into()),
            metrics: None,
        }
    }
}

/// Body of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictRequest {
    pub symbol: String,
    pub steps: u32,
    pub use_latest_data: bool,
}

impl PredictRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            steps: 10,
            use_latest_data: true,
        }
    }
}

/// One forecast step in a prediction response.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PredictionPoint {
    pub step: u32,
    pub predicted_price: f64,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub confidence: Option<String>,
}

/// Response of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PredictResponse {
    pub symbol: String,
    #[serde(default)]
    pub current_price: Option<f64>,
    pub predictions: Vec<PredictionPoint>,
    #[serde(default)]
    pub confidence_interval: Option<Value>,
    #[serde(default)]
    pub generated_at: Option<String>,
}

/// One entry in the `GET /models` listing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelEntry {
    pub symbol: String,
    #[serde(default)]
    pub files_present: bool,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub last_trained: Option<String>,
    #[serde(default)]
    pub model_size: Option<u64>,
    #[serde(default)]
    pub training_config: Option<Value>,
    #[serde(default)]
    pub metrics: Option<Value>,
}

/// Response of `GET /models`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelList {
    pub models: Vec<ModelEntry>,
}

/// Confirmation body of `DELETE /models/{SYMBOL}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeleteConfirmation {
    pub message: String,
}

/// Aggregate view assembled by the dashboard workflow.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DashboardData {
    pub health: HealthReport,
    pub models: Vec<ModelEntry>,
    pub summary: DashboardSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DashboardSummary {
    pub total_models: usize,
    pub healthy_models: usize,
    pub api_healthy: bool,
    pub active_trainings: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn training_state_decodes_both_failure_spellings() {
        let status: TrainingStatus =
            serde_json::from_str(r#"{"status":"failed","message":"Training failed: boom"}"#)
                .unwrap();
        assert_eq!(status.status, TrainingState::Error);
        assert!(status.is_terminal());

        let status: TrainingStatus = serde_json::from_str(r#"{"status":"error"}"#).unwrap();
        assert_eq!(status.status, TrainingState::Error);
    }

    #[test]
    fn training_status_tolerates_sparse_payloads() {
        let status: TrainingStatus = serde_json::from_str(
            r#"{"status":"training","progress":60.0,"message":"Training model...","started_at":"2026-01-01T00:00:00"}"#,
        )
        .unwrap();
        assert_eq!(status.status, TrainingState::Training);
        assert!(!status.is_terminal());
        assert_eq!(status.progress, Some(60.0));
        assert_eq!(status.current_epoch, None);
    }
}
