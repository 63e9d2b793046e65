use std::sync::Arc;

use serde_json::Value;

use crate::transport::{decode, RequestSpec, Transport};
use crate::types::{
    DeleteConfirmation, HealthReport, ModelEntry, ModelList, PredictRequest, PredictResponse,
    StockSeries, TrainAccepted, TrainRequest, TrainingStatus,
};
use crate::ApiError;

/// Typed surface over the prediction/training service.
///
/// The transport is injected explicitly; there is no implicit global
/// client. All symbol arguments are validated and upper-cased before a
/// request is issued.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Liveness probe, `GET /`.
    pub async fn api_health(&self) -> Result<Value, ApiError> {
        self.transport.send(&RequestSpec::get("/")).await
    }

    /// Detailed health, `GET /health`.
    pub async fn detailed_health(&self) -> Result<HealthReport, ApiError> {
        let value = self.transport.send(&RequestSpec::get("/health")).await?;
        decode(value)
    }

    /// Historical series, `GET /stock-data/{SYMBOL}`.
    pub async fn stock_data(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
    ) -> Result<StockSeries, ApiError> {
        let symbol = normalize_symbol(symbol)?;
        let spec = RequestSpec::get(format!("/stock-data/{symbol}"))
            .query("interval", interval)
            .query("limit", limit);
        decode(self.transport.send(&spec).await?)
    }

    /// Starts a training job, `POST /train`.
    pub async fn start_training(&self, request: &TrainRequest) -> Result<TrainAccepted, ApiError> {
        let symbol = normalize_symbol(&request.symbol)?;
        let body = serde_json::json!({
            "symbol": symbol,
            "interval": request.interval,
            "sequence_length": request.sequence_length,
            "prediction_horizon": request.prediction_horizon,
            "epochs": request.epochs,
        });
        let spec = RequestSpec::post("/train").body(body);
        decode(self.transport.send(&spec).await?)
    }

    /// One status fetch, `GET /training-status/{SYMBOL}`.
    pub async fn training_status(&self, symbol: &str) -> Result<TrainingStatus, ApiError> {
        let symbol = normalize_symbol(symbol)?;
        let spec = RequestSpec::get(format!("/training-status/{symbol}"));
        decode(self.transport.send(&spec).await?)
    }

    /// Runs a prediction, `POST /predict`.
    pub async fn predict(&self, request: &PredictRequest) -> Result<PredictResponse, ApiError> {
        let symbol = normalize_symbol(&request.symbol)?;
        let body = serde_json::json!({
            "symbol": symbol,
            "steps": request.steps,
            "use_latest_data": request.use_latest_data,
        });
        let spec = RequestSpec::post("/predict").body(body);
        decode(self.transport.send(&spec).await?)
    }

    /// Lists trained models, `GET /models`.
    pub async fn models(&self) -> Result<ModelList, ApiError> {
        decode(self.transport.send(&RequestSpec::get("/models")).await?)
    }

    /// Removes a trained model, `DELETE /models/{SYMBOL}`.
    pub async fn delete_model(&self, symbol: &str) -> Result<DeleteConfirmation, ApiError> {
        let symbol = normalize_symbol(symbol)?;
        let spec = RequestSpec::delete(format!("/models/{symbol}"));
        decode(self.transport.send(&spec).await?)
    }

    /// True when a usable model exists for `symbol` (case-insensitive).
    /// Any listing failure reads as "no model".
    pub async fn model_exists(&self, symbol: &str) -> bool {
        match self.model_info(symbol).await {
            Some(entry) => entry.files_present,
            None => false,
        }
    }

    /// Listing entry for `symbol`, if present (case-insensitive).
    pub async fn model_info(&self, symbol: &str) -> Option<ModelEntry> {
        let wanted = normalize_symbol(symbol).ok()?;
        let list = self.models().await.ok()?;
        list.models
            .into_iter()
            .find(|entry| entry.symbol.eq_ignore_ascii_case(&wanted))
    }
}

/// Validates and canonicalizes a symbol: trimmed, non-empty, upper-cased.
pub fn normalize_symbol(symbol: &str) -> Result<String, ApiError> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("symbol must not be empty"));
    }
    Ok(trimmed.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn normalize_symbol_uppercases_and_trims() {
        assert_eq!(normalize_symbol(" aapl ").unwrap(), "AAPL");
        assert_eq!(normalize_symbol("MSFT").unwrap(), "MSFT");
    }

    #[test]
    fn normalize_symbol_rejects_empty_input() {
        let err = normalize_symbol("   ").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
