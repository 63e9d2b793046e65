//! End-to-end compositions of the API client and the status poller,
//! the operations a UI calls directly.

use std::time::Duration;

use crate::poller::{PollHandle, PollUpdate, StatusPoller};
use crate::types::{DashboardData, DashboardSummary, PredictRequest, PredictResponse, TrainRequest, TrainingStatus};
use crate::{ApiClient, ApiError};

/// Summary of a workflow kick-off, shaped for direct display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowOutcome {
    pub success: bool,
    pub message: String,
    pub symbol: Option<String>,
    pub status_url: Option<String>,
}

/// Starts a training job and reduces the acknowledgement (or failure) to a
/// displayable outcome.
pub async fn train_model(client: &ApiClient, request: &TrainRequest) -> WorkflowOutcome {
    match client.start_training(request).await {
        Ok(accepted) => WorkflowOutcome {
            success: true,
            message: accepted.message,
            symbol: Some(accepted.symbol),
            status_url: Some(accepted.check_status_url),
        },
        Err(err) => WorkflowOutcome {
            success: false,
            message: err.to_string(),
            symbol: None,
            status_url: None,
        },
    }
}

/// Polls `/training-status/{SYMBOL}` until the job completes or fails.
///
/// Callers only ever see [`TrainingStatus`] values: a failed status fetch
/// is delivered as a synthesized terminal status carrying the error
/// message, after which the session is over.
pub fn watch_training<U>(
    client: ApiClient,
    poller: &StatusPoller,
    symbol: &str,
    interval: Duration,
    mut on_update: U,
) -> Result<PollHandle, ApiError>
where
    U: FnMut(TrainingStatus) + Send + 'static,
{
    let symbol = crate::api::normalize_symbol(symbol)?;
    let fetch_symbol = symbol.clone();
    let handle = poller.start(
        symbol,
        interval,
        move || {
            let client = client.clone();
            let symbol = fetch_symbol.clone();
            async move { client.training_status(&symbol).await }
        },
        TrainingStatus::is_terminal,
        move |update| match update {
            PollUpdate::Status(status) => on_update(status),
            PollUpdate::Failed(err) => on_update(TrainingStatus::failed(err.to_string())),
        },
    );
    Ok(handle)
}

/// Predicts prices for `symbol`, refusing up front when no trained model
/// is available.
pub async fn predict_prices(
    client: &ApiClient,
    symbol: &str,
    steps: u32,
    use_latest_data: bool,
) -> Result<PredictResponse, ApiError> {
    if !client.model_exists(symbol).await {
        return Err(ApiError::validation(format!(
            "No trained model found for {}. Please train a model first.",
            symbol.trim().to_ascii_uppercase()
        )));
    }
    let request = PredictRequest {
        symbol: symbol.to_string(),
        steps,
        use_latest_data,
    };
    client.predict(&request).await
}

/// Fetches health and the model listing concurrently and reduces them to
/// one dashboard view.
pub async fn dashboard_data(client: &ApiClient) -> Result<DashboardData, ApiError> {
    let (health, models) = tokio::try_join!(client.detailed_health(), client.models())?;
    let summary = DashboardSummary {
        total_models: models.models.len(),
        healthy_models: models.models.iter().filter(|m| m.files_present).count(),
        api_healthy: health.is_healthy(),
        active_trainings: health.active_trainings,
    };
    Ok(DashboardData {
        health,
        models: models.models,
        summary,
    })
}
