//! Stockcast client: transport, error normalization, and job polling for
//! the remote prediction/training service.
pub mod api;
mod async_state;
mod error;
mod poller;
mod realtime;
mod transport;
mod types;
pub mod workflow;

pub use api::{normalize_symbol, ApiClient};
pub use async_state::{AsyncRequest, AsyncState};
pub use error::{ApiError, ErrorKind};
pub use poller::{PollHandle, PollUpdate, StatusPoller};
pub use realtime::RealtimeChannel;
pub use transport::{decode, HttpTransport, Method, RequestSpec, Transport, TransportSettings};
pub use types::{
    DashboardData, DashboardSummary, DeleteConfirmation, HealthReport, ModelEntry, ModelList,
    PredictRequest, PredictResponse, PredictionPoint, StockBar, StockSeries, TrainAccepted,
    TrainRequest, TrainingState, TrainingStatus,
};
