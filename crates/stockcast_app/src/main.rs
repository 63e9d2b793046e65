//! Command-line front end for the stockcast client layer.
//!
//! Usage:
//!   stockcast_app health
//!   stockcast_app data <SYMBOL> [INTERVAL] [LIMIT]
//!   stockcast_app train <SYMBOL> [EPOCHS]
//!   stockcast_app predict <SYMBOL> [STEPS]
//!   stockcast_app models
//!   stockcast_app delete <SYMBOL>
//!   stockcast_app dashboard
//!
//! The service base address defaults to http://localhost:8000/api and can
//! be overridden with STOCKCAST_API_URL.

mod logging;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use client_logging::client_info;
use stockcast_client::workflow;
use stockcast_client::{
    ApiClient, HttpTransport, StatusPoller, TrainRequest, TrainingState, TransportSettings,
};

const POLL_INTERVAL: Duration = Duration::from_secs(2);

fn build_client() -> Result<ApiClient> {
    let mut settings = TransportSettings::default();
    if let Ok(base_url) = std::env::var("STOCKCAST_API_URL") {
        settings.base_url = base_url;
    }
    let transport = HttpTransport::new(settings).context("building HTTP transport")?;
    Ok(ApiClient::new(Arc::new(transport)))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::initialize(logging::LogDestination::File);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("help");
    let client = build_client()?;

    match command {
        "health" => {
            let health = client.detailed_health().await?;
            print_json(&health)?;
        }
        "data" => {
            let symbol = args.get(1).context("usage: data <SYMBOL> [INTERVAL] [LIMIT]")?;
            let interval = args.get(2).map(String::as_str).unwrap_or("5min");
            let limit = match args.get(3) {
                Some(raw) => raw.parse().context("LIMIT must be an integer")?,
                None => 100,
            };
            let series = client.stock_data(symbol, interval, limit).await?;
            println!("{} bars for {}", series.data.len(), series.symbol);
            print_json(&series)?;
        }
        "train" => {
            let symbol = args.get(1).context("usage: train <SYMBOL> [EPOCHS]")?;
            let mut request = TrainRequest::new(symbol.clone());
            if let Some(raw) = args.get(2) {
                request.epochs = raw.parse().context("EPOCHS must be an integer")?;
            }
            train_and_watch(&client, &request).await?;
        }
        "predict" => {
            let symbol = args.get(1).context("usage: predict <SYMBOL> [STEPS]")?;
            let steps = match args.get(2) {
                Some(raw) => raw.parse().context("STEPS must be an integer")?,
                None => 10,
            };
            let response = workflow::predict_prices(&client, symbol, steps, true).await?;
            print_json(&response)?;
        }
        "models" => {
            let list = client.models().await?;
            print_json(&list)?;
        }
        "delete" => {
            let symbol = args.get(1).context("usage: delete <SYMBOL>")?;
            let confirmation = client.delete_model(symbol).await?;
            println!("{}", confirmation.message);
        }
        "dashboard" => {
            let dashboard = workflow::dashboard_data(&client).await?;
            print_json(&dashboard)?;
        }
        "help" | "--help" | "-h" => {
            eprintln!("commands: health | data | train | predict | models | delete | dashboard");
        }
        other => bail!("unknown command: {other}"),
    }

    Ok(())
}

/// Starts a training job, then follows its status until it completes or
/// fails, printing each update.
async fn train_and_watch(client: &ApiClient, request: &TrainRequest) -> Result<()> {
    let outcome = workflow::train_model(client, request).await;
    if !outcome.success {
        bail!("training not started: {}", outcome.message);
    }
    let symbol = outcome.symbol.as_deref().unwrap_or(&request.symbol);
    client_info!("training started for {symbol}");
    println!("{}", outcome.message);

    let poller = StatusPoller::new();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    workflow::watch_training(
        client.clone(),
        &poller,
        symbol,
        POLL_INTERVAL,
        move |status| {
            let _ = tx.send(status);
        },
    )?;

    while let Some(status) = rx.recv().await {
        let progress = status
            .progress
            .map(|p| format!("{p:.0}%"))
            .unwrap_or_else(|| "-".to_string());
        let message = status.message.as_deref().unwrap_or("");
        println!("[{progress}] {message}");

        match status.status {
            TrainingState::Completed => {
                println!("training completed");
                if let Some(loss) = status.final_loss {
                    println!("final loss: {loss}");
                }
                break;
            }
            TrainingState::Error => {
                bail!("training failed: {message}");
            }
            TrainingState::Training => {}
        }
    }
    Ok(())
}
