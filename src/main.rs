//! Fingerspelling Pipeline - Main Entry Point
//!
//! Loads the model artifacts, then serves one-shot predictions and metadata
//! over NATS request/reply and turns live landmark streams into stabilized
//! letters.

use anyhow::Result;
use async_nats::Client;
use fingerspell_pipeline::{
    config::{AppConfig, LoggingConfig},
    consumer::LandmarkConsumer,
    metrics::{MetricsReporter, PipelineMetrics},
    models::inference::InferenceEngine,
    producer::{reply, LetterProducer},
    service::PredictionService,
    streaming::LiveSessions,
    types::{LetterEvent, MetadataResponse, PredictResponse},
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Letters buffered between the live loop and the NATS publisher
const LETTER_QUEUE: usize = 1024;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting Fingerspelling Pipeline");
    info!(
        models_dir = %config.models.models_dir,
        vote_window = config.live.vote_window,
        workers = config.pipeline.workers,
        "Configuration loaded"
    );

    // Every artifact must load before anything is served
    let engine = Arc::new(InferenceEngine::new(&config)?);
    let service = PredictionService::new(engine.clone());
    let metadata = service.metadata();
    info!(
        seq_len = metadata.seq_len,
        features_per_frame = metadata.features_per_frame,
        num_classes = metadata.num_classes,
        "Model ready"
    );

    let metrics = Arc::new(PipelineMetrics::new());

    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, 30);
        reporter.start().await;
    });

    let metadata_requests =
        LandmarkConsumer::subscribe(&client, &config.nats.metadata_subject).await?;
    tokio::spawn(serve_metadata(client.clone(), metadata_requests, metadata));

    let letters = LetterProducer::new(client.clone(), &config.nats.letter_subject);
    info!("Publishing live letters to: {}", config.nats.letter_subject);
    let (letter_tx, letter_rx) = mpsc::channel(LETTER_QUEUE);
    tokio::spawn(publish_letters(letters, letter_rx));

    let frames = LandmarkConsumer::subscribe(&client, &config.nats.frame_subject)
        .await?
        .live_frames();
    let mut live = LiveSessions::new(engine.clone(), &config.live, metrics.clone(), letter_tx);
    let sweep_every = Duration::from_secs(config.live.session_idle_secs.max(1));
    let live_task = tokio::spawn(async move {
        live.run(frames, sweep_every).await;
    });

    let predict_requests =
        LandmarkConsumer::subscribe(&client, &config.nats.predict_subject).await?;

    tokio::select! {
        _ = serve_predictions(client, predict_requests, service, config.pipeline.workers, metrics.clone()) => {
            warn!("Prediction subscription closed");
        }
        result = live_task => {
            match result {
                Ok(()) => error!("Live frame subscription closed"),
                Err(e) => error!(error = %e, "Live session task failed"),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    info!("Pipeline shutting down...");
    metrics.print_summary();

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!("fingerspell_pipeline={}", logging.level))?,
    };

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format.eq_ignore_ascii_case("json") {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
    Ok(())
}

/// Answer one-shot prediction requests, at most `workers` at a time
async fn serve_predictions(
    client: Client,
    mut requests: LandmarkConsumer,
    service: PredictionService,
    workers: usize,
    metrics: Arc<PipelineMetrics>,
) {
    info!("Serving predictions with {} parallel workers", workers);

    let semaphore = Arc::new(Semaphore::new(workers));
    let processed_count = Arc::new(AtomicU64::new(0));

    while let Some((message, request)) = requests.next_request().await {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };

        let client = client.clone();
        let service = service.clone();
        let metrics = metrics.clone();
        let processed_count = processed_count.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();

            let response = match request {
                Ok(request) => service.predict(&request.landmarks),
                Err(e) => {
                    warn!(error = %e, "Failed to decode prediction request");
                    PredictResponse::error(e.to_string())
                }
            };

            match &response {
                PredictResponse::Prediction(result) => {
                    let processing_time = start_time.elapsed();
                    metrics.record_prediction(processing_time, result.index, result.confidence);
                    debug!(
                        letter = %result.letter,
                        confidence = result.confidence,
                        processing_time_us = processing_time.as_micros(),
                        "Prediction served"
                    );
                }
                PredictResponse::Error { .. } => metrics.record_request_error(),
            }

            if let Err(e) = reply(&client, &message, &response).await {
                error!(error = %e, "Failed to send prediction reply");
            }

            let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
            if count % 100 == 0 {
                let stats = metrics.get_processing_stats();
                info!(
                    processed = count,
                    avg_latency_us = stats.mean_us,
                    "Processing milestone"
                );
            }

            drop(permit);
        });
    }
}

/// Answer metadata requests with the fixed model shape
async fn serve_metadata(client: Client, mut requests: LandmarkConsumer, metadata: MetadataResponse) {
    while let Some(message) = requests.next_message().await {
        if let Err(e) = reply(&client, &message, &metadata).await {
            error!(error = %e, "Failed to send metadata reply");
        }
    }
}

/// Forward letters from the live loop to NATS
async fn publish_letters(letters: LetterProducer, mut events: mpsc::Receiver<LetterEvent>) {
    while let Some(event) = events.recv().await {
        if let Err(e) = letters.publish(&event).await {
            error!(session_id = %event.session_id, error = %e, "Failed to publish letter");
        }
    }
}
