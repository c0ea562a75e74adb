//! Test Landmark Client
//!
//! Generates synthetic hand landmarks, sends one-shot prediction requests and
//! streams a live session to the pipeline for end-to-end testing.

use fingerspell_pipeline::config::{AppConfig, NatsConfig};
use fingerspell_pipeline::types::landmarks::LANDMARKS_PER_HAND;
use fingerspell_pipeline::types::{LiveFrame, PredictRequest, FEATURES_PER_FRAME};
use futures::StreamExt;
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

/// Run settings: positional args override the service's NATS config so the
/// client always talks on the subjects the pipeline serves.
#[derive(Debug, Clone)]
struct ClientSettings {
    nats: NatsConfig,
    requests: u64,
    live_ticks: u64,
    miss_rate: f64,
    delay_ms: u64,
}

impl ClientSettings {
    /// `args` excludes the program name: url, requests, live_ticks, miss_rate, delay_ms
    fn from_args(args: &[String], mut nats: NatsConfig) -> Self {
        if let Some(url) = args.first() {
            nats.url = url.clone();
        }

        Self {
            nats,
            requests: args.get(1).and_then(|s| s.parse().ok()).unwrap_or(10),
            live_ticks: args.get(2).and_then(|s| s.parse().ok()).unwrap_or(120),
            miss_rate: args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0.1),
            delay_ms: args.get(4).and_then(|s| s.parse().ok()).unwrap_or(33),
        }
    }
}

/// Synthetic hand generator: a fixed finger template offset by a random wrist
/// position, with per-frame jitter
struct HandGenerator {
    rng: rand::rngs::ThreadRng,
    template: Vec<[f32; 3]>,
}

impl HandGenerator {
    fn new() -> Self {
        let mut rng = rand::thread_rng();
        // wrist at origin, fingers fanned upward
        let template = (0..LANDMARKS_PER_HAND)
            .map(|i| {
                if i == 0 {
                    [0.0, 0.0, 0.0]
                } else {
                    let finger = ((i - 1) / 4) as f32;
                    let joint = ((i - 1) % 4 + 1) as f32;
                    [
                        (finger - 2.0) * 0.04,
                        -joint * 0.05,
                        rng.gen_range(-0.02..0.02),
                    ]
                }
            })
            .collect();

        Self { rng, template }
    }

    /// One frame with the wrist at `(wx, wy)`
    fn frame(&mut self, wx: f32, wy: f32) -> Vec<f32> {
        let mut values = Vec::with_capacity(FEATURES_PER_FRAME);
        for point in &self.template {
            values.push(wx + point[0] + self.rng.gen_range(-0.005..0.005));
            values.push(wy + point[1] + self.rng.gen_range(-0.005..0.005));
            values.push(point[2] + self.rng.gen_range(-0.005..0.005));
        }
        values
    }

    /// A whole sequence of `frames` frames drifting slowly across the image
    fn sequence(&mut self, frames: usize) -> Vec<f32> {
        let mut wx = self.rng.gen_range(0.3..0.7);
        let mut wy = self.rng.gen_range(0.5..0.8);
        let mut values = Vec::with_capacity(frames * FEATURES_PER_FRAME);
        for _ in 0..frames {
            wx += self.rng.gen_range(-0.003..0.003);
            wy += self.rng.gen_range(-0.003..0.003);
            values.extend(self.frame(wx, wy));
        }
        values
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_client=info".parse()?),
        )
        .init();

    info!("Starting Test Landmark Client");

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Pipeline config not found, using defaults");
            AppConfig::default()
        }
    };
    let args: Vec<String> = std::env::args().skip(1).collect();
    let settings = ClientSettings::from_args(&args, config.nats);
    let ClientSettings {
        nats,
        requests,
        live_ticks,
        miss_rate,
        delay_ms,
    } = settings;

    info!(
        nats_url = %nats.url,
        requests = requests,
        live_ticks = live_ticks,
        miss_rate = miss_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = match async_nats::connect(&nats.url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(requests, live_ticks, miss_rate).await;
        }
    };

    let reply = client
        .request(nats.metadata_subject.clone(), Vec::<u8>::new().into())
        .await?;
    info!("Metadata: {}", String::from_utf8_lossy(&reply.payload));

    let mut generator = HandGenerator::new();
    let mut rng = rand::thread_rng();

    // One-shot requests with varying lengths, plus one malformed request
    for i in 0..requests {
        let frames = rng.gen_range(5..60);
        let request = PredictRequest {
            landmarks: generator.sequence(frames),
        };
        let reply = client
            .request(nats.predict_subject.clone(), serde_json::to_vec(&request)?.into())
            .await?;
        info!(
            "Request {}/{} ({} frames): {}",
            i + 1,
            requests,
            frames,
            String::from_utf8_lossy(&reply.payload)
        );
    }

    let malformed = PredictRequest {
        landmarks: vec![0.0; FEATURES_PER_FRAME + 1],
    };
    let reply = client
        .request(nats.predict_subject.clone(), serde_json::to_vec(&malformed)?.into())
        .await?;
    info!("Malformed request: {}", String::from_utf8_lossy(&reply.payload));

    // Live session
    let mut letters = client.subscribe(nats.letter_subject.clone()).await?;
    tokio::spawn(async move {
        while let Some(message) = letters.next().await {
            info!("Letter: {}", String::from_utf8_lossy(&message.payload));
        }
    });

    let session_id = format!("test-{:08x}", rng.gen::<u32>());
    let (mut wx, mut wy) = (0.5_f32, 0.6_f32);
    let mut missed = 0;

    for i in 0..live_ticks {
        let landmarks = if rng.gen_bool(miss_rate) {
            missed += 1;
            None
        } else {
            wx += rng.gen_range(-0.003..0.003);
            wy += rng.gen_range(-0.003..0.003);
            Some(generator.frame(wx, wy))
        };

        let frame = LiveFrame {
            session_id: session_id.clone(),
            landmarks,
        };
        client
            .publish(nats.frame_subject.clone(), serde_json::to_vec(&frame)?.into())
            .await?;

        if (i + 1) % 30 == 0 {
            info!("Streamed {}/{} ticks ({} without hand)", i + 1, live_ticks, missed);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    client.flush().await?;
    // give the last letters time to arrive
    tokio::time::sleep(Duration::from_millis(500)).await;

    info!(
        "Completed! {} requests, {} live ticks ({} without hand)",
        requests, live_ticks, missed
    );

    Ok(())
}

async fn run_dry_mode(requests: u64, live_ticks: u64, miss_rate: f64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = HandGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..requests {
        let frames = rng.gen_range(5..60);
        let request = PredictRequest {
            landmarks: generator.sequence(frames),
        };
        info!(
            "Sample request {}: {} frames, {} values",
            i + 1,
            frames,
            request.landmarks.len()
        );
    }

    for i in 0..live_ticks.min(3) {
        let frame = LiveFrame {
            session_id: "dry-run".to_string(),
            landmarks: (!rng.gen_bool(miss_rate)).then(|| generator.frame(0.5, 0.6)),
        };
        info!("Sample live tick {}:\n{}", i + 1, serde_json::to_string(&frame)?);
    }

    Ok(())
}
