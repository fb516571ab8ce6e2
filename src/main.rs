use hoop_coach::pipeline::detection::{Detector, ReplayDetector, UnavailableDetector};
use hoop_coach::{AppError, CoordinatorBuilder, FeedbackView, Settings};
use std::sync::Arc;
use tracing::{info, warn, Level};

fn init_logging(level: &str) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();
}

async fn load_detector(settings: &Settings) -> Result<Arc<dyn Detector>, AppError> {
    match &settings.detection.replay_path {
        Some(path) => Ok(Arc::new(ReplayDetector::load(path).await?)),
        None => {
            warn!("No detection replay configured; pose detection is unavailable");
            Ok(Arc::new(UnavailableDetector))
        }
    }
}

fn log_view(view: &FeedbackView) {
    info!(
        state = %view.state,
        scores = view.scores,
        processed = view.stats.frames_processed,
        dropped = view.stats.frames_dropped,
        "Feedback: {}",
        view.messages.join(" | ")
    );
    if let Some(notice) = &view.notice {
        warn!("Notice: {}", notice);
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config_path = std::env::args().nth(1);
    let settings = Settings::load(config_path.as_deref())?;
    init_logging(&settings.log_level);

    let detector = load_detector(&settings).await?;
    let upload = settings.upload.path.clone();
    let record_on_start = settings.recording.record_on_start;
    let output_dir = settings.recording.output_dir.clone();

    let mut coordinator = CoordinatorBuilder::new(settings)
        .detector(detector)
        .build()?;
    let mut updates = coordinator.session().subscribe();

    if record_on_start {
        coordinator.session().start_recording().await?;
    }
    match upload {
        Some(path) => coordinator.session().analyze_upload(Some(path)).await?,
        None => {
            coordinator.session().start().await?;
            info!("Camera session started, waiting for frames");
        }
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = updates.borrow_and_update().clone();
                log_view(&view);
            }
        }
    }

    if let Some(clip) = coordinator.shutdown().await? {
        let target = tokio::task::spawn_blocking(move || clip.export(output_dir))
            .await
            .map_err(|e| AppError::Pipeline(e.to_string()))??;
        info!("Recording saved to {}", target.display());
    }
    Ok(())
}
