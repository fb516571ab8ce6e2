use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::common::GoalRegion;
use crate::error::AppError;

const ENV_PREFIX: &str = "HOOP_COACH";
const DEFAULT_CONFIG_FILE: &str = "hoop-coach";

/// Top level settings, layered from defaults, an optional config file and
/// `HOOP_COACH__*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log_level: String,
    pub session: SessionSettings,
    pub feedback: FeedbackSettings,
    pub goal: GoalSettings,
    pub detection: DetectionSettings,
    pub recording: RecordingSettings,
    pub upload: UploadSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub frame_buffer_size: usize,
    pub command_buffer_size: usize,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedbackSettings {
    pub speech_cooldown_ms: u64,
    pub repeat_delay_ms: u64,
    pub repeat_enabled: bool,
    pub knee_margin: f32,
    pub speech_rate: f32,
    pub closing_tip: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GoalSettings {
    pub region: GoalRegion,
    pub score_cooldown_ms: u64,
    pub score_message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    pub timeout_ms: u64,
    pub failure_notice_after: u32,
    pub min_ball_confidence: f32,
    pub ball_label: String,
    pub replay_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordingSettings {
    pub fps: u32,
    pub output_dir: PathBuf,
    pub record_on_start: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    pub frame_interval_ms: u64,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub enabled: bool,
    pub port: u16,
    pub static_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            session: SessionSettings::default(),
            feedback: FeedbackSettings::default(),
            goal: GoalSettings::default(),
            detection: DetectionSettings::default(),
            recording: RecordingSettings::default(),
            upload: UploadSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            frame_buffer_size: 4,
            command_buffer_size: 32,
            canvas_width: 640,
            canvas_height: 480,
        }
    }
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            speech_cooldown_ms: 5_000,
            repeat_delay_ms: 15_000,
            repeat_enabled: true,
            knee_margin: 0.1,
            speech_rate: 1.1,
            closing_tip: None,
        }
    }
}

impl Default for GoalSettings {
    fn default() -> Self {
        Self {
            region: GoalRegion::new(500.0, 50.0, 60.0, 40.0),
            score_cooldown_ms: 1_500,
            score_message: "Nice shot! That one went in.".to_string(),
        }
    }
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 2_000,
            failure_notice_after: 30,
            min_ball_confidence: 0.5,
            ball_label: "sports ball".to_string(),
            replay_path: None,
        }
    }
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            fps: 30,
            output_dir: PathBuf::from("recordings"),
            record_on_start: false,
        }
    }
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            frame_interval_ms: 100,
            path: None,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 3000,
            static_dir: PathBuf::from("frontend"),
        }
    }
}

impl Settings {
    /// Loads settings from `path` (or `hoop-coach.*` in the working directory
    /// when absent) and the environment. Missing files are not an error.
    pub fn load(path: Option<&str>) -> Result<Self, AppError> {
        let file = path.unwrap_or(DEFAULT_CONFIG_FILE);
        let settings: Settings = config::Config::builder()
            .add_source(config::File::with_name(file).required(path.is_some()))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), AppError> {
        let invalid = |msg: &str| Err(AppError::InvalidConfig(msg.to_string()));

        if self.session.frame_buffer_size == 0 || self.session.command_buffer_size == 0 {
            return invalid("Channel buffer sizes must be greater than 0");
        }
        if self.session.canvas_width == 0 || self.session.canvas_height == 0 {
            return invalid("Canvas dimensions must be greater than 0");
        }
        if self.feedback.speech_cooldown_ms == 0 || self.feedback.repeat_delay_ms == 0 {
            return invalid("Speech cooldown and repeat delay must be greater than 0");
        }
        if self.feedback.speech_rate <= 0.0 {
            return invalid("Speech rate must be positive");
        }
        if self.goal.region.width <= 0.0 || self.goal.region.height <= 0.0 {
            return invalid("Goal region must have a positive size");
        }
        if self.detection.timeout_ms == 0 {
            return invalid("Detection timeout must be greater than 0");
        }
        if !(0.0..=1.0).contains(&self.detection.min_ball_confidence) {
            return invalid("Minimum ball confidence must be between 0.0 and 1.0");
        }
        if self.recording.fps == 0 {
            return invalid("Recording fps must be greater than 0");
        }
        if self.upload.frame_interval_ms == 0 {
            return invalid("Upload frame interval must be greater than 0");
        }

        Ok(())
    }
}

impl FeedbackSettings {
    pub fn speech_cooldown(&self) -> Duration {
        Duration::from_millis(self.speech_cooldown_ms)
    }

    pub fn repeat_delay(&self) -> Option<Duration> {
        self.repeat_enabled
            .then(|| Duration::from_millis(self.repeat_delay_ms))
    }
}

impl GoalSettings {
    pub fn score_cooldown(&self) -> Duration {
        Duration::from_millis(self.score_cooldown_ms)
    }
}

impl DetectionSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl UploadSettings {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}
