use std::fmt;

/// Lifecycle of a coaching session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Running => "running",
            SessionState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Frame counters for the current run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames_processed: u64,
    pub frames_dropped: u64,
    pub results_discarded: u64,
    pub detection_failures: u64,
}

/// What the UI shows: ordered feedback lines plus session status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackView {
    pub state: SessionState,
    pub messages: Vec<String>,
    pub notice: Option<String>,
    pub scores: u32,
    pub recording: bool,
    pub stats: SessionStats,
}
