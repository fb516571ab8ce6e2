pub mod command;
pub mod controller;
pub mod handle;
pub mod state;


pub use command::SessionCommand;
pub use controller::{SessionController, SessionParts, SESSION_STOPPED_NOTICE};
pub use handle::SessionHandle;
pub use state::{FeedbackView, SessionState, SessionStats};
