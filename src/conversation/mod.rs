//! Conversation state and the controller that drives it

pub mod controller;
pub mod metrics;
pub mod session;

pub use controller::{
    round_seconds, Admission, ControllerState, ConversationController, SubmitOutcome,
    DEFAULT_NOTIFICATION_DURATION,
};
pub use session::{Dimensions, Message, Metadata, Role, Session, SessionStats};
