pub mod controller;
pub mod state;
pub mod timer;

pub use controller::{InitOutcome, QuizSession, SubmitOutcome};
pub use state::{
    reduce, Effect, Event, HintView, Notification, NotificationKind, ProgressMarker, ScoreSummary,
    SessionState, SubmitBlocked, TimerAction, MAX_ATTEMPTS, TRANSITION_DELAY,
};
