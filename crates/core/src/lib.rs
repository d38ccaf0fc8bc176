// crates/core/src/lib.rs
//! Domain logic for the study-partner session engine.
//!
//! This crate is pure: session/turn types and the status state machine,
//! the homework-intent classifier, and the proactive suggestion engine.
//! Persistence lives in `study-partner-db`, transport in
//! `study-partner-server`.

pub mod clock;
pub mod intent;
pub mod session;
pub mod suggestion;

pub use clock::{Clock, SystemClock};
pub use intent::{classify_intent, Confidence, IntentVerdict};
pub use session::{ConversationTurn, Role, SessionParams, SessionStatus, TutorSession};
pub use suggestion::{evaluate, AskState, Phase, Suggestion, RECENT_TURN_WINDOW};
