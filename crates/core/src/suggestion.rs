// crates/core/src/suggestion.rs
//! Proactive suggestion engine.
//!
//! A purely advisory state machine over conversational phase, re-derived
//! on every poll from session age and the recent turn window — nothing
//! here is persisted, so a poll always reflects the freshest history.
//! The engine is read-only and idempotent for a given snapshot of
//! inputs; it never raises, because proactive help is a nicety and must
//! fail open to `{none, false}`.

use crate::session::{Role, SessionStatus, TutorSession};
use crate::ConversationTurn;
use chrono::{DateTime, Utc};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// How many of the most recent turns the engine consumes.
pub const RECENT_TURN_WINDOW: usize = 20;

/// Minimum assistant turns between proactive asks (self-suppression).
pub const MIN_ASSISTANT_TURNS_BETWEEN_ASKS: i64 = 3;

/// At or below this message count the session is still in setup.
pub const START_MESSAGE_THRESHOLD: i64 = 2;

/// Elapsed session time before a periodic progress check fires.
pub const PROGRESS_CHECK_AFTER_SECS: i64 = 10 * 60;

/// Elapsed session time before the engine suggests wrapping up.
pub const WRAP_UP_AFTER_SECS: i64 = 45 * 60;

/// Gap after an unanswered assistant question that reads as disengagement.
pub const DISENGAGED_GAP_SECS: i64 = 3 * 60;

/// A user reply at or under this length (trimmed) counts as "short".
const SHORT_REPLY_MAX_CHARS: usize = 20;

/// Consecutive short user replies that read as confusion.
const SHORT_REPLY_RUN: usize = 3;

/// Conversational phase, in trigger-priority order `Stuck > Start >
/// WrapUp > ProgressCheck`. `None` means no intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Start,
    Stuck,
    ProgressCheck,
    WrapUp,
    None,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stuck => "stuck",
            Self::ProgressCheck => "progress_check",
            Self::WrapUp => "wrap_up",
            Self::None => "none",
        }
    }
}

/// Client-supplied suppression bookkeeping. Carried in the poll request
/// rather than the database, which keeps the engine stateless between
/// polls; the caller is the source of truth for ask spacing.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskState {
    /// Position in the turn stream of the last proactive intervention,
    /// if there has been one.
    #[serde(default)]
    pub last_ask_index: Option<i64>,
    /// Assistant turns emitted since that intervention.
    #[serde(default)]
    pub ai_messages_since_ask: i64,
}

/// The engine's decision for one poll.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub phase: Phase,
    pub should_ask: bool,
    /// Hint for the response layer's prompt when `should_ask` is true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_hint: Option<&'static str>,
}

impl Suggestion {
    /// The conservative no-intervention output.
    pub fn none() -> Self {
        Self {
            phase: Phase::None,
            should_ask: false,
            prompt_hint: None,
        }
    }

    fn ask(phase: Phase) -> Self {
        let prompt_hint = match phase {
            Phase::Start => Some(
                "The session just started. Ask what the learner wants to focus on \
                 and gauge their comfort with the subject.",
            ),
            Phase::Stuck => Some(
                "The learner seems stuck or disengaged. Offer a smaller step or a \
                 different angle on the current problem.",
            ),
            Phase::WrapUp => Some(
                "The session has run long. Offer to recap what was covered and \
                 suggest a natural stopping point.",
            ),
            Phase::ProgressCheck => Some(
                "Check in on progress toward the study goal and adjust the plan \
                 if needed.",
            ),
            Phase::None => None,
        };
        Self {
            phase,
            should_ask: true,
            prompt_hint,
        }
    }
}

/// Confusion language that marks a session as stuck. Separate from the
/// intent classifier's rule table: these run over the whole recent
/// window, not a single inbound message.
const CONFUSION_PATTERNS: &[&str] = &[
    r"(?i)\b(confused|confusing)\b",
    r"(?i)\b(don't|dont|do\s+not)\s+(get|understand|follow)\b",
    r"(?i)\b(makes?\s+no\s+sense|doesn't\s+make\s+sense)\b",
    r"(?i)\b(i'?m\s+)?(stuck|lost)\b",
    r"(?i)^(huh|what)\??$",
];

fn confusion_regexes() -> &'static [Regex] {
    static COMPILED: OnceLock<Vec<Regex>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        CONFUSION_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    })
}

/// Decide whether the assistant should proactively interject.
///
/// Evaluation order:
/// 1. Non-active sessions never get proactive pushes.
/// 2. Self-suppression: too few assistant turns since the last ask.
/// 3. Phase triggers in priority order `Stuck > Start > WrapUp >
///    ProgressCheck`; first match wins.
pub fn evaluate(
    session: &TutorSession,
    recent_turns: &[ConversationTurn],
    ask_state: &AskState,
    now: DateTime<Utc>,
) -> Suggestion {
    if session.status != SessionStatus::Active {
        return Suggestion::none();
    }

    // Spacing only applies once there has been an ask to space from.
    if ask_state.last_ask_index.is_some()
        && ask_state.ai_messages_since_ask < MIN_ASSISTANT_TURNS_BETWEEN_ASKS
    {
        return Suggestion::none();
    }

    let now_ts = now.timestamp();
    if now_ts < session.started_at {
        // Clock skew: fail open rather than derive phases from a
        // negative session age.
        tracing::debug!(
            session_id = %session.id,
            started_at = session.started_at,
            now = now_ts,
            "Clock behind session start; skipping proactive evaluation"
        );
        return Suggestion::none();
    }
    let elapsed = session.elapsed_secs(now_ts);

    let window = trailing_window(recent_turns);

    if is_stuck(window, now_ts) {
        return Suggestion::ask(Phase::Stuck);
    }
    if session.message_count <= START_MESSAGE_THRESHOLD {
        return Suggestion::ask(Phase::Start);
    }
    if elapsed >= WRAP_UP_AFTER_SECS {
        return Suggestion::ask(Phase::WrapUp);
    }
    if elapsed >= PROGRESS_CHECK_AFTER_SECS {
        return Suggestion::ask(Phase::ProgressCheck);
    }

    Suggestion::none()
}

/// Last `RECENT_TURN_WINDOW` turns, oldest first.
fn trailing_window(turns: &[ConversationTurn]) -> &[ConversationTurn] {
    let start = turns.len().saturating_sub(RECENT_TURN_WINDOW);
    &turns[start..]
}

/// Stuck signals, any of:
/// - explicit confusion language in a recent user turn
/// - a run of consecutive short user replies
/// - the assistant's last turn is a question the user has left
///   unanswered past the disengagement gap
fn is_stuck(window: &[ConversationTurn], now_ts: i64) -> bool {
    let user_turns: Vec<&ConversationTurn> =
        window.iter().filter(|t| t.role == Role::User).collect();

    for turn in &user_turns {
        if confusion_regexes().iter().any(|re| re.is_match(&turn.content)) {
            return true;
        }
    }

    if user_turns.len() >= SHORT_REPLY_RUN
        && user_turns[user_turns.len() - SHORT_REPLY_RUN..]
            .iter()
            .all(|t| t.content.trim().chars().count() <= SHORT_REPLY_MAX_CHARS)
    {
        return true;
    }

    if let Some(last) = window.last() {
        if last.role == Role::Assistant
            && last.content.trim_end().ends_with('?')
            && now_ts.saturating_sub(last.created_at) > DISENGAGED_GAP_SECS
        {
            return true;
        }
    }

    false
}
