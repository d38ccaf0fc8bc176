// crates/core/src/session.rs
//! Tutor session types and the status state machine.
//!
//! `SessionStatus` is an explicit sum type with an exhaustive transition
//! table: every transition function is total over defined states, and an
//! invalid transition is a value the compiler can see, not a string
//! comparison at runtime.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a tutor session.
///
/// `Completed` and `Expired` are terminal: no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Paused,
    Completed,
    Expired,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "paused" => Some(Self::Paused),
            "completed" => Some(Self::Completed),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }

    /// True for states a session can never leave.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Expired)
    }

    /// True while the session counts against the one-open-session-per-user
    /// invariant.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Active | Self::Paused)
    }

    /// Exhaustive transition table for the lifecycle state machine.
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        match (self, next) {
            (Self::Active, Self::Paused) => true,
            (Self::Paused, Self::Active) => true,
            (Self::Active | Self::Paused, Self::Completed) => true,
            (Self::Active, Self::Expired) => true,
            // Terminal states, self-transitions, and everything else.
            _ => false,
        }
    }
}

/// One AI study-partner session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorSession {
    pub id: String,
    pub user_id: String,
    pub status: SessionStatus,
    pub subject: Option<String>,
    pub skill_level: Option<String>,
    pub study_goal: Option<String>,
    pub persona_id: Option<String>,
    /// Opaque structured filter bag, preserved verbatim across
    /// "continue previous topic" flows.
    pub search_criteria: Option<serde_json::Value>,
    /// Epoch seconds.
    pub started_at: i64,
    pub ended_at: Option<i64>,
    /// Only meaningful once the session has ended.
    pub total_duration_seconds: Option<i64>,
    /// Monotonic counter, incremented by the message-append path.
    pub message_count: i64,
    /// Generic study-session record mirroring status/timestamps for
    /// cross-feature reporting.
    pub linked_study_session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_by_user_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_by_admin_at: Option<i64>,
}

impl TutorSession {
    /// Seconds elapsed since the session started, clamped at zero so a
    /// skewed clock never produces a negative age.
    pub fn elapsed_secs(&self, now_ts: i64) -> i64 {
        (now_ts - self.started_at).max(0)
    }
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

/// A single chat turn, read-only to this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    /// Epoch seconds.
    pub created_at: i64,
}

/// Create-time parameters for a new tutor session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionParams {
    pub subject: Option<String>,
    pub skill_level: Option<String>,
    pub study_goal: Option<String>,
    pub persona_id: Option<String>,
    pub search_criteria: Option<serde_json::Value>,
    /// Also create the linked generic study-session row in the same
    /// transaction.
    #[serde(default)]
    pub link_study_session: bool,
}
