// crates/server/src/notify.rs
//! Fire-and-forget notification dispatcher.
//!
//! Signals session starts to an optional webhook. The request path never
//! awaits the response and failures are ignored beyond a debug log —
//! notifications must never block or fail the tutoring flow.

use serde_json::json;
use study_partner_core::TutorSession;

#[derive(Debug, Clone)]
pub struct Notifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl Notifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }

    /// A notifier that drops everything (tests, no URL configured).
    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Dispatch a session-started signal without awaiting the result.
    pub fn session_started(&self, session: &TutorSession) {
        let Some(url) = self.webhook_url.clone() else {
            return;
        };
        let client = self.client.clone();
        let payload = json!({
            "event": "session_started",
            "sessionId": session.id,
            "userId": session.user_id,
            "subject": session.subject,
            "startedAt": session.started_at,
        });
        let session_id = session.id.clone();
        tokio::spawn(async move {
            match client.post(&url).json(&payload).send().await {
                Ok(resp) => {
                    tracing::debug!(session_id = %session_id, status = %resp.status(), "Start notification sent")
                }
                Err(e) => {
                    tracing::debug!(session_id = %session_id, error = %e, "Start notification failed (ignored)")
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_partner_core::SessionStatus;

    fn session() -> TutorSession {
        TutorSession {
            id: "sess-1".to_string(),
            user_id: "u1".to_string(),
            status: SessionStatus::Active,
            subject: Some("Algebra".to_string()),
            skill_level: None,
            study_goal: None,
            persona_id: None,
            search_criteria: None,
            started_at: 0,
            ended_at: None,
            total_duration_seconds: None,
            message_count: 0,
            linked_study_session_id: None,
            deleted_by_user_at: None,
            deleted_by_admin_at: None,
        }
    }

    #[tokio::test]
    async fn test_disabled_notifier_is_a_noop() {
        Notifier::disabled().session_started(&session());
    }

    #[tokio::test]
    async fn test_unreachable_webhook_does_not_error() {
        // Spawned send fails quietly; nothing to observe but no panic.
        let notifier = Notifier::new(Some("http://127.0.0.1:1/unreachable".to_string()));
        notifier.session_started(&session());
        tokio::task::yield_now().await;
    }
}
