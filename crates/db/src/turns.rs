// crates/db/src/turns.rs
// Turn history: the message-append collaborator contract and the bounded
// chronological reader the suggestion engine consumes.

use crate::lifecycle::{SessionError, SessionResult};
use crate::Database;
use study_partner_core::{ConversationTurn, Role};

impl Database {
    /// Append a turn and bump the session's monotonic message counter in
    /// one transaction.
    pub async fn append_turn(
        &self,
        session_id: &str,
        user_id: &str,
        role: Role,
        content: &str,
        now_ts: i64,
    ) -> SessionResult<()> {
        let mut tx = self.pool().begin().await?;

        let result = sqlx::query(
            "UPDATE tutor_sessions SET message_count = message_count + 1 \
             WHERE id = ?1 AND user_id = ?2 \
               AND deleted_by_user_at IS NULL AND deleted_by_admin_at IS NULL",
        )
        .bind(session_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(SessionError::NotFound);
        }

        sqlx::query(
            "INSERT INTO conversation_turns (session_id, role, content, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(session_id)
        .bind(role.as_str())
        .bind(content)
        .bind(now_ts)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// The most recent `limit` turns for a session, in chronological
    /// order. Turns with an unrecognized role are dropped rather than
    /// failing the read; the suggestion engine must degrade gracefully on
    /// bad turn data.
    pub async fn recent_turns(
        &self,
        session_id: &str,
        limit: usize,
    ) -> SessionResult<Vec<ConversationTurn>> {
        let rows: Vec<(String, String, i64)> = sqlx::query_as(
            "SELECT role, content, created_at FROM conversation_turns \
             WHERE session_id = ?1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT ?2",
        )
        .bind(session_id)
        .bind(limit as i64)
        .fetch_all(self.pool())
        .await?;

        let mut turns: Vec<ConversationTurn> = rows
            .into_iter()
            .filter_map(|(role, content, created_at)| {
                let role = match Role::parse(&role) {
                    Some(r) => r,
                    None => {
                        tracing::warn!(session_id, role = %role, "Dropping turn with unknown role");
                        return None;
                    }
                };
                Some(ConversationTurn {
                    role,
                    content,
                    created_at,
                })
            })
            .collect();
        turns.reverse();
        Ok(turns)
    }
}
