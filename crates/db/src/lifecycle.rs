// crates/db/src/lifecycle.rs
// Session lifecycle manager: the only component that mutates persisted
// session state.
//
// Every transition is conditioned on the stored status at the moment of
// the UPDATE, never on a status read earlier in the request, so two tabs
// racing on the same session cannot both win. The one-open-session-per-
// user invariant is enforced twice: a transactional existence check for
// the friendly `Conflict { existing_session_id }` error, and a partial
// unique index that catches the true concurrent double-create.

use crate::Database;
use sqlx::error::ErrorKind;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use study_partner_core::{SessionParams, SessionStatus, TutorSession};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,

    #[error("invalid transition from {}", .from.as_str())]
    InvalidTransition { from: SessionStatus },

    #[error("user already has an open session: {existing_session_id}")]
    Conflict { existing_session_id: String },

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Raw row shape for `tutor_sessions`.
pub(crate) struct SessionRow {
    id: String,
    user_id: String,
    status: String,
    subject: Option<String>,
    skill_level: Option<String>,
    study_goal: Option<String>,
    persona_id: Option<String>,
    search_criteria: Option<String>,
    started_at: i64,
    ended_at: Option<i64>,
    total_duration_seconds: Option<i64>,
    message_count: i64,
    linked_study_session_id: Option<String>,
    deleted_by_user_at: Option<i64>,
    deleted_by_admin_at: Option<i64>,
}

impl<'r> sqlx::FromRow<'r, SqliteRow> for SessionRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            status: row.try_get("status")?,
            subject: row.try_get("subject")?,
            skill_level: row.try_get("skill_level")?,
            study_goal: row.try_get("study_goal")?,
            persona_id: row.try_get("persona_id")?,
            search_criteria: row.try_get("search_criteria")?,
            started_at: row.try_get("started_at")?,
            ended_at: row.try_get("ended_at")?,
            total_duration_seconds: row.try_get("total_duration_seconds")?,
            message_count: row.try_get("message_count")?,
            linked_study_session_id: row.try_get("linked_study_session_id")?,
            deleted_by_user_at: row.try_get("deleted_by_user_at")?,
            deleted_by_admin_at: row.try_get("deleted_by_admin_at")?,
        })
    }
}

impl SessionRow {
    fn into_session(self) -> TutorSession {
        // An unrecognized status string can only come from a newer schema
        // or manual edits; treat it as terminal so it never re-enters the
        // live lifecycle.
        let status = SessionStatus::parse(&self.status).unwrap_or_else(|| {
            tracing::warn!(session_id = %self.id, status = %self.status, "Unknown session status");
            SessionStatus::Expired
        });
        let search_criteria = self
            .search_criteria
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok());
        TutorSession {
            id: self.id,
            user_id: self.user_id,
            status,
            subject: self.subject,
            skill_level: self.skill_level,
            study_goal: self.study_goal,
            persona_id: self.persona_id,
            search_criteria,
            started_at: self.started_at,
            ended_at: self.ended_at,
            total_duration_seconds: self.total_duration_seconds,
            message_count: self.message_count,
            linked_study_session_id: self.linked_study_session_id,
            deleted_by_user_at: self.deleted_by_user_at,
            deleted_by_admin_at: self.deleted_by_admin_at,
        }
    }
}

const SESSION_COLUMNS: &str = "id, user_id, status, subject, skill_level, study_goal, \
     persona_id, search_criteria, started_at, ended_at, total_duration_seconds, \
     message_count, linked_study_session_id, deleted_by_user_at, deleted_by_admin_at";

/// Soft-deleted sessions are invisible to the normal lifecycle but
/// retained for audit.
const NOT_DELETED: &str = "deleted_by_user_at IS NULL AND deleted_by_admin_at IS NULL";

impl Database {
    /// Create a new ACTIVE tutor session for `user_id`.
    ///
    /// Fails with `Conflict` when the user already has a session in
    /// ACTIVE or PAUSED, returning the existing id so the caller can
    /// offer "resume instead". The existence check and insert run in one
    /// transaction; a concurrent double-create that slips past the check
    /// loses on the partial unique index and is mapped to the same
    /// `Conflict`.
    pub async fn create_session(
        &self,
        user_id: &str,
        params: &SessionParams,
        now_ts: i64,
    ) -> SessionResult<TutorSession> {
        let mut tx = self.pool().begin().await?;

        let existing: Option<(String,)> = sqlx::query_as(&format!(
            "SELECT id FROM tutor_sessions \
             WHERE user_id = ?1 AND status IN ('active', 'paused') AND {NOT_DELETED}"
        ))
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        if let Some((existing_session_id,)) = existing {
            return Err(SessionError::Conflict {
                existing_session_id,
            });
        }

        let id = Uuid::new_v4().to_string();
        let linked_study_session_id = if params.link_study_session {
            let study_id = Uuid::new_v4().to_string();
            sqlx::query(
                "INSERT INTO study_sessions (id, user_id, subject, status, started_at) \
                 VALUES (?1, ?2, ?3, 'active', ?4)",
            )
            .bind(&study_id)
            .bind(user_id)
            .bind(&params.subject)
            .bind(now_ts)
            .execute(&mut *tx)
            .await?;
            Some(study_id)
        } else {
            None
        };

        let search_criteria = params
            .search_criteria
            .as_ref()
            .map(|v| v.to_string());

        let insert = sqlx::query(
            "INSERT INTO tutor_sessions (\
                 id, user_id, status, subject, skill_level, study_goal, persona_id, \
                 search_criteria, started_at, message_count, linked_study_session_id\
             ) VALUES (?1, ?2, 'active', ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(&params.subject)
        .bind(&params.skill_level)
        .bind(&params.study_goal)
        .bind(&params.persona_id)
        .bind(&search_criteria)
        .bind(now_ts)
        .bind(&linked_study_session_id)
        .execute(&mut *tx)
        .await;

        if let Err(e) = insert {
            if is_unique_violation(&e) {
                // Lost a create/create race. Surface the winner's id.
                drop(tx);
                return Err(self.open_session_conflict(user_id).await?);
            }
            return Err(e.into());
        }

        tx.commit().await?;

        self.get_session(&id, user_id).await
    }

    /// Ownership-scoped read. Soft-deleted sessions report `NotFound`.
    pub async fn get_session(&self, session_id: &str, user_id: &str) -> SessionResult<TutorSession> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM tutor_sessions \
             WHERE id = ?1 AND user_id = ?2 AND {NOT_DELETED}"
        ))
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        row.map(SessionRow::into_session)
            .ok_or(SessionError::NotFound)
    }

    /// ACTIVE → PAUSED. No duration is finalized.
    pub async fn pause(&self, session_id: &str, user_id: &str) -> SessionResult<TutorSession> {
        self.transition(session_id, user_id, SessionStatus::Active, "paused")
            .await
    }

    /// PAUSED → ACTIVE. The response layer owns the "welcome back" copy.
    pub async fn resume(&self, session_id: &str, user_id: &str) -> SessionResult<TutorSession> {
        self.transition(session_id, user_id, SessionStatus::Paused, "active")
            .await
    }

    /// Conditional single-state transition. The status predicate lives in
    /// the UPDATE itself; zero rows affected is disambiguated into
    /// `NotFound` vs `InvalidTransition` by re-reading.
    async fn transition(
        &self,
        session_id: &str,
        user_id: &str,
        from: SessionStatus,
        to: &str,
    ) -> SessionResult<TutorSession> {
        let result = sqlx::query(&format!(
            "UPDATE tutor_sessions SET status = ?1 \
             WHERE id = ?2 AND user_id = ?3 AND status = ?4 AND {NOT_DELETED}"
        ))
        .bind(to)
        .bind(session_id)
        .bind(user_id)
        .bind(from.as_str())
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_session(session_id, user_id).await?;
            return Err(SessionError::InvalidTransition {
                from: current.status,
            });
        }

        self.get_session(session_id, user_id).await
    }

    /// ACTIVE|PAUSED → COMPLETED. Stamps `ended_at` and
    /// `total_duration_seconds = now - started_at`, and ends the linked
    /// study session in the same transaction.
    pub async fn complete(
        &self,
        session_id: &str,
        user_id: &str,
        now_ts: i64,
    ) -> SessionResult<TutorSession> {
        let mut tx = self.pool().begin().await?;

        let result = sqlx::query(&format!(
            "UPDATE tutor_sessions SET \
                 status = 'completed', \
                 ended_at = ?1, \
                 total_duration_seconds = ?1 - started_at \
             WHERE id = ?2 AND user_id = ?3 AND status IN ('active', 'paused') AND {NOT_DELETED}"
        ))
        .bind(now_ts)
        .bind(session_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            drop(tx);
            let current = self.get_session(session_id, user_id).await?;
            return Err(SessionError::InvalidTransition {
                from: current.status,
            });
        }

        sqlx::query(
            "UPDATE study_sessions SET status = 'completed', ended_at = ?1 \
             WHERE id = (SELECT linked_study_session_id FROM tutor_sessions WHERE id = ?2) \
               AND status != 'completed'",
        )
        .bind(now_ts)
        .bind(session_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_session(session_id, user_id).await
    }

    /// Bulk opt-out path: end every ACTIVE/PAUSED session for the user in
    /// one pass, stamping a shared `ended_at`. Durations are deliberately
    /// left to the reporting job rather than reconstructed per session.
    /// Idempotent: a second call affects zero rows and errors on neither.
    pub async fn complete_all(&self, user_id: &str, now_ts: i64) -> SessionResult<u64> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(&format!(
            "UPDATE study_sessions SET status = 'completed', ended_at = ?1 \
             WHERE id IN (\
                 SELECT linked_study_session_id FROM tutor_sessions \
                 WHERE user_id = ?2 AND status IN ('active', 'paused') AND {NOT_DELETED} \
                   AND linked_study_session_id IS NOT NULL\
             )"
        ))
        .bind(now_ts)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(&format!(
            "UPDATE tutor_sessions SET status = 'completed', ended_at = ?1 \
             WHERE user_id = ?2 AND status IN ('active', 'paused') AND {NOT_DELETED}"
        ))
        .bind(now_ts)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    /// Background sweep: ACTIVE → EXPIRED for sessions whose last
    /// activity (latest turn, else session start) predates the staleness
    /// threshold. Uses the same conditional-status guard as `complete`,
    /// so racing a concurrent user-initiated completion no-ops instead of
    /// erroring. Returns the number of sessions expired.
    pub async fn expire_stale(&self, stale_after_secs: i64, now_ts: i64) -> SessionResult<u64> {
        let cutoff = now_ts - stale_after_secs;
        let result = sqlx::query(&format!(
            "UPDATE tutor_sessions SET \
                 status = 'expired', \
                 ended_at = ?1, \
                 total_duration_seconds = ?1 - started_at \
             WHERE status = 'active' AND {NOT_DELETED} \
               AND COALESCE(\
                     (SELECT MAX(t.created_at) FROM conversation_turns t \
                      WHERE t.session_id = tutor_sessions.id), \
                     started_at\
                   ) < ?2"
        ))
        .bind(now_ts)
        .bind(cutoff)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }

    /// Soft-delete marker set by the session's owner. The row stays for
    /// audit but disappears from the lifecycle.
    pub async fn mark_deleted_by_user(
        &self,
        session_id: &str,
        user_id: &str,
        now_ts: i64,
    ) -> SessionResult<()> {
        let result = sqlx::query(&format!(
            "UPDATE tutor_sessions SET deleted_by_user_at = ?1 \
             WHERE id = ?2 AND user_id = ?3 AND {NOT_DELETED}"
        ))
        .bind(now_ts)
        .bind(session_id)
        .bind(user_id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(SessionError::NotFound);
        }
        Ok(())
    }

    /// Resolve the winner of a lost create/create race into a `Conflict`.
    async fn open_session_conflict(&self, user_id: &str) -> Result<SessionError, sqlx::Error> {
        let existing: Option<(String,)> = sqlx::query_as(&format!(
            "SELECT id FROM tutor_sessions \
             WHERE user_id = ?1 AND status IN ('active', 'paused') AND {NOT_DELETED}"
        ))
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(match existing {
            Some((existing_session_id,)) => SessionError::Conflict {
                existing_session_id,
            },
            // The winner completed in the meantime; the caller can simply
            // retry.
            None => SessionError::NotFound,
        })
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(
        e.as_database_error().map(|d| d.kind()),
        Some(ErrorKind::UniqueViolation)
    )
}
