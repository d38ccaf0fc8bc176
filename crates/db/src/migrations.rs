/// Inline SQL migrations for the study-partner database schema.
///
/// We use simple inline migrations rather than sqlx migration files
/// because the schema is small and self-contained.
pub const MIGRATIONS: &[&str] = &[
    // Migration 1: tutor_sessions table
    r#"
CREATE TABLE IF NOT EXISTS tutor_sessions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',
    subject TEXT,
    skill_level TEXT,
    study_goal TEXT,
    persona_id TEXT,
    search_criteria TEXT,
    started_at INTEGER NOT NULL,
    ended_at INTEGER,
    total_duration_seconds INTEGER,
    message_count INTEGER NOT NULL DEFAULT 0,
    linked_study_session_id TEXT,
    deleted_by_user_at INTEGER,
    deleted_by_admin_at INTEGER
);
"#,
    // Migration 2: tutor_sessions indexes. The partial unique index is
    // what makes the one-open-session-per-user invariant hold under
    // concurrent creates: the losing insert fails with a unique
    // violation instead of producing a second open session.
    r#"
CREATE INDEX IF NOT EXISTS idx_tutor_sessions_user_status
ON tutor_sessions(user_id, status);
"#,
    r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_tutor_sessions_one_open
ON tutor_sessions(user_id)
WHERE status IN ('active', 'paused')
  AND deleted_by_user_at IS NULL
  AND deleted_by_admin_at IS NULL;
"#,
    // Migration 3: generic study_sessions records, mirrored for
    // cross-feature reporting.
    r#"
CREATE TABLE IF NOT EXISTS study_sessions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    subject TEXT,
    status TEXT NOT NULL DEFAULT 'active',
    started_at INTEGER NOT NULL,
    ended_at INTEGER
);
"#,
    // Migration 4: conversation_turns table
    r#"
CREATE TABLE IF NOT EXISTS conversation_turns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL REFERENCES tutor_sessions(id),
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
"#,
    r#"
CREATE INDEX IF NOT EXISTS idx_turns_session_time
ON conversation_turns(session_id, created_at);
"#,
];
