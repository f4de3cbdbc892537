//! SQL schema for the journal's SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    role          TEXT NOT NULL,   -- 'student' | 'teacher'
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS classrooms (
    classroom_id TEXT PRIMARY KEY,
    title        TEXT NOT NULL,
    teacher_id   TEXT NOT NULL REFERENCES users(user_id),
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS classroom_students (
    classroom_id TEXT NOT NULL REFERENCES classrooms(classroom_id) ON DELETE CASCADE,
    user_id      TEXT NOT NULL,
    PRIMARY KEY (classroom_id, user_id)
);

-- One row per reflection. The visibility discriminant and the classroom
-- column must agree: private rows carry no classroom, published rows do.
CREATE TABLE IF NOT EXISTS entries (
    entry_id       TEXT PRIMARY KEY,
    author_id      TEXT NOT NULL,
    title          TEXT NOT NULL,
    body           TEXT NOT NULL,
    photo_ref      TEXT,
    visibility     TEXT NOT NULL DEFAULT 'private',
    classroom_id   TEXT,
    feedback_state TEXT NOT NULL DEFAULT 'not_requested',
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL,
    CHECK ((visibility = 'private') = (classroom_id IS NULL)),
    CHECK (visibility IN ('private', 'public_attributed', 'public_anonymous')),
    CHECK (feedback_state IN ('not_requested', 'requested', 'given'))
);

-- The like set; the primary key makes membership unique per (entry, user).
CREATE TABLE IF NOT EXISTS entry_likes (
    entry_id TEXT NOT NULL REFERENCES entries(entry_id) ON DELETE CASCADE,
    user_id  TEXT NOT NULL,
    liked_at TEXT NOT NULL,
    PRIMARY KEY (entry_id, user_id)
);

CREATE TABLE IF NOT EXISTS feedback (
    entry_id   TEXT PRIMARY KEY REFERENCES entries(entry_id) ON DELETE CASCADE,
    teacher_id TEXT NOT NULL,
    content    TEXT NOT NULL,
    given_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS entries_author_idx    ON entries(author_id);
CREATE INDEX IF NOT EXISTS entries_classroom_idx ON entries(classroom_id);
CREATE INDEX IF NOT EXISTS classrooms_teacher_idx ON classrooms(teacher_id);

PRAGMA user_version = 1;
";
