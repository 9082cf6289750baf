//! SQL schema for the shopquiz SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Foreign keys cascade from `quizzes` down to conditions and collection
/// links, so deleting a quiz or its questions removes everything beneath.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS shops (
    shop_domain   TEXT PRIMARY KEY,
    access_token  TEXT NOT NULL,
    scope         TEXT,
    installed_at  TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS quizzes (
    id                    TEXT PRIMARY KEY,
    shop_domain           TEXT NOT NULL,
    title                 TEXT NOT NULL,
    internal_title        TEXT,
    internal_description  TEXT,
    image_url             TEXT,
    is_active             INTEGER NOT NULL DEFAULT 0,
    style_settings        TEXT,              -- JSON blob or NULL
    collection_ids        TEXT NOT NULL DEFAULT '[]',
    created_at            TEXT NOT NULL,
    updated_at            TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS questions (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    quiz_id         TEXT NOT NULL REFERENCES quizzes(id) ON DELETE CASCADE,
    question_text   TEXT NOT NULL,
    image_url       TEXT,
    show_images     INTEGER NOT NULL DEFAULT 0,
    allow_multiple  INTEGER NOT NULL DEFAULT 0,
    order_index     INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS answers (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    question_id    INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
    answer_text    TEXT NOT NULL,
    image_url      TEXT,
    redirect_url   TEXT,
    redirect_type  TEXT,
    order_index    INTEGER NOT NULL,
    weight         INTEGER NOT NULL DEFAULT 1,
    is_default     INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS metafield_conditions (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    answer_id       INTEGER NOT NULL REFERENCES answers(id) ON DELETE CASCADE,
    namespace       TEXT NOT NULL,
    key             TEXT NOT NULL,
    display_name    TEXT,
    metafield_type  TEXT,
    operator        TEXT NOT NULL,  -- 'equals' | 'not_equals'
    value           TEXT NOT NULL,
    weight          INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS answer_collections (
    answer_id               INTEGER NOT NULL REFERENCES answers(id) ON DELETE CASCADE,
    external_collection_id  TEXT NOT NULL,
    order_index             INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS quizzes_shop_idx            ON quizzes(shop_domain);
CREATE INDEX IF NOT EXISTS questions_quiz_idx          ON questions(quiz_id);
CREATE INDEX IF NOT EXISTS answers_question_idx        ON answers(question_id);
CREATE INDEX IF NOT EXISTS conditions_answer_idx       ON metafield_conditions(answer_id);
CREATE INDEX IF NOT EXISTS answer_collections_answer_idx ON answer_collections(answer_id);

PRAGMA user_version = 1;
";
