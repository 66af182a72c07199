//! SQL schema for the CourseFinder SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    role          TEXT NOT NULL,   -- 'admin' | 'student' | 'college'
    is_active     INTEGER NOT NULL DEFAULT 1,
    last_login    TEXT,
    created_at    TEXT NOT NULL    -- ISO 8601 UTC
);

CREATE TABLE IF NOT EXISTS students (
    id                    INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id               INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    phone_number          TEXT,
    date_of_birth         TEXT,
    gender                TEXT,    -- 'Male' | 'Female' | 'Other'
    school_name           TEXT,
    highest_qualification TEXT,
    marks_percentage      REAL,
    passing_year          INTEGER,
    street                TEXT,
    district              TEXT,
    state                 TEXT,
    verified              INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS colleges (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    logo        TEXT,
    image       TEXT,
    street      TEXT,
    state       TEXT,
    district    TEXT,
    description TEXT,
    is_approved INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS courses (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    college_id INTEGER NOT NULL REFERENCES colleges(id) ON DELETE CASCADE,
    name       TEXT NOT NULL,
    duration   INTEGER NOT NULL,
    fee        INTEGER NOT NULL
);

-- Duplicate (student, college, course) triples and reused payment ids are
-- rejected by the database itself, not by a read-then-write check.
CREATE TABLE IF NOT EXISTS applications (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id INTEGER NOT NULL REFERENCES students(id) ON DELETE CASCADE,
    college_id INTEGER NOT NULL REFERENCES colleges(id) ON DELETE CASCADE,
    course_id  INTEGER NOT NULL REFERENCES courses(id)  ON DELETE CASCADE,
    status     TEXT NOT NULL DEFAULT 'pending',
    payment_id TEXT NOT NULL UNIQUE,
    applied_at TEXT NOT NULL,
    UNIQUE (student_id, college_id, course_id)
);

CREATE TABLE IF NOT EXISTS reviews (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id  INTEGER NOT NULL REFERENCES students(id) ON DELETE CASCADE,
    college_id  INTEGER NOT NULL REFERENCES colleges(id) ON DELETE CASCADE,
    rating      INTEGER NOT NULL,
    review_text TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS contacts (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id      INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name         TEXT NOT NULL,
    email        TEXT NOT NULL,
    subject      TEXT NOT NULL,
    message      TEXT NOT NULL,
    role         TEXT NOT NULL,
    submitted_at TEXT NOT NULL
);

-- One pending verification code per email address.
CREATE TABLE IF NOT EXISTS otp_codes (
    email      TEXT PRIMARY KEY,
    code       TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS courses_college_idx      ON courses(college_id);
CREATE INDEX IF NOT EXISTS applications_student_idx ON applications(student_id);
CREATE INDEX IF NOT EXISTS applications_college_idx ON applications(college_id);
CREATE INDEX IF NOT EXISTS reviews_college_idx      ON reviews(college_id);

PRAGMA user_version = 1;
";
