//! SQL schema for the famtree SQLite store.
//!
//! Executed once when a [`crate::Database`] is opened. Ownership and event
//! subject references are deferred foreign keys: they are checked when a
//! transaction commits, so a delete-then-insert replacement inside one
//! transaction never trips them.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS "User" (
    username    TEXT PRIMARY KEY NOT NULL,
    password    TEXT NOT NULL,
    email       TEXT NOT NULL,
    first_name  TEXT NOT NULL,
    last_name   TEXT NOT NULL,
    gender      TEXT NOT NULL CHECK (gender IN ('m', 'f')),
    person_id   TEXT             -- root of the user's tree, if filled
);

CREATE TABLE IF NOT EXISTS "Person" (
    id                  TEXT PRIMARY KEY NOT NULL,
    associated_username TEXT NOT NULL
        REFERENCES "User"(username) DEFERRABLE INITIALLY DEFERRED,
    first_name          TEXT NOT NULL,
    last_name           TEXT NOT NULL,
    gender              TEXT NOT NULL CHECK (gender IN ('m', 'f')),
    father_id           TEXT,
    mother_id           TEXT,
    spouse_id           TEXT
);

CREATE TABLE IF NOT EXISTS "Event" (
    id                  TEXT PRIMARY KEY NOT NULL,
    associated_username TEXT NOT NULL
        REFERENCES "User"(username) DEFERRABLE INITIALLY DEFERRED,
    person_id           TEXT NOT NULL
        REFERENCES "Person"(id) DEFERRABLE INITIALLY DEFERRED,
    latitude            REAL,
    longitude           REAL,
    country             TEXT,
    city                TEXT,
    event_type          TEXT NOT NULL,   -- birth | marriage | death | free-form
    year                INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS "AuthToken" (
    id                  TEXT PRIMARY KEY NOT NULL,
    associated_username TEXT NOT NULL
        REFERENCES "User"(username) DEFERRABLE INITIALLY DEFERRED,
    created_at          TEXT NOT NULL,   -- RFC 3339 UTC
    is_valid            INTEGER NOT NULL CHECK (is_valid IN (0, 1))
);

CREATE INDEX IF NOT EXISTS person_owner_idx ON "Person"(associated_username);
CREATE INDEX IF NOT EXISTS event_owner_idx  ON "Event"(associated_username);
CREATE INDEX IF NOT EXISTS event_person_idx ON "Event"(person_id);
CREATE INDEX IF NOT EXISTS token_owner_idx  ON "AuthToken"(associated_username);

PRAGMA user_version = 1;
"#;
