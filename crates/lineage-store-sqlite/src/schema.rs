//! SQL schema for the Lineage SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS members (
    member_id   TEXT PRIMARY KEY,
    created_by  TEXT NOT NULL,
    name        TEXT NOT NULL,
    gender      TEXT NOT NULL CHECK (gender IN ('male', 'female')),
    birth_date  TEXT,            -- YYYY-MM-DD
    death_date  TEXT,            -- YYYY-MM-DD
    description TEXT,
    photo_url   TEXT,
    -- Not foreign keys: references to missing members are kept as written.
    father_id   TEXT,
    mother_id   TEXT,
    position_x  REAL NOT NULL DEFAULT 0,
    position_y  REAL NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,   -- RFC 3339 UTC, fixed microsecond width
    updated_at  TEXT NOT NULL
);

-- Set-valued fields, one row per element. The owning side cascades; the
-- referenced side is a plain id.
CREATE TABLE IF NOT EXISTS member_spouses (
    member_id TEXT NOT NULL REFERENCES members(member_id) ON DELETE CASCADE,
    spouse_id TEXT NOT NULL,
    PRIMARY KEY (member_id, spouse_id)
);

CREATE TABLE IF NOT EXISTS member_children (
    member_id TEXT NOT NULL REFERENCES members(member_id) ON DELETE CASCADE,
    child_id  TEXT NOT NULL,
    PRIMARY KEY (member_id, child_id)
);

CREATE INDEX IF NOT EXISTS members_father_idx   ON members(father_id);
CREATE INDEX IF NOT EXISTS members_mother_idx   ON members(mother_id);
CREATE INDEX IF NOT EXISTS members_created_idx  ON members(created_at);
CREATE INDEX IF NOT EXISTS spouses_spouse_idx   ON member_spouses(spouse_id);
CREATE INDEX IF NOT EXISTS children_child_idx   ON member_children(child_id);

PRAGMA user_version = 1;
";
