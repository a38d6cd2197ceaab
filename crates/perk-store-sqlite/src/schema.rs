//! SQL schema for the Perk SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per member. `position` records list order.
CREATE TABLE IF NOT EXISTS members (
    member_id     INTEGER PRIMARY KEY,
    position      INTEGER NOT NULL,
    name          TEXT NOT NULL,
    phone         TEXT,
    email         TEXT,
    address       TEXT,
    tier          TEXT NOT NULL,   -- 'Bronze' | 'Silver' | 'Gold' | 'Platinum'
    registered_at TEXT NOT NULL    -- ISO 8601 UTC
);

CREATE TABLE IF NOT EXISTS transactions (
    transaction_id TEXT PRIMARY KEY,
    member_id      INTEGER NOT NULL REFERENCES members(member_id) ON DELETE CASCADE,
    amount         TEXT NOT NULL,  -- exact decimal, never a float
    at             TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS reservations (
    reservation_id TEXT PRIMARY KEY,
    member_id      INTEGER NOT NULL REFERENCES members(member_id) ON DELETE CASCADE,
    at             TEXT NOT NULL,
    status         TEXT NOT NULL,  -- 'pending' | 'confirmed' | 'cancelled' | 'completed'
    remark         TEXT
);

-- Bookkeeping. A `saved_at` row means at least one save has happened.
CREATE TABLE IF NOT EXISTS meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS transactions_member_idx ON transactions(member_id);
CREATE INDEX IF NOT EXISTS reservations_member_idx ON reservations(member_id);

PRAGMA user_version = 1;
";
