// src/store/schema.rs

//! SQL schema for the SQLite record store.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_name VARCHAR(255) NOT NULL,
    start_year INTEGER NOT NULL,
    end_year INTEGER,
    key_figures TEXT,
    description TEXT,
    impact TEXT,
    category VARCHAR(100),
    region VARCHAR(100),
    importance_level INTEGER DEFAULT 5,
    source TEXT,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS periods (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    period_name VARCHAR(255) NOT NULL,
    start_year INTEGER NOT NULL,
    end_year INTEGER NOT NULL,
    period_type VARCHAR(50) NOT NULL,   -- 'continuous' | 'independent'
    description TEXT,
    region VARCHAR(100),
    era_characteristics TEXT,
    key_legacy TEXT,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_events_start_year ON events(start_year);
CREATE INDEX IF NOT EXISTS idx_events_region ON events(region);
CREATE INDEX IF NOT EXISTS idx_events_category ON events(category);
CREATE INDEX IF NOT EXISTS idx_events_importance ON events(importance_level);
CREATE INDEX IF NOT EXISTS idx_periods_start_year ON periods(start_year);
CREATE INDEX IF NOT EXISTS idx_periods_region ON periods(region);
CREATE INDEX IF NOT EXISTS idx_periods_type ON periods(period_type);
";
