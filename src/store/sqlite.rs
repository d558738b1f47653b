// src/store/sqlite.rs

//! SQLite implementation of the record store.

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::types::Value;

use crate::error::{AppError, Result};
use crate::models::{Event, NewEvent, NewPeriod, PageMeta, Period, PeriodType, StoreStatistics};
use crate::store::{EventFilter, EventPatch};
use crate::store::schema::SCHEMA;

/// Record store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. The
/// connection runs on its own thread, so no operation holds a transaction
/// across work-units.
#[derive(Clone)]
pub struct SqliteStore {
    conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
    /// Open (or create) a store at `path` and run schema initialization.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = tokio_rusqlite::Connection::open(path).await?;
        let store = Self { conn };
        store.init_schema().await?;
        Ok(store)
    }

    /// Open an in-memory store, useful for testing.
    pub async fn open_in_memory() -> Result<Self> {
        let conn = tokio_rusqlite::Connection::open_in_memory().await?;
        let store = Self { conn };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.execute_batch(SCHEMA)?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Insert a single event; returns the assigned row id.
    ///
    /// Does not deduplicate; callers pre-check.
    pub async fn insert_event(&self, event: &NewEvent) -> Result<i64> {
        let event = event.clone();
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO events (
                        event_name, start_year, end_year, key_figures,
                        description, impact, category, region,
                        importance_level, source
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    rusqlite::params![
                        event.event_name,
                        event.start_year,
                        event.end_year,
                        event.key_figures,
                        event.description,
                        event.impact,
                        event.category,
                        event.region,
                        event.importance_level,
                        event.source,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    /// Partially update an existing event: only the fields set in the
    /// patch change. An empty patch is a no-op (the row must still exist).
    pub async fn update_event(&self, id: i64, patch: &EventPatch) -> Result<()> {
        let patch = patch.clone();
        let changed = self
            .conn
            .call(move |conn| {
                let mut assignments = Vec::new();
                let mut params: Vec<Value> = Vec::new();

                if let Some(name) = patch.event_name {
                    assignments.push("event_name = ?");
                    params.push(Value::from(name));
                }
                if let Some(year) = patch.start_year {
                    assignments.push("start_year = ?");
                    params.push(Value::from(year));
                }
                if let Some(year) = patch.end_year {
                    assignments.push("end_year = ?");
                    params.push(Value::from(year));
                }
                if let Some(figures) = patch.key_figures {
                    assignments.push("key_figures = ?");
                    params.push(Value::from(figures));
                }
                if let Some(description) = patch.description {
                    assignments.push("description = ?");
                    params.push(Value::from(description));
                }
                if let Some(impact) = patch.impact {
                    assignments.push("impact = ?");
                    params.push(Value::from(impact));
                }
                if let Some(category) = patch.category {
                    assignments.push("category = ?");
                    params.push(Value::from(category));
                }
                if let Some(region) = patch.region {
                    assignments.push("region = ?");
                    params.push(Value::from(region));
                }
                if let Some(level) = patch.importance_level {
                    assignments.push("importance_level = ?");
                    params.push(Value::from(level));
                }
                if let Some(source) = patch.source {
                    assignments.push("source = ?");
                    params.push(Value::from(source));
                }

                if assignments.is_empty() {
                    let exists: bool = conn.query_row(
                        "SELECT EXISTS(SELECT 1 FROM events WHERE id = ?)",
                        [id],
                        |row| row.get(0),
                    )?;
                    return Ok(usize::from(exists));
                }

                let sql = format!(
                    "UPDATE events SET {} WHERE id = ?",
                    assignments.join(", ")
                );
                params.push(Value::from(id));
                let changed = conn.execute(&sql, rusqlite::params_from_iter(params))?;
                Ok(changed)
            })
            .await?;

        if changed == 0 {
            return Err(AppError::RecordNotFound(id));
        }
        Ok(())
    }

    /// Insert a single period; returns the assigned row id.
    pub async fn insert_period(&self, period: &NewPeriod) -> Result<i64> {
        let period = period.clone();
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO periods (
                        period_name, start_year, end_year, period_type,
                        description, region, era_characteristics, key_legacy
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    rusqlite::params![
                        period.period_name,
                        period.start_year,
                        period.end_year,
                        period.period_type.as_str(),
                        period.description,
                        period.region,
                        period.era_characteristics,
                        period.key_legacy,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    /// Query events whose start_year lies within [start_year, end_year],
    /// ordered by (start_year ASC, importance_level DESC) so that for equal
    /// years, higher-importance events surface first.
    pub async fn events_in_range(
        &self,
        region: &str,
        start_year: i32,
        end_year: i32,
        min_importance: Option<i64>,
        limit: usize,
    ) -> Result<Vec<Event>> {
        let region = region.to_string();
        let events = self
            .conn
            .call(move |conn| {
                let mut sql = String::from(
                    "SELECT * FROM events
                     WHERE start_year >= ? AND start_year <= ? AND region = ?",
                );
                let mut params: Vec<Value> = vec![
                    Value::from(start_year),
                    Value::from(end_year),
                    Value::from(region),
                ];

                if let Some(min) = min_importance {
                    sql.push_str(" AND importance_level >= ?");
                    params.push(Value::from(min));
                }

                sql.push_str(" ORDER BY start_year ASC, importance_level DESC LIMIT ?");
                params.push(Value::from(limit as i64));

                let mut stmt = conn.prepare(&sql)?;
                let events = stmt
                    .query_map(rusqlite::params_from_iter(params), event_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(events)
            })
            .await?;
        Ok(events)
    }

    /// Paginated event query for time-axis scrolling.
    pub async fn events_paginated(
        &self,
        filter: &EventFilter,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Event>, PageMeta)> {
        let filter = filter.clone();
        let (events, total) = self
            .conn
            .call(move |conn| {
                let mut conditions = Vec::new();
                let mut params: Vec<Value> = Vec::new();

                if let Some(start) = filter.start_year {
                    conditions.push("start_year >= ?");
                    params.push(Value::from(start));
                }
                if let Some(end) = filter.end_year {
                    conditions.push("start_year <= ?");
                    params.push(Value::from(end));
                }
                if let Some(region) = filter.region {
                    conditions.push("region = ?");
                    params.push(Value::from(region));
                }
                if let Some(min) = filter.min_importance {
                    conditions.push("importance_level >= ?");
                    params.push(Value::from(min));
                }

                let where_clause = if conditions.is_empty() {
                    String::new()
                } else {
                    format!(" WHERE {}", conditions.join(" AND "))
                };

                let total: i64 = conn.query_row(
                    &format!("SELECT COUNT(*) FROM events{where_clause}"),
                    rusqlite::params_from_iter(params.clone()),
                    |row| row.get(0),
                )?;

                let sql = format!(
                    "SELECT * FROM events{where_clause}
                     ORDER BY start_year ASC, importance_level DESC
                     LIMIT ? OFFSET ?"
                );
                params.push(Value::from(limit as i64));
                params.push(Value::from(offset as i64));

                let mut stmt = conn.prepare(&sql)?;
                let events = stmt
                    .query_map(rusqlite::params_from_iter(params), event_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok((events, total as usize))
            })
            .await?;

        let meta = PageMeta {
            total,
            offset,
            limit,
            has_more: offset + limit < total,
        };
        Ok((events, meta))
    }

    /// Case-insensitive substring search across name/description/impact/
    /// key_figures, OR-combined, ordered by (importance DESC, start_year ASC).
    pub async fn events_matching_keyword(
        &self,
        keyword: &str,
        region: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Event>> {
        let pattern = format!("%{}%", keyword.to_lowercase());
        let region = region.map(|r| r.to_string());
        let events = self
            .conn
            .call(move |conn| {
                let mut sql = String::from(
                    "SELECT * FROM events
                     WHERE (
                        LOWER(event_name) LIKE ?1 OR
                        LOWER(description) LIKE ?1 OR
                        LOWER(impact) LIKE ?1 OR
                        LOWER(key_figures) LIKE ?1
                     )",
                );
                let mut params: Vec<Value> = vec![Value::from(pattern)];

                if let Some(region) = region {
                    sql.push_str(" AND region = ?2");
                    params.push(Value::from(region));
                }

                sql.push_str(" ORDER BY importance_level DESC, start_year ASC LIMIT ");
                sql.push_str(&(limit as i64).to_string());

                let mut stmt = conn.prepare(&sql)?;
                let events = stmt
                    .query_map(rusqlite::params_from_iter(params), event_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(events)
            })
            .await?;
        Ok(events)
    }

    /// Query periods overlapping [start_year, end_year]
    /// (period.start <= query.end AND period.end >= query.start).
    pub async fn periods_in_range(
        &self,
        region: &str,
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<Period>> {
        let region = region.to_string();
        let periods = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT * FROM periods
                     WHERE start_year <= ?1 AND end_year >= ?2 AND region = ?3
                     ORDER BY start_year ASC",
                )?;
                let periods = stmt
                    .query_map(
                        rusqlite::params![end_year, start_year, region],
                        period_from_row,
                    )?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(periods)
            })
            .await?;
        Ok(periods)
    }

    /// Events of the given regions within ±50 years of `year` at or above
    /// the importance threshold, grouped by region.
    pub async fn cross_regional_events(
        &self,
        year: i32,
        regions: &[String],
        importance_threshold: i64,
    ) -> Result<BTreeMap<String, Vec<Event>>> {
        if regions.is_empty() {
            return Ok(BTreeMap::new());
        }

        let regions = regions.to_vec();
        let grouped = self
            .conn
            .call(move |conn| {
                let placeholders = vec!["?"; regions.len()].join(", ");
                let sql = format!(
                    "SELECT * FROM events
                     WHERE region IN ({placeholders})
                       AND ABS(start_year - ?) <= 50
                       AND importance_level >= ?
                     ORDER BY start_year ASC"
                );

                let mut params: Vec<Value> =
                    regions.into_iter().map(Value::from).collect();
                params.push(Value::from(year));
                params.push(Value::from(importance_threshold));

                let mut stmt = conn.prepare(&sql)?;
                let events = stmt
                    .query_map(rusqlite::params_from_iter(params), event_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                let mut grouped: BTreeMap<String, Vec<Event>> = BTreeMap::new();
                for event in events {
                    grouped
                        .entry(event.record.region.clone())
                        .or_default()
                        .push(event);
                }
                Ok(grouped)
            })
            .await?;
        Ok(grouped)
    }

    /// Aggregate counts: totals, per-region, per-category, importance
    /// histogram, year bounds.
    pub async fn statistics(&self) -> Result<StoreStatistics> {
        let stats = self
            .conn
            .call(|conn| {
                let total_events: i64 =
                    conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
                let total_periods: i64 =
                    conn.query_row("SELECT COUNT(*) FROM periods", [], |row| row.get(0))?;

                let mut events_by_region = BTreeMap::new();
                let mut stmt =
                    conn.prepare("SELECT region, COUNT(*) FROM events GROUP BY region")?;
                let rows = stmt.query_map([], |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                        row.get::<_, i64>(1)?,
                    ))
                })?;
                for row in rows {
                    let (region, count) = row?;
                    events_by_region.insert(region, count as usize);
                }

                let mut events_by_category = BTreeMap::new();
                let mut stmt = conn.prepare(
                    "SELECT category, COUNT(*) FROM events
                     WHERE category IS NOT NULL GROUP BY category",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })?;
                for row in rows {
                    let (category, count) = row?;
                    events_by_category.insert(category, count as usize);
                }

                let mut importance_histogram = BTreeMap::new();
                let mut stmt = conn.prepare(
                    "SELECT importance_level, COUNT(*) FROM events GROUP BY importance_level",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
                })?;
                for row in rows {
                    let (level, count) = row?;
                    importance_histogram.insert(level, count as usize);
                }

                let year_bounds: Option<(i32, i32)> = conn.query_row(
                    "SELECT MIN(start_year), MAX(start_year) FROM events",
                    [],
                    |row| {
                        let min: Option<i32> = row.get(0)?;
                        let max: Option<i32> = row.get(1)?;
                        Ok(min.zip(max))
                    },
                )?;

                Ok(StoreStatistics {
                    total_events: total_events as usize,
                    total_periods: total_periods as usize,
                    events_by_region,
                    events_by_category,
                    importance_histogram,
                    year_bounds,
                })
            })
            .await?;
        Ok(stats)
    }
}

fn event_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get("id")?,
        record: NewEvent {
            event_name: row.get("event_name")?,
            start_year: row.get("start_year")?,
            end_year: row.get("end_year")?,
            key_figures: row.get("key_figures")?,
            description: row.get("description")?,
            impact: row.get("impact")?,
            category: row.get("category")?,
            region: row.get::<_, Option<String>>("region")?.unwrap_or_default(),
            importance_level: row
                .get::<_, Option<i64>>("importance_level")?
                .unwrap_or(crate::models::DEFAULT_IMPORTANCE),
            source: row.get("source")?,
        },
    })
}

fn period_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Period> {
    let type_str: String = row.get("period_type")?;
    let period_type = type_str.parse::<PeriodType>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Period {
        id: row.get("id")?,
        record: NewPeriod {
            period_name: row.get("period_name")?,
            start_year: row.get("start_year")?,
            end_year: row.get("end_year")?,
            period_type,
            description: row.get("description")?,
            region: row.get::<_, Option<String>>("region")?.unwrap_or_default(),
            era_characteristics: row.get("era_characteristics")?,
            key_legacy: row.get("key_legacy")?,
        },
    })
}
