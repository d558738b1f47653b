// src/models/report.rs

//! Aggregate results of sweeps and store queries.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Structured accounting of one sweep.
///
/// Every candidate and every failed unit lands in exactly one counter, so a
/// caller can distinguish "no events existed" from "events existed but none
/// survived validation".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Events written to the record store
    pub inserted: usize,

    /// Valid candidates dropped by the ±5-year dedup heuristic
    pub skipped_duplicate: usize,

    /// Candidates dropped for missing fields or out-of-range importance
    pub skipped_invalid: usize,

    /// Valid candidates below the run's min_importance threshold
    pub skipped_below_threshold: usize,

    /// Work-units lost to transport failure
    pub failed_fetch: usize,

    /// Work-units lost to extraction failure
    pub failed_extract: usize,

    /// Periods written to the record store
    pub periods_inserted: usize,
}

impl SweepReport {
    /// Fold another report into this one.
    pub fn merge(&mut self, other: &SweepReport) {
        self.inserted += other.inserted;
        self.skipped_duplicate += other.skipped_duplicate;
        self.skipped_invalid += other.skipped_invalid;
        self.skipped_below_threshold += other.skipped_below_threshold;
        self.failed_fetch += other.failed_fetch;
        self.failed_extract += other.failed_extract;
        self.periods_inserted += other.periods_inserted;
    }

    /// Total candidates seen by VALIDATE_AND_PERSIST.
    pub fn candidates_seen(&self) -> usize {
        self.inserted + self.skipped_duplicate + self.skipped_invalid + self.skipped_below_threshold
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted, {} periods, {} duplicate, {} invalid, {} below threshold, {} fetch failures, {} extract failures",
            self.inserted,
            self.periods_inserted,
            self.skipped_duplicate,
            self.skipped_invalid,
            self.skipped_below_threshold,
            self.failed_fetch,
            self.failed_extract
        )
    }
}

/// Pagination metadata for scrolled timeline queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub has_more: bool,
}

/// Aggregate counts over the record store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStatistics {
    pub total_events: usize,
    pub total_periods: usize,
    pub events_by_region: BTreeMap<String, usize>,
    pub events_by_category: BTreeMap<String, usize>,
    pub importance_histogram: BTreeMap<i64, usize>,
    /// (min, max) start_year over all events, None when the store is empty
    pub year_bounds: Option<(i32, i32)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_sums_all_counters() {
        let mut a = SweepReport {
            inserted: 3,
            failed_fetch: 1,
            ..SweepReport::default()
        };
        let b = SweepReport {
            inserted: 2,
            skipped_duplicate: 4,
            periods_inserted: 1,
            ..SweepReport::default()
        };
        a.merge(&b);
        assert_eq!(a.inserted, 5);
        assert_eq!(a.skipped_duplicate, 4);
        assert_eq!(a.failed_fetch, 1);
        assert_eq!(a.periods_inserted, 1);
    }

    #[test]
    fn test_candidates_seen_excludes_unit_failures() {
        let report = SweepReport {
            inserted: 2,
            skipped_invalid: 1,
            failed_fetch: 7,
            ..SweepReport::default()
        };
        assert_eq!(report.candidates_seen(), 3);
    }
}
