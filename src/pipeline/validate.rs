// src/pipeline/validate.rs

//! Candidate validation and conversion to storable records.
//!
//! Two paths exist. The strict path runs when an extractor produced the
//! candidates and rejects anything structurally broken. The trusting path
//! runs in degraded mode (cached candidates, no extractor) and only
//! enforces what the store itself requires.

use crate::models::{CandidateEvent, CandidatePeriod, DEFAULT_IMPORTANCE, NewEvent, NewPeriod, PeriodType};

/// Strictly validate an extractor-produced candidate.
///
/// Requires a non-empty name, a start year that fits the year axis, a
/// region, and an importance level within 1-10 when present (absent
/// defaults to 5). Returns the rejection reason on failure.
pub fn validate_candidate(candidate: &CandidateEvent) -> Result<NewEvent, String> {
    let event_name = match candidate.event_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Err("missing event_name".to_string()),
    };

    let start_year = match candidate.start_year {
        Some(year) => {
            i32::try_from(year).map_err(|_| format!("start_year {year} out of range"))?
        }
        None => return Err(format!("missing start_year for '{event_name}'")),
    };

    let region = match candidate.region.as_deref().map(str::trim) {
        Some(region) if !region.is_empty() => region.to_string(),
        _ => return Err(format!("missing region for '{event_name}'")),
    };

    let importance_level = match candidate.importance_level {
        Some(level) if (1..=10).contains(&level) => level,
        Some(level) => {
            return Err(format!(
                "importance_level {level} outside 1-10 for '{event_name}'"
            ));
        }
        None => DEFAULT_IMPORTANCE,
    };

    // Inverted spans read as point events.
    let end_year = candidate
        .end_year
        .and_then(|year| i32::try_from(year).ok())
        .filter(|&end| end >= start_year);

    Ok(NewEvent {
        event_name,
        start_year,
        end_year,
        key_figures: candidate.key_figures.clone(),
        description: candidate.description.clone(),
        impact: candidate.impact.clone(),
        category: candidate.category.clone(),
        region,
        importance_level,
        source: candidate.source.clone(),
    })
}

/// Convert a candidate without validating beyond the store's NOT NULL
/// constraints. Used when no extractor is configured.
pub fn trust_candidate(candidate: &CandidateEvent, region_fallback: &str) -> Option<NewEvent> {
    let event_name = candidate
        .event_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())?
        .to_string();
    let start_year = i32::try_from(candidate.start_year?).ok()?;

    let region = candidate
        .region
        .clone()
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| region_fallback.to_string());

    Some(NewEvent {
        event_name,
        start_year,
        end_year: candidate
            .end_year
            .and_then(|year| i32::try_from(year).ok())
            .filter(|&end| end >= start_year),
        key_figures: candidate.key_figures.clone(),
        description: candidate.description.clone(),
        impact: candidate.impact.clone(),
        category: candidate.category.clone(),
        region,
        importance_level: candidate.importance_level.unwrap_or(DEFAULT_IMPORTANCE),
        source: candidate.source.clone(),
    })
}

/// Validate a period candidate. The period type is taken from the
/// candidate when it parses, otherwise classified from the name and span.
pub fn validate_period(
    candidate: &CandidatePeriod,
    region_fallback: &str,
) -> Result<NewPeriod, String> {
    let period_name = match candidate.period_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Err("missing period_name".to_string()),
    };

    let start_year = match candidate.start_year {
        Some(year) => {
            i32::try_from(year).map_err(|_| format!("start_year {year} out of range"))?
        }
        None => return Err(format!("missing start_year for '{period_name}'")),
    };
    let end_year = match candidate.end_year {
        Some(year) => i32::try_from(year).map_err(|_| format!("end_year {year} out of range"))?,
        None => return Err(format!("missing end_year for '{period_name}'")),
    };
    if end_year < start_year {
        return Err(format!("end_year precedes start_year for '{period_name}'"));
    }

    let period_type = candidate
        .period_type
        .as_deref()
        .and_then(|raw| raw.parse::<PeriodType>().ok())
        .unwrap_or_else(|| PeriodType::classify(&period_name, start_year, Some(end_year)));

    let region = candidate
        .region
        .clone()
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| region_fallback.to_string());

    Ok(NewPeriod {
        period_name,
        start_year,
        end_year,
        period_type,
        description: candidate.description.clone(),
        region,
        era_characteristics: candidate.era_characteristics.clone(),
        key_legacy: candidate.key_legacy.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, year: i64, region: &str) -> CandidateEvent {
        CandidateEvent {
            event_name: Some(name.to_string()),
            start_year: Some(year),
            region: Some(region.to_string()),
            ..CandidateEvent::default()
        }
    }

    #[test]
    fn test_valid_candidate_passes() {
        let event = validate_candidate(&candidate("Fall of Rome", 476, "European")).unwrap();
        assert_eq!(event.event_name, "Fall of Rome");
        assert_eq!(event.start_year, 476);
        assert_eq!(event.importance_level, DEFAULT_IMPORTANCE);
    }

    #[test]
    fn test_missing_name_rejected() {
        let mut c = candidate("x", 476, "European");
        c.event_name = None;
        assert!(validate_candidate(&c).is_err());
        c.event_name = Some("   ".to_string());
        assert!(validate_candidate(&c).is_err());
    }

    #[test]
    fn test_missing_start_year_rejected() {
        let mut c = candidate("Fall of Rome", 476, "European");
        c.start_year = None;
        assert!(validate_candidate(&c).is_err());
    }

    #[test]
    fn test_missing_region_rejected() {
        let mut c = candidate("Fall of Rome", 476, "European");
        c.region = None;
        assert!(validate_candidate(&c).is_err());
    }

    #[test]
    fn test_importance_out_of_range_rejected() {
        let mut c = candidate("Fall of Rome", 476, "European");
        c.importance_level = Some(11);
        assert!(validate_candidate(&c).is_err());
        c.importance_level = Some(0);
        assert!(validate_candidate(&c).is_err());
        c.importance_level = Some(10);
        assert!(validate_candidate(&c).is_ok());
    }

    #[test]
    fn test_inverted_span_becomes_point_event() {
        let mut c = candidate("Odd span", 1500, "European");
        c.end_year = Some(1400);
        let event = validate_candidate(&c).unwrap();
        assert_eq!(event.end_year, None);
    }

    #[test]
    fn test_trust_path_fills_region_and_importance() {
        let mut c = candidate("安史之乱", 755, "");
        c.region = None;
        let event = trust_candidate(&c, "Chinese").unwrap();
        assert_eq!(event.region, "Chinese");
        assert_eq!(event.importance_level, DEFAULT_IMPORTANCE);
    }

    #[test]
    fn test_trust_path_still_needs_name_and_year() {
        let mut c = candidate("x", 1, "Chinese");
        c.event_name = None;
        assert!(trust_candidate(&c, "Chinese").is_none());

        let mut c = candidate("x", 1, "Chinese");
        c.start_year = None;
        assert!(trust_candidate(&c, "Chinese").is_none());
    }

    #[test]
    fn test_period_type_classified_when_absent() {
        let candidate = CandidatePeriod {
            period_name: Some("French Revolution".to_string()),
            start_year: Some(1789),
            end_year: Some(1799),
            ..CandidatePeriod::default()
        };
        let period = validate_period(&candidate, "European").unwrap();
        assert_eq!(period.period_type, PeriodType::Independent);
        assert_eq!(period.region, "European");
    }

    #[test]
    fn test_period_explicit_type_wins() {
        let candidate = CandidatePeriod {
            period_name: Some("French Revolution".to_string()),
            start_year: Some(1789),
            end_year: Some(1799),
            period_type: Some("continuous".to_string()),
            ..CandidatePeriod::default()
        };
        let period = validate_period(&candidate, "European").unwrap();
        assert_eq!(period.period_type, PeriodType::Continuous);
    }

    #[test]
    fn test_period_inverted_span_rejected() {
        let candidate = CandidatePeriod {
            period_name: Some("Backwards".to_string()),
            start_year: Some(1800),
            end_year: Some(1700),
            ..CandidatePeriod::default()
        };
        assert!(validate_period(&candidate, "European").is_err());
    }
}
