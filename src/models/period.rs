// src/models/period.rs

//! Historical period data structures and period-type classification.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::RegexSet;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Kind of historical span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    /// Multi-generational era: empire, dynasty, epoch
    Continuous,
    /// Bounded event-like span: war, revolution, movement
    Independent,
}

/// Exact terms that always classify as independent regardless of vocabulary.
const SPECIAL_INDEPENDENT: &[&str] = &[
    "founding",
    "translation",
    "reform",
    "movement",
    "uprising",
    "persecution",
    "black death",
];

fn independent_vocabulary() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| {
        RegexSet::new([
            r"(?i)war",
            r"(?i)battle",
            r"(?i)rebellion",
            r"(?i)revolution",
            r"(?i)uprising",
            r"(?i)crusade",
            r"(?i)founding",
            r"(?i)persecution",
            r"(?i)suppression",
        ])
        .expect("static vocabulary patterns are valid")
    })
}

fn continuous_vocabulary() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| {
        RegexSet::new([
            r"(?i)period",
            r"(?i)civilization",
            r"(?i)dynasty",
            r"(?i)age",
            r"(?i)era",
            r"(?i)kingdom",
            r"(?i)empire",
            r"(?i)republic",
        ])
        .expect("static vocabulary patterns are valid")
    })
}

impl PeriodType {
    /// Infer the period type from its name.
    ///
    /// Independent vocabulary wins over continuous so that e.g.
    /// "War of the Roman Empire" classifies as independent. Names matching
    /// neither vocabulary read as era-like spans.
    pub fn classify(period_name: &str, _start_year: i32, _end_year: Option<i32>) -> Self {
        let lowered = period_name.to_lowercase();
        if SPECIAL_INDEPENDENT.iter().any(|k| lowered.contains(k)) {
            return PeriodType::Independent;
        }

        if independent_vocabulary().is_match(period_name) {
            return PeriodType::Independent;
        }

        if continuous_vocabulary().is_match(period_name) {
            return PeriodType::Continuous;
        }

        PeriodType::Continuous
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Continuous => "continuous",
            PeriodType::Independent => "independent",
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "continuous" => Ok(PeriodType::Continuous),
            "independent" => Ok(PeriodType::Independent),
            other => Err(AppError::validation(format!(
                "unknown period_type '{other}'"
            ))),
        }
    }
}

/// An unvalidated period candidate as produced by the extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CandidatePeriod {
    #[serde(default)]
    pub period_name: Option<String>,

    #[serde(default)]
    pub start_year: Option<i64>,

    #[serde(default)]
    pub end_year: Option<i64>,

    /// "continuous" or "independent"; classified from the name when absent
    #[serde(default)]
    pub period_type: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub era_characteristics: Option<String>,

    #[serde(default)]
    pub key_legacy: Option<String>,
}

/// A validated period ready for insertion into the record store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPeriod {
    pub period_name: String,
    pub start_year: i32,
    pub end_year: i32,
    pub period_type: PeriodType,
    pub description: Option<String>,
    pub region: String,
    pub era_characteristics: Option<String>,
    pub key_legacy: Option<String>,
}

/// A stored period row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Period {
    /// Surrogate id assigned by the store
    pub id: i64,

    #[serde(flatten)]
    pub record: NewPeriod,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_empire_is_continuous() {
        assert_eq!(
            PeriodType::classify("Roman Empire", -27, Some(476)),
            PeriodType::Continuous
        );
    }

    #[test]
    fn test_classify_revolution_is_independent() {
        assert_eq!(
            PeriodType::classify("French Revolution", 1789, Some(1799)),
            PeriodType::Independent
        );
    }

    #[test]
    fn test_classify_war_beats_continuous_vocabulary() {
        assert_eq!(
            PeriodType::classify("Thirty Years' War", 1618, Some(1648)),
            PeriodType::Independent
        );
    }

    #[test]
    fn test_classify_special_term_forces_independent() {
        assert_eq!(
            PeriodType::classify("Black Death", 1346, Some(1353)),
            PeriodType::Independent
        );
    }

    #[test]
    fn test_classify_unmatched_long_span_is_continuous() {
        assert_eq!(
            PeriodType::classify("Pax Romana", -27, Some(180)),
            PeriodType::Continuous
        );
    }

    #[test]
    fn test_classify_unmatched_short_span_defaults_continuous() {
        assert_eq!(
            PeriodType::classify("Interregnum", 1649, Some(1660)),
            PeriodType::Continuous
        );
    }

    #[test]
    fn test_period_type_parse() {
        assert_eq!(
            "continuous".parse::<PeriodType>().unwrap(),
            PeriodType::Continuous
        );
        assert_eq!(
            "Independent".parse::<PeriodType>().unwrap(),
            PeriodType::Independent
        );
        assert!("epoch".parse::<PeriodType>().is_err());
    }

    #[test]
    fn test_period_type_serde_lowercase() {
        let json = serde_json::to_string(&PeriodType::Continuous).unwrap();
        assert_eq!(json, r#""continuous""#);
    }
}
