use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

use super::counters::Counter;

#[derive(Debug, Error)]
pub enum WeightsError {
    #[error("Failed to read weight table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid weight table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Weight for {0} must be a finite number")]
    NonFinite(Counter),

    #[error("Unknown scoring policy: {0}")]
    UnknownPolicy(String),
}

/// Built-in weight tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringPolicy {
    /// Differentiated weights favouring new attendees and elite cells
    #[default]
    Standard,
    /// Ten points per unit for every scored counter
    Flat,
}

impl FromStr for ScoringPolicy {
    type Err = WeightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(ScoringPolicy::Standard),
            "flat" => Ok(ScoringPolicy::Flat),
            other => Err(WeightsError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Per-unit point value of each counter. Counters without an entry weigh zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable {
    weights: BTreeMap<Counter, f64>,
}

impl WeightTable {
    pub fn new(weights: BTreeMap<Counter, f64>) -> Result<Self, WeightsError> {
        if let Some((counter, _)) = weights.iter().find(|(_, w)| !w.is_finite()) {
            return Err(WeightsError::NonFinite(*counter));
        }
        Ok(Self { weights })
    }

    pub fn for_policy(policy: ScoringPolicy) -> Self {
        let weights = match policy {
            ScoringPolicy::Standard => BTreeMap::from([
                (Counter::NewAttendees, 10.0),
                (Counter::EliteCells, 15.0),
                (Counter::TuesdayAttendance, 5.0),
                (Counter::TuesdayNewAttendees, 10.0),
                (Counter::ArenaAttendance, 8.0),
                (Counter::ArenaNewAttendees, 15.0),
                (Counter::SundayAttendance, 3.0),
                (Counter::SundayNewAttendees, 8.0),
                (Counter::PartnerDonation, 0.1),
            ]),
            ScoringPolicy::Flat => BTreeMap::from([
                (Counter::NewAttendees, 10.0),
                (Counter::CellsHeld, 10.0),
                (Counter::EliteCells, 10.0),
                (Counter::TuesdayAttendance, 10.0),
                (Counter::TuesdayNewAttendees, 10.0),
                (Counter::ArenaAttendance, 10.0),
                (Counter::ArenaNewAttendees, 10.0),
                (Counter::SundayAttendance, 10.0),
                (Counter::SundayNewAttendees, 10.0),
                (Counter::PartnerDonation, 10.0),
            ]),
        };
        Self { weights }
    }

    pub fn from_json(json: &str) -> Result<Self, WeightsError> {
        let weights: BTreeMap<Counter, f64> = serde_json::from_str(json)?;
        Self::new(weights)
    }

    /// Loads a JSON object of `counter name -> number`
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, WeightsError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading weight table");

        let contents = std::fs::read_to_string(path).map_err(|source| WeightsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_json(&contents)?;

        info!(path = %path.display(), entries = table.weights.len(), "Weight table loaded");
        Ok(table)
    }

    pub fn weight(&self, counter: Counter) -> f64 {
        self.weights.get(&counter).copied().unwrap_or_default()
    }

    pub fn entries(&self) -> impl Iterator<Item = (Counter, f64)> + '_ {
        self.weights.iter().map(|(counter, weight)| (*counter, *weight))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_policy_weights() {
        let table = WeightTable::for_policy(ScoringPolicy::Standard);

        assert_eq!(table.weight(Counter::NewAttendees), 10.0);
        assert_eq!(table.weight(Counter::EliteCells), 15.0);
        assert_eq!(table.weight(Counter::PartnerDonation), 0.1);
        assert_eq!(table.weight(Counter::Attendance), 0.0);
        assert_eq!(table.weight(Counter::CellsHeld), 0.0);
    }

    #[test]
    fn flat_policy_weights() {
        let table = WeightTable::for_policy(ScoringPolicy::Flat);

        assert_eq!(table.weight(Counter::CellsHeld), 10.0);
        assert_eq!(table.weight(Counter::PartnerDonation), 10.0);
        assert_eq!(table.weight(Counter::Attendance), 0.0);
    }

    #[test]
    fn parses_legacy_weight_keys() {
        let table =
            WeightTable::from_json(r#"{"pessoas_novas": 10, "celulas_elite": 15, "valor_arrecadacao": 0.1}"#)
                .unwrap();

        assert_eq!(table.weight(Counter::NewAttendees), 10.0);
        assert_eq!(table.weight(Counter::EliteCells), 15.0);
        assert_eq!(table.weight(Counter::PartnerDonation), 0.1);
        assert_eq!(table.weight(Counter::SundayAttendance), 0.0);
    }

    #[test]
    fn rejects_unknown_counter() {
        let result = WeightTable::from_json(r#"{"visitors": 3}"#);
        assert!(matches!(result, Err(WeightsError::Parse(_))));
    }

    #[test]
    fn rejects_non_finite_weight() {
        let weights = BTreeMap::from([(Counter::EliteCells, f64::INFINITY)]);
        let result = WeightTable::new(weights);
        assert!(matches!(result, Err(WeightsError::NonFinite(Counter::EliteCells))));
    }

    #[test]
    fn serializes_as_plain_map() {
        let table = WeightTable::from_json(r#"{"elite_cells": 15}"#).unwrap();
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json, serde_json::json!({"elite_cells": 15.0}));
    }

    #[test]
    fn loads_table_from_file() {
        let path = std::env::temp_dir().join(format!("weights-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"new_attendees": 7}"#).unwrap();

        let table = WeightTable::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(table.weight(Counter::NewAttendees), 7.0);
    }

    #[test]
    fn missing_file_is_reported() {
        let result = WeightTable::from_json_file("/nonexistent/weights.json");
        assert!(matches!(result, Err(WeightsError::Io { .. })));
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!("standard".parse::<ScoringPolicy>().unwrap(), ScoringPolicy::Standard);
        assert_eq!(" FLAT ".parse::<ScoringPolicy>().unwrap(), ScoringPolicy::Flat);
        assert!("weighted".parse::<ScoringPolicy>().is_err());
    }
}
