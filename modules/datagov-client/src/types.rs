use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// --- Weather forecast ---

/// Location attached to every forecast entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastLocation {
    pub location_id: String,
    pub location_name: String,
}

/// Administrative granularity encoded in the forecast location id prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationCategory {
    State,
    RecreationCentre,
    District,
    Town,
    Division,
}

impl ForecastLocation {
    /// `St` state, `Rc` recreation centre, `Ds` district, `Tn` town, `Dv` division.
    pub fn category(&self) -> Option<LocationCategory> {
        let prefix = self.location_id.get(..2)?;
        match prefix {
            "St" => Some(LocationCategory::State),
            "Rc" => Some(LocationCategory::RecreationCentre),
            "Ds" => Some(LocationCategory::District),
            "Tn" => Some(LocationCategory::Town),
            "Dv" => Some(LocationCategory::Division),
            _ => None,
        }
    }
}

/// One day of forecast for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub location: ForecastLocation,
    pub date: NaiveDate,
    #[serde(default)]
    pub morning_forecast: Option<String>,
    #[serde(default)]
    pub afternoon_forecast: Option<String>,
    #[serde(default)]
    pub night_forecast: Option<String>,
    #[serde(default)]
    pub summary_forecast: Option<String>,
    #[serde(default)]
    pub summary_when: Option<String>,
    #[serde(default)]
    pub min_temp: Option<i32>,
    #[serde(default)]
    pub max_temp: Option<i32>,
}

impl ForecastEntry {
    /// Exact case-insensitive name match, or exact id match.
    pub fn matches(&self, candidate: &str) -> bool {
        self.location.location_name.eq_ignore_ascii_case(candidate)
            || self.location.location_id == candidate
    }
}

// --- Flood warning ---

/// A river-level station record from the flood warning feed.
///
/// Only the fields used for matching and ordering are typed; everything
/// else the feed returns is kept in `extra` so it survives into reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloodWarningStation {
    #[serde(default)]
    pub station_id: String,
    #[serde(default)]
    pub station_name: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub water_level_current: Option<f64>,
    #[serde(default)]
    pub water_level_indicator: Option<String>,
    #[serde(default)]
    pub water_level_update_datetime: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FloodWarningStation {
    /// Case-insensitive substring match against name, id, district or state.
    pub fn matches(&self, candidate: &str) -> bool {
        let needle = candidate.to_lowercase();
        if needle.is_empty() {
            return false;
        }
        [
            &self.station_name,
            &self.station_id,
            &self.district,
            &self.state,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(id: &str, name: &str) -> ForecastLocation {
        ForecastLocation {
            location_id: id.into(),
            location_name: name.into(),
        }
    }

    #[test]
    fn category_from_id_prefix() {
        assert_eq!(location("St001", "Perlis").category(), Some(LocationCategory::State));
        assert_eq!(location("Tn042", "Klang").category(), Some(LocationCategory::Town));
        assert_eq!(location("Ds010", "Petaling").category(), Some(LocationCategory::District));
        assert_eq!(
            location("Rc003", "Cameron Highlands").category(),
            Some(LocationCategory::RecreationCentre)
        );
        assert_eq!(location("Dv001", "Kuching").category(), Some(LocationCategory::Division));
        assert_eq!(location("X", "Nowhere").category(), None);
    }

    #[test]
    fn forecast_entry_deserializes_from_feed_shape() {
        let entry: ForecastEntry = serde_json::from_value(serde_json::json!({
            "location": {"location_id": "Tn042", "location_name": "Klang"},
            "date": "2025-01-03",
            "morning_forecast": "Tiada hujan",
            "afternoon_forecast": "Ribut petir",
            "night_forecast": "Hujan",
            "summary_forecast": "Ribut petir di kebanyakan tempat",
            "summary_when": "Petang",
            "min_temp": 24,
            "max_temp": 32
        }))
        .unwrap();
        assert!(entry.matches("klang"));
        assert!(entry.matches("Tn042"));
        assert!(!entry.matches("Shah Alam"));
    }

    #[test]
    fn station_keeps_unknown_fields() {
        let station: FloodWarningStation = serde_json::from_value(serde_json::json!({
            "station_id": "3014401",
            "station_name": "Sg. Klang di Jambatan Petaling",
            "district": "Klang",
            "state": "Selangor",
            "water_level_current": 4.2,
            "danger_level": 6.0
        }))
        .unwrap();
        assert!(station.matches("KLANG"));
        assert!(station.matches("selangor"));
        assert!(!station.matches(""));
        assert_eq!(station.extra.get("danger_level"), Some(&serde_json::json!(6.0)));
    }
}
