//! Static reference corpus of Malaysian place names.
//!
//! Deterministic fallback for the location resolver, and the list of known
//! names handed to the model-backed knowledge base as grounding.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;

use datagov_client::{ForecastEntry, LocationCategory};
use floodwatch_common::LocationFields;

const BUNDLED: &str = include_str!("../../data/gazetteer.json");

#[derive(Debug, Clone, Deserialize)]
pub struct GazetteerEntry {
    pub name: String,
    pub category: LocationCategory,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub division: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

struct Indexed {
    entry: GazetteerEntry,
    pattern: Regex,
}

/// Lower is more specific. Mirrors the candidate ordering.
fn specificity(category: LocationCategory) -> u8 {
    match category {
        LocationCategory::Town => 0,
        LocationCategory::RecreationCentre => 1,
        LocationCategory::District => 2,
        LocationCategory::Division => 3,
        LocationCategory::State => 4,
    }
}

pub struct Gazetteer {
    entries: Vec<Indexed>,
}

impl Gazetteer {
    /// The corpus compiled into the binary.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED).context("bundled gazetteer is invalid")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read gazetteer {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid gazetteer {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let entries: Vec<GazetteerEntry> = serde_json::from_str(raw)?;
        Self::from_entries(entries)
    }

    pub fn from_entries(entries: Vec<GazetteerEntry>) -> Result<Self> {
        let entries = entries
            .into_iter()
            .filter(|e| !e.name.trim().is_empty())
            .map(|entry| {
                let pattern = name_pattern(&entry)?;
                Ok(Indexed { entry, pattern })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// Build a flat corpus (no hierarchy) from the locations a forecast
    /// feed publishes. Category comes from the location id prefix.
    pub fn from_forecast_entries(forecast: &[ForecastEntry]) -> Result<Self> {
        let mut seen = HashSet::new();
        let entries = forecast
            .iter()
            .filter_map(|f| {
                let category = f.location.category()?;
                let name = f.location.location_name.trim().to_string();
                seen.insert((name.to_lowercase(), category)).then(|| GazetteerEntry {
                    name,
                    category,
                    district: None,
                    division: None,
                    state: None,
                    aliases: Vec::new(),
                })
            })
            .collect();
        Self::from_entries(entries)
    }

    /// Add entries from `other` whose name and category are not already
    /// known. Returns how many were added.
    pub fn extend(&mut self, other: Gazetteer) -> usize {
        let known: HashSet<(String, LocationCategory)> = self
            .entries
            .iter()
            .map(|i| (i.entry.name.to_lowercase(), i.entry.category))
            .collect();
        let before = self.entries.len();
        self.entries.extend(
            other
                .entries
                .into_iter()
                .filter(|i| !known.contains(&(i.entry.name.to_lowercase(), i.entry.category))),
        );
        self.entries.len() - before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical names, for prompting.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|i| i.entry.name.as_str()).collect()
    }

    /// Resolve free text to gazetteer fields by whole-name, case-insensitive
    /// containment. The most specific matching entry wins (longer names
    /// break ties), and its hierarchy fills the coarser fields.
    pub fn lookup(&self, text: &str) -> Option<LocationFields> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let matches: Vec<&GazetteerEntry> = self
            .entries
            .iter()
            .filter(|i| i.pattern.is_match(text))
            .map(|i| &i.entry)
            .collect();

        let best = matches.iter().copied().min_by(|a, b| {
            specificity(a.category)
                .cmp(&specificity(b.category))
                .then_with(|| b.name.len().cmp(&a.name.len()))
        })?;

        let mut fields = LocationFields::default();
        set_field(&mut fields, best.category, &best.name);
        fields.district = fields.district.take().or_else(|| best.district.clone());
        fields.division = fields.division.take().or_else(|| best.division.clone());
        fields.state = fields.state.take().or_else(|| best.state.clone());

        // Other mentions in the same state can fill levels the best match left open.
        for other in matches {
            let consistent = match (&fields.state, &other.state) {
                (Some(resolved), Some(theirs)) => resolved.eq_ignore_ascii_case(theirs),
                (Some(resolved), None) => {
                    other.category == LocationCategory::State
                        && resolved.eq_ignore_ascii_case(&other.name)
                }
                (None, _) => true,
            };
            if consistent && field_for(&fields, other.category).is_none() {
                set_field(&mut fields, other.category, &other.name);
            }
        }

        Some(fields)
    }
}

fn name_pattern(entry: &GazetteerEntry) -> Result<Regex> {
    let alternatives: Vec<String> = std::iter::once(&entry.name)
        .chain(entry.aliases.iter())
        .map(|n| regex::escape(n.trim()))
        .collect();
    let pattern = format!(r"(?i)\b(?:{})\b", alternatives.join("|"));
    Regex::new(&pattern).with_context(|| format!("bad gazetteer name {}", entry.name))
}

fn field_for(fields: &LocationFields, category: LocationCategory) -> Option<&String> {
    match category {
        LocationCategory::Town => fields.town.as_ref(),
        LocationCategory::RecreationCentre => fields.recreation_centre.as_ref(),
        LocationCategory::District => fields.district.as_ref(),
        LocationCategory::Division => fields.division.as_ref(),
        LocationCategory::State => fields.state.as_ref(),
    }
}

fn set_field(fields: &mut LocationFields, category: LocationCategory, name: &str) {
    let slot = match category {
        LocationCategory::Town => &mut fields.town,
        LocationCategory::RecreationCentre => &mut fields.recreation_centre,
        LocationCategory::District => &mut fields.district,
        LocationCategory::Division => &mut fields.division,
        LocationCategory::State => &mut fields.state,
    };
    *slot = Some(name.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundled() -> Gazetteer {
        Gazetteer::bundled().unwrap()
    }

    #[test]
    fn bundled_corpus_loads() {
        let g = bundled();
        assert!(g.len() > 100);
        assert!(g.names().contains(&"Selangor"));
    }

    #[test]
    fn town_resolves_with_hierarchy() {
        let fields = bundled().lookup("Banjir kilat di Klang pagi ini").unwrap();
        assert_eq!(fields.town.as_deref(), Some("Klang"));
        assert_eq!(fields.district.as_deref(), Some("Klang"));
        assert_eq!(fields.state.as_deref(), Some("Selangor"));
        assert_eq!(fields.ordered_candidates().as_slice(), &["Klang", "Selangor"]);
    }

    #[test]
    fn longer_name_beats_shorter_at_same_level() {
        let fields = bundled().lookup("flooding near johor bahru").unwrap();
        assert_eq!(fields.town.as_deref(), Some("Johor Bahru"));
        assert_eq!(fields.state.as_deref(), Some("Johor"));
    }

    #[test]
    fn sarawak_town_carries_division() {
        let fields = bundled().lookup("Kuching").unwrap();
        assert_eq!(fields.town.as_deref(), Some("Kuching"));
        assert_eq!(fields.division.as_deref(), Some("Kuching"));
        assert_eq!(fields.state.as_deref(), Some("Sarawak"));
    }

    #[test]
    fn aliases_match() {
        let fields = bundled().lookup("Heavy rain in Penang").unwrap();
        assert_eq!(fields.state.as_deref(), Some("Pulau Pinang"));
        assert!(fields.town.is_none());
    }

    #[test]
    fn partial_words_do_not_match() {
        assert!(bundled().lookup("Klangor street party").is_none());
        assert!(bundled().lookup("downtown").is_none());
        assert!(bundled().lookup("  ").is_none());
    }

    fn forecast(rows: &[(&str, &str)]) -> Vec<ForecastEntry> {
        let rows: Vec<_> = rows
            .iter()
            .map(|(id, name)| {
                serde_json::json!({
                    "location": {"location_id": id, "location_name": name},
                    "date": "2025-01-03",
                })
            })
            .collect();
        serde_json::from_value(serde_json::Value::Array(rows)).unwrap()
    }

    #[test]
    fn forecast_corpus_uses_id_prefix() {
        let forecast = forecast(&[
            ("Tn042", "Klang"),
            ("Tn042", "Klang"),
            ("St010", "Selangor"),
            ("Zz001", "Mystery"),
        ]);

        let g = Gazetteer::from_forecast_entries(&forecast).unwrap();
        assert_eq!(g.len(), 2);
        let fields = g.lookup("Klang, Selangor").unwrap();
        assert_eq!(fields.town.as_deref(), Some("Klang"));
        assert_eq!(fields.state.as_deref(), Some("Selangor"));
    }

    #[test]
    fn forecast_names_extend_bundled_corpus() {
        let mut g = bundled();
        let before = g.len();
        assert!(g.lookup("Banjir di Kampung Sungai Lembu").is_none());

        let feed = forecast(&[
            ("Tn042", "Klang"),
            ("St010", "SELANGOR"),
            ("Tn999", "Sungai Lembu"),
        ]);
        let added = g.extend(Gazetteer::from_forecast_entries(&feed).unwrap());

        assert_eq!(added, 1);
        assert_eq!(g.len(), before + 1);
        let fields = g.lookup("Banjir di Kampung Sungai Lembu").unwrap();
        assert_eq!(fields.town.as_deref(), Some("Sungai Lembu"));
        // Existing entries keep their hierarchy.
        let klang = g.lookup("Klang").unwrap();
        assert_eq!(klang.state.as_deref(), Some("Selangor"));
    }
}
