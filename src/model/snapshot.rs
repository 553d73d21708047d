//! Downloadable report built from the current model state.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::{percentage, Competition, Factor, PredictionModel};

/// Entries serialised as a JSON object whose keys keep insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyed<T>(pub Vec<(String, T)>);

impl<T> Keyed<T> {
    pub fn get(&self, key: &str) -> Option<&T> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: Serialize> Serialize for Keyed<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// ISO-8601, millisecond precision, UTC
    pub generated_at: String,
    pub season: String,
    /// "NN%"
    pub overall_trophy_probability: String,
    /// Keyed by competition id
    pub competitions: Keyed<CompetitionReport>,
    /// Keyed by factor display label
    pub factors: Keyed<FactorReport>,
    pub insights: Insights,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionReport {
    pub name: String,
    pub probability: String,
    pub start_date: String,
    pub end_date: String,
    /// "D/5"
    pub difficulty: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Impact {
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorReport {
    pub weight: String,
    pub current_value: String,
    pub base_value: String,
    pub impact: Impact,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    /// `None` only when there are no competitions
    pub most_likely_win: Option<String>,
    pub earliest_possible_win: String,
    pub key_success_factor: String,
    /// "S/10", one decimal place
    pub current_form_score: String,
}

impl From<&Competition> for CompetitionReport {
    fn from(comp: &Competition) -> Self {
        Self {
            name: comp.name().to_string(),
            probability: format!("{}%", comp.percentage()),
            start_date: comp.start_date().to_string(),
            end_date: comp.end_date().to_string(),
            difficulty: format!("{}/5", comp.difficulty()),
        }
    }
}

impl From<&Factor> for FactorReport {
    fn from(factor: &Factor) -> Self {
        let impact = if factor.current_value() > factor.base_value() {
            Impact::Positive
        } else {
            Impact::Negative
        };
        Self {
            weight: format!("{}%", percentage(factor.weight())),
            current_value: format!("{}/10", factor.current_value()),
            base_value: format!("{}/10", factor.base_value()),
            impact,
        }
    }
}

/// One decimal place, exact binary ties rounded away from zero.
///
/// `{:.1}` rounds ties to even, so 30.25 would print as "30.2". A tie is only
/// representable when the value is an odd number of quarters.
fn one_decimal(value: f64) -> String {
    let quarters = value * 4.0;
    let is_tie = quarters.fract() == 0.0 && quarters.abs() % 2.0 == 1.0;
    if is_tie {
        // value × 10 is exact for quarter values
        let tenths = (value * 10.0).abs().ceil().copysign(value);
        format!("{:.1}", tenths / 10.0)
    } else {
        format!("{:.1}", value)
    }
}

impl Snapshot {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl PredictionModel {
    pub fn export_snapshot(&self) -> Snapshot {
        self.export_snapshot_at(Utc::now())
    }

    /// Build a report stamped with `generated_at`. Never mutates the model.
    pub fn export_snapshot_at(&self, generated_at: DateTime<Utc>) -> Snapshot {
        let competitions = self
            .competitions()
            .iter()
            .map(|c| (c.id().to_string(), CompetitionReport::from(c)))
            .collect();
        let factors = self
            .factors()
            .iter()
            .map(|f| (f.label(), FactorReport::from(f)))
            .collect();

        Snapshot {
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            season: self.season().to_string(),
            overall_trophy_probability: format!("{}%", percentage(self.overall_probability())),
            competitions: Keyed(competitions),
            factors: Keyed(factors),
            insights: Insights {
                most_likely_win: self.most_likely_competition().map(|c| c.name().to_string()),
                earliest_possible_win: self.earliest_possible_win.clone(),
                key_success_factor: self.key_success_factor.clone(),
                current_form_score: format!("{}/10", one_decimal(self.current_form_score())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::seed;
    use chrono::TimeZone;

    fn seeded() -> PredictionModel {
        PredictionModel::seeded(seed::SEASON)
    }

    #[test]
    fn snapshot_of_seed_state() {
        let at = Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();
        let snap = seeded().export_snapshot_at(at);

        assert_eq!(snap.generated_at, "2025-08-01T12:00:00.000Z");
        assert_eq!(snap.season, "2025-26");
        assert_eq!(snap.overall_trophy_probability, "50%");

        let pl = snap.competitions.get("premier-league").unwrap();
        assert_eq!(pl.name, "Premier League");
        assert_eq!(pl.probability, "25%");
        assert_eq!(pl.start_date, "2025-08-17");
        assert_eq!(pl.end_date, "2026-05-24");
        assert_eq!(pl.difficulty, "4/5");

        let keys: Vec<&str> = snap.factors.keys().collect();
        assert_eq!(
            keys,
            [
                "Squad Quality",
                "Manager Exp",
                "Squad Depth",
                "Recent Form",
                "Mental Strength"
            ]
        );
        let manager = snap.factors.get("Manager Exp").unwrap();
        assert_eq!(manager.weight, "15%");
        assert_eq!(manager.current_value, "8/10");
        assert_eq!(manager.base_value, "8/10");

        assert_eq!(snap.insights.most_likely_win.as_deref(), Some("Premier League"));
        assert_eq!(
            snap.insights.earliest_possible_win,
            "February 28, 2026 (EFL Cup Final)"
        );
        assert_eq!(snap.insights.key_success_factor, "Squad Quality (20% weighting)");
        assert_eq!(snap.insights.current_form_score, "56.8/10");
    }

    #[test]
    fn reset_never_reports_positive_impact() {
        let mut model = seeded();
        model.set_factor_value("recent-form", 9.9).unwrap();
        model.recompute();
        assert_eq!(
            model.export_snapshot().factors.get("Recent Form").unwrap().impact,
            Impact::Positive
        );

        model.reset();
        let snap = model.export_snapshot();
        for (_, report) in &snap.factors.0 {
            assert_eq!(report.impact, Impact::Negative);
        }
    }

    #[test]
    fn repeated_export_differs_only_in_timestamp() {
        let mut model = seeded();
        model.set_factor_value("squad-depth", 6.0).unwrap();
        model.recompute();
        let before = model.competitions().to_vec();

        let mut first = model.export_snapshot();
        let mut second = model.export_snapshot();
        first.generated_at.clear();
        second.generated_at.clear();
        assert_eq!(first, second);
        assert_eq!(model.competitions(), before.as_slice());
    }

    #[test]
    fn json_shape_keeps_competition_order() {
        let snap = seeded().export_snapshot();
        let json = snap.to_json_pretty().unwrap();

        let pl = json.find("\"premier-league\"").unwrap();
        let fa = json.find("\"fa-cup\"").unwrap();
        let efl = json.find("\"efl-cup\"").unwrap();
        let cl = json.find("\"champions-league\"").unwrap();
        assert!(pl < fa && fa < efl && efl < cl);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["overallTrophyProbability"], "50%");
        assert_eq!(value["competitions"]["fa-cup"]["difficulty"], "3/5");
        assert_eq!(value["factors"]["Squad Quality"]["impact"], "Negative");
        assert_eq!(value["factors"]["Squad Quality"]["currentValue"], "8.3/10");
        assert_eq!(value["insights"]["currentFormScore"], snap.insights.current_form_score);
        assert!(value["generatedAt"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn one_decimal_rounds_ties_up() {
        assert_eq!(one_decimal(0.25), "0.3");
        assert_eq!(one_decimal(30.25), "30.3");
        assert_eq!(one_decimal(0.75), "0.8");
        assert_eq!(one_decimal(56.75), "56.8");
        assert_eq!(one_decimal(30.24), "30.2");
        assert_eq!(one_decimal(7.0), "7.0");
        assert_eq!(one_decimal(0.0), "0.0");
    }

    #[test]
    fn form_score_quarter_rounds_up_in_report() {
        let mut model = seeded();
        for id in ["manager-exp", "squad-depth", "recent-form", "mental-strength"] {
            model.set_factor_value(id, 0.0).unwrap();
        }
        model.set_factor_value("squad-quality", 0.125).unwrap();
        model.recompute();
        assert_eq!(model.current_form_score(), 0.25);
        assert_eq!(model.export_snapshot().insights.current_form_score, "0.3/10");

        model.reset();
        model.set_factor_value("squad-quality", 0.0).unwrap();
        model.set_factor_value("manager-exp", 1.4).unwrap();
        assert_eq!(model.current_form_score(), 30.25);
        assert_eq!(model.export_snapshot().insights.current_form_score, "30.3/10");
    }

    #[test]
    fn empty_model_reports_no_most_likely() {
        let snap = PredictionModel::new("2030-31", Vec::new(), Vec::new()).export_snapshot();
        assert_eq!(snap.overall_trophy_probability, "0%");
        assert!(snap.competitions.is_empty());
        assert!(snap.insights.most_likely_win.is_none());
        assert_eq!(snap.insights.current_form_score, "0.0/10");
    }
}
