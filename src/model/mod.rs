//! Trophy-probability model driven by adjustable form factors.
//!
//! Each factor is a 0–10 rating with a fixed weight. A recompute turns the
//! weighted mean of the normalised ratings into an impact multiplier, scales
//! every competition's base probability by it (plus a fixed per-competition
//! adjustment) and clamps the result to [`MIN_PROBABILITY`, `MAX_PROBABILITY`].
//!
//! Two aggregates are reported and they are deliberately not the same scale:
//! - [`PredictionModel::average_factor_score`] is normalised by total weight (0–1).
//! - [`PredictionModel::current_form_score`] is the raw weighted sum × 10.

pub mod error;
pub mod seed;
pub mod snapshot;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

pub use error::ModelError;
pub use snapshot::Snapshot;

/// Lower clamp for a recomputed competition probability.
pub const MIN_PROBABILITY: f64 = 0.03;
/// Upper clamp for a recomputed competition probability.
pub const MAX_PROBABILITY: f64 = 0.45;
/// Amplifies the 0–1 average factor score into a probability multiplier.
pub const IMPACT_AMPLIFICATION: f64 = 1.3;
/// Factor ratings live on a 0–10 scale.
pub const FACTOR_SCALE: f64 = 10.0;

/// Chart filter selecting every competition.
pub const FILTER_ALL: &str = "all";

/// Round a probability to a whole percentage (0.254 → 25).
pub fn percentage(p: f64) -> u32 {
    (p * 100.0).round().max(0.0) as u32
}

// ── Entities ─────────────────────────────────────────────────────────────────

/// A tracked competition with a fixed base estimate and a derived current one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Competition {
    id: String,
    name: String,
    base_probability: f64,
    current_probability: f64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    /// 1 (easiest) to 5
    difficulty: u8,
    /// Multiplier applied on top of the shared impact multiplier
    adjustment: f64,
}

impl Competition {
    pub fn new(
        id: &str,
        name: &str,
        base_probability: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        difficulty: u8,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            base_probability,
            current_probability: base_probability,
            start_date,
            end_date,
            difficulty: difficulty.clamp(1, 5),
            adjustment: 1.0,
        }
    }

    pub fn with_adjustment(mut self, adjustment: f64) -> Self {
        self.adjustment = adjustment;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_probability(&self) -> f64 {
        self.base_probability
    }

    pub fn current_probability(&self) -> f64 {
        self.current_probability
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn difficulty(&self) -> u8 {
        self.difficulty
    }

    pub fn adjustment(&self) -> f64 {
        self.adjustment
    }

    /// Current probability as a rounded whole percentage.
    pub fn percentage(&self) -> u32 {
        percentage(self.current_probability)
    }
}

/// A weighted 0–10 rating. Only `current_value` ever changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Factor {
    id: String,
    weight: f64,
    base_value: f64,
    current_value: f64,
}

impl Factor {
    pub fn new(id: &str, weight: f64, base_value: f64) -> Self {
        Self {
            id: id.to_string(),
            weight,
            base_value,
            current_value: base_value,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn base_value(&self) -> f64 {
        self.base_value
    }

    pub fn current_value(&self) -> f64 {
        self.current_value
    }

    /// Human label derived from the id: first `-` becomes a space and every
    /// ASCII word is capitalised (`squad-quality` → `Squad Quality`).
    pub fn label(&self) -> String {
        display_label(&self.id)
    }
}

fn display_label(id: &str) -> String {
    let spaced = id.replacen('-', " ", 1);
    let mut out = String::with_capacity(spaced.len());
    let mut at_word_start = true;
    for ch in spaced.chars() {
        if at_word_start && ch.is_ascii_alphanumeric() {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_word_start = !(ch.is_ascii_alphanumeric() || ch == '_');
    }
    out
}

/// Data fed to the bar chart: labels and whole percentages, in competition order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub data: Vec<u32>,
}

// ── Model ────────────────────────────────────────────────────────────────────

/// One session's worth of competition and factor state.
#[derive(Debug, Clone)]
pub struct PredictionModel {
    season: String,
    competitions: Vec<Competition>,
    factors: Vec<Factor>,
    earliest_possible_win: String,
    key_success_factor: String,
}

impl PredictionModel {
    pub fn new(season: &str, competitions: Vec<Competition>, factors: Vec<Factor>) -> Self {
        Self {
            season: season.to_string(),
            competitions,
            factors,
            earliest_possible_win: String::new(),
            key_success_factor: String::new(),
        }
    }

    /// The 2025-26 seed set, labelled with `season`.
    pub fn seeded(season: &str) -> Self {
        Self::new(season, seed::competitions(), seed::factors())
            .with_notes(seed::EARLIEST_POSSIBLE_WIN, seed::KEY_SUCCESS_FACTOR)
    }

    /// Static insight notes copied into every exported snapshot.
    pub fn with_notes(mut self, earliest_possible_win: &str, key_success_factor: &str) -> Self {
        self.earliest_possible_win = earliest_possible_win.to_string();
        self.key_success_factor = key_success_factor.to_string();
        self
    }

    pub fn season(&self) -> &str {
        &self.season
    }

    pub fn competitions(&self) -> &[Competition] {
        &self.competitions
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    pub fn competition(&self, id: &str) -> Result<&Competition, ModelError> {
        self.competitions
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| ModelError::UnknownCompetition(id.to_string()))
    }

    pub fn factor(&self, id: &str) -> Result<&Factor, ModelError> {
        self.factors
            .iter()
            .find(|f| f.id == id)
            .ok_or_else(|| ModelError::UnknownFactor(id.to_string()))
    }

    /// Overwrite a factor's current value, clamped to [0, 10].
    ///
    /// Does not recompute; call [`recompute`](Self::recompute) afterwards.
    pub fn set_factor_value(&mut self, id: &str, value: f64) -> Result<(), ModelError> {
        if !value.is_finite() {
            return Err(ModelError::InvalidFactorValue {
                id: id.to_string(),
                value,
            });
        }
        let factor = self
            .factors
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| ModelError::UnknownFactor(id.to_string()))?;

        let clamped = value.clamp(0.0, FACTOR_SCALE);
        if clamped != value {
            warn!("Factor {} value {} out of range, clamped to {}", id, value, clamped);
        }
        debug!("Factor {}: {} -> {}", id, factor.current_value, clamped);
        factor.current_value = clamped;
        Ok(())
    }

    /// Weighted mean of the normalised (0–1) factor ratings. Zero when the
    /// total weight is zero.
    pub fn average_factor_score(&self) -> f64 {
        let (weighted, total_weight) = self
            .factors
            .iter()
            .fold((0.0, 0.0), |(score, weight), f| {
                (score + (f.current_value / FACTOR_SCALE) * f.weight, weight + f.weight)
            });
        if total_weight == 0.0 {
            return 0.0;
        }
        weighted / total_weight
    }

    pub fn impact_multiplier(&self) -> f64 {
        self.average_factor_score() * IMPACT_AMPLIFICATION
    }

    /// Re-derive every competition's current probability from the factors.
    pub fn recompute(&mut self) {
        let impact = self.impact_multiplier();
        debug!("Recompute: impact multiplier {:.4}", impact);

        for comp in &mut self.competitions {
            let multiplier = impact * comp.adjustment;
            comp.current_probability =
                (comp.base_probability * multiplier).clamp(MIN_PROBABILITY, MAX_PROBABILITY);
            debug!(
                "  {} ×{:.4} -> {:.4}",
                comp.id, multiplier, comp.current_probability
            );
        }
    }

    /// Probability of winning at least one competition, treating them as independent.
    pub fn overall_probability(&self) -> f64 {
        let none = self
            .competitions
            .iter()
            .fold(1.0, |acc, c| acc * (1.0 - c.current_probability));
        1.0 - none
    }

    /// Competition with the strictly greatest current probability; ties go
    /// to the earliest in insertion order.
    pub fn most_likely_competition(&self) -> Option<&Competition> {
        let mut best: Option<&Competition> = None;
        for comp in &self.competitions {
            match best {
                Some(b) if comp.current_probability <= b.current_probability => {}
                _ => best = Some(comp),
            }
        }
        best
    }

    /// Σ(value × weight) × 10. Not normalised by total weight.
    pub fn current_form_score(&self) -> f64 {
        self.factors
            .iter()
            .map(|f| f.current_value * f.weight)
            .sum::<f64>()
            * 10.0
    }

    /// Chart feed for `filter`: [`FILTER_ALL`] or a single competition id.
    pub fn chart_series(&self, filter: &str) -> Result<ChartSeries, ModelError> {
        let selected: Vec<&Competition> = if filter == FILTER_ALL {
            self.competitions.iter().collect()
        } else {
            vec![self.competition(filter)?]
        };
        Ok(ChartSeries {
            labels: selected.iter().map(|c| c.name.clone()).collect(),
            data: selected.iter().map(|c| c.percentage()).collect(),
        })
    }

    /// Restore base factor values and base probabilities exactly, without
    /// going through the multiplier formula.
    pub fn reset(&mut self) {
        for factor in &mut self.factors {
            factor.current_value = factor.base_value;
        }
        for comp in &mut self.competitions {
            comp.current_probability = comp.base_probability;
        }
        info!("Model reset to base values");
    }
}
