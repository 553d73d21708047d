//! Fixed seed data for the 2025-26 season.
//!
//! Base probabilities come from the pre-season estimates; factor base values
//! are the 0–10 ratings the sliders start at. Weights sum to 0.70, not 1.0.

use chrono::NaiveDate;

use super::{Competition, Factor};

pub const SEASON: &str = "2025-26";

pub const EARLIEST_POSSIBLE_WIN: &str = "February 28, 2026 (EFL Cup Final)";
pub const KEY_SUCCESS_FACTOR: &str = "Squad Quality (20% weighting)";

/// File name used when a report is saved without an explicit path.
pub const DEFAULT_EXPORT_FILE: &str = "arsenal-cup-predictions.json";

// Per-competition multiplier adjustments applied on top of the impact multiplier.
const FA_CUP_ADJUSTMENT: f64 = 1.1;
const EFL_CUP_ADJUSTMENT: f64 = 0.9;
const CHAMPIONS_LEAGUE_ADJUSTMENT: f64 = 0.8;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("seed dates are valid calendar days")
}

pub fn competitions() -> Vec<Competition> {
    vec![
        Competition::new(
            "premier-league",
            "Premier League",
            0.25,
            date(2025, 8, 17),
            date(2026, 5, 24),
            4,
        ),
        Competition::new("fa-cup", "FA Cup", 0.18, date(2026, 1, 10), date(2026, 5, 16), 3)
            .with_adjustment(FA_CUP_ADJUSTMENT),
        Competition::new("efl-cup", "EFL Cup", 0.12, date(2025, 9, 23), date(2026, 2, 28), 2)
            .with_adjustment(EFL_CUP_ADJUSTMENT),
        Competition::new(
            "champions-league",
            "Champions League",
            0.08,
            date(2025, 9, 16),
            date(2026, 5, 30),
            5,
        )
        .with_adjustment(CHAMPIONS_LEAGUE_ADJUSTMENT),
    ]
}

pub fn factors() -> Vec<Factor> {
    vec![
        Factor::new("squad-quality", 0.20, 8.3),
        Factor::new("manager-exp", 0.15, 8.0),
        Factor::new("squad-depth", 0.15, 8.5),
        Factor::new("recent-form", 0.10, 8.2),
        Factor::new("mental-strength", 0.10, 7.2),
    ]
}
