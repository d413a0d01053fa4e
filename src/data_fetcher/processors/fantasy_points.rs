use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::data_fetcher::models::{StatLine, stat_keys};

/// Weight per stat key used when scoring a stat line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FantasyScoringWeights(BTreeMap<String, f64>);

impl FantasyScoringWeights {
    pub fn new(weights: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self(weights.into_iter().collect())
    }

    pub fn weight(&self, stat_key: &str) -> Option<f64> {
        self.0.get(stat_key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(key, weight)| (key.as_str(), *weight))
    }
}

impl Default for FantasyScoringWeights {
    /// goals 6, assists 4, shots/hits/blocks 0.5, wins 5, saves 0.2, shutouts 3.
    /// `points` is left out; it is goals plus assists and would count them twice.
    fn default() -> Self {
        Self::new(
            [
                (stat_keys::GOALS, 6.0),
                (stat_keys::ASSISTS, 4.0),
                (stat_keys::SHOTS, 0.5),
                (stat_keys::HITS, 0.5),
                (stat_keys::BLOCKS, 0.5),
                (stat_keys::WINS, 5.0),
                (stat_keys::SAVES, 0.2),
                (stat_keys::SHUTOUTS, 3.0),
            ]
            .map(|(key, weight)| (key.to_string(), weight)),
        )
    }
}

/// Sums `weight * stat` over the weight table, rounded to two decimals.
/// Stats absent from `stats` contribute nothing.
pub fn calculate_fantasy_points(stats: &StatLine, weights: Option<&FantasyScoringWeights>) -> f64 {
    let default_weights;
    let weights = match weights {
        Some(weights) => weights,
        None => {
            default_weights = FantasyScoringWeights::default();
            &default_weights
        }
    };

    let total: f64 = weights
        .iter()
        .map(|(key, weight)| stats.get(key).copied().unwrap_or(0.0) * weight)
        .sum();
    (total * 100.0).round() / 100.0
}
