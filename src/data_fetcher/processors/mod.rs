pub mod fantasy_parsing;
pub mod fantasy_points;
pub mod news_classification;
pub mod news_formatting;
pub mod player_formatting;

// Re-export the pieces the manager and pipeline call directly
pub use fantasy_points::{FantasyScoringWeights, calculate_fantasy_points};
pub use news_classification::{classify_news_type, deduplicate_news};
pub use player_formatting::flatten_roster;
