pub mod common;
pub mod fantasy;
pub mod news;
pub mod nhl;
pub mod players;

pub use common::{LocalizedName, Provider};
pub use fantasy::{
    CombinedPlayerData, FantasyLeague, FantasyPlayer, FantasyTeam, LeagueSettings, Matchup,
    MatchupTeam, RosterSlot, StandingsEntry, StatCategory, Transaction, TransactionPlayer,
};
pub use news::{Impact, NewsItem, NewsQuery, NewsType};
pub use nhl::{ClubStats, GameSummary, Scoreboard, StandingsRow, Team, TeamScore};
pub use players::{NormalizedPlayer, Position, StatLine, stat_keys};
