//! Parsing of the fantasy provider's JSON representation.
//!
//! The provider encodes collections as objects keyed `"0"`, `"1"`, ... plus a
//! `"count"` field, and entities as arrays of single-field fragments, e.g.
//! `"player": [[{"player_key": ..}, {"name": {..}}], {"player_stats": {..}}]`.
//! [`merge_fragments`] folds such an entity into one flat object so the
//! per-resource parsers below can read fields by name.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::data_fetcher::models::{
    FantasyLeague, FantasyPlayer, FantasyTeam, LeagueSettings, Matchup, MatchupTeam, Position,
    RosterSlot, StandingsEntry, StatCategory, StatLine, Transaction, TransactionPlayer, stat_keys,
};

/// A payload lacked a node every response of its kind carries
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fantasy payload is missing '{0}'")]
pub struct MissingNode(pub &'static str);

type Entity = Map<String, Value>;

/// Folds an entity's fragments into one object. Nested arrays are flattened;
/// later fragments win on duplicate keys.
pub fn merge_fragments(value: &Value) -> Entity {
    let mut merged = Map::new();
    collect_fragments(value, &mut merged);
    merged
}

fn collect_fragments(value: &Value, into: &mut Entity) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| collect_fragments(item, into)),
        Value::Object(fields) => {
            for (key, field) in fields {
                into.insert(key.clone(), field.clone());
            }
        }
        _ => {}
    }
}

/// Returns the `item_key` values of a numbered collection in index order
pub fn collection_items<'a>(collection: &'a Value, item_key: &str) -> Vec<&'a Value> {
    match collection {
        Value::Object(fields) => {
            let mut indexed: Vec<(usize, &Value)> = fields
                .iter()
                .filter_map(|(key, entry)| {
                    let index = key.parse::<usize>().ok()?;
                    Some((index, entry.get(item_key)?))
                })
                .collect();
            indexed.sort_by_key(|(index, _)| *index);
            indexed.into_iter().map(|(_, item)| item).collect()
        }
        Value::Array(entries) => entries.iter().filter_map(|e| e.get(item_key)).collect(),
        _ => Vec::new(),
    }
}

fn content(root: &Value) -> Result<&Value, MissingNode> {
    root.get("fantasy_content").ok_or(MissingNode("fantasy_content"))
}

/// Merged top-level entity, e.g. `fantasy_content.league`
fn root_entity(root: &Value, key: &'static str) -> Result<Entity, MissingNode> {
    content(root)?
        .get(key)
        .map(merge_fragments)
        .ok_or(MissingNode(key))
}

fn text(entity: &Entity, key: &str) -> Option<String> {
    match entity.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn count(entity: &Entity, key: &str) -> Option<u32> {
    number(entity.get(key)).map(|n| n as u32)
}

fn name_of(entity: &Entity) -> String {
    match entity.get("name") {
        Some(Value::Object(name)) => name
            .get("full")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Some(Value::String(name)) => name.clone(),
        _ => String::new(),
    }
}

/// Canonical stat key for a provider stat id; unknown ids keep a `stat_<id>` key
pub fn stat_key_for_id(stat_id: &str) -> String {
    let key = match stat_id {
        "0" | "29" => stat_keys::GAMES_PLAYED,
        "1" => stat_keys::GOALS,
        "2" => stat_keys::ASSISTS,
        "3" => stat_keys::POINTS,
        "4" => stat_keys::PLUS_MINUS,
        "5" => stat_keys::PENALTY_MINUTES,
        "6" => stat_keys::POWER_PLAY_GOALS,
        "14" => stat_keys::SHOTS,
        "19" => stat_keys::WINS,
        "23" => stat_keys::GOALS_AGAINST_AVERAGE,
        "25" => stat_keys::SAVES,
        "26" => stat_keys::SAVE_PERCENTAGE,
        "27" => stat_keys::SHUTOUTS,
        "31" => stat_keys::HITS,
        "32" => stat_keys::BLOCKS,
        other => return format!("stat_{other}"),
    };
    key.to_string()
}

fn parse_stats(player: &Entity) -> StatLine {
    let mut line = StatLine::new();
    let Some(stats) = player
        .get("player_stats")
        .and_then(|s| s.get("stats"))
        .and_then(Value::as_array)
    else {
        return line;
    };

    for entry in stats {
        let Some(stat) = entry.get("stat") else { continue };
        let id = match stat.get("stat_id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => continue,
        };
        // "-" marks a stat with no value yet
        if let Some(value) = number(stat.get("value")) {
            line.insert(stat_key_for_id(&id), value);
        }
    }
    line
}

pub fn parse_player(value: &Value) -> FantasyPlayer {
    let player = merge_fragments(value);
    let display_position = text(&player, "display_position").unwrap_or_default();
    let primary = display_position.split(',').next().unwrap_or_default();

    let eligible_positions = player
        .get("eligible_positions")
        .map(|positions| {
            collection_items(positions, "position")
                .into_iter()
                .filter_map(|p| p.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let percent_owned = player
        .get("percent_owned")
        .map(merge_fragments)
        .and_then(|owned| number(owned.get("value")));

    FantasyPlayer {
        player_key: text(&player, "player_key").unwrap_or_default(),
        name: name_of(&player),
        team_abbrev: text(&player, "editorial_team_abbr").map(|t| t.to_uppercase()),
        position: Position::from_code(primary),
        eligible_positions,
        status: text(&player, "status"),
        percent_owned,
        stats: parse_stats(&player),
    }
}

fn players_in(collection: Option<&Value>) -> Vec<FantasyPlayer> {
    collection
        .map(|players| {
            collection_items(players, "player")
                .into_iter()
                .map(parse_player)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_league(league: &Entity) -> FantasyLeague {
    FantasyLeague {
        league_key: text(league, "league_key").unwrap_or_default(),
        name: name_of(league),
        season: text(league, "season"),
        num_teams: count(league, "num_teams"),
        scoring_type: text(league, "scoring_type"),
        current_week: count(league, "current_week"),
    }
}

/// `users;use_login=1/leagues`
pub fn parse_user_leagues(root: &Value) -> Result<Vec<FantasyLeague>, MissingNode> {
    let users = content(root)?.get("users").ok_or(MissingNode("users"))?;

    let mut leagues = Vec::new();
    for user in collection_items(users, "user") {
        let user = merge_fragments(user);
        let Some(games) = user.get("games") else { continue };
        for game in collection_items(games, "game") {
            let game = merge_fragments(game);
            if let Some(collection) = game.get("leagues") {
                leagues.extend(
                    collection_items(collection, "league")
                        .into_iter()
                        .map(|league| parse_league(&merge_fragments(league))),
                );
            }
        }
    }
    Ok(leagues)
}

pub fn parse_league_settings(root: &Value) -> Result<LeagueSettings, MissingNode> {
    let league = root_entity(root, "league")?;
    let settings = league
        .get("settings")
        .map(merge_fragments)
        .ok_or(MissingNode("settings"))?;

    let roster_slots = settings
        .get("roster_positions")
        .map(|positions| {
            collection_items(positions, "roster_position")
                .into_iter()
                .map(merge_fragments)
                .map(|slot| RosterSlot {
                    position: text(&slot, "position").unwrap_or_default(),
                    count: count(&slot, "count").unwrap_or(0),
                })
                .collect()
        })
        .unwrap_or_default();

    let stat_categories = settings
        .get("stat_categories")
        .and_then(|categories| categories.get("stats"))
        .map(|stats| {
            collection_items(stats, "stat")
                .into_iter()
                .map(merge_fragments)
                .map(|stat| StatCategory {
                    stat_id: count(&stat, "stat_id").unwrap_or(0),
                    name: text(&stat, "name").unwrap_or_default(),
                    display_name: text(&stat, "display_name").unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(LeagueSettings {
        league_key: text(&league, "league_key").unwrap_or_default(),
        draft_type: text(&settings, "draft_type"),
        scoring_type: text(&settings, "scoring_type").or_else(|| text(&league, "scoring_type")),
        max_teams: count(&settings, "max_teams"),
        roster_slots,
        stat_categories,
    })
}

fn parse_team(value: &Value) -> FantasyTeam {
    let team = merge_fragments(value);
    let manager = team.get("managers").and_then(|managers| {
        collection_items(managers, "manager")
            .into_iter()
            .map(merge_fragments)
            .find_map(|manager| text(&manager, "nickname"))
    });
    FantasyTeam {
        team_key: text(&team, "team_key").unwrap_or_default(),
        name: name_of(&team),
        manager,
    }
}

pub fn parse_league_teams(root: &Value) -> Result<Vec<FantasyTeam>, MissingNode> {
    let league = root_entity(root, "league")?;
    let teams = league.get("teams").ok_or(MissingNode("teams"))?;
    Ok(collection_items(teams, "team")
        .into_iter()
        .map(parse_team)
        .collect())
}

pub fn parse_league_standings(root: &Value) -> Result<Vec<StandingsEntry>, MissingNode> {
    let league = root_entity(root, "league")?;
    let standings = league
        .get("standings")
        .map(merge_fragments)
        .ok_or(MissingNode("standings"))?;
    let teams = standings.get("teams").ok_or(MissingNode("teams"))?;

    Ok(collection_items(teams, "team")
        .into_iter()
        .map(|value| {
            let team = merge_fragments(value);
            let standing = team
                .get("team_standings")
                .map(merge_fragments)
                .unwrap_or_default();
            let outcomes = standing
                .get("outcome_totals")
                .map(merge_fragments)
                .unwrap_or_default();
            StandingsEntry {
                team_key: text(&team, "team_key").unwrap_or_default(),
                name: name_of(&team),
                rank: count(&standing, "rank"),
                wins: count(&outcomes, "wins").unwrap_or(0),
                losses: count(&outcomes, "losses").unwrap_or(0),
                ties: count(&outcomes, "ties").unwrap_or(0),
                points_for: number(standing.get("points_for")),
            }
        })
        .collect())
}

/// `team/{key}/roster`
pub fn parse_team_roster(root: &Value) -> Result<Vec<FantasyPlayer>, MissingNode> {
    let team = root_entity(root, "team")?;
    let roster = team.get("roster").ok_or(MissingNode("roster"))?;
    Ok(collection_items(roster, "players")
        .into_iter()
        .flat_map(|players| players_in(Some(players)))
        .collect())
}

/// League-scoped player collections: free agents and player stats
pub fn parse_league_players(root: &Value) -> Result<Vec<FantasyPlayer>, MissingNode> {
    let league = root_entity(root, "league")?;
    Ok(players_in(league.get("players")))
}

pub fn parse_transactions(root: &Value) -> Result<Vec<Transaction>, MissingNode> {
    let league = root_entity(root, "league")?;
    let Some(transactions) = league.get("transactions") else {
        return Ok(Vec::new());
    };

    Ok(collection_items(transactions, "transaction")
        .into_iter()
        .map(|value| {
            let transaction = merge_fragments(value);
            let players = transaction
                .get("players")
                .map(|players| {
                    collection_items(players, "player")
                        .into_iter()
                        .map(|player| {
                            let player = merge_fragments(player);
                            let data = player
                                .get("transaction_data")
                                .map(merge_fragments)
                                .unwrap_or_default();
                            TransactionPlayer {
                                player_key: text(&player, "player_key").unwrap_or_default(),
                                name: name_of(&player),
                                kind: text(&data, "type"),
                                source_team: text(&data, "source_team_key"),
                                destination_team: text(&data, "destination_team_key"),
                            }
                        })
                        .collect()
                })
                .unwrap_or_default();

            Transaction {
                transaction_key: text(&transaction, "transaction_key").unwrap_or_default(),
                kind: text(&transaction, "type").unwrap_or_default(),
                status: text(&transaction, "status"),
                timestamp: number(transaction.get("timestamp")).map(|t| t as i64),
                players,
            }
        })
        .collect())
}

/// `league/{key}/scoreboard`
pub fn parse_matchups(root: &Value) -> Result<Vec<Matchup>, MissingNode> {
    let league = root_entity(root, "league")?;
    let scoreboard = league.get("scoreboard").ok_or(MissingNode("scoreboard"))?;

    let mut matchups = Vec::new();
    for collection in collection_items(scoreboard, "matchups") {
        for value in collection_items(collection, "matchup") {
            let matchup = merge_fragments(value);
            let teams = collection_items(value, "teams")
                .into_iter()
                .flat_map(|teams| collection_items(teams, "team"))
                .map(|team| {
                    let team = merge_fragments(team);
                    let points = team
                        .get("team_points")
                        .map(merge_fragments)
                        .and_then(|p| number(p.get("total")));
                    MatchupTeam {
                        team_key: text(&team, "team_key").unwrap_or_default(),
                        name: name_of(&team),
                        points,
                    }
                })
                .collect();
            matchups.push(Matchup {
                week: count(&matchup, "week"),
                status: text(&matchup, "status"),
                teams,
            });
        }
    }
    Ok(matchups)
}
