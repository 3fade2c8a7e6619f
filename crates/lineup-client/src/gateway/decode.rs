// Lenient JSON decoding for LineupLogic API responses.
//
// Bodies are parsed into a `serde_json::Value` and fields are pulled out one
// at a time. A missing or mistyped field becomes `None` (or an empty list);
// decoding itself never fails.

use serde_json::Value;
use tracing::debug;

use crate::model::{Player, Recommendation, Team};

/// Decoded `/league/nba/teams` body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamsResponse {
    pub teams: Vec<Team>,
}

/// Decoded `/league/nba/roster` body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterResponse {
    pub team_name: Option<String>,
    pub days_window: Option<u32>,
    pub players: Vec<Player>,
}

/// Decoded `/league/nba/recommendations/waivers` body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationsResponse {
    pub team_name: Option<String>,
    pub days_window: Option<u32>,
    pub drop_player_id: Option<i64>,
    pub drop_candidates_used: Vec<Player>,
    pub recommendations: Vec<Recommendation>,
}

/// Parse body text, treating anything that is not JSON as `null`.
pub(crate) fn parse_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|e| {
        debug!("response body is not JSON ({e}), treating as empty");
        Value::Null
    })
}

pub(crate) fn teams(body: &Value) -> TeamsResponse {
    let teams = array(body, "teams")
        .iter()
        .filter_map(|t| {
            let Some(id) = int(t, "team_id") else {
                debug!("skipping team entry without team_id");
                return None;
            };
            Some(Team {
                id,
                name: string(t, "team_name"),
                wins: uint(t, "wins"),
                losses: uint(t, "losses"),
            })
        })
        .collect();
    TeamsResponse { teams }
}

pub(crate) fn roster(body: &Value) -> RosterResponse {
    RosterResponse {
        team_name: string(body, "team"),
        days_window: uint(body, "days_window"),
        players: array(body, "roster").iter().map(player).collect(),
    }
}

pub(crate) fn recommendations(body: &Value) -> RecommendationsResponse {
    RecommendationsResponse {
        team_name: string(body, "team"),
        days_window: uint(body, "days_window"),
        drop_player_id: int(body, "drop_player_id"),
        drop_candidates_used: array(body, "drop_candidates_used")
            .iter()
            .map(player)
            .collect(),
        recommendations: array(body, "recommendations")
            .iter()
            .map(|r| Recommendation {
                add: r.get("add").map(player).unwrap_or_default(),
                drop: r.get("drop").map(player).unwrap_or_default(),
                expected_gain_in_window: float(r, "expected_gain_next_n_days"),
            })
            .collect(),
    }
}

pub(crate) fn player(v: &Value) -> Player {
    Player {
        player_id: int(v, "playerId"),
        name: string(v, "name"),
        position: string(v, "position"),
        pro_team: string(v, "proTeam"),
        injury_status: string(v, "injuryStatus"),
        games_in_window: uint(v, "games_next_n_days"),
        fantasy_ppg_used: float(v, "fantasy_ppg_used"),
        projected_points_in_window: float(v, "projected_points_next_n_days"),
        avg_points: float(v, "avg_points"),
        projected_avg_points: float(v, "projected_avg_points"),
    }
}

// ---------------------------------------------------------------------------
// Field accessors
// ---------------------------------------------------------------------------

fn array<'a>(v: &'a Value, key: &str) -> &'a [Value] {
    v.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn string(v: &Value, key: &str) -> Option<String> {
    v.get(key)?.as_str().map(str::to_string)
}

/// Integer field; whole-valued floats such as `10.0` are accepted.
fn int(v: &Value, key: &str) -> Option<i64> {
    let field = v.get(key)?;
    field.as_i64().or_else(|| {
        field
            .as_f64()
            .filter(|f| f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

fn uint(v: &Value, key: &str) -> Option<u32> {
    int(v, key).and_then(|n| u32::try_from(n).ok())
}

fn float(v: &Value, key: &str) -> Option<f64> {
    v.get(key)?.as_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_teams() {
        let body = json!({
            "team_count": 2,
            "days_window": 7,
            "teams": [
                { "team_id": 1, "team_name": "Alpha", "wins": 3, "losses": 2 },
                { "team_id": 2, "team_name": null }
            ]
        });
        let resp = teams(&body);
        assert_eq!(resp.teams.len(), 2);
        assert_eq!(resp.teams[0].id, 1);
        assert_eq!(resp.teams[0].name.as_deref(), Some("Alpha"));
        assert_eq!(resp.teams[0].wins, Some(3));
        assert_eq!(resp.teams[1].name, None);
        assert_eq!(resp.teams[1].losses, None);
    }

    #[test]
    fn skips_teams_without_id() {
        let body = json!({ "teams": [ { "team_name": "Ghost" }, { "team_id": "7" }, { "team_id": 4 } ] });
        let resp = teams(&body);
        assert_eq!(resp.teams.iter().map(|t| t.id).collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn decodes_player_fields_from_wire_names() {
        let v = json!({
            "playerId": 10,
            "name": "A",
            "position": "PG",
            "proTeam": "X",
            "injuryStatus": "ACTIVE",
            "avg_points": 19.5,
            "projected_avg_points": null,
            "fantasy_ppg_used": 20.1,
            "days_window": 7,
            "games_next_n_days": 3,
            "projected_points_next_n_days": 60.3
        });
        let p = player(&v);
        assert_eq!(p.player_id, Some(10));
        assert_eq!(p.name.as_deref(), Some("A"));
        assert_eq!(p.position.as_deref(), Some("PG"));
        assert_eq!(p.pro_team.as_deref(), Some("X"));
        assert_eq!(p.injury_status.as_deref(), Some("ACTIVE"));
        assert_eq!(p.games_in_window, Some(3));
        assert_eq!(p.fantasy_ppg_used, Some(20.1));
        assert_eq!(p.projected_points_in_window, Some(60.3));
        assert_eq!(p.avg_points, Some(19.5));
        assert_eq!(p.projected_avg_points, None);
    }

    #[test]
    fn mistyped_player_fields_become_none() {
        let v = json!({ "playerId": "ten", "name": 5, "games_next_n_days": -1 });
        let p = player(&v);
        assert_eq!(p, Player::default());
    }

    #[test]
    fn whole_float_ids_are_accepted() {
        let p = player(&json!({ "playerId": 10.0 }));
        assert_eq!(p.player_id, Some(10));
        let p = player(&json!({ "playerId": 10.5 }));
        assert_eq!(p.player_id, None);
    }

    #[test]
    fn decodes_roster() {
        let body = json!({
            "team": "Alpha",
            "days_window": 7,
            "roster": [ { "playerId": 10, "name": "A" }, { "playerId": 11 } ]
        });
        let resp = roster(&body);
        assert_eq!(resp.team_name.as_deref(), Some("Alpha"));
        assert_eq!(resp.days_window, Some(7));
        assert_eq!(resp.players.len(), 2);
        assert_eq!(resp.players[1].name, None);
    }

    #[test]
    fn decodes_recommendations_in_server_order() {
        let body = json!({
            "team": "Alpha",
            "days_window": 7,
            "drop_player_id": 10,
            "drop_candidates_used": [ { "playerId": 10 } ],
            "recommendations": [
                { "add": { "playerId": 20 }, "drop": { "playerId": 10 }, "expected_gain_next_n_days": 5.5 },
                { "add": { "playerId": 21 }, "drop": { "playerId": 10 }, "expected_gain_next_n_days": 9.0 },
                { "expected_gain_next_n_days": "big" }
            ]
        });
        let resp = recommendations(&body);
        assert_eq!(resp.drop_player_id, Some(10));
        assert_eq!(resp.drop_candidates_used.len(), 1);
        assert_eq!(resp.recommendations.len(), 3);
        // Server order is kept even when gains are not descending.
        assert_eq!(resp.recommendations[0].add.player_id, Some(20));
        assert_eq!(resp.recommendations[1].add.player_id, Some(21));
        assert_eq!(resp.recommendations[0].expected_gain_in_window, Some(5.5));
        assert_eq!(resp.recommendations[2].add, Player::default());
        assert_eq!(resp.recommendations[2].expected_gain_in_window, None);
    }

    #[test]
    fn non_json_body_decodes_to_empty() {
        let body = parse_body("<html>oops</html>");
        assert_eq!(body, Value::Null);
        assert!(teams(&body).teams.is_empty());
        assert!(roster(&body).players.is_empty());
        assert!(recommendations(&body).recommendations.is_empty());
    }

    #[test]
    fn wrong_container_types_decode_to_empty() {
        let body = json!({ "teams": {"team_id": 1}, "roster": "none", "recommendations": 3 });
        assert!(teams(&body).teams.is_empty());
        assert!(roster(&body).players.is_empty());
        assert!(recommendations(&body).recommendations.is_empty());
    }
}
