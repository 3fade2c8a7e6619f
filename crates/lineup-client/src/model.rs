// Domain entities: teams, players, roster snapshots, recommendation sets and
// the drop-candidate selection.
//
// Every field the server may omit is an `Option`. Display code substitutes a
// placeholder for `None`; nothing in the client fails because a field is
// missing.

use chrono::{DateTime, Utc};

use crate::gateway::QueryError;

/// A fantasy team in the league.
#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub id: i64,
    pub name: Option<String>,
    pub wins: Option<u32>,
    pub losses: Option<u32>,
}

/// A player as reported for one lookback window.
///
/// `player_id` is the identity; everything else is window-dependent and goes
/// stale when `days` changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Player {
    pub player_id: Option<i64>,
    pub name: Option<String>,
    pub position: Option<String>,
    pub pro_team: Option<String>,
    pub injury_status: Option<String>,
    pub games_in_window: Option<u32>,
    pub fantasy_ppg_used: Option<f64>,
    pub projected_points_in_window: Option<f64>,
    /// Season average fantasy points.
    pub avg_points: Option<f64>,
    /// Projected average fantasy points, when ESPN publishes one.
    pub projected_avg_points: Option<f64>,
}

impl Player {
    pub fn is(&self, player_id: i64) -> bool {
        self.player_id == Some(player_id)
    }
}

/// The active players of one team for one window. Replaced wholesale on every
/// roster query.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterSnapshot {
    pub team_id: i64,
    pub team_name: Option<String>,
    pub days: u32,
    /// Window the server reports having used, if it says.
    pub days_window: Option<u32>,
    pub players: Vec<Player>,
    pub fetched_at: DateTime<Utc>,
}

impl RosterSnapshot {
    pub fn find(&self, player_id: i64) -> Option<&Player> {
        self.players.iter().find(|p| p.is(player_id))
    }

    pub fn contains(&self, player_id: i64) -> bool {
        self.find(player_id).is_some()
    }
}

/// One suggested add/drop swap.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub add: Player,
    pub drop: Player,
    pub expected_gain_in_window: Option<f64>,
}

/// The ranked swap list for one parameter set, in server order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationSet {
    pub team_id: i64,
    /// Team name as echoed by the server.
    pub team_name: Option<String>,
    pub days: u32,
    pub days_window: Option<u32>,
    pub pool_size: u32,
    pub limit: u32,
    pub drop_filter: Option<i64>,
    pub recommendations: Vec<Recommendation>,
    /// Roster players the server considered as drops.
    pub drop_candidates_used: Vec<Player>,
    pub fetched_at: DateTime<Utc>,
}

/// The drop candidate the user has picked from the roster, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub selected_drop_id: Option<i64>,
    pub selected_drop_name: Option<String>,
}

impl SelectionState {
    pub fn select(&mut self, player_id: i64, name: Option<String>) {
        self.selected_drop_id = Some(player_id);
        self.selected_drop_name = name;
    }

    pub fn clear(&mut self) {
        self.selected_drop_id = None;
        self.selected_drop_name = None;
    }

    pub fn is_active(&self) -> bool {
        self.selected_drop_id.is_some()
    }
}

/// Freshness of one view region.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LoadStatus {
    /// Nothing has been requested for this region yet.
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(QueryError),
}
