// Message types shared between the console front end, the session task and
// the rendering sink.

use crate::model::{SelectionState, Team};
use crate::params::ParameterSnapshot;
use crate::recommendations::RecommendationPanel;
use crate::roster::RosterPanel;

/// User actions forwarded to the session orchestrator.
///
/// Numeric parameters travel as raw text; the Parameter Store clamps them.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    SelectTeam { team_id: i64 },
    SetDays(String),
    SetPoolSize(String),
    SetLimit(String),
    /// Pick a roster player as the drop candidate.
    SelectDrop { player_id: i64 },
    /// Clear the drop candidate and show the best swaps overall.
    BestSwaps,
    RefreshRoster,
    /// Re-run the health check and the full initial load.
    Reconnect,
    Quit,
}

/// Reachability of the LineupLogic API.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiStatus {
    /// No health check has completed yet.
    Checking,
    Online,
    /// No response obtained; persists until a query succeeds.
    Unreachable,
    /// The health check got a non-2xx answer.
    Error(String),
}

/// What the team selector should show.
#[derive(Debug, Clone, PartialEq)]
pub enum TeamsPanel {
    NotLoaded,
    Loading,
    Failed(String),
    Ready(Vec<Team>),
}

/// Immutable copy of everything the rendering sink needs.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub api_status: ApiStatus,
    pub params: ParameterSnapshot,
    pub teams: TeamsPanel,
    pub roster: RosterPanel,
    pub selection: SelectionState,
    pub recommendations: RecommendationPanel,
    /// Queries issued but not yet applied or discarded.
    pub in_flight: usize,
}

/// Updates pushed from the session task to the rendering sink.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    Snapshot(Box<SessionSnapshot>),
    /// A command was rejected without changing state.
    Notice(String),
}
