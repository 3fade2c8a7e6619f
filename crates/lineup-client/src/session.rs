// Session orchestrator and its event loop.
//
// Owns the Parameter Store, the selection and the three derived views (team
// list, roster, recommendations). Every user trigger maps to a reload chain:
// an ordered list of query steps. Only the head of a chain is in flight at any
// time; the next step is issued once the previous outcome has been applied,
// and its query is built from the parameters as they stand at that moment.
//
// Queries run in spawned tasks and report back over an mpsc channel. An
// outcome is applied only when the query the session would issue *now* for
// the same step equals the query that produced it; otherwise it is dropped
// without a render and its chain ends there.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::SessionDefaults;
use crate::gateway::{QueryError, QueryGateway, RecommendationQuery, TeamsResponse};
use crate::model::{LoadStatus, RecommendationSet, RosterSnapshot, SelectionState, Team};
use crate::params::ParameterStore;
use crate::protocol::{ApiStatus, SessionSnapshot, TeamsPanel, UiUpdate, UserCommand};
use crate::recommendations::{self, RecommendationViewModel};
use crate::roster::{self, RosterViewModel};

// ---------------------------------------------------------------------------
// Reload chains
// ---------------------------------------------------------------------------

/// One query in a reload chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Health,
    Teams,
    Roster,
    Recommendations,
}

pub const INITIALIZATION: &[Step] = &[Step::Health, Step::Teams, Step::Roster, Step::Recommendations];
pub const TEAM_CHANGED: &[Step] = &[Step::Roster, Step::Recommendations];
pub const WINDOW_CHANGED: &[Step] = &[Step::Teams, Step::Roster, Step::Recommendations];
pub const RECOMMENDATIONS_ONLY: &[Step] = &[Step::Recommendations];
pub const ROSTER_REFRESH: &[Step] = &[Step::Roster, Step::Recommendations];

/// A fully parameterized query. Doubles as the stamp used to decide whether
/// its outcome is still current.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Health,
    Teams { days: u32 },
    Roster { team_id: i64, days: u32 },
    Recommendations(RecommendationQuery),
}

impl Query {
    pub fn step(&self) -> Step {
        match self {
            Query::Health => Step::Health,
            Query::Teams { .. } => Step::Teams,
            Query::Roster { .. } => Step::Roster,
            Query::Recommendations(_) => Step::Recommendations,
        }
    }
}

#[derive(Debug)]
pub enum QueryResult {
    Health(Result<(), QueryError>),
    Teams(Result<TeamsResponse, QueryError>),
    Roster(Result<RosterSnapshot, QueryError>),
    Recommendations(Result<RecommendationSet, QueryError>),
}

/// A finished query, sent back to the session task.
#[derive(Debug)]
pub struct QueryOutcome {
    pub query: Query,
    /// Steps to issue after this one if it is applied successfully.
    pub remaining: Vec<Step>,
    pub result: QueryResult,
}

/// Run one query against the gateway.
pub async fn execute(gateway: &dyn QueryGateway, query: &Query) -> QueryResult {
    match query {
        Query::Health => QueryResult::Health(gateway.health().await),
        Query::Teams { days } => QueryResult::Teams(gateway.teams(*days).await),
        Query::Roster { team_id, days } => {
            QueryResult::Roster(roster::fetch(gateway, *team_id, *days).await)
        }
        Query::Recommendations(q) => {
            QueryResult::Recommendations(recommendations::fetch(gateway, q).await)
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct TeamList {
    teams: Vec<Team>,
    status: LoadStatus,
    settled: LoadStatus,
}

impl TeamList {
    fn mark_loading(&mut self) {
        if self.status != LoadStatus::Loading {
            self.settled = std::mem::replace(&mut self.status, LoadStatus::Loading);
        }
    }

    fn abandon_loading(&mut self) -> bool {
        if self.status != LoadStatus::Loading {
            return false;
        }
        self.status = std::mem::take(&mut self.settled);
        true
    }
}

pub struct Session {
    params: ParameterStore,
    selection: SelectionState,
    teams: TeamList,
    roster: RosterViewModel,
    recommendations: RecommendationViewModel,
    api_status: ApiStatus,
    /// Per step: queries spawned whose outcome has not been applied or
    /// discarded yet.
    pending: [usize; 4],
    gateway: Arc<dyn QueryGateway>,
    /// Spawned query tasks report through a clone of this sender.
    outcome_tx: mpsc::Sender<QueryOutcome>,
}

impl Session {
    pub fn new(
        defaults: &SessionDefaults,
        gateway: Arc<dyn QueryGateway>,
        outcome_tx: mpsc::Sender<QueryOutcome>,
    ) -> Self {
        Session {
            params: ParameterStore::new(defaults),
            selection: SelectionState::default(),
            teams: TeamList::default(),
            roster: RosterViewModel::default(),
            recommendations: RecommendationViewModel::default(),
            api_status: ApiStatus::Checking,
            pending: [0; 4],
            gateway,
            outcome_tx,
        }
    }

    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams.teams
    }

    pub fn roster(&self) -> &RosterViewModel {
        &self.roster
    }

    pub fn recommendations(&self) -> &RecommendationViewModel {
        &self.recommendations
    }

    pub fn api_status(&self) -> &ApiStatus {
        &self.api_status
    }

    pub fn in_flight(&self) -> usize {
        self.pending.iter().sum()
    }

    /// Start the initial load: health check, teams, roster, recommendations.
    pub async fn initialize(&mut self, ui_tx: &mpsc::Sender<UiUpdate>) {
        info!("Initializing session");
        self.issue(INITIALIZATION);
        self.send_snapshot(ui_tx).await;
    }

    /// The query this session would issue for `step` right now, or `None`
    /// when the step needs a team and none is active.
    pub fn query_for(&self, step: Step) -> Option<Query> {
        match step {
            Step::Health => Some(Query::Health),
            Step::Teams => Some(Query::Teams {
                days: self.params.days(),
            }),
            Step::Roster => Some(Query::Roster {
                team_id: self.params.team_id()?,
                days: self.params.days(),
            }),
            Step::Recommendations => self
                .params
                .recommendation_query(self.selection.selected_drop_id)
                .map(Query::Recommendations),
        }
    }

    /// Whether an outcome for `query` still matches the current parameters.
    pub fn is_current(&self, query: &Query) -> bool {
        self.query_for(query.step()).as_ref() == Some(query)
    }

    /// Handle a user command from the front end.
    pub async fn handle_command(&mut self, cmd: UserCommand, ui_tx: &mpsc::Sender<UiUpdate>) {
        match cmd {
            UserCommand::SelectTeam { team_id } => {
                let Some(name) = self
                    .teams
                    .teams
                    .iter()
                    .find(|t| t.id == team_id)
                    .map(|t| t.name.clone())
                else {
                    warn!("Rejected team selection {}: not in team list", team_id);
                    notice(ui_tx, format!("Team {team_id} is not in the team list")).await;
                    return;
                };
                info!("Team changed to {}", team_id);
                self.params.set_team(team_id, name);
                self.selection.clear();
                self.issue(TEAM_CHANGED);
            }
            UserCommand::SetDays(raw) => {
                let days = self.params.set_days(&raw);
                info!("Window set to {} days (raw {:?})", days, raw);
                self.issue(WINDOW_CHANGED);
            }
            UserCommand::SetPoolSize(raw) => {
                let pool_size = self.params.set_pool_size(&raw);
                info!("Pool size set to {} (raw {:?})", pool_size, raw);
                self.issue(RECOMMENDATIONS_ONLY);
            }
            UserCommand::SetLimit(raw) => {
                let limit = self.params.set_limit(&raw);
                info!("Limit set to {} (raw {:?})", limit, raw);
                self.issue(RECOMMENDATIONS_ONLY);
            }
            UserCommand::SelectDrop { player_id } => {
                let Some(name) = self
                    .roster
                    .snapshot()
                    .and_then(|r| r.find(player_id))
                    .map(|p| p.name.clone())
                else {
                    warn!("Rejected drop selection {}: not on roster", player_id);
                    notice(ui_tx, format!("Player {player_id} is not on the roster")).await;
                    return;
                };
                info!("Drop candidate selected: {}", player_id);
                self.selection.select(player_id, name);
                self.issue(RECOMMENDATIONS_ONLY);
            }
            UserCommand::BestSwaps => {
                info!("Showing best swaps (selection cleared)");
                self.selection.clear();
                self.issue(RECOMMENDATIONS_ONLY);
            }
            UserCommand::RefreshRoster => {
                info!("Manual roster refresh");
                self.issue(ROSTER_REFRESH);
            }
            UserCommand::Reconnect => {
                info!("Reconnect requested, re-running initial load");
                self.issue(INITIALIZATION);
            }
            UserCommand::Quit => {
                // Handled in the event loop
                return;
            }
        }
        self.send_snapshot(ui_tx).await;
    }

    /// Apply a finished query, then issue the next step of its chain.
    ///
    /// Stale outcomes are discarded without touching the views. The only
    /// exception is a region left loading with nothing in flight for it,
    /// which goes back to its last settled status and is rendered.
    pub async fn apply_outcome(&mut self, outcome: QueryOutcome, ui_tx: &mpsc::Sender<UiUpdate>) {
        let pending = &mut self.pending[outcome.query.step() as usize];
        *pending = pending.saturating_sub(1);

        if !self.is_current(&outcome.query) {
            debug!("Discarding stale outcome for {:?}", outcome.query);
            if self.abandon_idle_loads() {
                self.send_snapshot(ui_tx).await;
            }
            return;
        }

        let QueryOutcome {
            query,
            remaining,
            result,
        } = outcome;

        let proceed = match result {
            QueryResult::Health(Ok(())) => {
                self.mark_reachable();
                true
            }
            QueryResult::Health(Err(e)) => {
                self.record_failure(&query, &e);
                if !e.is_connectivity() {
                    self.api_status = ApiStatus::Error(e.to_string());
                }
                false
            }
            QueryResult::Teams(Ok(resp)) => {
                self.mark_reachable();
                self.replace_teams(resp.teams)
            }
            QueryResult::Teams(Err(e)) => {
                self.record_failure(&query, &e);
                self.teams.status = LoadStatus::Failed(e);
                false
            }
            QueryResult::Roster(Ok(snapshot)) => {
                self.mark_reachable();
                info!(
                    "Roster loaded: team {} ({} players, {} days)",
                    snapshot.team_id,
                    snapshot.players.len(),
                    snapshot.days
                );
                self.roster.replace(snapshot, &mut self.selection);
                true
            }
            QueryResult::Roster(Err(e)) => {
                self.record_failure(&query, &e);
                self.roster.mark_failed(e);
                false
            }
            QueryResult::Recommendations(Ok(set)) => {
                self.mark_reachable();
                info!(
                    "Recommendations loaded: {} swaps (drop filter {:?})",
                    set.recommendations.len(),
                    set.drop_filter
                );
                self.recommendations.replace(set);
                true
            }
            QueryResult::Recommendations(Err(e)) => {
                self.record_failure(&query, &e);
                self.recommendations.mark_failed(e);
                false
            }
        };

        if proceed {
            self.issue(&remaining);
        }
        self.abandon_idle_loads();
        self.send_snapshot(ui_tx).await;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let teams = match &self.teams.status {
            LoadStatus::Idle => TeamsPanel::NotLoaded,
            LoadStatus::Loading => TeamsPanel::Loading,
            LoadStatus::Failed(e) => TeamsPanel::Failed(e.to_string()),
            LoadStatus::Ready => TeamsPanel::Ready(self.teams.teams.clone()),
        };
        SessionSnapshot {
            api_status: self.api_status.clone(),
            params: self.params.snapshot(),
            teams,
            roster: self.roster.panel(),
            selection: self.selection.clone(),
            recommendations: self.recommendations.panel(),
            in_flight: self.in_flight(),
        }
    }

    /// Issue the head of `chain` and carry the rest along with it.
    fn issue(&mut self, chain: &[Step]) {
        let Some((&step, rest)) = chain.split_first() else {
            return;
        };

        let Some(query) = self.query_for(step) else {
            debug!("No active team, {:?} chain stops", step);
            self.roster.reset();
            self.recommendations.reset();
            return;
        };

        match step {
            Step::Health => self.api_status = ApiStatus::Checking,
            Step::Teams => self.teams.mark_loading(),
            Step::Roster => self.roster.mark_loading(),
            Step::Recommendations => self.recommendations.mark_loading(),
        }

        debug!("Issuing {:?}", query);
        self.pending[step as usize] += 1;

        let gateway = Arc::clone(&self.gateway);
        let tx = self.outcome_tx.clone();
        let remaining = rest.to_vec();
        tokio::spawn(async move {
            let result = execute(gateway.as_ref(), &query).await;
            let _ = tx
                .send(QueryOutcome {
                    query,
                    remaining,
                    result,
                })
                .await;
        });
    }

    /// Replace the team list and keep the active team a member of it.
    ///
    /// Returns `false` when the list is empty and the chain cannot continue.
    fn replace_teams(&mut self, teams: Vec<Team>) -> bool {
        self.teams.teams = teams;
        self.teams.status = LoadStatus::Ready;

        let current = self.params.team_id();
        let listed = current.and_then(|id| self.teams.teams.iter().find(|t| t.id == id));
        let fallback = self.teams.teams.first();

        match (listed, fallback) {
            (Some(team), _) => {
                // Same team; pick up a renamed team's new name.
                let (id, name) = (team.id, team.name.clone());
                self.params.set_team(id, name);
                true
            }
            (None, Some(first)) => {
                let (id, name) = (first.id, first.name.clone());
                if let Some(old) = current {
                    info!("Team {} missing from refreshed list, falling back to {}", old, id);
                }
                self.params.set_team(id, name);
                self.selection.clear();
                true
            }
            (None, None) => {
                warn!("Team list is empty, no active team");
                self.params.clear_team();
                self.selection.clear();
                self.roster.reset();
                self.recommendations.reset();
                false
            }
        }
    }

    /// Return regions marked loading with no query in flight for their step
    /// to their last settled status. Reports whether any region changed.
    fn abandon_idle_loads(&mut self) -> bool {
        let mut changed = false;
        if self.pending[Step::Teams as usize] == 0 {
            changed |= self.teams.abandon_loading();
        }
        if self.pending[Step::Roster as usize] == 0 {
            changed |= self.roster.abandon_loading();
        }
        if self.pending[Step::Recommendations as usize] == 0 {
            changed |= self.recommendations.abandon_loading();
        }
        changed
    }

    fn mark_reachable(&mut self) {
        if self.api_status != ApiStatus::Online {
            info!("API reachable");
            self.api_status = ApiStatus::Online;
        }
    }

    fn record_failure(&mut self, query: &Query, err: &QueryError) {
        warn!("{:?} failed: {}", query, err);
        if err.is_connectivity() {
            self.api_status = ApiStatus::Unreachable;
        }
    }

    async fn send_snapshot(&self, ui_tx: &mpsc::Sender<UiUpdate>) {
        let _ = ui_tx
            .send(UiUpdate::Snapshot(Box::new(self.snapshot())))
            .await;
    }
}

async fn notice(ui_tx: &mpsc::Sender<UiUpdate>, text: String) {
    let _ = ui_tx.send(UiUpdate::Notice(text)).await;
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

/// Run the session until the user quits or the command channel closes.
///
/// Starts the initial load, then interleaves user commands with query
/// outcomes. All session mutation happens on this task.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    mut outcome_rx: mpsc::Receiver<QueryOutcome>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut session: Session,
) -> anyhow::Result<()> {
    info!("Session event loop started");
    session.initialize(&ui_tx).await;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => session.handle_command(cmd, &ui_tx).await,
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            outcome = outcome_rx.recv() => {
                match outcome {
                    Some(outcome) => session.apply_outcome(outcome, &ui_tx).await,
                    None => {
                        info!("Outcome channel closed, shutting down");
                        break;
                    }
                }
            }
        }
    }

    info!("Session event loop exiting");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
