// Roster View Model: the active team's players for the current window.
//
// Loading is split at the network boundary: `fetch` runs in a spawned task,
// `replace` runs on the session task once the outcome is known to be current.

use chrono::Utc;
use tracing::info;

use crate::gateway::{QueryError, QueryGateway};
use crate::model::{LoadStatus, RosterSnapshot, SelectionState};

/// Query the roster for `team_id` over `days` and wrap it as a snapshot.
pub async fn fetch(
    gateway: &dyn QueryGateway,
    team_id: i64,
    days: u32,
) -> Result<RosterSnapshot, QueryError> {
    let resp = gateway.roster(team_id, days).await?;
    Ok(RosterSnapshot {
        team_id,
        team_name: resp.team_name,
        days,
        days_window: resp.days_window,
        players: resp.players,
        fetched_at: Utc::now(),
    })
}

/// What the roster region should show.
#[derive(Debug, Clone, PartialEq)]
pub enum RosterPanel {
    NotLoaded,
    Loading,
    Failed(String),
    Ready(RosterSnapshot),
}

#[derive(Debug, Clone, Default)]
pub struct RosterViewModel {
    snapshot: Option<RosterSnapshot>,
    status: LoadStatus,
    /// Status to return to if a load is abandoned.
    settled: LoadStatus,
}

impl RosterViewModel {
    pub fn snapshot(&self) -> Option<&RosterSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn mark_loading(&mut self) {
        if self.status != LoadStatus::Loading {
            self.settled = std::mem::replace(&mut self.status, LoadStatus::Loading);
        }
    }

    /// Drop a pending load that will never be applied, going back to the
    /// status the region had before it.
    pub fn abandon_loading(&mut self) -> bool {
        if self.status != LoadStatus::Loading {
            return false;
        }
        self.status = std::mem::take(&mut self.settled);
        true
    }

    pub fn mark_failed(&mut self, err: QueryError) {
        self.status = LoadStatus::Failed(err);
    }

    /// Replace the stored snapshot and re-check the selection against it.
    ///
    /// Returns `true` when the selected drop candidate is no longer on the
    /// roster and the selection was cleared.
    pub fn replace(&mut self, snapshot: RosterSnapshot, selection: &mut SelectionState) -> bool {
        let cleared = match selection.selected_drop_id {
            Some(id) if !snapshot.contains(id) => {
                info!("Selected drop {} left the roster, clearing selection", id);
                selection.clear();
                true
            }
            _ => false,
        };
        self.snapshot = Some(snapshot);
        self.status = LoadStatus::Ready;
        cleared
    }

    pub fn panel(&self) -> RosterPanel {
        match (&self.status, &self.snapshot) {
            (LoadStatus::Loading, _) => RosterPanel::Loading,
            (LoadStatus::Failed(err), _) => RosterPanel::Failed(err.to_string()),
            (LoadStatus::Ready, Some(snapshot)) => RosterPanel::Ready(snapshot.clone()),
            _ => RosterPanel::NotLoaded,
        }
    }

    /// Forget the roster entirely (no active team).
    pub fn reset(&mut self) {
        self.snapshot = None;
        self.status = LoadStatus::Idle;
    }
}
