// Recommendation View Model: the ranked add/drop swaps for the current
// parameters.

use chrono::Utc;
use tracing::warn;

use crate::gateway::{QueryError, QueryGateway, RecommendationQuery};
use crate::model::{LoadStatus, RecommendationSet};

/// Query waiver recommendations and stamp the set with the query it answers.
pub async fn fetch(
    gateway: &dyn QueryGateway,
    query: &RecommendationQuery,
) -> Result<RecommendationSet, QueryError> {
    let resp = gateway.recommendations(query).await?;
    if let Some(echoed) = resp.drop_player_id {
        if Some(echoed) != query.drop_player_id {
            warn!(
                "Server answered for drop filter {} but {:?} was requested",
                echoed, query.drop_player_id
            );
        }
    }
    Ok(RecommendationSet {
        team_id: query.team_id,
        team_name: resp.team_name,
        days: query.days,
        days_window: resp.days_window,
        pool_size: query.pool_size,
        limit: query.limit,
        drop_filter: query.drop_player_id,
        recommendations: resp.recommendations,
        drop_candidates_used: resp.drop_candidates_used,
        fetched_at: Utc::now(),
    })
}

/// What the recommendation region should show.
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationPanel {
    NotRequested,
    Loading,
    Failed(String),
    /// The query succeeded with zero recommendations.
    Empty(RecommendationSet),
    Ready(RecommendationSet),
}

#[derive(Debug, Clone, Default)]
pub struct RecommendationViewModel {
    set: Option<RecommendationSet>,
    status: LoadStatus,
    /// Status to return to if a load is abandoned.
    settled: LoadStatus,
}

impl RecommendationViewModel {
    pub fn set(&self) -> Option<&RecommendationSet> {
        self.set.as_ref()
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

    pub fn replace(&mut self, set: RecommendationSet) {
        self.set = Some(set);
        self.status = LoadStatus::Ready;
    }

    pub fn reset(&mut self) {
        self.set = None;
        self.status = LoadStatus::Idle;
    }

    /// True only for a completed load that returned nothing.
    pub fn is_empty_result(&self) -> bool {
        self.status == LoadStatus::Ready
            && self.set.as_ref().is_some_and(|s| s.recommendations.is_empty())
    }

    pub fn panel(&self) -> RecommendationPanel {
        match (&self.status, &self.set) {
            (LoadStatus::Loading, _) => RecommendationPanel::Loading,
            (LoadStatus::Failed(err), _) => RecommendationPanel::Failed(err.to_string()),
            (LoadStatus::Ready, Some(set)) if set.recommendations.is_empty() => {
                RecommendationPanel::Empty(set.clone())
            }
            (LoadStatus::Ready, Some(set)) => RecommendationPanel::Ready(set.clone()),
            _ => RecommendationPanel::NotRequested,
        }
    }
}
