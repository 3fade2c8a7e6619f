// Parameter Store: the user-adjustable inputs every query is built from.
//
// Setters clamp raw input into range and hand the stored value back so the
// caller can reflect it to its input surface. The store never talks to the
// network.

use std::ops::RangeInclusive;

use crate::config::SessionDefaults;
use crate::gateway::RecommendationQuery;

pub const DAYS_RANGE: RangeInclusive<u32> = 1..=60;
pub const POOL_SIZE_RANGE: RangeInclusive<u32> = 25..=1000;
pub const LIMIT_RANGE: RangeInclusive<u32> = 1..=50;

/// Parse `raw` and clamp it into `range`.
///
/// Non-numeric input (including NaN) yields the lower bound. Fractional
/// input is truncated toward zero before clamping; values too large for a
/// float clamp like any other out-of-range value.
pub fn clamp_raw(raw: &str, range: &RangeInclusive<u32>) -> u32 {
    let (min, max) = (*range.start(), *range.end());
    match raw.trim().parse::<f64>() {
        Ok(v) if !v.is_nan() => {
            let v = v.trunc();
            if v < min as f64 {
                min
            } else if v > max as f64 {
                max
            } else {
                v as u32
            }
        }
        _ => min,
    }
}

/// Current parameter values, copied out for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSnapshot {
    pub team_id: Option<i64>,
    pub team_name: Option<String>,
    pub days: u32,
    pub pool_size: u32,
    pub limit: u32,
}

#[derive(Debug, Clone)]
pub struct ParameterStore {
    team_id: Option<i64>,
    team_name: Option<String>,
    days: u32,
    pool_size: u32,
    limit: u32,
}

impl ParameterStore {
    /// Build a store from configured defaults. Defaults are clamped the same
    /// way user input is.
    pub fn new(defaults: &SessionDefaults) -> Self {
        ParameterStore {
            team_id: None,
            team_name: None,
            days: defaults.days.clamp(*DAYS_RANGE.start(), *DAYS_RANGE.end()),
            pool_size: defaults
                .pool_size
                .clamp(*POOL_SIZE_RANGE.start(), *POOL_SIZE_RANGE.end()),
            limit: defaults.limit.clamp(*LIMIT_RANGE.start(), *LIMIT_RANGE.end()),
        }
    }

    pub fn set_days(&mut self, raw: &str) -> u32 {
        self.days = clamp_raw(raw, &DAYS_RANGE);
        self.days
    }

    pub fn set_pool_size(&mut self, raw: &str) -> u32 {
        self.pool_size = clamp_raw(raw, &POOL_SIZE_RANGE);
        self.pool_size
    }

    pub fn set_limit(&mut self, raw: &str) -> u32 {
        self.limit = clamp_raw(raw, &LIMIT_RANGE);
        self.limit
    }

    /// Store the active team. Membership in the team list is the
    /// orchestrator's concern.
    pub fn set_team(&mut self, id: i64, name: Option<String>) {
        self.team_id = Some(id);
        self.team_name = name;
    }

    pub fn clear_team(&mut self) {
        self.team_id = None;
        self.team_name = None;
    }

    pub fn team_id(&self) -> Option<i64> {
        self.team_id
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn pool_size(&self) -> u32 {
        self.pool_size
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// The recommendation query these parameters describe, or `None` without
    /// an active team.
    pub fn recommendation_query(&self, drop_player_id: Option<i64>) -> Option<RecommendationQuery> {
        Some(RecommendationQuery {
            team_id: self.team_id?,
            days: self.days,
            pool_size: self.pool_size,
            limit: self.limit,
            drop_player_id,
        })
    }

    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            team_id: self.team_id,
            team_name: self.team_name.clone(),
            days: self.days,
            pool_size: self.pool_size,
            limit: self.limit,
        }
    }
}
