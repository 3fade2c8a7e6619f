//! Remote query gateway for the LineupLogic API.
//!
//! Four read-only operations, each built from explicit parameters. Failures
//! are normalized into [`QueryError`].

pub mod decode;
pub mod error;
pub mod http;

pub use decode::{RecommendationsResponse, RosterResponse, TeamsResponse};
pub use error::QueryError;
pub use http::HttpGateway;

/// Used when the configured origin is absent or unusable.
pub const FALLBACK_BASE_URL: &str = "http://127.0.0.1:8000";

/// Parameters of a waiver recommendation query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationQuery {
    pub team_id: i64,
    pub days: u32,
    pub pool_size: u32,
    pub limit: u32,
    pub drop_player_id: Option<i64>,
}

#[async_trait::async_trait]
pub trait QueryGateway: Send + Sync {
    /// `GET /health`; any 2xx counts as healthy.
    async fn health(&self) -> Result<(), QueryError>;

    /// `GET /league/nba/teams?days=`.
    async fn teams(&self, days: u32) -> Result<TeamsResponse, QueryError>;

    /// `GET /league/nba/roster?team_id=&days=`.
    async fn roster(&self, team_id: i64, days: u32) -> Result<RosterResponse, QueryError>;

    /// `GET /league/nba/recommendations/waivers?team_id=&days=&pool_size=&limit=[&drop_player_id=]`.
    async fn recommendations(
        &self,
        query: &RecommendationQuery,
    ) -> Result<RecommendationsResponse, QueryError>;
}

/// Resolve the API base location from the client's origin.
///
/// An absolute http/https URL with a host is used as-is (minus any trailing
/// slash); anything else falls back to [`FALLBACK_BASE_URL`].
pub fn resolve_base_url(origin: Option<&str>) -> String {
    let usable = origin
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .and_then(|o| reqwest::Url::parse(o).ok())
        .filter(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some());

    match usable {
        Some(url) => url.as_str().trim_end_matches('/').to_string(),
        None => FALLBACK_BASE_URL.to_string(),
    }
}
