// reqwest-backed implementation of `QueryGateway`.

use std::time::Duration;

use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::{debug, warn};

use super::decode;
use super::{
    QueryError, QueryGateway, RecommendationQuery, RecommendationsResponse, RosterResponse,
    TeamsResponse,
};
use crate::config::ApiConfig;

const HEALTH_PATH: &str = "/health";
const TEAMS_PATH: &str = "/league/nba/teams";
const ROSTER_PATH: &str = "/league/nba/roster";
const WAIVERS_PATH: &str = "/league/nba/recommendations/waivers";

pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Build a gateway against the origin resolved from `config`.
    pub fn from_config(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let base_url = super::resolve_base_url(config.origin.as_deref());
        Self::new(base_url, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one GET and return the body as JSON (`null` if it is not JSON).
    ///
    /// A non-2xx body is read as text for the error; a body that cannot be
    /// read counts as empty.
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, QueryError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "GET");

        let response = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| {
                warn!("request to {url} failed: {e}");
                QueryError::from(e)
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!("{url} returned {status}");
            return Err(QueryError::request(status.as_u16(), text));
        }

        Ok(decode::parse_body(&text))
    }
}

#[async_trait::async_trait]
impl QueryGateway for HttpGateway {
    async fn health(&self) -> Result<(), QueryError> {
        self.get(HEALTH_PATH, &[]).await.map(|_| ())
    }

    async fn teams(&self, days: u32) -> Result<TeamsResponse, QueryError> {
        let body = self.get(TEAMS_PATH, &[("days", days.to_string())]).await?;
        Ok(decode::teams(&body))
    }

    async fn roster(&self, team_id: i64, days: u32) -> Result<RosterResponse, QueryError> {
        let body = self
            .get(
                ROSTER_PATH,
                &[("team_id", team_id.to_string()), ("days", days.to_string())],
            )
            .await?;
        Ok(decode::roster(&body))
    }

    async fn recommendations(
        &self,
        query: &RecommendationQuery,
    ) -> Result<RecommendationsResponse, QueryError> {
        let mut params = vec![
            ("team_id", query.team_id.to_string()),
            ("days", query.days.to_string()),
            ("pool_size", query.pool_size.to_string()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(id) = query.drop_player_id {
            params.push(("drop_player_id", id.to_string()));
        }
        let body = self.get(WAIVERS_PATH, &params).await?;
        Ok(decode::recommendations(&body))
    }
}
