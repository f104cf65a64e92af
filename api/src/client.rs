use crate::cache::{FetchCache, is_permanent};
use crate::fpl::{BootstrapResponse, StandingsEntry, StandingsResponse};
use log::debug;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const FPL_UPSTREAM: &str = "https://fantasy.premierleague.com";
pub const BOOTSTRAP_PATH: &str = "bootstrap-static";

/// One way of reaching the FPL API. Tried in order by [`FplApi`]; the first
/// success wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Same-origin pass-through: `{base}/api/fpl/{path}`.
    Gateway(String),
    /// The upstream itself: `{base}/api/{path}/`.
    Direct(String),
}

impl Transport {
    pub fn url(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        match self {
            Transport::Gateway(base) => format!("{}/api/fpl/{path}", base.trim_end_matches('/')),
            Transport::Direct(base) => format!("{}/api/{path}/", base.trim_end_matches('/')),
        }
    }
}

/// FPL client. Every logical request goes through the shared [`FetchCache`]
/// before touching the network. Requests are never retried here.
#[derive(Debug, Clone)]
pub struct FplApi {
    client: Client,
    timeout: Duration,
    transports: Vec<Transport>,
    cache: Arc<FetchCache>,
}

impl Default for FplApi {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .user_agent("fpltui/0.1 (terminal league stats)")
                .build()
                .unwrap_or_default(),
            timeout: Duration::from_secs(10),
            transports: vec![Transport::Direct(FPL_UPSTREAM.to_owned())],
            cache: Arc::new(FetchCache::new()),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Upstream(StatusCode, String),
    Parsing(serde_json::Error, String),
    NoData,
    Validation(String),
    NoTransport,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Upstream(status, url) => write!(f, "FPL API error: {status} for {url}"),
            ApiError::Parsing(e, path) => write!(f, "Parse error for {path}: {e}"),
            ApiError::NoData => write!(f, "could not fetch any manager data"),
            ApiError::Validation(msg) => write!(f, "{msg}"),
            ApiError::NoTransport => write!(f, "no transport configured"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Network(e, _) => Some(e),
            ApiError::Parsing(e, _) => Some(e),
            _ => None,
        }
    }
}

/// A league ID is a non-empty run of ASCII digits.
pub fn validate_league_id(raw: &str) -> ApiResult<&str> {
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        Ok(raw)
    } else {
        Err(ApiError::Validation("Invalid league ID".into()))
    }
}

impl FplApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the candidate transports. An empty list makes every uncached
    /// fetch fail with [`ApiError::NoTransport`].
    pub fn with_transports(mut self, transports: Vec<Transport>) -> Self {
        self.transports = transports;
        self
    }

    pub fn with_cache(mut self, cache: Arc<FetchCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Per-request timeout applied to every transport attempt (10 s by
    /// default). A timed-out request is an ordinary fetch failure; retrying
    /// it is left to the [`BatchScheduler`](crate::batch::BatchScheduler).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn cache(&self) -> &Arc<FetchCache> {
        &self.cache
    }

    pub fn transports(&self) -> &[Transport] {
        &self.transports
    }

    /// Fetch the league table for `league_id`. Malformed IDs are rejected
    /// without a network call.
    pub async fn fetch_standings(&self, league_id: &str) -> ApiResult<Vec<StandingsEntry>> {
        let id = validate_league_id(league_id)?;
        let raw: StandingsResponse = self
            .fetch(&format!("leagues-classic/{id}/standings"), None)
            .await?;
        Ok(raw.standings.results)
    }

    pub async fn fetch_bootstrap(&self) -> ApiResult<BootstrapResponse> {
        self.fetch(BOOTSTRAP_PATH, None).await
    }

    /// Element ID → short display name, from `bootstrap-static`.
    pub async fn fetch_player_names(&self) -> ApiResult<HashMap<u32, String>> {
        let bootstrap = self.fetch_bootstrap().await?;
        Ok(player_names(&bootstrap))
    }

    /// Fetch `path` and decode it as `T`. See [`FplApi::fetch_json`].
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        current_event: Option<u32>,
    ) -> ApiResult<T> {
        let value = self.fetch_json(path, current_event).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Parsing(e, path.to_owned()))
    }

    /// Serve `path` from cache when valid, otherwise try each transport in
    /// order. A success is cached with permanence decided by
    /// `current_event`; a failure returns the last transport's error.
    pub async fn fetch_json(&self, path: &str, current_event: Option<u32>) -> ApiResult<Value> {
        if let Some(hit) = self.cache.get(path) {
            debug!("cache hit: {path}");
            return Ok(hit);
        }

        let mut last_error = None;
        for transport in &self.transports {
            let url = transport.url(path);
            match self.get(&url).await {
                Ok(value) => {
                    self.cache
                        .put(path, value.clone(), is_permanent(path, current_event));
                    return Ok(value);
                }
                Err(e) => {
                    debug!("{e}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(ApiError::NoTransport))
    }

    async fn get(&self, url: &str) -> ApiResult<Value> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Upstream(status, url.to_owned()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Parsing(e, url.to_owned()))
    }
}

pub fn player_names(bootstrap: &BootstrapResponse) -> HashMap<u32, String> {
    bootstrap
        .elements
        .iter()
        .map(|e| (e.id, e.web_name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn direct(server: &mockito::ServerGuard) -> FplApi {
        FplApi::new().with_transports(vec![Transport::Direct(server.url())])
    }

    #[test]
    fn transport_urls() {
        let gw = Transport::Gateway("http://localhost:3000/".into());
        let up = Transport::Direct("https://fantasy.premierleague.com".into());
        assert_eq!(gw.url("entry/1/history"), "http://localhost:3000/api/fpl/entry/1/history");
        assert_eq!(up.url("event/3/live"), "https://fantasy.premierleague.com/api/event/3/live/");
    }

    #[test]
    fn request_timeout_defaults_to_ten_seconds() {
        assert_eq!(FplApi::new().timeout(), Duration::from_secs(10));
        let api = FplApi::new().with_timeout(Duration::from_millis(250));
        assert_eq!(api.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn league_id_validation() {
        assert!(validate_league_id("12176").is_ok());
        for bad in ["abc", "", "123; DROP TABLE", "12 176", "-1"] {
            assert!(
                matches!(validate_league_id(bad), Err(ApiError::Validation(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn fetch_caches_successful_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/entry/1/history/")
            .with_status(200)
            .with_body(json!({"current": [], "chips": []}).to_string())
            .expect(1)
            .create_async()
            .await;

        let api = direct(&server);
        api.fetch_json("entry/1/history", None).await.unwrap();
        api.fetch_json("entry/1/history", None).await.unwrap();

        mock.assert_async().await;
        assert_eq!(api.cache().len(), 1);
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_error_and_not_cached() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/event/1/live/")
            .with_status(503)
            .create_async()
            .await;

        let api = direct(&server);
        let err = api.fetch_json("event/1/live", Some(5)).await.unwrap_err();
        assert!(matches!(err, ApiError::Upstream(s, _) if s.as_u16() == 503));
        assert!(api.cache().is_empty());
    }

    #[tokio::test]
    async fn falls_through_to_next_transport() {
        let mut broken = mockito::Server::new_async().await;
        broken
            .mock("GET", "/api/fpl/bootstrap-static")
            .with_status(502)
            .with_body(r#"{"error":"down"}"#)
            .create_async()
            .await;
        let mut upstream = mockito::Server::new_async().await;
        upstream
            .mock("GET", "/api/bootstrap-static/")
            .with_status(200)
            .with_body(json!({"elements": [{"id": 1, "web_name": "Salah"}], "events": []}).to_string())
            .create_async()
            .await;

        let api = FplApi::new().with_transports(vec![
            Transport::Gateway(broken.url()),
            Transport::Direct(upstream.url()),
        ]);
        let names = api.fetch_player_names().await.unwrap();
        assert_eq!(names.get(&1).map(String::as_str), Some("Salah"));
    }

    #[tokio::test]
    async fn standings_rejects_bad_id_without_network() {
        let api = FplApi::new().with_transports(vec![]);
        let err = api.fetch_standings("abc").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn standings_are_returned_in_order() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/leagues-classic/12176/standings/")
            .with_status(200)
            .with_body(
                json!({"standings": {"results": [
                    {"entry": 7, "player_name": "A", "entry_name": "Team A", "total": 300},
                    {"entry": 3, "player_name": "B", "entry_name": "Team B", "total": 250}
                ]}})
                .to_string(),
            )
            .create_async()
            .await;

        let standings = direct(&server).fetch_standings("12176").await.unwrap();
        let ids: Vec<u64> = standings.iter().map(|s| s.entry).collect();
        assert_eq!(ids, vec![7, 3]);
    }

    #[tokio::test]
    async fn no_transport_is_an_error() {
        let api = FplApi::new().with_transports(vec![]);
        let err = api.fetch_json("bootstrap-static", None).await.unwrap_err();
        assert!(matches!(err, ApiError::NoTransport));
    }
}
