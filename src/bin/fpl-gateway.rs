use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use fpl_api::client::{FPL_UPSTREAM, validate_league_id};
use serde::Serialize;
use std::env;
use std::time::Duration;
use tokio::net::TcpListener;

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const EDGE_CACHE: &str = "s-maxage=60, stale-while-revalidate";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let addr = env::var("FPL_GATEWAY_BIND").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let upstream = env::var("FPL_GATEWAY_UPSTREAM").unwrap_or_else(|_| FPL_UPSTREAM.to_string());
    let listener = TcpListener::bind(&addr).await?;

    eprintln!("fpl gateway listening on {addr}, forwarding to {upstream}");

    axum::serve(listener, router(GatewayState::new(upstream))).await?;
    Ok(())
}

#[derive(Clone)]
struct GatewayState {
    client: reqwest::Client,
    upstream: String,
}

impl GatewayState {
    fn new(upstream: String) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_UA)
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self { client, upstream: upstream.trim_end_matches('/').to_string() }
    }
}

fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/api/fpl", get(missing_path))
        .route("/api/fpl/", get(missing_path))
        .route("/api/fpl/{*path}", get(proxy_fpl))
        .route("/api/standings", get(missing_league_id))
        .route("/api/standings/", get(missing_league_id))
        .route("/api/standings/{league_id}", get(league_standings))
        .with_state(state)
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
enum GatewayError {
    MissingPath,
    InvalidLeagueId,
    Upstream(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            GatewayError::MissingPath => (StatusCode::BAD_REQUEST, "Missing path".to_string()),
            GatewayError::InvalidLeagueId => (StatusCode::BAD_REQUEST, "Invalid league ID".to_string()),
            GatewayError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

async fn missing_path() -> GatewayError {
    GatewayError::MissingPath
}

async fn missing_league_id() -> GatewayError {
    GatewayError::InvalidLeagueId
}

/// `GET /api/fpl/{path}` → upstream `/api/{path}/`, status and body verbatim.
async fn proxy_fpl(
    State(state): State<GatewayState>,
    Path(path): Path<String>,
) -> Result<Response, GatewayError> {
    let path = path.trim_matches('/');
    if path.is_empty() {
        return Err(GatewayError::MissingPath);
    }
    let mut response = forward(&state, path).await?;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static(EDGE_CACHE));
    Ok(response)
}

/// `GET /api/standings/{league_id}` → upstream classic-league standings.
async fn league_standings(
    State(state): State<GatewayState>,
    Path(league_id): Path<String>,
) -> Result<Response, GatewayError> {
    let id = validate_league_id(&league_id).map_err(|_| GatewayError::InvalidLeagueId)?;
    forward(&state, &format!("leagues-classic/{id}/standings")).await
}

async fn forward(state: &GatewayState, path: &str) -> Result<Response, GatewayError> {
    let url = format!("{}/api/{path}/", state.upstream);
    let upstream = state
        .client
        .get(&url)
        .send()
        .await
        .map_err(|e| {
            eprintln!("upstream request failed for {url}: {e}");
            GatewayError::Upstream(e.to_string())
        })?;

    let status = upstream.status();
    let body = upstream.bytes().await.map_err(|e| {
        eprintln!("upstream body failed for {url}: {e}");
        GatewayError::Upstream(e.to_string())
    })?;

    Ok((status, [(header::CONTENT_TYPE, "application/json")], body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn unreachable_state() -> GatewayState {
        GatewayState::new("http://127.0.0.1:1".to_string())
    }

    #[tokio::test]
    async fn rejects_malformed_league_ids() {
        for bad in ["abc", "", "123; DROP TABLE"] {
            let response = league_standings(State(unreachable_state()), Path(bad.to_string()))
                .await
                .into_response();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{bad:?}");
            assert_eq!(body_json(response).await["error"], "Invalid league ID");
        }
    }

    async fn serve(upstream: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router(GatewayState::new(upstream))).await });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn routes_reject_bad_requests_before_forwarding() {
        let mut server = mockito::Server::new_async().await;
        let upstream = server.mock("GET", mockito::Matcher::Any).expect(0).create_async().await;
        let base = serve(server.url()).await;

        for path in [
            "/api/standings",
            "/api/standings/",
            "/api/standings/abc",
            "/api/standings/123%3B%20DROP%20TABLE",
            "/api/fpl",
            "/api/fpl/",
        ] {
            let response = reqwest::get(format!("{base}{path}")).await.unwrap();
            assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST, "{path}");
            let body: Value = serde_json::from_slice(&response.bytes().await.unwrap()).unwrap();
            assert!(body["error"].is_string(), "{path}");
        }
        upstream.assert_async().await;
    }

    #[tokio::test]
    async fn routes_forward_valid_requests() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/leagues-classic/12176/standings/")
            .with_status(200)
            .with_body(r#"{"standings":{"results":[]}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/entry/1/history/")
            .with_status(404)
            .with_body(r#"{"detail":"Not found."}"#)
            .create_async()
            .await;
        let base = serve(server.url()).await;

        let standings = reqwest::get(format!("{base}/api/standings/12176")).await.unwrap();
        assert_eq!(standings.status(), reqwest::StatusCode::OK);
        assert!(standings.headers().get(header::CACHE_CONTROL).is_none());

        let history = reqwest::get(format!("{base}/api/fpl/entry/1/history")).await.unwrap();
        assert_eq!(history.status(), reqwest::StatusCode::NOT_FOUND);
        assert_eq!(
            history.headers().get(header::CACHE_CONTROL).and_then(|v| v.to_str().ok()),
            Some(EDGE_CACHE)
        );
    }

    #[tokio::test]
    async fn rejects_empty_fpl_path() {
        let response = proxy_fpl(State(unreachable_state()), Path("/".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Missing path");
        assert_eq!(missing_path().await.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn forwards_valid_league_id() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/leagues-classic/12176/standings/")
            .with_status(200)
            .with_body(r#"{"standings":{"results":[]}}"#)
            .create_async()
            .await;

        let response = league_standings(State(GatewayState::new(server.url())), Path("12176".into()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["standings"]["results"], Value::Array(vec![]));
    }

    #[tokio::test]
    async fn proxies_status_verbatim_with_cache_header() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/entry/1/history/")
            .with_status(404)
            .with_body(r#"{"detail":"Not found."}"#)
            .create_async()
            .await;

        let response = proxy_fpl(State(GatewayState::new(server.url())), Path("entry/1/history".into()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).and_then(|v| v.to_str().ok()),
            Some(EDGE_CACHE)
        );
        assert_eq!(body_json(response).await["detail"], "Not found.");
    }

    #[tokio::test]
    async fn network_failure_is_bad_gateway() {
        let response = proxy_fpl(State(unreachable_state()), Path("bootstrap-static".into()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(body_json(response).await["error"].is_string());
    }
}
