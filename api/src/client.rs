use crate::pulselive::RankedStatsResponse;
use crate::{PlayerStat, RawApiRecord};
use futures_util::{StreamExt, TryStreamExt, stream};
use log::{debug, info};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN};
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const DEFAULT_BASE_URL: &str = "https://footballapi.pulselive.com";
pub const DEFAULT_PAGE_SIZE: u32 = 500;
const RANKED_GOALS_PATH: &str = "/football/stats/ranked/players/goals";
const ORIGIN_HEADER: &str = "https://www.premierleague.com";
/// Upper bound on in-flight page requests in concurrent mode.
const CONCURRENT_PAGE_LIMIT: usize = 4;

/// Client for the Premier League all-time goals ranking.
#[derive(Debug, Clone)]
pub struct PremierApi {
    client: Client,
    headers: HeaderMap,
    base_url: String,
    page_size: u32,
    concurrent_pages: bool,
    timeout: Duration,
}

impl Default for PremierApi {
    fn default() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ORIGIN, HeaderValue::from_static(ORIGIN_HEADER));

        Self {
            client: Client::builder()
                .user_agent("premier-stats/0.1 (goal rankings export)")
                .build()
                .unwrap_or_default(),
            headers,
            base_url: DEFAULT_BASE_URL.to_owned(),
            page_size: DEFAULT_PAGE_SIZE,
            concurrent_pages: false,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    /// The body lacks `stats.pageInfo.numPages` or `stats.content`.
    InvalidApiResult { page: u32, url: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::InvalidApiResult { page, url } => {
                write!(f, "Invalid API result for page {page} ({url})")
            }
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Network(e, _) | ApiError::Api(e, _) | ApiError::Parsing(e, _) => Some(e),
            ApiError::InvalidApiResult { .. } => None,
        }
    }
}

/// One validated page of the ranking.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub index: u32,
    /// Total page count as reported alongside this page.
    pub num_pages: u32,
    pub content: Vec<RawApiRecord>,
}

impl PremierApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Fetch pages 1.. concurrently once page 0 has reported the page count.
    pub fn with_concurrent_pages(mut self, enabled: bool) -> Self {
        self.concurrent_pages = enabled;
        self
    }

    pub fn page_url(&self, page: u32) -> String {
        format!(
            "{}{RANKED_GOALS_PATH}?pageSize={}&comps=1&compCodeForActivePlayer=EN_PR&altIds=true&page={page}",
            self.base_url, self.page_size
        )
    }

    /// Fetch every page and flatten the records, silently dropping the ones
    /// that lack a display name or a birth country.
    pub async fn fetch_player_stats(&self) -> ApiResult<Vec<PlayerStat>> {
        let records = self.fetch_all_pages().await?;
        let total = records.len();

        let players: Vec<PlayerStat> = records
            .iter()
            .filter_map(|record| match PlayerStat::from_raw(record) {
                Ok(player) => Some(player),
                Err(e) => {
                    debug!("dropping record: {e}");
                    None
                }
            })
            .collect();

        if players.len() < total {
            debug!("{} of {total} records dropped", total - players.len());
        }
        info!("Fetched {} players", players.len());
        Ok(players)
    }

    /// Fetch all pages starting at page 0 and concatenate their content in
    /// page order. The first failing page fails the whole fetch.
    ///
    /// Sequentially, each response's own `numPages` decides whether another
    /// page follows. In concurrent mode page 0's count is authoritative.
    pub async fn fetch_all_pages(&self) -> ApiResult<Vec<RawApiRecord>> {
        let first = self.fetch_page(0).await?;

        if self.concurrent_pages {
            return self.fetch_remaining_concurrently(first).await;
        }

        let mut records = first.content;
        let mut num_pages = first.num_pages;
        let mut page = 0;
        while page + 1 < num_pages {
            page += 1;
            let next = self.fetch_page(page).await?;
            debug!("page {} returned {} records", next.index, next.content.len());
            num_pages = next.num_pages;
            records.extend(next.content);
        }
        Ok(records)
    }

    async fn fetch_remaining_concurrently(&self, first: Page) -> ApiResult<Vec<RawApiRecord>> {
        // `buffered` yields in input order, so pages concatenate ascending.
        let pages: Vec<Page> = stream::iter(1..first.num_pages)
            .map(|page| self.fetch_page(page))
            .buffered(CONCURRENT_PAGE_LIMIT)
            .try_collect()
            .await?;

        let mut records = first.content;
        for page in pages {
            debug!("page {} returned {} records", page.index, page.content.len());
            records.extend(page.content);
        }
        Ok(records)
    }

    /// Fetch and validate a single page.
    pub async fn fetch_page(&self, page: u32) -> ApiResult<Page> {
        let url = self.page_url(page);
        info!("Fetching page {page}");

        let body = self.get(&url, &self.headers).await?;
        let invalid = || ApiError::InvalidApiResult { page, url: url.clone() };

        let stats = serde_json::from_value::<RankedStatsResponse>(body)
            .map_err(|_| invalid())?
            .stats
            .ok_or_else(invalid)?;
        let num_pages = stats
            .page_info
            .and_then(|info| info.num_pages)
            .ok_or_else(invalid)?;
        let content = stats.content.ok_or_else(invalid)?;

        Ok(Page { index: page, num_pages, content })
    }

    async fn get(&self, url: &str, headers: &HeaderMap) -> ApiResult<serde_json::Value> {
        let response = self
            .client
            .get(url)
            .headers(headers.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?
            .error_for_status()
            .map_err(|e| ApiError::Api(e, url.to_owned()))?;

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ApiError::Parsing(e, url.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Mock, Server, ServerGuard};
    use serde_json::{Value, json};

    fn page_body(num_pages: u32, content: Value) -> Value {
        json!({ "stats": { "pageInfo": { "numPages": num_pages }, "content": content } })
    }

    fn player(name: &str, country: &str, rank: u32, goals: u32) -> Value {
        json!({
            "owner": {
                "name": { "display": name },
                "birth": { "country": { "country": country } }
            },
            "rank": rank,
            "value": goals
        })
    }

    async fn mock_page(server: &mut ServerGuard, page: u32, body: &Value) -> Mock {
        server
            .mock("GET", RANKED_GOALS_PATH)
            .match_query(Matcher::UrlEncoded("page".into(), page.to_string()))
            .match_header("origin", ORIGIN_HEADER)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .expect(1)
            .create_async()
            .await
    }

    fn api_for(server: &ServerGuard) -> PremierApi {
        PremierApi::new().with_base_url(server.url())
    }

    #[test]
    fn test_page_url() {
        let api = PremierApi::new().with_base_url("http://localhost:1234/").with_page_size(20);
        assert_eq!(
            api.page_url(3),
            "http://localhost:1234/football/stats/ranked/players/goals?pageSize=20&comps=1&compCodeForActivePlayer=EN_PR&altIds=true&page=3"
        );
        assert!(PremierApi::new().page_url(0).starts_with(DEFAULT_BASE_URL));
        assert!(PremierApi::new().page_url(0).contains("pageSize=500"));
    }

    #[tokio::test]
    async fn test_single_page_for_zero_and_one_page_counts() {
        for num_pages in [0, 1] {
            let mut server = Server::new_async().await;
            let content = json!(["Yay!", { "rank": 3 }]);
            let first = mock_page(&mut server, 0, &page_body(num_pages, content.clone())).await;
            let second = server
                .mock("GET", RANKED_GOALS_PATH)
                .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
                .expect(0)
                .create_async()
                .await;

            let records = api_for(&server).fetch_all_pages().await.unwrap();
            assert_eq!(Value::Array(records), content);
            first.assert_async().await;
            second.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_concatenates_pages_in_order() {
        let mut server = Server::new_async().await;
        let m0 = mock_page(&mut server, 0, &page_body(3, json!(["Page 1!"]))).await;
        let m1 = mock_page(&mut server, 1, &page_body(3, json!(["Page 2!"]))).await;
        let m2 = mock_page(&mut server, 2, &page_body(3, json!(["Page 3!"]))).await;

        let records = api_for(&server).fetch_all_pages().await.unwrap();
        assert_eq!(Value::Array(records), json!(["Page 1!", "Page 2!", "Page 3!"]));
        m0.assert_async().await;
        m1.assert_async().await;
        m2.assert_async().await;
    }

    #[tokio::test]
    async fn test_follows_each_page_count_hint() {
        let mut server = Server::new_async().await;
        let m0 = mock_page(&mut server, 0, &page_body(3, json!(["a"]))).await;
        let m1 = mock_page(&mut server, 1, &page_body(2, json!(["b"]))).await;
        let m2 = server
            .mock("GET", RANKED_GOALS_PATH)
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .expect(0)
            .create_async()
            .await;

        let records = api_for(&server).fetch_all_pages().await.unwrap();
        assert_eq!(Value::Array(records), json!(["a", "b"]));
        m0.assert_async().await;
        m1.assert_async().await;
        m2.assert_async().await;
    }

    #[tokio::test]
    async fn test_concurrent_pages_keep_page_order() {
        let mut server = Server::new_async().await;
        let mut mocks = Vec::new();
        for page in 0..5u32 {
            let body = page_body(5, json!([format!("page {page}")]));
            mocks.push(mock_page(&mut server, page, &body).await);
        }

        let api = api_for(&server).with_concurrent_pages(true);
        let records = api.fetch_all_pages().await.unwrap();
        assert_eq!(
            Value::Array(records),
            json!(["page 0", "page 1", "page 2", "page 3", "page 4"])
        );
        for mock in mocks {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_concurrent_pages_fail_on_any_page() {
        let mut server = Server::new_async().await;
        let _m0 = mock_page(&mut server, 0, &page_body(4, json!(["page 0"]))).await;
        let _m1 = mock_page(&mut server, 1, &page_body(4, json!(["page 1"]))).await;
        let _m2 = server
            .mock("GET", RANKED_GOALS_PATH)
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(500)
            .create_async()
            .await;
        let _m3 = mock_page(&mut server, 3, &page_body(4, json!(["page 3"]))).await;

        let api = api_for(&server).with_concurrent_pages(true);
        let err = api.fetch_all_pages().await.unwrap_err();
        assert!(matches!(err, ApiError::Api(_, _)), "got {err}");
    }

    #[tokio::test]
    async fn test_concurrent_pages_beyond_in_flight_limit() {
        let mut server = Server::new_async().await;
        let num_pages = (CONCURRENT_PAGE_LIMIT * 3) as u32;
        let mut mocks = Vec::new();
        for page in 0..num_pages {
            let body = page_body(num_pages, json!([page]));
            mocks.push(mock_page(&mut server, page, &body).await);
        }

        let api = api_for(&server).with_concurrent_pages(true);
        let records = api.fetch_all_pages().await.unwrap();
        let expected: Vec<Value> = (0..num_pages).map(|page| json!(page)).collect();
        assert_eq!(records, expected);
        for mock in mocks {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_fetch_page_reports_index_and_count() {
        let mut server = Server::new_async().await;
        let _mock = mock_page(&mut server, 2, &page_body(5, json!(["a", "b"]))).await;

        let page = api_for(&server).fetch_page(2).await.unwrap();
        assert_eq!(page.index, 2);
        assert_eq!(page.num_pages, 5);
        assert_eq!(page.content, vec![json!("a"), json!("b")]);
    }

    #[tokio::test]
    async fn test_transport_error_on_first_page() {
        // Nothing listens on port 1.
        let api = PremierApi::new().with_base_url("http://127.0.0.1:1");
        let err = api.fetch_all_pages().await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_, _)), "got {err}");
    }

    #[tokio::test]
    async fn test_error_on_second_page_discards_first() {
        let mut server = Server::new_async().await;
        let m0 = mock_page(&mut server, 0, &page_body(3, json!(["Page 1!"]))).await;
        let m1 = server
            .mock("GET", RANKED_GOALS_PATH)
            .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        let m2 = server
            .mock("GET", RANKED_GOALS_PATH)
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .expect(0)
            .create_async()
            .await;

        let err = api_for(&server).fetch_all_pages().await.unwrap_err();
        assert!(matches!(err, ApiError::Api(_, _)), "got {err}");
        m0.assert_async().await;
        m1.assert_async().await;
        m2.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_api_results() {
        let bodies = [
            json!({}),
            json!({ "stats": {} }),
            json!({ "stats": { "pageInfo": {} } }),
            json!({ "stats": { "pageInfo": { "numPages": 1 } } }),
            json!({ "stats": { "content": [] } }),
            json!({ "stats": { "pageInfo": {}, "content": [] } }),
            json!({ "stats": { "pageInfo": { "numPages": "two" }, "content": [] } }),
            json!("stats"),
        ];
        for body in bodies {
            let mut server = Server::new_async().await;
            let mock = mock_page(&mut server, 0, &body).await;
            let err = api_for(&server).fetch_all_pages().await.unwrap_err();
            assert!(
                matches!(err, ApiError::InvalidApiResult { page: 0, .. }),
                "body {body}: got {err}"
            );
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_invalid_second_page_fails_fetch() {
        let mut server = Server::new_async().await;
        let _m0 = mock_page(&mut server, 0, &page_body(2, json!(["Page 1!"]))).await;
        let _m1 = mock_page(&mut server, 1, &json!({ "stats": {} })).await;

        let err = api_for(&server).fetch_all_pages().await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidApiResult { page: 1, .. }), "got {err}");
    }

    #[tokio::test]
    async fn test_non_json_body_is_parse_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", RANKED_GOALS_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let err = api_for(&server).fetch_all_pages().await.unwrap_err();
        assert!(matches!(err, ApiError::Parsing(_, _)), "got {err}");
    }

    #[tokio::test]
    async fn test_fetch_player_stats_drops_invalid_records() {
        let mut server = Server::new_async().await;
        let _m0 = mock_page(
            &mut server,
            0,
            &page_body(2, json!([player("Pelé", "Brazil", 1, 1282), "Yay!", {}])),
        )
        .await;
        let _m1 = mock_page(
            &mut server,
            1,
            &page_body(2, json!([{ "owner": {} }, player("Maradona", "Argentina", 2, 365)])),
        )
        .await;

        let players = api_for(&server).fetch_player_stats().await.unwrap();
        let names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Pelé", "Maradona"]);
        assert_eq!(players[1].nationality, "Argentina");
        assert_eq!(players[1].goals, 365);
    }

    #[tokio::test]
    async fn test_fetch_player_stats_all_invalid_is_empty() {
        let mut server = Server::new_async().await;
        let _mock =
            mock_page(&mut server, 0, &page_body(0, json!(["Yay!", {}, { "owner": {} }]))).await;

        let players = api_for(&server).fetch_player_stats().await.unwrap();
        assert!(players.is_empty());
    }
}
