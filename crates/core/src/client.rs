use crate::error::SearchError;
use crate::soql::SoqlQuery;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

/// Resource root of the datos.gov.co Socrata deployment.
pub const SOCRATA_BASE_URL: &str = "https://www.datos.gov.co/resource/";

/// Transport seam: fetch one page of raw records for a dataset.
#[async_trait]
pub trait PageFetch {
    async fn fetch_page(
        &self,
        resource: &str,
        query: &SoqlQuery,
        offset: usize,
    ) -> Result<Vec<Value>, SearchError>;
}

pub struct SocrataClient {
    client: Client,
    base_url: Url,
    app_token: Option<String>,
}

impl SocrataClient {
    pub fn new(base_url: impl AsRef<str>, app_token: Option<String>) -> Result<Self, SearchError> {
        Ok(Self {
            client: Client::new(),
            base_url: Url::parse(base_url.as_ref())?,
            app_token,
        })
    }

    fn resource_url(&self, resource: &str) -> Result<Url, SearchError> {
        Ok(self.base_url.join(&format!("{resource}.json"))?)
    }
}

#[async_trait]
impl PageFetch for SocrataClient {
    async fn fetch_page(
        &self,
        resource: &str,
        query: &SoqlQuery,
        offset: usize,
    ) -> Result<Vec<Value>, SearchError> {
        let mut request = self
            .client
            .get(self.resource_url(resource)?)
            .query(&query.params(offset));

        if let Some(token) = &self.app_token {
            request = request.header("X-App-Token", token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(SearchError::Status(response.status()));
        }

        Ok(response.json().await?)
    }
}

/// Outcome of one full pagination walk.
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub records: Vec<Value>,
    pub requests: usize,
    /// False when a transport failure truncated the walk; the records
    /// fetched before the failure are still present.
    pub complete: bool,
}

impl FetchReport {
    fn empty() -> Self {
        Self {
            records: Vec::new(),
            requests: 0,
            complete: true,
        }
    }
}

/// Walk a dataset to completeness, one page at a time.
///
/// Continues while the last page came back exactly full; an exactly-full
/// final page therefore costs one extra request that returns empty. Any
/// transport failure ends the walk with whatever was already accumulated;
/// this never returns an error.
pub async fn fetch_all<F>(api: &F, resource: &str, query: &SoqlQuery) -> FetchReport
where
    F: PageFetch + Sync,
{
    let page_size = query.limit();
    let mut report = FetchReport::empty();

    report.requests = 1;
    let mut last_len = match api.fetch_page(resource, query, 0).await {
        Ok(page) => {
            let len = page.len();
            report.records.extend(page);
            len
        }
        Err(error) => {
            warn!(resource, %error, "initial page request failed");
            report.complete = false;
            return report;
        }
    };

    while last_len == page_size {
        let offset = report.records.len();
        report.requests += 1;

        match api.fetch_page(resource, query, offset).await {
            Ok(page) => {
                debug!(resource, offset, got = page.len(), "fetched page");
                last_len = page.len();
                report.records.extend(page);
            }
            Err(error) => {
                warn!(
                    resource,
                    offset,
                    fetched = report.records.len(),
                    %error,
                    "pagination stopped early, keeping partial results"
                );
                report.complete = false;
                break;
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted transport: each queued entry is one page; `None` simulates
    /// a transport failure. Past the script, pages come back empty.
    struct ScriptedApi {
        pages: Mutex<VecDeque<Option<Vec<Value>>>>,
        calls: AtomicUsize,
    }

    impl ScriptedApi {
        fn new(pages: Vec<Option<Vec<Value>>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageFetch for ScriptedApi {
        async fn fetch_page(
            &self,
            _resource: &str,
            _query: &SoqlQuery,
            _offset: usize,
        ) -> Result<Vec<Value>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.pages.lock().unwrap().pop_front() {
                Some(Some(page)) => Ok(page),
                Some(None) => Err(SearchError::Status(StatusCode::INTERNAL_SERVER_ERROR)),
                None => Ok(Vec::new()),
            }
        }
    }

    fn page_of(len: usize) -> Vec<Value> {
        (0..len).map(|i| json!({ "n": i })).collect()
    }

    #[tokio::test]
    async fn walk_stops_on_first_short_page() {
        let limit = 5;
        let api = ScriptedApi::new(vec![
            Some(page_of(limit)),
            Some(page_of(limit)),
            Some(page_of(limit)),
            Some(page_of(2)),
        ]);
        let query = SoqlQuery::new(limit);

        let report = fetch_all(&api, "p6dx-8zbt", &query).await;

        assert_eq!(report.records.len(), 3 * limit + 2);
        assert_eq!(report.requests, 4);
        assert_eq!(api.calls(), 4);
        assert!(report.complete);
    }

    #[tokio::test]
    async fn failure_mid_stream_keeps_earlier_pages() {
        let limit = 4;
        let api = ScriptedApi::new(vec![
            Some(page_of(limit)),
            Some(page_of(limit)),
            None,
            Some(page_of(limit)),
        ]);
        let query = SoqlQuery::new(limit);

        let report = fetch_all(&api, "p6dx-8zbt", &query).await;

        assert_eq!(report.records.len(), 2 * limit);
        assert_eq!(report.requests, 3);
        assert!(!report.complete);
    }

    #[tokio::test]
    async fn failed_first_request_returns_empty_partial_report() {
        let api = ScriptedApi::new(vec![None]);
        let query = SoqlQuery::new(1000);

        let report = fetch_all(&api, "p6dx-8zbt", &query).await;

        assert!(report.records.is_empty());
        assert_eq!(report.requests, 1);
        assert!(!report.complete);
    }

    #[tokio::test]
    async fn exactly_full_final_page_costs_one_empty_request() {
        let limit = 3;
        let api = ScriptedApi::new(vec![Some(page_of(limit))]);
        let query = SoqlQuery::new(limit);

        let report = fetch_all(&api, "p6dx-8zbt", &query).await;

        assert_eq!(report.records.len(), limit);
        assert_eq!(report.requests, 2);
        assert!(report.complete);
    }

    #[tokio::test]
    async fn short_first_page_makes_a_single_request() {
        let api = ScriptedApi::new(vec![Some(page_of(7))]);
        let query = SoqlQuery::new(1000);

        let report = fetch_all(&api, "hgi6-6wh3", &query).await;

        assert_eq!(report.records.len(), 7);
        assert_eq!(report.requests, 1);
        assert!(report.complete);
    }
}
