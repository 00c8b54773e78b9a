use log::{debug, warn};
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use super::client::ApiClient;

const PAGE_PARAM: &str = "page";
const PER_PAGE_PARAM: &str = "per_page";

/// Walks a page-numbered list endpoint.
///
/// Stops on a short page, on a request that yields no result, or once
/// `hard_cap` items have been covered; never returns more than `hard_cap`.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: usize,
    hard_cap: usize,
}

impl Paginator {
    pub fn new(per_page: usize, hard_cap: usize) -> Self {
        Self {
            per_page: per_page.max(1),
            hard_cap,
        }
    }

    /// Fetches pages in server order. Items that fail to deserialize are dropped
    /// but still count toward the page size.
    pub async fn collect<T: DeserializeOwned>(
        &self,
        client: &ApiClient,
        url: &Url,
        headers: &HeaderMap,
        query: &[(&str, String)],
    ) -> Vec<T> {
        let mut items = Vec::new();
        let mut page = 1;

        while (page - 1) * self.per_page < self.hard_cap {
            let mut params = query.to_vec();
            params.push((PAGE_PARAM, page.to_string()));
            params.push((PER_PAGE_PARAM, self.per_page.to_string()));

            let Some(response) = client.get(url, headers, &params).await else {
                debug!("No result for page {page} of {url}, stopping");
                break;
            };

            let Value::Array(batch) = response.body else {
                warn!("Expected a JSON array from {url}, stopping pagination");
                break;
            };

            let batch_len = batch.len();
            items.extend(batch.into_iter().filter_map(|item| {
                serde_json::from_value(item)
                    .map_err(|e| warn!("Skipping malformed item from {url}: {e}"))
                    .ok()
            }));

            if batch_len < self.per_page {
                break;
            }

            page += 1;
        }

        items.truncate(self.hard_cap);
        items
    }
}
