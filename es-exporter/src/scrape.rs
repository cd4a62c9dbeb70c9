//! Two-phase data gathering: discover entity ids, then fetch each one.

use std::collections::BTreeMap;
use std::future::Future;

use serde::de::IgnoredAny;
use tracing::{debug, warn};
use url::Url;

use crate::fetch::{FetchError, JsonFetcher};

/// Fetch a JSON object from `url` and return its keys.
///
/// Values are ignored. Any failure is returned to the caller unchanged.
pub async fn discover(fetcher: &JsonFetcher, url: Url) -> Result<Vec<String>, FetchError> {
    let listing: BTreeMap<String, IgnoredAny> = fetcher.fetch(url).await?;
    Ok(listing.into_keys().collect())
}

/// Fetch the detail payload of each id independently.
///
/// Ids whose fetch fails are logged and left out of the result; the
/// remaining ids are still fetched. Fetches run one after another.
pub async fn fetch_each<T, F, Fut>(ids: Vec<String>, fetch: F) -> BTreeMap<String, T>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let requested = ids.len();
    let mut fetched = BTreeMap::new();

    for id in ids {
        match fetch(id.clone()).await {
            Ok(payload) => {
                fetched.insert(id, payload);
            }
            Err(e) => {
                warn!(entity = %id, error = %e, "Failed to fetch entity, skipping");
            }
        }
    }

    debug!(requested, fetched = fetched.len(), "Fetched entity details");
    fetched
}
