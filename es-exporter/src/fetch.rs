//! Single GET + JSON decode step shared by every collector.

use prometheus_client::metrics::counter::Counter;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::trace;
use url::Url;

use crate::endpoint::redact;

/// Errors from one fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure, including client-side timeouts.
    #[error("failed to get from {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with something other than 200 OK.
    #[error("HTTP request to {url} failed with code {status}")]
    Status { url: String, status: StatusCode },

    /// The body was not valid JSON for the expected shape.
    #[error("failed to decode JSON from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// The HTTP status code, for [`FetchError::Status`].
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is a decode failure.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

/// Performs GET requests with an injected client and decodes JSON bodies.
///
/// Every decode failure increments `parse_failures`, whichever caller
/// triggered the fetch.
#[derive(Debug, Clone)]
pub struct JsonFetcher {
    client: Client,
    parse_failures: Counter,
}

impl JsonFetcher {
    /// Create a fetcher sharing the given parse-failure counter.
    pub fn new(client: Client, parse_failures: Counter) -> Self {
        Self {
            client,
            parse_failures,
        }
    }

    /// GET `url` and decode the body into `T`.
    pub async fn fetch<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        trace!(url = %redact(&url), "Fetching");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: redact(&url),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: redact(&url),
                status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Request {
                url: redact(&url),
                source,
            })?;

        serde_json::from_slice(&body).map_err(|source| {
            self.parse_failures.inc();
            FetchError::Parse {
                url: redact(&url),
                source,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = FetchError::Status {
            url: "http://localhost:9200/_snapshot".to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        };

        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!err.is_parse());
        assert!(err.to_string().contains("failed with code 500"));
    }

    #[test]
    fn test_parse_error_flag() {
        let source = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        let err = FetchError::Parse {
            url: "http://localhost:9200/_all/_settings".to_string(),
            source,
        };

        assert!(err.is_parse());
        assert_eq!(err.status(), None);
    }
}
