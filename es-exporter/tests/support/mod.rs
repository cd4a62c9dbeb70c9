//! In-process stand-in for the Elasticsearch REST API.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;

use es_exporter::Endpoint;

#[derive(Default)]
struct Routes {
    responses: HashMap<String, (StatusCode, String)>,
    requests: AtomicUsize,
    paths: Mutex<Vec<String>>,
}

/// Fake cluster serving canned responses by exact path.
///
/// Unknown paths answer 404.
pub struct MockElasticsearch {
    routes: Arc<Routes>,
    pub endpoint: Endpoint,
}

impl MockElasticsearch {
    /// Start serving `(path, status, body)` responses on a random local port.
    pub async fn start(responses: &[(&str, u16, &str)]) -> Self {
        let routes = Arc::new(Routes {
            responses: responses
                .iter()
                .map(|(path, status, body)| {
                    (
                        path.to_string(),
                        (StatusCode::from_u16(*status).unwrap(), body.to_string()),
                    )
                })
                .collect(),
            ..Default::default()
        });

        let router = Router::new()
            .fallback(respond)
            .with_state(Arc::clone(&routes));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            routes,
            endpoint: Endpoint::parse(&format!("http://{addr}")).unwrap(),
        }
    }

    /// Total requests served so far.
    pub fn requests(&self) -> usize {
        self.routes.requests.load(Ordering::SeqCst)
    }

    /// Whether `path` has been requested.
    pub fn was_requested(&self, path: &str) -> bool {
        self.routes.paths.lock().iter().any(|p| p == path)
    }
}

async fn respond(State(routes): State<Arc<Routes>>, uri: Uri) -> Response {
    routes.requests.fetch_add(1, Ordering::SeqCst);
    routes.paths.lock().push(uri.path().to_string());

    match routes.responses.get(uri.path()) {
        Some((status, body)) => (
            *status,
            [("content-type", "application/json")],
            body.clone(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// An endpoint nothing listens on.
pub async fn closed_endpoint() -> Endpoint {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Endpoint::parse(&format!("http://{addr}")).unwrap()
}
