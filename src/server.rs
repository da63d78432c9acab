use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::json;
use tracing::{error, info, warn};
use warp::http::{Method, Response, StatusCode};
use warp::hyper::body::Bytes;
use warp::{Filter, Rejection};

use crate::config::ServerConfig;
use crate::handler::{health_report, SearchProxy};
use crate::request::InboundRequest;
use crate::response::ProxyResponse;
use crate::upstream::Upstream;

/// Largest request body the local server will buffer.
pub const MAX_BODY_BYTES: u64 = 16 * 1024;

/// Body refused before it is read: too large, or of unknown length.
#[derive(Debug)]
struct BodyRejected {
    status: u16,
    message: &'static str,
}

impl warp::reject::Reject for BodyRejected {}

/// Local HTTP server: `/health` plus the proxy on every other path.
pub struct Server<U> {
    config: ServerConfig,
    proxy: Arc<SearchProxy<U>>,
}

impl<U: Upstream + 'static> Server<U> {
    pub fn new(proxy: SearchProxy<U>) -> Self {
        Self {
            config: proxy.config().server.clone(),
            proxy: Arc::new(proxy),
        }
    }

    /// Serve until ctrl-c.
    pub async fn run(self) -> crate::Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| crate::ProxyError::Config(format!("Invalid listen address: {}", e)))?;

        let (bound, server) = warp::serve(routes(self.proxy))
            .try_bind_with_graceful_shutdown(addr, async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutdown signal received");
            })
            .map_err(|e| crate::ProxyError::Internal(format!("Failed to bind {}: {}", addr, e)))?;

        info!("Search proxy listening on {}", bound);
        server.await;

        Ok(())
    }
}

pub fn routes<U: Upstream + 'static>(
    proxy: Arc<SearchProxy<U>>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Rejection> + Clone {
    let allow_methods = proxy.config().allow_methods_header();

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_proxy(proxy.clone()))
        .map(|proxy: Arc<SearchProxy<U>>| warp::reply::json(&health_report(proxy.config())));

    // A URI without a query string is treated as an empty one
    let raw_query = warp::query::raw().or(warp::any().map(String::new)).unify();

    let search = warp::method()
        .and(raw_query)
        .and(limited_body())
        .and(with_proxy(proxy))
        .and_then(handle_proxy::<U>);

    health.or(search).recover(move |rejection: Rejection| {
        let allow_methods = allow_methods.clone();
        async move { handle_rejection(rejection, &allow_methods) }
    })
}

/// Buffers the body only when its declared length is within
/// [`MAX_BODY_BYTES`]. Chunked bodies carry no length and are refused.
fn limited_body() -> impl Filter<Extract = (Bytes,), Error = Rejection> + Clone {
    warp::header::optional::<u64>("content-length")
        .and(warp::header::optional::<String>("transfer-encoding"))
        .and_then(|length: Option<u64>, transfer_encoding: Option<String>| async move {
            match (length, transfer_encoding) {
                (Some(length), _) if length > MAX_BODY_BYTES => {
                    Err(warp::reject::custom(BodyRejected {
                        status: 413,
                        message: "Request body too large",
                    }))
                }
                (None, Some(_)) => Err(warp::reject::custom(BodyRejected {
                    status: 411,
                    message: "Content-Length required",
                })),
                _ => Ok(()),
            }
        })
        .untuple_one()
        .and(warp::body::bytes())
}

fn handle_rejection(
    rejection: Rejection,
    allow_methods: &str,
) -> Result<Response<String>, Rejection> {
    match rejection.find::<BodyRejected>() {
        Some(rejected) => {
            warn!(status = rejected.status, "Request rejected: {}", rejected.message);
            Ok(into_response(ProxyResponse::json(
                rejected.status,
                allow_methods,
                &json!({ "error": rejected.message }),
            )))
        }
        None => Err(rejection),
    }
}

/// Helper function to pass the proxy to handlers
fn with_proxy<U: Upstream + 'static>(
    proxy: Arc<SearchProxy<U>>,
) -> impl Filter<Extract = (Arc<SearchProxy<U>>,), Error = Infallible> + Clone {
    warp::any().map(move || proxy.clone())
}

async fn handle_proxy<U: Upstream + 'static>(
    method: Method,
    query_string: String,
    body: Bytes,
    proxy: Arc<SearchProxy<U>>,
) -> Result<Response<String>, Infallible> {
    let request = InboundRequest::new(method.as_str())
        .with_query(query_string)
        .with_body(body.to_vec());

    Ok(into_response(proxy.handle(request).await))
}

fn into_response(response: ProxyResponse) -> Response<String> {
    let mut builder = Response::builder().status(response.status);
    for (name, value) in &response.headers {
        builder = builder.header(*name, value.as_str());
    }

    builder.body(response.body).unwrap_or_else(|e| {
        error!("Failed to build response: {}", e);
        let mut fallback = Response::new(String::new());
        *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}
