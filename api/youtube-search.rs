use std::sync::OnceLock;

use tracing::info;
use video_search_proxy::{logging, Config, HttpUpstream, InboundRequest, SearchProxy};
use vercel_runtime::{run, Body, Error, Request, Response};

static PROXY: OnceLock<SearchProxy<HttpUpstream>> = OnceLock::new();

#[tokio::main]
async fn main() -> Result<(), Error> {
    logging::init();

    let config = Config::from_env()?;
    info!(
        allow_methods = %config.allow_methods_header(),
        "youtube-search function starting"
    );
    let proxy = SearchProxy::new(config, HttpUpstream::new()?);
    if PROXY.set(proxy).is_err() {
        return Err("search proxy initialised twice".into());
    }

    run(handler).await
}

async fn handler(req: Request) -> Result<Response<Body>, Error> {
    let proxy = PROXY.get().ok_or("search proxy not initialised")?;

    let mut inbound = InboundRequest::new(req.method().as_str()).with_body(body_bytes(req.body()));
    if let Some(query) = req.uri().query() {
        inbound = inbound.with_query(query);
    }

    let response = proxy.handle(inbound).await;

    let mut builder = Response::builder().status(response.status);
    for (name, value) in &response.headers {
        builder = builder.header(*name, value.as_str());
    }
    let body = if response.body.is_empty() {
        Body::Empty
    } else {
        Body::Text(response.body)
    };

    Ok(builder.body(body)?)
}

#[allow(unreachable_patterns)]
fn body_bytes(body: &Body) -> Vec<u8> {
    match body {
        Body::Empty => Vec::new(),
        Body::Text(text) => text.as_bytes().to_vec(),
        Body::Binary(bytes) => bytes.clone(),
        _ => Vec::new(),
    }
}
