use video_search_proxy::handler::health_report;
use video_search_proxy::{logging, Config};
use vercel_runtime::{run, Body, Error, Request, Response, StatusCode};

#[tokio::main]
async fn main() -> Result<(), Error> {
    logging::init();
    run(handler).await
}

async fn handler(_req: Request) -> Result<Response<Body>, Error> {
    let config = Config::from_env()?;
    let body = serde_json::to_vec(&health_report(&config))?;
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/json")
        .body(Body::Binary(body))?)
}
