pub mod catalog;
pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod request;
pub mod response;
pub mod server;
pub mod upstream;


pub use config::Config;
pub use error::ProxyError;
pub use handler::SearchProxy;
pub use request::InboundRequest;
pub use response::ProxyResponse;
pub use upstream::{HttpUpstream, Upstream, UpstreamReply};

pub type Result<T> = std::result::Result<T, ProxyError>;
