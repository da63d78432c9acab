//! Supported upstream services and how each resource kind maps onto an
//! upstream call.

use url::Url;

use crate::config::Secret;
use crate::{ProxyError, Result};

/// Placeholder written over the API key wherever a URL is logged.
pub const HIDDEN_KEY: &str = "[API_KEY_HIDDEN]";

/// Which configured key a resource kind is billed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSlot {
    Search,
    Lookup,
}

impl CredentialSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialSlot::Search => "search",
            CredentialSlot::Lookup => "lookup",
        }
    }
}

#[derive(Debug)]
pub struct Service {
    /// Matched case-insensitively against the `service` parameter.
    pub name: &'static str,
    pub display_name: &'static str,
    /// `error` field of the envelope wrapped around upstream failures.
    pub error_label: &'static str,
}

/// One query-string parameter of an upstream call.
#[derive(Debug)]
pub enum Param {
    Fixed(&'static str, &'static str),
    /// Carries the client's `query` value.
    Query(&'static str),
}

#[derive(Debug)]
pub struct Route {
    pub service: &'static str,
    pub kind: &'static str,
    pub path: &'static str,
    pub params: &'static [Param],
    pub slot: CredentialSlot,
}

pub static SERVICES: &[Service] = &[Service {
    name: "youtube",
    display_name: "YouTube",
    error_label: "YouTube API error",
}];

pub static ROUTES: &[Route] = &[
    Route {
        service: "youtube",
        kind: "search",
        path: "/search",
        params: &[
            Param::Fixed("part", "snippet"),
            Param::Fixed("maxResults", "10"),
            Param::Query("q"),
            Param::Fixed("type", "video"),
        ],
        slot: CredentialSlot::Search,
    },
    Route {
        service: "youtube",
        kind: "channel",
        path: "/channels",
        params: &[Param::Fixed("part", "snippet"), Param::Query("id")],
        slot: CredentialSlot::Lookup,
    },
    Route {
        service: "youtube",
        kind: "channel-search",
        path: "/search",
        params: &[
            Param::Fixed("part", "snippet"),
            Param::Fixed("maxResults", "10"),
            Param::Query("q"),
            Param::Fixed("type", "channel"),
        ],
        slot: CredentialSlot::Search,
    },
    Route {
        service: "youtube",
        kind: "video",
        path: "/videos",
        params: &[Param::Fixed("part", "snippet"), Param::Query("id")],
        slot: CredentialSlot::Lookup,
    },
];

pub fn find_service(name: &str) -> Option<&'static Service> {
    SERVICES.iter().find(|s| s.name.eq_ignore_ascii_case(name))
}

fn find_route(service: &Service, kind: &str) -> Option<&'static Route> {
    ROUTES
        .iter()
        .find(|r| r.service == service.name && r.kind == kind)
}

impl Service {
    pub fn credential_slot(&self, kind: &str) -> Result<CredentialSlot> {
        find_route(self, kind)
            .map(|r| r.slot)
            .ok_or(ProxyError::InvalidTypeForService {
                service: self.display_name,
            })
    }
}

/// A fully built upstream call.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub url: Url,
    redacted: String,
}

impl UpstreamRequest {
    /// The URL with the key replaced by [`HIDDEN_KEY`].
    pub fn redacted(&self) -> &str {
        &self.redacted
    }
}

/// Builds the upstream URL for `kind`. Looks the route up again rather than
/// trusting an earlier [`Service::credential_slot`] call.
pub fn build_upstream_url(
    base_url: &str,
    service: &Service,
    kind: &str,
    query: &str,
    key: &Secret,
) -> Result<UpstreamRequest> {
    let route = find_route(service, kind).ok_or(ProxyError::InvalidType)?;

    let mut url = route_url(base_url, route, query)?;
    let redacted = format!("{}&key={}", url, HIDDEN_KEY);
    url.query_pairs_mut().append_pair("key", key.expose());

    Ok(UpstreamRequest { url, redacted })
}

/// Endpoint plus every parameter except the key, which always goes last.
fn route_url(base_url: &str, route: &Route, query: &str) -> Result<Url> {
    let endpoint = format!("{}{}", base_url.trim_end_matches('/'), route.path);
    let mut url = Url::parse(&endpoint)
        .map_err(|e| ProxyError::Config(format!("Invalid upstream URL {}: {}", endpoint, e)))?;

    {
        let mut pairs = url.query_pairs_mut();
        for param in route.params {
            match param {
                Param::Fixed(name, value) => pairs.append_pair(name, value),
                Param::Query(name) => pairs.append_pair(name, query),
            };
        }
    }

    Ok(url)
}
