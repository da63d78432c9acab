use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::catalog::{build_upstream_url, find_service, CredentialSlot};
use crate::config::Config;
use crate::request::{InboundRequest, SearchParams};
use crate::response::{ApiResponse, ProxyResponse};
use crate::upstream::Upstream;
use crate::{ProxyError, Result};

/// Turns one inbound request into at most one upstream call and relays the
/// result. Holds no per-request state, so one instance serves every
/// concurrent request.
pub struct SearchProxy<U> {
    config: Config,
    upstream: U,
}

impl<U: Upstream> SearchProxy<U> {
    pub fn new(config: Config, upstream: U) -> Self {
        Self { config, upstream }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    pub async fn handle(&self, request: InboundRequest) -> ProxyResponse {
        let allow_methods = self.config.allow_methods_header();

        if request.is_method("OPTIONS") {
            return ProxyResponse::empty(200, &allow_methods);
        }

        let result = if self.config.allows_method(&request.method) {
            self.dispatch(&request).await
        } else {
            Err(ProxyError::MethodNotAllowed)
        };

        match result {
            Ok(body) => ProxyResponse::json(200, &allow_methods, &body),
            Err(e) => {
                let status = e.status();
                if status >= 500 {
                    error!(status, method = %request.method, "Function error: {}", e);
                } else {
                    warn!(status, method = %request.method, "Request rejected: {}", e);
                }
                ProxyResponse::json(status, &allow_methods, &e.body())
            }
        }
    }

    async fn dispatch(&self, request: &InboundRequest) -> Result<Value> {
        let params = self.extract_params(request)?;
        let credentials = &self.config.credentials;

        info!(
            method = %request.method,
            service = %params.service,
            kind = %params.kind,
            query = params.query.as_deref().unwrap_or_default(),
            search_key = credentials.presence(CredentialSlot::Search),
            lookup_key = credentials.presence(CredentialSlot::Lookup),
            "Proxy request received"
        );

        let query = params.query.as_deref().ok_or(ProxyError::MissingQuery)?;
        let service = find_service(&params.service).ok_or(ProxyError::InvalidService)?;
        let slot = service.credential_slot(&params.kind)?;

        let key = credentials
            .get(slot)
            .ok_or_else(|| ProxyError::MissingCredential {
                service: params.service.clone(),
                kind: params.kind.clone(),
                has_search_key: credentials.has(CredentialSlot::Search),
                has_lookup_key: credentials.has(CredentialSlot::Lookup),
            })?;

        let upstream_request = build_upstream_url(
            &self.config.upstream.base_url,
            service,
            &params.kind,
            query,
            key,
        )?;
        info!(slot = slot.as_str(), url = %upstream_request.redacted(), "Making API call");

        let reply = self.upstream.fetch(&upstream_request).await?;

        if !reply.is_success() {
            warn!(status = reply.status, details = %reply.body, "{}", service.error_label);
            return Err(ProxyError::Upstream {
                status: reply.status,
                label: service.error_label,
                details: reply.body,
            });
        }

        let items = reply
            .body
            .get("items")
            .and_then(Value::as_array)
            .map_or(0, |items| items.len() as u64);
        info!(items, "{} success", service.display_name);

        Ok(reply.body)
    }

    fn extract_params(&self, request: &InboundRequest) -> Result<SearchParams> {
        let default_service = &self.config.upstream.default_service;

        if request.is_method("GET") {
            Ok(SearchParams::from_query_string(
                request.query_string.as_deref(),
                default_service,
            ))
        } else {
            SearchParams::from_json_body(&request.body, default_service)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: String,
    pub credentials: CredentialPresence,
}

/// Whether each slot is configured. Never the values.
#[derive(Debug, Serialize)]
pub struct CredentialPresence {
    pub search: bool,
    pub lookup: bool,
}

pub fn health_report(config: &Config) -> ApiResponse<HealthReport> {
    ApiResponse::success(HealthReport {
        status: "ok",
        service: config.upstream.default_service.clone(),
        credentials: CredentialPresence {
            search: config.credentials.has(CredentialSlot::Search),
            lookup: config.credentials.has(CredentialSlot::Lookup),
        },
    })
}
