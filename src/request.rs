use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::{ProxyError, Result};

/// Framework-neutral view of an inbound request. Each deployment surface
/// (warp, vercel) converts its own request type into this.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    pub method: String,
    /// Raw query string without the leading `?`.
    pub query_string: Option<String>,
    pub body: Vec<u8>,
}

impl InboundRequest {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Default::default()
        }
    }

    pub fn with_query(mut self, query_string: impl Into<String>) -> Self {
        self.query_string = Some(query_string.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_method(&self, method: &str) -> bool {
        self.method.eq_ignore_ascii_case(method)
    }
}

/// Parameters of one proxied call, with defaults already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub query: Option<String>,
    pub kind: String,
    pub service: String,
}

pub const DEFAULT_KIND: &str = "search";

impl SearchParams {
    fn new(
        query: Option<String>,
        kind: Option<String>,
        service: Option<String>,
        default_service: &str,
    ) -> Self {
        Self {
            query: query.filter(|q| !q.is_empty()),
            kind: kind
                .filter(|k| !k.is_empty())
                .unwrap_or_else(|| DEFAULT_KIND.to_string()),
            service: service
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| default_service.to_string()),
        }
    }

    /// GET: `q`, `type` and `service` from the query string. The first
    /// occurrence of a repeated key wins.
    pub fn from_query_string(query_string: Option<&str>, default_service: &str) -> Self {
        let mut query = None;
        let mut kind = None;
        let mut service = None;

        for (key, value) in form_urlencoded::parse(query_string.unwrap_or_default().as_bytes()) {
            let slot = match key.as_ref() {
                "q" => &mut query,
                "type" => &mut kind,
                "service" => &mut service,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        Self::new(query, kind, service, default_service)
    }

    /// POST: a JSON object with `query`, `type` and `service`. Anything that
    /// is not an object (arrays included) is an error.
    pub fn from_json_body(body: &[u8], default_service: &str) -> Result<Self> {
        let fields = match serde_json::from_slice::<Value>(body)? {
            Value::Object(fields) => fields,
            other => {
                return Err(ProxyError::Internal(format!(
                    "Request body must be a JSON object, got {}",
                    json_type(&other)
                )))
            }
        };

        Ok(Self::new(
            text_field(&fields, "query")?,
            text_field(&fields, "type")?,
            text_field(&fields, "service")?,
            default_service,
        ))
    }
}

/// Strings as-is, numbers in their JSON spelling; `null` or absent is `None`.
fn text_field(fields: &Map<String, Value>, name: &str) -> Result<Option<String>> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(other) => Err(ProxyError::Internal(format!(
            "Field `{}` must be a string, got {}",
            name,
            json_type(other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
