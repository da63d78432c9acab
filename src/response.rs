use serde::Serialize;
use serde_json::Value;

/// Framework-neutral response; converted back by each deployment surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
}

impl ProxyResponse {
    /// Empty body with the CORS headers, for preflight.
    pub fn empty(status: u16, allow_methods: &str) -> Self {
        Self {
            status,
            headers: cors_headers(allow_methods),
            body: String::new(),
        }
    }

    pub fn json(status: u16, allow_methods: &str, body: &Value) -> Self {
        let mut headers = cors_headers(allow_methods);
        headers.push(("Content-Type", "application/json".to_string()));
        Self {
            status,
            headers,
            body: body.to_string(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body parsed back as JSON. `Value::Null` for an empty body.
    pub fn json_body(&self) -> serde_json::Result<Value> {
        if self.body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&self.body)
    }
}

/// Sent on every response.
pub fn cors_headers(allow_methods: &str) -> Vec<(&'static str, String)> {
    vec![
        ("Access-Control-Allow-Origin", "*".to_string()),
        ("Access-Control-Allow-Headers", "Content-Type".to_string()),
        ("Access-Control-Allow-Methods", allow_methods.to_string()),
    ]
}

/// Envelope used by the health endpoints.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}
