//! Remote API calls
//!
//! Every outcome, including unknown APIs, invalid methods and transport
//! failures, comes back as an `ApiResponse`; nothing here returns an error to
//! the caller.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use super::registry::{join_url, ApiConfig, ApiRegistry};
use super::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, RequestBody, TransportError};
use crate::parser::format_template;

/* ===================== Response ===================== */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub status_code: u16,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>, data: Option<Value>, status_code: u16) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            status_code,
        }
    }

    pub fn failure(message: impl Into<String>, status_code: u16) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            status_code,
        }
    }

    /// Human-readable result for message boxes and display areas
    pub fn display_text(&self) -> String {
        if !self.success {
            return format!("Error: {}", self.message);
        }
        match &self.data {
            Some(Value::String(text)) => text.clone(),
            Some(data) => serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string()),
            None => self.message.clone(),
        }
    }

    /// Value written to a `-> target`
    pub fn target_value(&self) -> Value {
        if self.success {
            self.data
                .clone()
                .unwrap_or_else(|| Value::String(self.message.clone()))
        } else {
            Value::String(format!("Error: {}", self.message))
        }
    }
}

/// One call against a named API
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiRequest {
    pub method: String,
    pub path: String,
    /// Body with `{name}` placeholders
    pub body_template: Option<String>,
    pub context: HashMap<String, String>,
}

impl ApiRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn body(mut self, template: impl Into<String>) -> Self {
        self.body_template = Some(template.into());
        self
    }

    pub fn context(mut self, context: HashMap<String, String>) -> Self {
        self.context = context;
        self
    }
}

/* ===================== Client ===================== */

pub struct ApiClient {
    registry: Arc<ApiRegistry>,
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
    connect_timeout: Duration,
}

impl ApiClient {
    pub fn new(
        registry: Arc<ApiRegistry>,
        transport: Arc<dyn HttpTransport>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            transport,
            timeout,
            connect_timeout,
        }
    }

    pub fn registry(&self) -> &Arc<ApiRegistry> {
        &self.registry
    }

    pub async fn call(&self, name: &str, request: &ApiRequest) -> ApiResponse {
        let method = match self.validate(name, request) {
            Ok(method) => method,
            Err(response) => return response,
        };
        let Some(config) = self.registry.get_api(name) else {
            return not_found(name);
        };

        let http = self.build_request(&config, method, request);
        let result = self.transport.send(http).await;
        interpret_response(name, method, &request.path, result)
    }

    /// Try the registered config, then `fallback` if the transport failed
    ///
    /// HTTP error statuses are final; only connection-level failures retry.
    /// The registry is never modified.
    pub async fn call_with_fallback(
        &self,
        name: &str,
        request: &ApiRequest,
        fallback: &ApiConfig,
    ) -> ApiResponse {
        let method = match self.validate(name, request) {
            Ok(method) => method,
            Err(response) => return response,
        };
        let Some(config) = self.registry.get_api(name) else {
            return not_found(name);
        };

        let result = match self.transport.send(self.build_request(&config, method, request)).await {
            Err(err) => {
                warn!(api = name, error = %err, fallback = %fallback.url, "primary failed, trying fallback");
                let mut fallback = fallback.clone();
                fallback.url = super::registry::ensure_url_scheme(&fallback.url);
                self.transport
                    .send(self.build_request(&fallback, method, request))
                    .await
            }
            ok => ok,
        };
        interpret_response(name, method, &request.path, result)
    }

    /// GET the base URL with the connection timeout; only 200 counts as success
    pub async fn test_connection(&self, name: &str) -> ApiResponse {
        let Some(config) = self.registry.get_api(name) else {
            return not_found(name);
        };

        let request = HttpRequest {
            method: HttpMethod::Get,
            url: config.url.clone(),
            headers: BTreeMap::new(),
            query: Vec::new(),
            body: None,
            timeout: self.connect_timeout,
        };

        match self.transport.send(request).await {
            Ok(response) => {
                let success = response.status == 200;
                let data = json!({
                    "status_code": response.status,
                    "response_time": response.elapsed.as_secs_f64(),
                });
                info!(api = name, status = response.status, success, "connection test finished");
                if success {
                    ApiResponse::ok("Connection successful", Some(data), response.status)
                } else {
                    ApiResponse {
                        data: Some(data),
                        ..ApiResponse::failure(format!("Connection failed: {}", response.status), response.status)
                    }
                }
            }
            Err(err) => {
                error!(api = name, error = %err, "connection test failed");
                ApiResponse::failure(format!("Connection test failed: {err}"), 500)
            }
        }
    }

    fn validate(&self, name: &str, request: &ApiRequest) -> Result<HttpMethod, ApiResponse> {
        HttpMethod::parse(&request.method).ok_or_else(|| {
            error!(api = name, method = %request.method, "invalid HTTP method");
            ApiResponse::failure(format!("invalid method: {}", request.method), 400)
        })
    }

    /// Assemble the transport request for one call
    pub fn build_request(&self, config: &ApiConfig, method: HttpMethod, request: &ApiRequest) -> HttpRequest {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        if let Some(auth) = config.authorization() {
            headers.insert("Authorization".to_string(), auth);
        }

        let mut query = Vec::new();
        let mut body = request
            .body_template
            .as_deref()
            .filter(|template| !template.trim().is_empty())
            .map(|template| render_body(template, &request.context));

        if method.uses_query() {
            match body.take() {
                Some(RequestBody::Json(Value::Object(fields))) => {
                    query = fields
                        .into_iter()
                        .map(|(key, value)| {
                            let value = match value {
                                Value::String(text) => text,
                                other => other.to_string(),
                            };
                            (key, value)
                        })
                        .collect();
                }
                Some(_) => debug!(method = method.as_str(), "non-object body dropped"),
                None => {}
            }
        }

        HttpRequest {
            method,
            url: join_url(&config.url, &request.path),
            headers,
            query,
            body,
            timeout: self.timeout,
        }
    }
}

fn not_found(name: &str) -> ApiResponse {
    error!(api = name, "API not found");
    ApiResponse::failure(format!("API '{name}' not found"), 404)
}

/// Substitute placeholders, then prefer JSON over raw text
pub fn render_body(template: &str, context: &HashMap<String, String>) -> RequestBody {
    let rendered = format_template(template, context);
    match serde_json::from_str::<Value>(&rendered) {
        Ok(value) => RequestBody::Json(value),
        Err(_) => RequestBody::Text(rendered),
    }
}

pub fn interpret_response(
    name: &str,
    method: HttpMethod,
    path: &str,
    result: Result<HttpResponse, TransportError>,
) -> ApiResponse {
    match result {
        Ok(response) if response.is_success() => {
            let data = serde_json::from_str::<Value>(&response.body)
                .unwrap_or_else(|_| json!({"response": response.body, "status_code": response.status}));
            info!(api = name, method = method.as_str(), path, status = response.status, "API call succeeded");
            ApiResponse::ok("API call successful", Some(data), response.status)
        }
        Ok(response) => {
            error!(api = name, method = method.as_str(), path, status = response.status, "API call returned an error status");
            let detail: String = response.body.chars().take(200).collect();
            ApiResponse {
                data: serde_json::from_str(&response.body).ok(),
                ..ApiResponse::failure(format!("HTTP {}: {}", response.status, detail), response.status)
            }
        }
        Err(err) => {
            error!(api = name, method = method.as_str(), path, error = %err, "API request failed");
            ApiResponse::failure(format!("API request failed: {err}"), 500)
        }
    }
}
