//! Resilient client for the external parameter service
//!
//! Each declared endpoint pairs an HTTP method and a path template with its
//! own [`CircuitBreaker`] — breakers are never shared between endpoints.
//! `execute` routes every call through the endpoint's breaker and classifies
//! the outcome: transport failures and 5xx responses count against the
//! breaker, other non-success responses are returned as client errors without
//! advancing it.

use crate::config::ParameterServiceConfig;
use crate::params::breaker::CircuitBreaker;
use crate::params::error::CallError;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Path template for parameter value lookup; `%s` slots are filled
/// positionally.
const PARAM_VALUE_PATH: &str = "/v1/console/parameters/value/attr/%s";

/// Immutable pairing of method, path template, and breaker.
pub struct Endpoint {
    method: Method,
    path: String,
    breaker: CircuitBreaker,
}

impl Endpoint {
    pub fn new(
        method: &str,
        path: &str,
        failure_threshold: u32,
        open_cooldown: Duration,
    ) -> Result<Self, CallError> {
        Ok(Self {
            method: parse_method(method)?,
            path: path.to_string(),
            breaker: CircuitBreaker::new(failure_threshold, open_cooldown),
        })
    }

    /// Interpolate positional arguments into the `%s` slots in order. Slots
    /// without a matching argument are left as-is.
    fn render_path(&self, args: &[&str]) -> String {
        let mut path = self.path.clone();
        for arg in args {
            path = path.replacen("%s", arg, 1);
        }
        path
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

fn parse_method(method: &str) -> Result<Method, CallError> {
    match method.to_ascii_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "PATCH" => Ok(Method::PATCH),
        "DELETE" => Ok(Method::DELETE),
        "HEAD" => Ok(Method::HEAD),
        other => Err(CallError::InvalidMethod(other.to_string())),
    }
}

/// A request built for one endpoint, ready for `execute`.
#[derive(Debug)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

/// Response envelope of the parameter service.
#[derive(Debug, Deserialize)]
struct ParamEnvelope {
    data: serde_json::Value,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

pub struct ParamClient {
    http: reqwest::Client,
    base_url: String,
    param_value: Endpoint,
}

impl ParamClient {
    pub fn new(config: &ParameterServiceConfig) -> Result<Self, CallError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| CallError::Connectivity(format!("failed to create HTTP client: {}", e)))?;

        let param_value = Endpoint::new(
            "GET",
            PARAM_VALUE_PATH,
            config.failure_threshold,
            config.open_cooldown(),
        )?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            param_value,
        })
    }

    /// The parameter-value endpoint and its breaker.
    pub fn param_value_endpoint(&self) -> &Endpoint {
        &self.param_value
    }

    /// Build a request for an endpoint: interpolate path arguments, serialize
    /// the body, and merge headers under the `Content-Type: application/json`
    /// default (caller headers are merged in but never replace the default).
    pub fn build_request<T: Serialize>(
        &self,
        endpoint: &Endpoint,
        path_args: &[&str],
        body: Option<&T>,
        extra_headers: HeaderMap,
    ) -> Result<OutboundRequest, CallError> {
        let url = format!("{}{}", self.base_url, endpoint.render_path(path_args));

        let body = match body {
            Some(value) => Some(serde_json::to_string(value)?),
            None => None,
        };

        let mut headers = extra_headers;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(OutboundRequest {
            method: endpoint.method.clone(),
            url,
            headers,
            body,
        })
    }

    /// Execute a request through the endpoint's circuit breaker.
    ///
    /// - breaker open: rejected immediately with a connectivity error, no
    ///   network call is made;
    /// - transport failure: counted AND the breaker is forced open at once —
    ///   total unreachability fails fast instead of waiting out the
    ///   consecutive-failure count;
    /// - status >= 500: counted failure;
    /// - other non-success status: client error, not counted;
    /// - success: resets the consecutive-failure count.
    pub async fn execute(
        &self,
        endpoint: &Endpoint,
        request: OutboundRequest,
    ) -> Result<reqwest::Response, CallError> {
        if !endpoint.breaker.allow() {
            return Err(CallError::Connectivity(format!(
                "circuit open for {} (probing in {:.1}s)",
                endpoint.path,
                endpoint.breaker.remaining_open_secs()
            )));
        }

        let mut builder = self
            .http
            .request(request.method, request.url.as_str())
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                endpoint.breaker.record_failure();
                endpoint.breaker.force_open();
                tracing::warn!(url = %request.url, error = %e, "parameter service unreachable, breaker forced open");
                return Err(CallError::Connectivity(format!(
                    "{} unreachable: {}",
                    request.url, e
                )));
            }
        };

        let status = response.status().as_u16();
        if status >= 500 {
            endpoint.breaker.record_failure();
            return Err(CallError::UpstreamServer { status });
        }
        if status >= 300 {
            return Err(CallError::UpstreamClient { status });
        }

        endpoint.breaker.record_success();
        Ok(response)
    }

    /// Look up one parameter value by attribute name.
    pub async fn parameter_value(&self, name: &str) -> Result<serde_json::Value, CallError> {
        let request =
            self.build_request::<()>(&self.param_value, &[name], None, HeaderMap::new())?;
        let response = self.execute(&self.param_value, request).await?;

        let text = response
            .text()
            .await
            .map_err(|e| CallError::Connectivity(format!("failed to read response body: {}", e)))?;
        let envelope: ParamEnvelope = serde_json::from_str(&text)?;

        if !envelope.errors.is_empty() {
            tracing::warn!(parameter = name, errors = ?envelope.errors, "parameter service reported errors");
        }

        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ParameterServiceConfig {
        ParameterServiceConfig {
            base_url: "http://localhost:9000/".to_string(),
            request_timeout_secs: 2,
            failure_threshold: 3,
            open_cooldown_secs: 30,
        }
    }

    #[test]
    fn test_parse_method_rejects_unknown_verbs() {
        assert!(parse_method("GET").is_ok());
        assert!(parse_method("post").is_ok());
        assert!(matches!(
            parse_method("FETCH"),
            Err(CallError::InvalidMethod(_))
        ));
    }

    #[test]
    fn test_render_path_fills_slots_in_order() {
        let ep = Endpoint::new("GET", "/v1/%s/items/%s", 3, Duration::from_secs(30)).unwrap();
        assert_eq!(ep.render_path(&["a", "b"]), "/v1/a/items/b");
        // Missing arguments leave the slot in place.
        assert_eq!(ep.render_path(&["a"]), "/v1/a/items/%s");
    }

    #[test]
    fn test_build_request_url_and_default_header() {
        let client = ParamClient::new(&test_config()).unwrap();
        let request = client
            .build_request::<()>(client.param_value_endpoint(), &["max_rows"], None, HeaderMap::new())
            .unwrap();

        assert_eq!(
            request.url,
            "http://localhost:9000/v1/console/parameters/value/attr/max_rows"
        );
        assert_eq!(
            request.headers.get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert!(request.body.is_none());
    }

    #[test]
    fn test_build_request_keeps_json_content_type_over_caller_header() {
        let client = ParamClient::new(&test_config()).unwrap();

        let mut extra = HeaderMap::new();
        extra.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        extra.insert("x-request-id", HeaderValue::from_static("abc-123"));

        let request = client
            .build_request(
                client.param_value_endpoint(),
                &["max_rows"],
                Some(&serde_json::json!({"scope": "global"})),
                extra,
            )
            .unwrap();

        assert_eq!(
            request.headers.get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(request.headers.get("x-request-id").unwrap(), "abc-123");
        assert_eq!(request.body.as_deref(), Some(r#"{"scope":"global"}"#));
    }
}
