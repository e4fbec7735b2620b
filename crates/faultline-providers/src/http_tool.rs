// crates/faultline-providers/src/http_tool.rs
// ============================================================================
// Module: HTTP Probe Tool
// Description: Tool handler for bounded HTTP endpoint probes.
// Purpose: Provide status and JSON-body diagnostics with strict limits.
// Dependencies: faultline-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! The HTTP tool issues bounded GET requests against diagnostic endpoints
//! (health checks, metrics APIs) and returns the status plus a parsed JSON
//! body when one fits the size limit. It enforces scheme restrictions, host
//! allowlists, redirects disabled, and size limits so a probe cannot be
//! redirected into an internal surface or used to exfiltrate at volume.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::io::Read;
use std::time::Duration;

use faultline_core::ToolDescriptor;
use faultline_core::ToolExecutionError;
use faultline_core::ToolName;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use crate::registry::ToolHandler;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the HTTP probe tool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpToolConfig {
    /// Allow cleartext HTTP (disabled by default).
    pub allow_http: bool,
    /// Upper bound on any request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
    /// Optional host allowlist.
    pub allowed_hosts: Option<BTreeSet<String>>,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for HttpToolConfig {
    fn default() -> Self {
        Self {
            allow_http: false,
            timeout_ms: 5_000,
            max_response_bytes: 1024 * 1024,
            allowed_hosts: None,
            user_agent: "faultline/0.1".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Tool Implementation
// ============================================================================

/// Tool handler for HTTP endpoint probes.
pub struct HttpTool {
    /// Tool configuration, including limits and policy.
    config: HttpToolConfig,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl HttpTool {
    /// Creates a new HTTP tool with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ToolExecutionError`] when the HTTP client cannot be created.
    pub fn new(config: HttpToolConfig) -> Result<Self, ToolExecutionError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|_| ToolExecutionError::Failed("http client build failed".to_string()))?;
        Ok(Self {
            config,
            client,
        })
    }

    /// Validates a probe URL against scheme and host policy.
    fn validate_url(&self, url: &Url) -> Result<(), ToolExecutionError> {
        match url.scheme() {
            "https" => {}
            "http" if self.config.allow_http => {}
            scheme => {
                return Err(ToolExecutionError::Blocked(format!(
                    "scheme not allowed: {scheme}"
                )));
            }
        }
        if let Some(allowed) = &self.config.allowed_hosts {
            let host = url.host_str().unwrap_or_default();
            if !allowed.contains(host) {
                return Err(ToolExecutionError::Blocked(format!("host not allowed: {host}")));
            }
        }
        Ok(())
    }
}

impl ToolHandler for HttpTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: ToolName::from("http-probe"),
            description: "GET a diagnostic endpoint and return status plus JSON body".to_string(),
            parameter_schema: json!({
                "type": "object",
                "properties": {
                    "url": { "type": "string" }
                },
                "required": ["url"]
            }),
            mutating: false,
        }
    }

    fn call(&self, args: &Value, timeout_ms: u64) -> Result<Value, ToolExecutionError> {
        let raw = args
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolExecutionError::Failed("missing url argument".to_string()))?;
        let url = Url::parse(raw)
            .map_err(|err| ToolExecutionError::Failed(format!("invalid url: {err}")))?;
        self.validate_url(&url)?;

        // The caller's budget tightens the configured bound, never widens it.
        let timeout = Duration::from_millis(timeout_ms.min(self.config.timeout_ms));
        let response = self.client.get(url).timeout(timeout).send().map_err(|err| {
            if err.is_timeout() {
                ToolExecutionError::Timeout(format!("http probe timed out: {raw}"))
            } else {
                ToolExecutionError::Failed(format!("http probe failed: {err}"))
            }
        })?;
        let status = response.status().as_u16();

        let mut body = Vec::new();
        let mut limited = response.take(self.config.max_response_bytes as u64 + 1);
        limited
            .read_to_end(&mut body)
            .map_err(|err| ToolExecutionError::Failed(format!("http body read failed: {err}")))?;
        if body.len() > self.config.max_response_bytes {
            return Err(ToolExecutionError::Failed("http response exceeds size limit".to_string()));
        }

        let parsed = serde_json::from_slice::<Value>(&body).ok();
        Ok(json!({
            "status": status,
            "body": parsed,
        }))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    #[test]
    fn rejects_cleartext_by_default() {
        let tool = HttpTool::new(HttpToolConfig::default()).unwrap();
        let err = tool.call(&json!({"url": "http://internal/health"}), 1_000).unwrap_err();
        assert!(matches!(err, ToolExecutionError::Blocked(_)));
    }

    #[test]
    fn rejects_host_outside_allowlist() {
        let mut allowed = BTreeSet::new();
        allowed.insert("observability.example.com".to_string());
        let tool = HttpTool::new(HttpToolConfig {
            allowed_hosts: Some(allowed),
            ..HttpToolConfig::default()
        })
        .unwrap();
        let err = tool.call(&json!({"url": "https://internal/health"}), 1_000).unwrap_err();
        assert!(matches!(err, ToolExecutionError::Blocked(_)));
    }

    #[test]
    fn rejects_missing_url() {
        let tool = HttpTool::new(HttpToolConfig::default()).unwrap();
        assert!(tool.call(&json!({}), 1_000).is_err());
    }
}
