//! Request pipeline shared by every endpoint.
//!
//! # Design
//! `build_request` is pure: it joins the endpoint onto the base address,
//! merges headers and serializes the body. `interpret_response` is pure as
//! well: it turns an `HttpResponse` into either parsed JSON or a normalized
//! `ApiError`. `request` just runs one between the other through the
//! configured `Transport`. The pipeline never retries.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ApiError, INVALID_JSON_MESSAGE, UNEXPECTED_SHAPE_MESSAGE};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;

const CONTENT_TYPE: &str = "Content-Type";
const APPLICATION_JSON: &str = "application/json";

/// Builds, sends and interprets JSON requests against one base address.
#[derive(Debug, Clone)]
pub struct RequestPipeline<T> {
    base_url: String,
    transport: T,
}

impl<T> RequestPipeline<T> {
    pub fn new(base_url: &str, transport: T) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Describe a request without sending it.
    ///
    /// `Content-Type: application/json` is always present; an entry in
    /// `extra_headers` with the same name (any case) replaces it.
    pub fn build_request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&Value>,
        extra_headers: &[(&str, &str)],
    ) -> HttpRequest {
        let mut headers = vec![(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())];
        for (name, value) in extra_headers {
            match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
                Some(existing) => *existing = (name.to_string(), value.to_string()),
                None => headers.push((name.to_string(), value.to_string())),
            }
        }

        HttpRequest {
            method,
            url: format!("{}{endpoint}", self.base_url),
            headers,
            body: body.map(Value::to_string),
        }
    }
}

impl<T: Transport> RequestPipeline<T> {
    /// Send one request and return the parsed JSON body.
    pub async fn request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&Value>,
        extra_headers: &[(&str, &str)],
    ) -> Result<Value, ApiError> {
        let request = self.build_request(method, endpoint, body, extra_headers);
        debug!(%method, url = %request.url, "sending request");

        let response = match self.transport.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(%method, endpoint, error = %e, "request failed before a response arrived");
                return Err(e.into());
            }
        };

        interpret_response(&response).inspect_err(|e| {
            warn!(%method, endpoint, status = response.status, error = %e, "request failed");
        })
    }

    /// Send one request and decode the JSON body into `R`.
    pub async fn request_as<R: DeserializeOwned>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<R, ApiError> {
        let value = self.request(method, endpoint, body, &[]).await?;
        decode(value)
    }
}

/// Turn a response into its parsed JSON body or a normalized error.
///
/// An empty success body parses as `null`. A success body that is not JSON
/// is a backend failure with a generic message.
pub fn interpret_response(response: &HttpResponse) -> Result<Value, ApiError> {
    if !response.is_success() {
        return Err(normalize_failure(response));
    }
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&response.body).map_err(|e| {
        debug!(status = response.status, error = %e, "success body is not JSON");
        ApiError::Backend {
            status: response.status,
            message: INVALID_JSON_MESSAGE.to_string(),
        }
    })
}

/// Two-step decode of a failed response into a single message.
///
/// 1. Body parses as JSON: use its `error` string when present and
///    non-empty, otherwise a generic status message.
/// 2. Body does not parse: use the status's reason phrase.
fn normalize_failure(response: &HttpResponse) -> ApiError {
    let generic = || format!("HTTP error! status: {}", response.status);

    let message = match serde_json::from_str::<Value>(&response.body) {
        Ok(body) => match body.get("error").and_then(Value::as_str) {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => generic(),
        },
        Err(_) => response
            .reason_phrase()
            .map(str::to_string)
            .unwrap_or_else(generic),
    };

    ApiError::Backend {
        status: response.status,
        message,
    }
}

pub(crate) fn decode<R: DeserializeOwned>(value: Value) -> Result<R, ApiError> {
    serde_json::from_value(value).map_err(|e| {
        debug!(error = %e, "response does not match the expected shape");
        ApiError::Decode {
            message: UNEXPECTED_SHAPE_MESSAGE.to_string(),
        }
    })
}
