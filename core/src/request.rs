use reqwest::{Method, Url};
use serde::Serialize;
use serde_json::Value;

use crate::errors::{ApiError, ApiResult};

/// Description of a single API call, relative to the configured base URL
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    /// Identifier segments appended after `path`, each kept as one segment
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            segments: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Appends an identifier as a single path segment.
    ///
    /// `/` and other reserved characters are percent-encoded instead of
    /// splitting the value.
    pub fn segment(mut self, value: impl Into<String>) -> Self {
        self.segments.push(value.into());
        self
    }

    /// Appends a query parameter. Values are sent as given, only
    /// percent-encoded.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attaches a JSON body
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes `body` and attaches it as the JSON body
    pub fn json_from<T: Serialize>(self, body: &T) -> ApiResult<Self> {
        let value = serde_json::to_value(body).map_err(|e| {
            ApiError::InvalidRequest(format!("Failed to serialize request body: {}", e))
        })?;
        Ok(self.json(value))
    }

    /// Resolves the descriptor against `base_url`.
    ///
    /// The path is appended to whatever path the base URL already has, one
    /// percent-encoded segment per `/`-separated component, followed by the
    /// identifier segments. Empty, `.` and `..` identifiers cannot be carried
    /// as a single segment and are rejected.
    pub fn url(&self, base_url: &str) -> ApiResult<Url> {
        if let Some(bad) = self
            .segments
            .iter()
            .find(|segment| matches!(segment.as_str(), "" | "." | ".."))
        {
            return Err(ApiError::InvalidRequest(format!(
                "Invalid path segment {:?}",
                bad
            )));
        }

        let mut url = Url::parse(base_url).map_err(|e| {
            ApiError::InvalidRequest(format!("Invalid base URL {}: {}", base_url, e))
        })?;

        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ApiError::InvalidRequest(format!("Base URL cannot carry a path: {}", base_url))
            })?;
            segments.pop_if_empty();
            segments.extend(self.path.split('/').filter(|segment| !segment.is_empty()));
            for segment in &self.segments {
                segments.push(segment);
            }
        }

        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }

        Ok(url)
    }
}
