use std::collections::HashMap;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::HttpError;

/// The slice of an inbound request a controller method sees: matched path
/// parameters and the parsed JSON body.
///
/// Built by the binder for every dispatched request, so controllers never
/// touch axum extractors directly.
#[derive(Debug, Clone, Default)]
pub struct RouteRequest {
    params: HashMap<String, String>,
    body: Option<Value>,
}

impl RouteRequest {
    pub fn new(params: HashMap<String, String>, body: Option<Value>) -> Self {
        Self { params, body }
    }

    /// Add a path parameter (mostly useful in tests).
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Set the JSON body (mostly useful in tests).
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Raw path parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Path parameter parsed into `T`.
    ///
    /// A missing or unparsable parameter is a client error.
    pub fn path_param<T: FromStr>(&self, name: &str) -> Result<T, HttpError> {
        let raw = self
            .param(name)
            .ok_or_else(|| HttpError::BadRequest(format!("missing path parameter '{name}'")))?;
        raw.parse()
            .map_err(|_| HttpError::BadRequest(format!("invalid path parameter '{name}': {raw}")))
    }

    /// Parsed body, if the request carried one.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Deserialize the body into `T`. A missing body is a client error.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        let body = self
            .body
            .as_ref()
            .ok_or_else(|| HttpError::BadRequest("request body is required".into()))?;
        T::deserialize(body).map_err(|e| HttpError::BadRequest(format!("invalid request body: {e}")))
    }

    /// Deserialize the body into `T`, or `T::default()` when there is none.
    pub fn json_or_default<T: DeserializeOwned + Default>(&self) -> Result<T, HttpError> {
        match self.body {
            Some(_) => self.json(),
            None => Ok(T::default()),
        }
    }
}
