//! Request builder shared by every quoter operation.
//!
//! # Design
//! Operations describe their parameters as a flat `Params` list and hand it to
//! `RequestBuilder::build` together with the method. The method alone decides
//! the encoding: GET/HEAD put every parameter in the query string, everything
//! else sends them as one JSON object. `RequestOverrides` are applied last so
//! callers can attach the access key or swap in a raw binary body.

use serde_json::{Map, Value};

use crate::error::QuoterError;
use crate::http::{HttpMethod, HttpRequest};

pub const CONTENT_TYPE: &str = "content-type";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Ordered name/value parameters for a single request.
///
/// Lists are never joined here; callers pass the `;`-joined string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, Value)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name`, replacing any earlier value for the same name.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
        self
    }

    /// Set `name` only when `value` is present.
    pub fn set_opt<V: Into<Value>>(&mut self, name: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.set(name, value);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn into_query(self) -> Result<Vec<(String, String)>, QuoterError> {
        self.entries
            .into_iter()
            .map(|(name, value)| {
                let text = match value {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Null | Value::Array(_) | Value::Object(_) => {
                        return Err(QuoterError::InvalidParameter { name });
                    }
                };
                Ok((name, text))
            })
            .collect()
    }

    fn into_json_object(self) -> Value {
        Value::Object(self.entries.into_iter().collect::<Map<String, Value>>())
    }
}

/// Headers and body applied after parameter encoding.
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl RequestOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

/// Turns `(path, method, params, overrides)` into an `HttpRequest`.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base_url: String,
}

impl RequestBuilder {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build(
        &self,
        path: &str,
        method: HttpMethod,
        params: Params,
        overrides: RequestOverrides,
    ) -> Result<HttpRequest, QuoterError> {
        let mut request = HttpRequest {
            method,
            url: format!("{}/{}", self.base_url, path.trim_start_matches('/')),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        };

        if method.encodes_query() {
            request.query = params.into_query()?;
        } else {
            let body = serde_json::to_vec(&params.into_json_object())
                .map_err(|e| QuoterError::Serialization(e.to_string()))?;
            request
                .headers
                .push((CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string()));
            request.body = Some(body);
        }

        for (name, value) in overrides.headers {
            match request
                .headers
                .iter_mut()
                .find(|(k, _)| k.eq_ignore_ascii_case(&name))
            {
                Some(existing) => *existing = (name, value),
                None => request.headers.push((name, value)),
            }
        }
        if let Some(body) = overrides.body {
            request.body = Some(body);
        }

        Ok(request)
    }
}
