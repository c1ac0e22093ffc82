//! Stateless request builder and response parser for the quoter API.
//!
//! # Design
//! `QuoterClient` holds only immutable configuration. Each operation is split
//! into a `build_*` method that produces an `HttpRequest` and a `parse_*`
//! method that consumes an `HttpResponse`; `Quoter` glues the two together
//! through a `Transport`, but hosts that do their own I/O can drive the pair
//! directly.
//!
//! All local validation (access key, empty author filter) happens in `build_*`, before any request exists.

use std::ops::RangeInclusive;

use serde::de::DeserializeOwned;

use crate::config::QuoterConfig;
use crate::error::QuoterError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::request::{Params, RequestBuilder, RequestOverrides, CONTENT_TYPE};
use crate::types::{Attachment, NewQuote, Quote, SearchQuery};

pub const ACCESS_KEY_HEADER: &str = "X-Access-Key";
pub const ATTACHMENT_TYPE_HEADER: &str = "X-Attachment-Content-Type";
pub const OCTET_STREAM: &str = "application/octet-stream";
pub const RESOLVER_PARAM: &str = "resolver";

/// Synchronous, stateless client for the quoter API.
#[derive(Debug, Clone)]
pub struct QuoterClient {
    requests: RequestBuilder,
    access_key: Option<String>,
    default_repo: String,
}

impl QuoterClient {
    pub fn new(config: &QuoterConfig) -> Self {
        Self {
            requests: RequestBuilder::new(&config.base_url),
            access_key: config.access_key.clone(),
            default_repo: config.default_repo.clone(),
        }
    }

    pub fn default_repo(&self) -> &str {
        &self.default_repo
    }

    pub fn has_access_key(&self) -> bool {
        self.access_key.is_some()
    }

    fn scoped(&self, repo: Option<&str>) -> Params {
        let mut params = Params::new();
        params.set(RESOLVER_PARAM, repo.unwrap_or(self.default_repo.as_str()));
        params
    }

    fn keyed(&self) -> Result<RequestOverrides, QuoterError> {
        let key = self.access_key.as_deref().ok_or(QuoterError::MissingCredentials)?;
        Ok(RequestOverrides::new().header(ACCESS_KEY_HEADER, key))
    }

    fn get(&self, path: &str, params: Params) -> Result<HttpRequest, QuoterError> {
        self.requests
            .build(path, HttpMethod::Get, params, RequestOverrides::new())
    }

    // --- writes ---

    pub fn build_add(&self, quote: &NewQuote, repo: Option<&str>) -> Result<HttpRequest, QuoterError> {
        let overrides = self.keyed()?;
        let mut params = self.scoped(repo);
        params
            .set("adder", quote.adder.as_str())
            .set("authors", quote.authors.joined())
            .set("content", quote.content.as_str())
            .set_opt("dtype", quote.display_type.map(|d| d.as_str()))
            .set_opt("attachments", quote.attachments.as_ref().map(|a| a.join(";")));
        self.requests.build("", HttpMethod::Put, params, overrides)
    }

    pub fn build_attach(&self, id: i64, attachment: &str, repo: Option<&str>) -> Result<HttpRequest, QuoterError> {
        let overrides = self.keyed()?;
        let mut params = self.scoped(repo);
        params.set("id", id).set("attachment", attachment);
        self.requests.build("attach", HttpMethod::Put, params, overrides)
    }

    pub fn build_edit(
        &self,
        id: i64,
        edited_by: &str,
        new_content: &str,
        repo: Option<&str>,
    ) -> Result<HttpRequest, QuoterError> {
        let overrides = self.keyed()?;
        let mut params = self.scoped(repo);
        params
            .set("id", id)
            .set("edited_by", edited_by)
            .set("new_content", new_content);
        self.requests.build("edit", HttpMethod::Post, params, overrides)
    }

    pub fn build_fix_ids(&self, repo: Option<&str>) -> Result<HttpRequest, QuoterError> {
        let overrides = self.keyed()?;
        self.requests
            .build("fix_ids", HttpMethod::Post, self.scoped(repo), overrides)
    }

    pub fn build_add_repo(&self, name: &str) -> Result<HttpRequest, QuoterError> {
        let overrides = self.keyed()?;
        let mut params = Params::new();
        params.set("name", name);
        self.requests.build("repo", HttpMethod::Put, params, overrides)
    }

    // --- reads ---

    pub fn build_by_id(&self, id: i64, repo: Option<&str>) -> Result<HttpRequest, QuoterError> {
        self.get(&id.to_string(), self.scoped(repo))
    }

    pub fn build_by_range(&self, from: i64, to: i64, repo: Option<&str>) -> Result<HttpRequest, QuoterError> {
        self.get(&format!("{from}/{to}"), self.scoped(repo))
    }

    pub fn build_by_range_inclusive(
        &self,
        range: RangeInclusive<i64>,
        repo: Option<&str>,
    ) -> Result<HttpRequest, QuoterError> {
        self.build_by_range(*range.start(), *range.end(), repo)
    }

    /// `count` defaults to 1.
    pub fn build_random(&self, count: Option<u32>, repo: Option<&str>) -> Result<HttpRequest, QuoterError> {
        let count = count.unwrap_or(1);
        self.get(&format!("random/{count}"), self.scoped(repo))
    }

    pub fn build_all(&self, repo: Option<&str>) -> Result<HttpRequest, QuoterError> {
        self.get("all", self.scoped(repo))
    }

    pub fn build_total(&self, repo: Option<&str>) -> Result<HttpRequest, QuoterError> {
        self.get("total", self.scoped(repo))
    }

    pub fn build_search(&self, query: &SearchQuery, repo: Option<&str>) -> Result<HttpRequest, QuoterError> {
        if matches!(&query.authors, Some(authors) if authors.is_empty()) {
            return Err(QuoterError::InvalidArgument(
                "authors filter must not be empty when provided".to_string(),
            ));
        }
        let mut params = self.scoped(repo);
        params
            .set_opt("adder", query.adder.as_deref())
            .set_opt("authors", query.authors.as_ref().map(|a| a.join(";")))
            .set_opt("content", query.content.as_deref());
        self.get("search", params)
    }

    // --- attachments ---

    pub fn build_register_attachment(&self, content_type: &str, data: &[u8]) -> Result<HttpRequest, QuoterError> {
        let overrides = self
            .keyed()?
            .header(CONTENT_TYPE, OCTET_STREAM)
            .header(ATTACHMENT_TYPE_HEADER, content_type)
            .body(data.to_vec());
        self.requests
            .build("attachments", HttpMethod::Put, Params::new(), overrides)
    }

    pub fn build_get_attachment(&self, id: &str) -> Result<HttpRequest, QuoterError> {
        self.get(&attachment_path(id), Params::new())
    }

    pub fn build_delete_attachment(&self, id: &str) -> Result<HttpRequest, QuoterError> {
        let overrides = self.keyed()?;
        self.requests.build(
            &attachment_path(id),
            HttpMethod::Delete,
            Params::new(),
            overrides,
        )
    }

    // --- parsing ---

    /// Success signal for writes; hands the response back to the caller.
    pub fn parse_ack(&self, response: HttpResponse) -> Result<HttpResponse, QuoterError> {
        check_status(&response)?;
        Ok(response)
    }

    /// 404 means the quote does not exist and yields `None`.
    pub fn parse_by_id(&self, response: HttpResponse) -> Result<Option<Quote>, QuoterError> {
        if response.status == 404 {
            return Ok(None);
        }
        check_status(&response)?;
        decode(&response).map(Some)
    }

    /// Shared by `by_range`, `random`, `all` and `search`.
    pub fn parse_quotes(&self, response: HttpResponse) -> Result<Vec<Quote>, QuoterError> {
        check_status(&response)?;
        decode(&response)
    }

    pub fn parse_total(&self, response: HttpResponse) -> Result<u64, QuoterError> {
        check_status(&response)?;
        let text = response.text();
        let trimmed = text.trim();
        let digits = trimmed
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(trimmed);
        digits
            .parse()
            .map_err(|_| QuoterError::MalformedResponse(format!("expected a decimal count, got {trimmed:?}")))
    }

    pub fn parse_register_attachment(&self, response: HttpResponse) -> Result<String, QuoterError> {
        check_status(&response)?;
        let id = response.text().trim().to_string();
        if id.is_empty() {
            return Err(QuoterError::MalformedResponse(
                "attachment upload returned an empty id".to_string(),
            ));
        }
        Ok(id)
    }

    /// 404 means the attachment does not exist and yields `None`.
    pub fn parse_get_attachment(&self, response: HttpResponse) -> Result<Option<Attachment>, QuoterError> {
        if response.status == 404 {
            return Ok(None);
        }
        check_status(&response)?;
        let content_type = response
            .header(ATTACHMENT_TYPE_HEADER)
            .ok_or_else(|| {
                QuoterError::MalformedResponse(format!("expected {ATTACHMENT_TYPE_HEADER} header in attachment response"))
            })?
            .to_string();
        Ok(Some(Attachment {
            content_type,
            data: response.body,
        }))
    }
}

/// Attachment ids are opaque; escape them so `/`, `?` or `#` stay in the segment.
fn attachment_path(id: &str) -> String {
    format!("attachments/{}", urlencoding::encode(id))
}

/// Map non-2xx responses to `RemoteCall` with the raw status and body.
fn check_status(response: &HttpResponse) -> Result<(), QuoterError> {
    if response.is_success() {
        return Ok(());
    }
    Err(QuoterError::RemoteCall {
        status: response.status,
        body: response.text(),
    })
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, QuoterError> {
    serde_json::from_slice(&response.body).map_err(|e| QuoterError::MalformedResponse(e.to_string()))
}
