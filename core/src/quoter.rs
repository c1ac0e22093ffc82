//! Dispatching client: build, execute through a `Transport`, parse.
//!
//! # Design
//! `Quoter` owns a `QuoterClient` and a transport and never mutates either
//! after construction, so `&Quoter` can be shared across threads. Every
//! method performs exactly one round trip; local validation failures return
//! before the transport is touched.

use std::ops::RangeInclusive;

use tracing::{debug, warn};

use crate::client::QuoterClient;
use crate::config::QuoterConfig;
use crate::error::QuoterError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{Attachment, NewQuote, Quote, SearchQuery};

/// Quote service client over a pluggable transport.
///
/// Every `repo` argument falls back to the configured default when `None`.
pub struct Quoter<T: Transport> {
    client: QuoterClient,
    transport: T,
}

#[cfg(feature = "ureq")]
impl Quoter<crate::transport::UreqTransport> {
    /// Client over a default blocking `ureq` agent.
    pub fn connect(config: &QuoterConfig) -> Self {
        Self::new(config, crate::transport::UreqTransport::new())
    }
}

impl<T: Transport> Quoter<T> {
    pub fn new(config: &QuoterConfig, transport: T) -> Self {
        Self {
            client: QuoterClient::new(config),
            transport,
        }
    }

    /// The request/response half, for hosts that want to do their own I/O.
    pub fn client(&self) -> &QuoterClient {
        &self.client
    }

    /// Release the transport. Consuming `self` rules out use after close.
    pub fn close(self) -> Result<(), QuoterError> {
        debug!("closing quoter transport");
        self.transport.close()?;
        Ok(())
    }

    fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, QuoterError> {
        debug!(method = request.method.as_str(), url = %request.url, "quoter request");
        let response = self.transport.execute(&request)?;
        if !response.is_success() {
            warn!(
                method = request.method.as_str(),
                url = %request.url,
                status = response.status,
                "quoter request returned non-success status"
            );
        }
        Ok(response)
    }

    pub fn add(&self, quote: &NewQuote, repo: Option<&str>) -> Result<HttpResponse, QuoterError> {
        let request = self.client.build_add(quote, repo)?;
        self.client.parse_ack(self.dispatch(request)?)
    }

    pub fn attach(&self, id: i64, attachment: &str, repo: Option<&str>) -> Result<HttpResponse, QuoterError> {
        let request = self.client.build_attach(id, attachment, repo)?;
        self.client.parse_ack(self.dispatch(request)?)
    }

    pub fn by_id(&self, id: i64, repo: Option<&str>) -> Result<Option<Quote>, QuoterError> {
        let request = self.client.build_by_id(id, repo)?;
        self.client.parse_by_id(self.dispatch(request)?)
    }

    /// Quotes with `from <= id <= to`.
    pub fn by_range(&self, from: i64, to: i64, repo: Option<&str>) -> Result<Vec<Quote>, QuoterError> {
        let request = self.client.build_by_range(from, to, repo)?;
        self.client.parse_quotes(self.dispatch(request)?)
    }

    pub fn by_range_inclusive(&self, range: RangeInclusive<i64>, repo: Option<&str>) -> Result<Vec<Quote>, QuoterError> {
        let request = self.client.build_by_range_inclusive(range, repo)?;
        self.client.parse_quotes(self.dispatch(request)?)
    }

    /// Up to `count` (default 1) random quotes.
    pub fn random(&self, count: Option<u32>, repo: Option<&str>) -> Result<Vec<Quote>, QuoterError> {
        let request = self.client.build_random(count, repo)?;
        self.client.parse_quotes(self.dispatch(request)?)
    }

    pub fn all(&self, repo: Option<&str>) -> Result<Vec<Quote>, QuoterError> {
        let request = self.client.build_all(repo)?;
        self.client.parse_quotes(self.dispatch(request)?)
    }

    pub fn total(&self, repo: Option<&str>) -> Result<u64, QuoterError> {
        let request = self.client.build_total(repo)?;
        self.client.parse_total(self.dispatch(request)?)
    }

    pub fn edit(
        &self,
        id: i64,
        edited_by: &str,
        new_content: &str,
        repo: Option<&str>,
    ) -> Result<HttpResponse, QuoterError> {
        let request = self.client.build_edit(id, edited_by, new_content, repo)?;
        self.client.parse_ack(self.dispatch(request)?)
    }

    pub fn search(&self, query: &SearchQuery, repo: Option<&str>) -> Result<Vec<Quote>, QuoterError> {
        let request = self.client.build_search(query, repo)?;
        self.client.parse_quotes(self.dispatch(request)?)
    }

    pub fn fix_ids(&self, repo: Option<&str>) -> Result<HttpResponse, QuoterError> {
        let request = self.client.build_fix_ids(repo)?;
        self.client.parse_ack(self.dispatch(request)?)
    }

    pub fn add_repo(&self, name: &str) -> Result<HttpResponse, QuoterError> {
        let request = self.client.build_add_repo(name)?;
        self.client.parse_ack(self.dispatch(request)?)
    }

    /// Upload a blob and return the id the service assigned to it.
    pub fn register_attachment(&self, content_type: &str, data: &[u8]) -> Result<String, QuoterError> {
        let request = self.client.build_register_attachment(content_type, data)?;
        self.client.parse_register_attachment(self.dispatch(request)?)
    }

    pub fn get_attachment(&self, id: &str) -> Result<Option<Attachment>, QuoterError> {
        let request = self.client.build_get_attachment(id)?;
        self.client.parse_get_attachment(self.dispatch(request)?)
    }

    pub fn delete_attachment(&self, id: &str) -> Result<HttpResponse, QuoterError> {
        let request = self.client.build_delete_attachment(id)?;
        self.client.parse_ack(self.dispatch(request)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::error::TransportError;

    /// Replays one canned response and records every request it sees.
    #[derive(Default)]
    struct Recorder {
        status: u16,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
        calls: AtomicUsize,
        seen: Mutex<Vec<HttpRequest>>,
        closed: AtomicUsize,
    }

    impl Recorder {
        fn replying(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                status,
                body: body.as_bytes().to_vec(),
                ..Self::default()
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last(&self) -> HttpRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for Recorder {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request.clone());
            Ok(HttpResponse {
                status: self.status,
                headers: self.headers.clone(),
                body: self.body.clone(),
            })
        }

        fn close(&self) -> Result<(), TransportError> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Unreachable;

    impl Transport for Unreachable {
        fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            Err(TransportError::new("connection refused"))
        }
    }

    fn keyed(transport: Arc<Recorder>) -> Quoter<Arc<Recorder>> {
        Quoter::new(&QuoterConfig::new("http://q").with_access_key("k"), transport)
    }

    fn keyless(transport: Arc<Recorder>) -> Quoter<Arc<Recorder>> {
        Quoter::new(&QuoterConfig::new("http://q"), transport)
    }

    #[test]
    fn mutating_calls_without_key_never_touch_transport() {
        let transport = Recorder::replying(200, "");
        let quoter = keyless(transport.clone());

        let results = [
            quoter.add(&NewQuote::new("bob", "a", "hi"), None).err(),
            quoter.attach(1, "x", None).err(),
            quoter.edit(1, "e", "c", None).err(),
            quoter.fix_ids(None).err(),
            quoter.add_repo("r").err(),
            quoter.register_attachment("image/png", b"x").err(),
            quoter.delete_attachment("x").err(),
        ];
        for err in results {
            assert!(matches!(err, Some(QuoterError::MissingCredentials)));
        }
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn empty_authors_filter_fails_before_dispatch() {
        let transport = Recorder::replying(200, "[]");
        let quoter = keyed(transport.clone());
        let err = quoter
            .search(&SearchQuery::new().authors(Vec::new()), None)
            .unwrap_err();
        assert!(matches!(err, QuoterError::InvalidArgument(_)));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn by_id_absent_only_on_404() {
        let quoter = keyed(Recorder::replying(404, "no such quote"));
        assert!(quoter.by_id(1, None).unwrap().is_none());

        let quoter = keyed(Recorder::replying(500, "kaboom"));
        let err = quoter.by_id(1, None).unwrap_err();
        assert!(matches!(err, QuoterError::RemoteCall { status: 500, .. }));
    }

    #[test]
    fn get_attachment_absent_on_404() {
        let quoter = keyed(Recorder::replying(404, ""));
        assert!(quoter.get_attachment("missing").unwrap().is_none());
    }

    #[test]
    fn total_parses_count() {
        assert_eq!(keyed(Recorder::replying(200, "42")).total(None).unwrap(), 42);
        let err = keyed(Recorder::replying(200, "abc")).total(None).unwrap_err();
        assert!(matches!(err, QuoterError::MalformedResponse(_)));
    }

    #[test]
    fn every_repo_scoped_call_sends_resolver() {
        let transport = Recorder::replying(200, "[]");
        let quoter = Quoter::new(
            &QuoterConfig::new("http://q").with_default_repo("main"),
            transport.clone(),
        );

        quoter.all(None).unwrap();
        assert_eq!(transport.last().query_param("resolver"), Some("main"));

        quoter.by_range(1, 3, Some("side")).unwrap();
        assert_eq!(transport.last().query_param("resolver"), Some("side"));
        assert_eq!(transport.last().url, "http://q/1/3");
    }

    #[test]
    fn add_sends_joined_authors_with_key() {
        let transport = Recorder::replying(201, "");
        let quoter = keyed(transport.clone());
        quoter
            .add(&NewQuote::new("bob", ["a", "b"], "hi"), None)
            .unwrap();
        let sent = transport.last();
        let body: serde_json::Value = serde_json::from_slice(sent.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["authors"], "a;b");
        assert_eq!(sent.header("X-Access-Key"), Some("k"));
    }

    #[test]
    fn transport_failure_propagates() {
        let quoter = Quoter::new(&QuoterConfig::new("http://q"), Unreachable);
        let err = quoter.all(None).unwrap_err();
        assert!(matches!(err, QuoterError::Transport(_)));
    }

    #[test]
    fn close_releases_transport_once() {
        let transport = Recorder::replying(200, "[]");
        let quoter = keyed(transport.clone());
        quoter.close().unwrap();
        assert_eq!(transport.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn quoter_is_shareable_across_threads() {
        let transport = Recorder::replying(200, "[]");
        let quoter = Arc::new(keyed(transport.clone()));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let quoter = Arc::clone(&quoter);
                std::thread::spawn(move || quoter.all(None).unwrap().len())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 0);
        }
        assert_eq!(transport.calls(), 4);
    }
}
