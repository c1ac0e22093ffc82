//! Pluggable HTTP engine.
//!
//! # Design
//! `Transport` is the only place I/O happens. It receives a fully built
//! `HttpRequest` and returns whatever the server answered, including 4xx/5xx
//! responses; status interpretation stays in `QuoterClient`. A transport only
//! returns `Err` when no response was obtained at all.
//!
//! Implementations must be `Send + Sync` so one `Quoter` can serve concurrent
//! callers. Connection pooling, if any, belongs to the engine.

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

pub trait Transport: Send + Sync {
    /// Execute one request/response round trip.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Release engine resources. Called once by `Quoter::close`.
    fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }

    fn close(&self) -> Result<(), TransportError> {
        (**self).close()
    }
}

#[cfg(feature = "ureq")]
pub use self::ureq_engine::UreqTransport;

#[cfg(feature = "ureq")]
mod ureq_engine {
    use ureq::{Agent, RequestBuilder};

    use super::Transport;
    use crate::error::TransportError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Blocking transport backed by a shared `ureq::Agent`.
    ///
    /// The agent is configured with `http_status_as_error(false)` so 4xx/5xx
    /// responses come back as data rather than `Err`.
    #[derive(Clone)]
    pub struct UreqTransport {
        agent: Agent,
    }

    impl UreqTransport {
        pub fn new() -> Self {
            let agent = Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();
            Self { agent }
        }

        /// Use a caller-configured agent. It must not treat HTTP status codes
        /// as errors.
        pub fn with_agent(agent: Agent) -> Self {
            Self { agent }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    fn with_parts<B>(mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
        for (name, value) in &request.query {
            builder = builder.query(name.as_str(), value.as_str());
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    impl Transport for UreqTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            let url = request.url.as_str();
            let body = request.body.as_deref();

            let result = match request.method {
                HttpMethod::Get => with_parts(self.agent.get(url), request).call(),
                HttpMethod::Head => with_parts(self.agent.head(url), request).call(),
                HttpMethod::Post => {
                    let builder = with_parts(self.agent.post(url), request);
                    match body {
                        Some(bytes) => builder.send(bytes),
                        None => builder.send_empty(),
                    }
                }
                HttpMethod::Put => {
                    let builder = with_parts(self.agent.put(url), request);
                    match body {
                        Some(bytes) => builder.send(bytes),
                        None => builder.send_empty(),
                    }
                }
                HttpMethod::Delete => match body {
                    Some(bytes) => with_parts(self.agent.delete(url), request)
                        .force_send_body()
                        .send(bytes),
                    None => with_parts(self.agent.delete(url), request).call(),
                },
            };

            let mut response = result.map_err(|e| {
                TransportError::with_source(format!("{} {url}", request.method.as_str()), e)
            })?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect();
            // Attachments can exceed ureq's default 10 MiB read cap.
            let body = response
                .body_mut()
                .with_config()
                .limit(u64::MAX)
                .read_to_vec()
                .map_err(|e| TransportError::with_source(format!("read body of {url}"), e))?;

            Ok(HttpResponse { status, headers, body })
        }
    }
}
