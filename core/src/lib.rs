//! Synchronous API client core for the quoter service.
//!
//! # Overview
//! Turns typed quote operations into `HttpRequest` values and `HttpResponse`
//! values back into typed results. Two layers are exposed:
//! - `QuoterClient`: `build_*` / `parse_*` pairs with no I/O (host-does-IO).
//! - `Quoter<T: Transport>`: one method per remote operation that builds,
//!   dispatches through a pluggable transport, and parses.
//!
//! # Design
//! - Configuration (base URL, access key, default repo) is fixed at
//!   construction; clients carry no other state.
//! - Parameters go through `RequestBuilder`: query string for GET/HEAD, JSON
//!   object body for everything else, overrides applied last.
//! - Mutating operations require an access key and fail locally with
//!   `QuoterError::MissingCredentials` when it is absent.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod quoter;
pub mod request;
pub mod transport;
pub mod types;

pub use client::QuoterClient;
pub use config::QuoterConfig;
pub use error::{QuoterError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use quoter::Quoter;
pub use request::{Params, RequestBuilder, RequestOverrides};
pub use transport::Transport;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{Attachment, Authors, DisplayType, NewQuote, Quote, SearchQuery};
