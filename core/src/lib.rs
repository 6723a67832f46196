//! Synchronous API client core for the mite time-tracking service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). The caller executes the
//! actual HTTP round-trip with whatever client it prefers.
//!
//! # Design
//! - `MiteClient` is stateless; it holds the base url, api key and user agent.
//! - Request parameters are a `serde_json::Map`; `params::clean` drops `null`
//!   and `""` entries before any encoding.
//! - mite wraps entities in single-key envelopes (`{"project": {...}}`);
//!   `envelope::declassify` wraps a parse function and strips that key.
//! - `Resource` ties each DTO to its collection path and envelope key, and the
//!   `Archivable` / `Writable` markers gate which builders compile for it.

pub mod client;
pub mod envelope;
pub mod error;
pub mod http;
pub mod params;
pub mod resource;
pub mod types;

pub use client::MiteClient;
pub use envelope::{declassify, unwrap_envelope};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use params::{clean, encode_form, to_params, Params};
pub use resource::{Archivable, Resource, Writable};
pub use types::{Account, Customer, Project, Service, TimeEntry, Tracker, TrackedEntry, User};
