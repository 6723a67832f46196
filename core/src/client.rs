//! Stateless HTTP request builder and response parser for the mite API.
//!
//! # Design
//! `MiteClient` holds the base url, the api key and a user agent, and carries
//! no mutable state between calls. Every operation is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that consumes
//! an `HttpResponse`. The caller executes the HTTP round-trip in between.
//!
//! Parameters always pass through `params::clean` before encoding. GET puts
//! them in the query string, POST sends them as a JSON body, PUT and DELETE
//! send them form-encoded.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::envelope::declassify;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::params::{clean, encode_form, Params};
use crate::resource::{
    Archivable, Resource, Writable, ACCOUNT_ENVELOPE, MYSELF_ENVELOPE, TRACKER_ENVELOPE,
};
use crate::types::{Account, Tracker, User};

pub const API_KEY_HEADER: &str = "x-miteapikey";
pub const DEFAULT_USER_AGENT: &str = concat!("mite-core/", env!("CARGO_PKG_VERSION"));

/// Synchronous, stateless client for the mite API.
#[derive(Clone)]
pub struct MiteClient {
    base_url: String,
    api_key: String,
    user_agent: String,
}

impl std::fmt::Debug for MiteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiteClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl MiteClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Client for the hosted account `https://<realm>.mite.yo.lk`.
    pub fn from_realm(realm: &str, api_key: &str) -> Self {
        Self::new(&format!("https://{realm}.mite.yo.lk"), api_key)
    }

    /// Read `MITE_API_KEY` plus `MITE_BASE_URL` or, failing that, `MITE_REALM`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let api_key = lookup("MITE_API_KEY").ok_or(ApiError::MissingConfig("MITE_API_KEY"))?;
        if let Some(base_url) = lookup("MITE_BASE_URL") {
            return Ok(Self::new(&base_url, &api_key));
        }
        let realm = lookup("MITE_REALM").ok_or(ApiError::MissingConfig("MITE_REALM"))?;
        Ok(Self::from_realm(&realm, &api_key))
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![
            (API_KEY_HEADER.to_string(), self.api_key.clone()),
            ("user-agent".to_string(), self.user_agent.clone()),
        ]
    }

    fn request(&self, method: HttpMethod, url: String, body: Option<String>) -> HttpRequest {
        debug!(%method, %url, has_body = body.is_some(), "built request");
        let mut headers = self.headers();
        if method == HttpMethod::Post {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        HttpRequest {
            method,
            url,
            headers,
            body,
        }
    }


    /// GET `<base>/<path>.json`, with the cleaned params as query string.
    pub fn build_get(&self, path: &str, params: &Params) -> HttpRequest {
        let query = encode_form(&clean(params));
        let mut url = self.url(path);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        self.request(HttpMethod::Get, url, None)
    }

    /// POST `<base>/<path>.json` with the cleaned params as a JSON body.
    pub fn build_post(&self, path: &str, params: &Params) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(&clean(params))
            .map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(self.request(HttpMethod::Post, self.url(path), Some(body)))
    }

    /// PUT `<base>/<path>.json` with the cleaned params form-encoded.
    pub fn build_put(&self, path: &str, params: &Params) -> HttpRequest {
        self.request(HttpMethod::Put, self.url(path), form_body(params))
    }

    /// DELETE `<base>/<path>.json` with the cleaned params form-encoded.
    pub fn build_delete(&self, path: &str, params: &Params) -> HttpRequest {
        self.request(HttpMethod::Delete, self.url(path), form_body(params))
    }

    /// Decode a 2xx body as JSON. An empty body decodes to `null`.
    pub fn parse_json(&self, response: HttpResponse) -> Result<Value, ApiError> {
        check_status(&response)?;
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Check the status of a response whose body carries nothing of interest.
    pub fn parse_empty(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    fn parse_enveloped<T: DeserializeOwned>(
        &self,
        envelope: &str,
        response: HttpResponse,
    ) -> Result<T, ApiError> {
        let unwrap = declassify(envelope, |resp: HttpResponse| self.parse_json(resp));
        serde_json::from_value(unwrap(response)?)
            .map_err(|e| ApiError::Deserialization(e.to_string()))
    }


    pub fn build_list<R: Resource>(&self, filter: &Params) -> HttpRequest {
        self.build_get(R::PATH, filter)
    }

    pub fn build_list_archived<R: Archivable>(&self, filter: &Params) -> HttpRequest {
        self.build_get(&format!("{}/archived", R::PATH), filter)
    }

    pub fn build_show<R: Resource>(&self, id: u64) -> HttpRequest {
        self.build_get(&format!("{}/{id}", R::PATH), &Params::new())
    }

    /// POST `{ENVELOPE: attrs}` to the collection.
    pub fn build_create<R: Writable>(&self, attrs: &Params) -> Result<HttpRequest, ApiError> {
        self.build_post(R::PATH, &enveloped::<R>(attrs))
    }

    /// PUT `ENVELOPE[field]=value` pairs to the record.
    pub fn build_update<R: Writable>(&self, id: u64, attrs: &Params) -> HttpRequest {
        self.build_put(&format!("{}/{id}", R::PATH), &enveloped::<R>(attrs))
    }

    pub fn build_destroy<R: Writable>(&self, id: u64) -> HttpRequest {
        self.build_delete(&format!("{}/{id}", R::PATH), &Params::new())
    }

    /// Parse a list or archived-list response.
    pub fn parse_list<R: Resource>(&self, response: HttpResponse) -> Result<Vec<R>, ApiError> {
        self.parse_enveloped(R::ENVELOPE, response)
    }

    pub fn parse_show<R: Resource>(&self, response: HttpResponse) -> Result<R, ApiError> {
        self.parse_enveloped(R::ENVELOPE, response)
    }

    pub fn parse_create<R: Writable>(&self, response: HttpResponse) -> Result<R, ApiError> {
        self.parse_enveloped(R::ENVELOPE, response)
    }


    pub fn build_account(&self) -> HttpRequest {
        self.build_get("account", &Params::new())
    }

    pub fn parse_account(&self, response: HttpResponse) -> Result<Account, ApiError> {
        self.parse_enveloped(ACCOUNT_ENVELOPE, response)
    }

    /// The user the api key belongs to.
    pub fn build_myself(&self) -> HttpRequest {
        self.build_get("myself", &Params::new())
    }

    pub fn parse_myself(&self, response: HttpResponse) -> Result<User, ApiError> {
        self.parse_enveloped(MYSELF_ENVELOPE, response)
    }

    pub fn build_tracker(&self) -> HttpRequest {
        self.build_get("tracker", &Params::new())
    }

    pub fn build_start_tracker(&self, time_entry_id: u64) -> HttpRequest {
        self.build_put(&format!("tracker/{time_entry_id}"), &Params::new())
    }

    pub fn build_stop_tracker(&self, time_entry_id: u64) -> HttpRequest {
        self.build_delete(&format!("tracker/{time_entry_id}"), &Params::new())
    }

    /// Parse the response of any tracker request.
    pub fn parse_tracker(&self, response: HttpResponse) -> Result<Tracker, ApiError> {
        self.parse_enveloped(TRACKER_ENVELOPE, response)
    }
}

fn form_body(params: &Params) -> Option<String> {
    let body = encode_form(&clean(params));
    (!body.is_empty()).then_some(body)
}

fn enveloped<R: Resource>(attrs: &Params) -> Params {
    let mut outer = Params::new();
    outer.insert(R::ENVELOPE.to_string(), Value::Object(clean(attrs)));
    outer
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    match response.status {
        401 => Err(ApiError::Unauthorized {
            body: response.body.clone(),
        }),
        404 => Err(ApiError::NotFound {
            body: response.body.clone(),
        }),
        status => Err(ApiError::Http {
            status,
            body: response.body.clone(),
        }),
    }
}
