//! HTTP transport.
//!
//! Both remote collaborators (the model endpoint and the diagram renderer) are
//! reached through [`Transport`]. The production implementation wraps a
//! blocking `reqwest` client; tests substitute a recording mock.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use crate::error::{RcaError, RcaResult};

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, lossy.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Blocking POST requests.
///
/// Implementations return `Ok` for any HTTP status; only transport failures
/// (DNS, connect, timeout, body read) are errors.
pub trait Transport: Send + Sync {
    /// POST a JSON body with a bearer token.
    fn post_json(&self, url: &str, bearer: &str, body: &serde_json::Value) -> RcaResult<HttpReply>;

    /// POST a `text/plain` body.
    fn post_text(&self, url: &str, body: &str) -> RcaResult<HttpReply>;
}

/// [`Transport`] backed by `reqwest::blocking`.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// `timeout` of `None` keeps reqwest's default.
    pub fn new(timeout: Option<Duration>) -> RcaResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| RcaError::external("reqwest", e))?;
        Ok(Self { client })
    }

    fn finish(
        &self,
        url: &str,
        response: reqwest::Result<reqwest::blocking::Response>,
    ) -> RcaResult<HttpReply> {
        let response =
            response.map_err(|e| RcaError::network("POST", Some(url.to_string()), e))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| RcaError::network("read response body", Some(url.to_string()), e))?;
        Ok(HttpReply::new(status, body.to_vec()))
    }
}

impl Transport for ReqwestTransport {
    fn post_json(&self, url: &str, bearer: &str, body: &serde_json::Value) -> RcaResult<HttpReply> {
        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", bearer))
            .json(body)
            .send();
        self.finish(url, response)
    }

    fn post_text(&self, url: &str, body: &str) -> RcaResult<HttpReply> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "text/plain")
            .body(body.to_string())
            .send();
        self.finish(url, response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_helpers() {
        let ok = HttpReply::new(200, "hello");
        assert!(ok.is_success());
        assert_eq!(ok.text(), "hello");

        let err = HttpReply::new(500, vec![0xff, b'x']);
        assert!(!err.is_success());
        assert_eq!(err.text(), "\u{fffd}x");
    }

    #[test]
    fn unreachable_host_is_a_network_error() {
        let transport = ReqwestTransport::new(Some(Duration::from_secs(2))).unwrap();
        // Port 9 on localhost (discard) is closed on any sane test machine.
        let err = transport.post_text("http://127.0.0.1:9/plantuml/png", "@startmindmap\n@endmindmap").unwrap_err();
        assert_eq!(err.category(), "network");
    }
}
