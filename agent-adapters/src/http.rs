//! HTTPS client shared by the completion adapter and tool providers.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use hyper::body::{Bytes, to_bytes};
use hyper::client::HttpConnector;
use hyper::header::{ACCEPT, CONTENT_TYPE};
use hyper::{Body, Client, Method, Request, StatusCode, Uri};
use hyper_rustls::HttpsConnector;
use rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore};
use serde::Serialize;
use tokio::time::timeout;
use webpki_roots::TLS_SERVER_ROOTS;

use crate::traits::{AdapterError, AdapterResult};

type HyperClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Raw response returned by [`HttpsClient`].
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    body: Bytes,
}

impl HttpResponse {
    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the numeric status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns the response body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the body decoded lossily as UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Rustls-backed HTTP client with a per-request timeout.
#[derive(Clone)]
pub struct HttpsClient {
    client: HyperClient,
    timeout: Duration,
}

impl fmt::Debug for HttpsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpsClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpsClient {
    /// Builds a client trusting the bundled web PKI roots.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let mut roots = RootCertStore::empty();
        roots.add_trust_anchors(TLS_SERVER_ROOTS.iter().map(|anchor| {
            OwnedTrustAnchor::from_subject_spki_name_constraints(
                anchor.subject,
                anchor.spki,
                anchor.name_constraints,
            )
        }));

        let config = ClientConfig::builder()
            .with_safe_defaults()
            .with_root_certificates(roots)
            .with_no_client_auth();

        let mut http = HttpConnector::new();
        http.enforce_http(false);

        let connector = HttpsConnector::from((http, Arc::new(config)));

        Self {
            client: Client::builder().build::<_, Body>(connector),
            timeout,
        }
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issues a `GET` request.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidRequest`] for malformed URLs and
    /// [`AdapterError::Transport`] for network failures or timeouts.
    pub async fn get(&self, url: &str, headers: &[(&str, &str)]) -> AdapterResult<HttpResponse> {
        self.send(Method::GET, url, headers, Body::empty()).await
    }

    /// Issues a `POST` request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidRequest`] if the URL or body cannot be
    /// encoded and [`AdapterError::Transport`] for network failures or timeouts.
    pub async fn post_json<T>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &T,
    ) -> AdapterResult<HttpResponse>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(body).map_err(|err| {
            AdapterError::invalid_request(format!("failed to encode request body: {err}"))
        })?;
        self.send(Method::POST, url, headers, Body::from(body)).await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        headers: &[(&str, &str)],
        body: Body,
    ) -> AdapterResult<HttpResponse> {
        let uri = url
            .parse::<Uri>()
            .map_err(|err| AdapterError::invalid_request(format!("invalid URL `{url}`: {err}")))?;

        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = builder
            .body(body)
            .map_err(|err| AdapterError::transport(format!("failed to build request: {err}")))?;

        let response = timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| AdapterError::transport(format!("request to {url} timed out")))?
            .map_err(|err| AdapterError::transport(format!("request to {url} failed: {err}")))?;

        let status = response.status();
        let body = to_bytes(response.into_body())
            .await
            .map_err(|err| AdapterError::transport(format!("failed to read response: {err}")))?;

        Ok(HttpResponse { status, body })
    }
}
