//! Gist-style remote document client.
//!
//! The remote service stores the dataset as a named file inside a single
//! document: `GET {api_base}/{gist_id}` returns a JSON envelope whose
//! `files` map holds the serialized dataset, and `PATCH {api_base}/{gist_id}`
//! replaces that file's content wholesale. The HTTP library itself sits
//! behind [`HttpClient`] so tests can script responses and embedders can
//! bring their own transport.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::remote::RemoteStore;
use podium_model::Dataset;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// HTTP verb used against the document API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Fetch the document.
    Get,
    /// Replace file content inside the document.
    Patch,
}

/// One HTTP request, fully assembled by [`GistStore`].
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Verb.
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    /// Header name/value pairs.
    pub headers: Vec<(&'static str, String)>,
    /// Request body, for PATCH.
    pub body: Option<String>,
}

/// An HTTP response reduced to what the client needs.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client abstraction.
///
/// Implement this to provide the actual transport. The bundled
/// [`ReqwestClient`] covers normal use; tests implement it with canned
/// responses.
pub trait HttpClient: Send + Sync {
    /// Sends a request; `Err` is a transport-level failure (no response).
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String>;
}

/// The gist envelope: a map of file name to file.
#[derive(Debug, Deserialize)]
struct GistEnvelope {
    files: BTreeMap<String, GistFile>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    content: Option<String>,
}

/// [`RemoteStore`] over a gist-style document API.
pub struct GistStore<C: HttpClient> {
    api_base: String,
    gist_id: String,
    file_name: String,
    token: String,
    client: C,
}

impl<C: HttpClient> GistStore<C> {
    /// Creates a store addressing the document named by `config`.
    pub fn new(config: &SyncConfig, client: C) -> Self {
        Self {
            api_base: config.api_base.clone(),
            gist_id: config.gist_id.clone(),
            file_name: config.data_file_name.clone(),
            token: config.token.clone(),
            client,
        }
    }

    fn document_url(&self) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), self.gist_id)
    }

    fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Authorization", format!("token {}", self.token)),
            ("Accept", "application/vnd.github.v3+json".to_owned()),
        ]
    }

    fn send(&self, request: &HttpRequest) -> SyncResult<HttpResponse> {
        let response = self
            .client
            .send(request)
            .map_err(SyncError::transport_retryable)?;

        if !response.is_success() {
            return Err(SyncError::Remote {
                status: response.status,
                message: truncate(&response.body, 200),
            });
        }
        Ok(response)
    }
}

impl<C: HttpClient> RemoteStore for GistStore<C> {
    fn fetch(&self) -> SyncResult<Dataset> {
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: self.document_url(),
            headers: self.headers(),
            body: None,
        };
        let response = self.send(&request)?;

        let envelope: GistEnvelope = serde_json::from_str(&response.body)?;
        let content = envelope
            .files
            .get(&self.file_name)
            .and_then(|file| file.content.as_deref())
            .ok_or_else(|| SyncError::DocumentMissing {
                file: self.file_name.clone(),
            })?;

        let dataset: Dataset = serde_json::from_str(content)?;
        debug!(version = dataset.version, "fetched remote dataset");
        Ok(dataset)
    }

    fn replace(&self, dataset: &Dataset) -> SyncResult<()> {
        let content = serde_json::to_string_pretty(dataset)?;
        let body = serde_json::json!({
            "files": { &self.file_name: { "content": content } }
        });

        let request = HttpRequest {
            method: HttpMethod::Patch,
            url: self.document_url(),
            headers: self.headers(),
            body: Some(body.to_string()),
        };
        self.send(&request)?;
        debug!(version = dataset.version, "replaced remote dataset");
        Ok(())
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_owned()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// [`HttpClient`] backed by a blocking reqwest client.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Builds a client with a 30 second request timeout.
    pub fn new() -> SyncResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SyncError::transport_fatal(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Patch => self.client.patch(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        if let Some(body) = &request.body {
            builder = builder
                .header("Content-Type", "application/json")
                .body(body.clone());
        }

        let response = builder.send().map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| e.to_string())?;
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;
    use podium_model::Record;

    /// Scripted client: pops one canned response per send, records requests.
    struct ScriptedClient {
        responses: Mutex<Vec<Result<HttpResponse, String>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<HttpResponse, String>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpClient for ScriptedClient {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
            self.requests.lock().push(request.clone());
            let mut responses = self.responses.lock();
            if responses.is_empty() {
                return Err("no scripted response".to_owned());
            }
            responses.remove(0)
        }
    }

    fn config() -> SyncConfig {
        SyncConfig::default().with_token("tok").with_gist_id("g123")
    }

    fn dataset() -> Dataset {
        Dataset::with_speakers(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            vec![Record::new(1, "Ada")],
        )
    }

    fn envelope_with(content: &str) -> String {
        serde_json::json!({
            "files": { "speakers-data.json": { "content": content } }
        })
        .to_string()
    }

    #[test]
    fn fetch_parses_envelope() {
        let d = dataset();
        let body = envelope_with(&serde_json::to_string(&d).unwrap());
        let client = ScriptedClient::new(vec![Ok(HttpResponse { status: 200, body })]);
        let store = GistStore::new(&config(), client);

        assert_eq!(store.fetch().unwrap(), d);

        let requests = store.client.requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Get);
        assert_eq!(requests[0].url, "https://api.github.com/gists/g123");
        assert!(requests[0]
            .headers
            .iter()
            .any(|(name, value)| *name == "Authorization" && value == "token tok"));
    }

    #[test]
    fn fetch_missing_file_is_document_missing() {
        let body = serde_json::json!({ "files": {} }).to_string();
        let client = ScriptedClient::new(vec![Ok(HttpResponse { status: 200, body })]);
        let store = GistStore::new(&config(), client);

        assert!(matches!(
            store.fetch(),
            Err(SyncError::DocumentMissing { .. })
        ));
    }

    #[test]
    fn fetch_propagates_status() {
        let client = ScriptedClient::new(vec![Ok(HttpResponse {
            status: 401,
            body: "bad credentials".to_owned(),
        })]);
        let store = GistStore::new(&config(), client);

        match store.fetch() {
            Err(SyncError::Remote { status, .. }) => assert_eq!(status, 401),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn fetch_garbage_content_is_serialization_error() {
        let body = envelope_with("{{{not a dataset");
        let client = ScriptedClient::new(vec![Ok(HttpResponse { status: 200, body })]);
        let store = GistStore::new(&config(), client);

        let err = store.fetch().unwrap_err();
        assert!(matches!(err, SyncError::Serialization(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn replace_patches_named_file() {
        let client = ScriptedClient::new(vec![Ok(HttpResponse {
            status: 200,
            body: "{}".to_owned(),
        })]);
        let store = GistStore::new(&config(), client);

        store.replace(&dataset()).unwrap();

        let requests = store.client.requests.lock();
        assert_eq!(requests[0].method, HttpMethod::Patch);
        let body: serde_json::Value =
            serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        let content = body["files"]["speakers-data.json"]["content"]
            .as_str()
            .unwrap();
        let roundtrip: Dataset = serde_json::from_str(content).unwrap();
        assert_eq!(roundtrip, dataset());
    }

    #[test]
    fn transport_failure_is_retryable() {
        let client = ScriptedClient::new(vec![Err("connection refused".to_owned())]);
        let store = GistStore::new(&config(), client);

        let err = store.fetch().unwrap_err();
        assert!(err.is_retryable());
    }
}
