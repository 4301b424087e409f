//! HTTP transport module
//!
//! This module issues authenticated GET requests against the base URL of a
//! configured instance and hands back the raw body together with the status
//! code. Interpreting the response is left to the catalog client.

use crate::config::{CatalogConfig, InstanceConfig, InstanceId};
use thiserror::Error;

/// Errors raised by the transport layer
///
/// These are network level failures. A non-200 status is not an error here.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or no response was received
    #[error("Request to {url} failed")]
    Request { url: String, source: reqwest::Error },

    /// The response body could not be read
    #[error("Failed to read response body from {url}")]
    Body { url: String, source: reqwest::Error },

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    /// No configuration exists for the requested instance
    #[error("Instance {0} is not configured")]
    UnknownInstance(InstanceId),
}

/// Raw response of a single GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Undecoded response body
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Whether the status is exactly 200
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// A transport able to fetch resources relative to an instance base URL
pub trait Transport {
    /// Issues a GET request for `resource` (path plus optional query)
    fn get(&self, resource: &str) -> Result<TransportResponse, TransportError>;
}

/// Creates transports for configured instances
pub trait TransportFactory {
    /// The transport type handed out by this factory
    type Transport: Transport;

    /// Creates a transport bound to the given instance
    fn connect(&self, instance: InstanceId) -> Result<Self::Transport, TransportError>;
}

/// Blocking HTTP transport for one instance
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
    credentials: Option<(String, Option<String>)>,
}

impl HttpTransport {
    /// Creates a transport from an instance profile
    pub fn new(instance: &InstanceConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::blocking::Client::builder().timeout(instance.timeout());
        if let Some(connect_timeout) = instance.connect_timeout() {
            builder = builder.connect_timeout(connect_timeout);
        }
        let client = builder.build().map_err(TransportError::ClientBuild)?;

        let credentials = instance
            .username
            .as_ref()
            .map(|user| (user.clone(), instance.password.clone()));

        Ok(Self {
            client,
            base_url: instance.url.trim().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Builds the absolute URL of a resource
    fn url(&self, resource: &str) -> String {
        format!("{}{}", self.base_url, resource)
    }
}

impl Transport for HttpTransport {
    fn get(&self, resource: &str) -> Result<TransportResponse, TransportError> {
        let url = self.url(resource);

        let mut request = self.client.get(&url);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, password.as_ref());
        }

        let response = request.send().map_err(|e| TransportError::Request {
            url: url.clone(),
            source: e,
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| TransportError::Body {
                url: url.clone(),
                source: e,
            })?
            .to_vec();

        tracing::debug!(url = %url, status, bytes = body.len(), "catalog request");

        Ok(TransportResponse { status, body })
    }
}

impl TransportFactory for CatalogConfig {
    type Transport = HttpTransport;

    fn connect(&self, instance: InstanceId) -> Result<HttpTransport, TransportError> {
        let profile = self
            .instance(instance)
            .ok_or(TransportError::UnknownInstance(instance))?;
        HttpTransport::new(profile)
    }
}

/// In-memory transports for unit tests
#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// Transport answering from a table of canned responses
    ///
    /// Unknown resources answer with 404. Every requested resource is recorded.
    #[derive(Clone, Default)]
    pub(crate) struct ScriptedTransport {
        responses: Rc<RefCell<HashMap<String, Result<(u16, String), String>>>>,
        pub requests: Rc<RefCell<Vec<String>>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(&self, resource: &str, status: u16, body: &str) -> &Self {
            self.responses
                .borrow_mut()
                .insert(resource.to_string(), Ok((status, body.to_string())));
            self
        }

        pub fn fail(&self, resource: &str) -> &Self {
            self.responses
                .borrow_mut()
                .insert(resource.to_string(), Err(resource.to_string()));
            self
        }

        pub fn requested(&self) -> Vec<String> {
            self.requests.borrow().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn get(&self, resource: &str) -> Result<TransportResponse, TransportError> {
            self.requests.borrow_mut().push(resource.to_string());
            match self.responses.borrow().get(resource) {
                Some(Ok((status, body))) => Ok(TransportResponse {
                    status: *status,
                    body: body.as_bytes().to_vec(),
                }),
                Some(Err(resource)) => Err(network_failure(resource)),
                None => Ok(TransportResponse {
                    status: 404,
                    body: Vec::new(),
                }),
            }
        }
    }

    /// A `Request` error as produced by an unreachable server
    ///
    /// The URL is unparseable, so reqwest fails before touching the network.
    pub(crate) fn network_failure(resource: &str) -> TransportError {
        let url = format!("unreachable:/{}", resource);
        match reqwest::blocking::Client::new().get("http://[unreachable").send() {
            Err(source) => TransportError::Request { url, source },
            Ok(_) => unreachable!("invalid url was accepted"),
        }
    }

    /// Factory handing out one scripted transport per instance
    #[derive(Default)]
    pub(crate) struct ScriptedFactory {
        pub transports: HashMap<InstanceId, ScriptedTransport>,
        pub connects: RefCell<Vec<InstanceId>>,
    }

    impl ScriptedFactory {
        pub fn with(mut self, instance: InstanceId, transport: ScriptedTransport) -> Self {
            self.transports.insert(instance, transport);
            self
        }
    }

    impl TransportFactory for ScriptedFactory {
        type Transport = ScriptedTransport;

        fn connect(&self, instance: InstanceId) -> Result<ScriptedTransport, TransportError> {
            self.connects.borrow_mut().push(instance);
            self.transports
                .get(&instance)
                .cloned()
                .ok_or(TransportError::UnknownInstance(instance))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogClient;
    use std::error::Error;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Serves one canned response per accepted connection, returning the raw requests
    fn serve(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let mut requests = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();

                let mut request: Vec<u8> = Vec::new();
                let mut buffer = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = stream.read(&mut buffer).unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buffer[..n]);
                }
                requests.push(String::from_utf8_lossy(&request).to_string());

                let response = format!(
                    "HTTP/1.1 {} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).unwrap();
            }
            requests
        });

        (url, handle)
    }

    fn instance(url: &str) -> InstanceConfig {
        InstanceConfig {
            id: InstanceId(1),
            name: None,
            url: url.to_string(),
            username: Some("admin".to_string()),
            password: None,
            timeout_secs: 5,
            connect_timeout_secs: 0,
        }
    }

    #[test]
    fn test_url_strips_trailing_slashes() {
        let transport = HttpTransport::new(&instance("https://media.example.org//")).unwrap();
        assert_eq!(
            transport.url("/api/series/abc"),
            "https://media.example.org/api/series/abc"
        );
    }

    #[test]
    fn test_credentials_taken_from_profile() {
        let transport = HttpTransport::new(&instance("https://media.example.org")).unwrap();
        assert_eq!(
            transport.credentials,
            Some(("admin".to_string(), None))
        );
    }

    #[test]
    fn test_config_factory_rejects_unknown_instance() {
        let config = CatalogConfig::from_toml_str(
            r#"
[[instances]]
id = 1
url = "https://media.example.org"
"#,
        )
        .unwrap();

        assert!(config.connect(InstanceId(1)).is_ok());
        assert!(matches!(
            config.connect(InstanceId(2)),
            Err(TransportError::UnknownInstance(InstanceId(2)))
        ));
    }

    #[test]
    fn test_http_get_joins_url_and_sends_basic_auth() {
        let (url, server) = serve(vec![(404, "null")]);
        let mut profile = instance(&url);
        profile.username = Some("u".to_string());
        profile.password = Some("p".to_string());
        let client = CatalogClient::new(InstanceId(1), HttpTransport::new(&profile).unwrap());

        assert_eq!(client.get_series("s1").unwrap(), None);

        let requests = server.join().unwrap();
        let request = requests[0].to_lowercase();
        assert!(request.starts_with("get /api/series/s1 http/1.1\r\n"));
        // base64("u:p")
        assert!(request.contains("authorization: basic dtpw\r\n"));
    }

    #[test]
    fn test_http_get_returns_status_and_body() {
        let (url, server) = serve(vec![
            (404, "null"),
            (200, r#"{"identifier":"s1","title":"Lecture 1"}"#),
        ]);
        let mut profile = instance(&url);
        profile.username = None;
        let transport = HttpTransport::new(&profile).unwrap();

        let missing = transport.get("/api/series/none").unwrap();
        assert_eq!(missing.status, 404);
        assert_eq!(missing.body, b"null");

        let found = transport.get("/api/series/s1").unwrap();
        assert!(found.is_ok());
        assert_eq!(found.body, br#"{"identifier":"s1","title":"Lecture 1"}"#);

        let requests = server.join().unwrap();
        assert!(!requests[1].to_lowercase().contains("authorization:"));
    }

    #[test]
    fn test_http_get_unreachable_server_is_request_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let transport = HttpTransport::new(&instance(&url)).unwrap();
        let error = transport.get("/api/series/s1").unwrap_err();

        assert!(matches!(error, TransportError::Request { .. }));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_response_ok_only_on_200() {
        let ok = TransportResponse {
            status: 200,
            body: Vec::new(),
        };
        let created = TransportResponse {
            status: 201,
            body: Vec::new(),
        };
        assert!(ok.is_ok());
        assert!(!created.is_ok());
    }
}
