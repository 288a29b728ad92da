//! HTTP client for the virtualization daemon.
//!
//! Owns the daemon endpoint and the reqwest transport, classifies responses
//! by status code, and hands successful bodies to the schema translator.

use crate::container::{
    ClientError, Container, ContainerConfig, ContainerInfo, HttpError, NO_SUCH_IMAGE_MARKER,
    Result, VirtContainerConfig, VirtContainerInfo,
};
use hyper::ext::ReasonPhrase;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_HOST: &str = "localhost:2376";

const TLS_HINT_NEEDLE: &str = "connection refused";

/// TLS material for talking to a TLS-enabled daemon.
///
/// All paths point to PEM files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsSettings {
    /// Additional root CA certificate
    pub ca_cert: Option<PathBuf>,
    /// Client certificate for mutual TLS
    pub client_cert: Option<PathBuf>,
    /// Private key matching `client_cert`
    pub client_key: Option<PathBuf>,
    /// Accept any server certificate
    pub insecure_skip_verify: bool,
}

/// Daemon client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Daemon address, with or without scheme
    pub host: String,
    /// Request timeout in seconds; zero disables the timeout
    pub timeout_secs: u64,
    /// TLS settings; presence switches the default scheme to https
    pub tls: Option<TlsSettings>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            tls: None,
        }
    }
}

impl ClientConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parse from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// Load from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Serialize to a TOML string
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// Save to TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}

/// Client for a libvirt-backed container daemon.
///
/// The handle is read-only after construction and cheap to clone; the
/// underlying connection pool is shared between clones.
#[derive(Debug, Clone)]
pub struct VirtplusClient {
    url: Url,
    http: reqwest::Client,
    tls: Option<TlsSettings>,
    timeout: Duration,
}

impl VirtplusClient {
    /// Create a client with the default timeout.
    ///
    /// Without a scheme (or with `tcp://`) the address resolves to `http`,
    /// or to `https` when TLS settings are given.
    ///
    /// # Errors
    ///
    /// Returns error if the address is not a valid endpoint or TLS material
    /// cannot be loaded.
    pub fn new(address: &str, tls: Option<TlsSettings>) -> Result<Self> {
        Self::with_timeout(address, tls, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit request timeout.
    ///
    /// A zero timeout means requests never time out.
    ///
    /// # Errors
    ///
    /// Returns error if the address is not a valid endpoint or TLS material
    /// cannot be loaded.
    pub fn with_timeout(address: &str, tls: Option<TlsSettings>, timeout: Duration) -> Result<Self> {
        let url = resolve_address(address, tls.is_some())?;
        let http = build_http_client(tls.as_ref(), timeout)?;

        info!("Configured daemon client for {}", url);

        Ok(Self {
            url,
            http,
            tls,
            timeout,
        })
    }

    /// Create a client from a loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the configured address or TLS material is invalid.
    pub fn with_config(config: &ClientConfig) -> Result<Self> {
        Self::with_timeout(&config.host, config.tls.clone(), config.timeout())
    }

    /// Resolved daemon base URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Client-wide request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// TLS settings the client was built with.
    pub fn tls(&self) -> Option<&TlsSettings> {
        self.tls.as_ref()
    }

    /// List containers known to the daemon.
    ///
    /// Every id is inspected in order; ids that fail inspection are logged
    /// and left out of the result.
    ///
    /// # Errors
    ///
    /// Returns error if the id listing itself fails or cannot be decoded.
    pub async fn list_containers(&self) -> Result<Vec<Container>> {
        let url = self.endpoint(&["containers"], &[])?;
        let data = self.do_request(Method::GET, url, None, None).await?;

        let ids: Vec<String> = serde_json::from_slice::<Option<Vec<String>>>(&data)?
            .unwrap_or_default();
        debug!("Daemon reported {} container ids", ids.len());

        let mut containers = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.inspect_container(id).await {
                Ok(info) => containers.push(Container::from(info)),
                Err(e) => warn!("Skipping container {}: {}", id, e),
            }
        }

        Ok(containers)
    }

    /// Inspect a single container.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if the id does not resolve, or a
    /// decode error if the payload is malformed.
    pub async fn inspect_container(&self, id: &str) -> Result<ContainerInfo> {
        let virt = self.inspect_virt(id).await?;
        Ok(ContainerInfo::from(virt))
    }

    /// Fetch the raw daemon inspection payload, including CPU and domain snapshots.
    ///
    /// # Errors
    ///
    /// Same as [`VirtplusClient::inspect_container`].
    pub async fn inspect_virt(&self, id: &str) -> Result<VirtContainerInfo> {
        let url = self.endpoint(&["containers", id], &[])?;
        let data = self.do_request(Method::GET, url, None, None).await?;

        let virt: VirtContainerInfo = serde_json::from_slice(&data)?;
        debug!("Inspected container {} ({})", virt.id, virt.name);
        Ok(virt)
    }

    /// Create a VM-backed container and return the daemon-assigned id.
    ///
    /// # Errors
    ///
    /// Returns error if the payload cannot be encoded, the daemon rejects the
    /// request, or the returned id cannot be decoded.
    pub async fn create_container(&self, config: &ContainerConfig, name: &str) -> Result<String> {
        let payload = VirtContainerConfig::from_config(config, name);
        let body = serde_json::to_vec(&payload)?;

        let name_query = [("name", name)];
        let query: &[(&str, &str)] = if name.is_empty() { &[] } else { &name_query };
        let url = self.endpoint(&["containers"], query)?;
        let data = self.do_request(Method::POST, url, Some(body), None).await?;

        let id: String = serde_json::from_slice(&data)?;
        info!("Created container {} (boot: {})", id, payload.boot);
        Ok(id)
    }

    /// Remove a container.
    ///
    /// # Errors
    ///
    /// Returns any error from the request layer.
    pub async fn remove_container(&self, id: &str) -> Result<()> {
        let url = self.endpoint(&["containers", id], &[])?;
        self.do_request(Method::DELETE, url, None, None).await?;
        info!("Removed container {}", id);
        Ok(())
    }

    /// Build an endpoint URL below the base address. Segments are percent-encoded.
    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidAddress {
                address: self.url.to_string(),
                reason: "address cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url)
    }

    /// Send a request and fully read the body of a successful response.
    pub async fn do_request(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<Vec<u8>> {
        let response = self.do_stream_request(method, url, body, headers).await?;
        let data = response.bytes().await?;
        Ok(data.to_vec())
    }

    /// Send a request and classify the response by status code.
    ///
    /// Error responses are consumed before returning. On success the
    /// response is handed back unread.
    pub async fn do_stream_request(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<Response> {
        let mut header_map = HeaderMap::new();
        header_map.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        for (key, value) in headers.into_iter().flatten() {
            match (
                HeaderName::try_from(key.as_str()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(val)) => {
                    header_map.append(name, val);
                }
                _ => warn!("invalid header: {}={}", key, value),
            }
        }

        let body = match body {
            Some(body) => Some(body),
            None if method == Method::POST || method == Method::PUT => Some(Vec::new()),
            None => None,
        };

        debug!("{} {}", method, url);
        let mut request = self.http.request(method, url).headers(header_map);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.classify_transport_error(e))?;

        let status = response.status();
        debug!("Daemon responded {}", status);

        if status == StatusCode::NOT_FOUND {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!("Unreadable 404 body: {}", e);
                    return Err(ClientError::NotFound);
                }
            };
            if body.is_empty() {
                return Err(ClientError::NotFound);
            }
            if body.contains(NO_SUCH_IMAGE_MARKER) {
                return Err(ClientError::ImageNotFound);
            }
            return Err(ClientError::Daemon(body));
        }

        if status.as_u16() >= 400 {
            let status_line = status_line(&response);
            let body = response.text().await?;
            return Err(ClientError::Http(HttpError {
                status_code: status.as_u16(),
                status: status_line,
                body,
            }));
        }

        Ok(response)
    }

    fn classify_transport_error(&self, err: reqwest::Error) -> ClientError {
        if self.tls.is_none() && !mentions_connection_refused(&err) {
            ClientError::TlsHint(err)
        } else {
            ClientError::Transport(err)
        }
    }
}

/// Turn a daemon address into a base URL, filling in the scheme.
fn resolve_address(address: &str, tls: bool) -> Result<Url> {
    let invalid = |reason: String| ClientError::InvalidAddress {
        address: address.to_string(),
        reason,
    };
    let default_scheme = if tls { "https" } else { "http" };

    let candidate = match address.split_once("://") {
        None => format!("{}://{}", default_scheme, address),
        Some((scheme, rest)) => match scheme.to_ascii_lowercase().as_str() {
            "" | "tcp" => format!("{}://{}", default_scheme, rest),
            "http" | "https" => address.to_string(),
            other => return Err(invalid(format!("unsupported scheme {:?}", other))),
        },
    };

    let mut url = Url::parse(&candidate).map_err(|e| invalid(e.to_string()))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

/// Status line as sent by the daemon, e.g. `"409 Conflict"`.
///
/// hyper only keeps the reason phrase when it differs from the canonical one.
fn status_line(response: &Response) -> String {
    let status = response.status();
    let reason = response
        .extensions()
        .get::<ReasonPhrase>()
        .map(|reason| String::from_utf8_lossy(reason.as_bytes()).into_owned())
        .or_else(|| status.canonical_reason().map(str::to_string));

    match reason {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

fn build_http_client(tls: Option<&TlsSettings>, timeout: Duration) -> Result<reqwest::Client> {
    let mut builder =
        reqwest::Client::builder().user_agent(concat!("virtplus/", env!("CARGO_PKG_VERSION")));
    if !timeout.is_zero() {
        builder = builder.timeout(timeout);
    }

    if let Some(tls) = tls {
        if let Some(ca_path) = &tls.ca_cert {
            let pem = read_pem(ca_path)?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                ClientError::Tls(format!("invalid CA certificate {:?}: {}", ca_path, e))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        match (&tls.client_cert, &tls.client_key) {
            (Some(cert_path), Some(key_path)) => {
                let mut pem = read_pem(cert_path)?;
                pem.push(b'\n');
                pem.extend(read_pem(key_path)?);
                let identity = reqwest::Identity::from_pem(&pem).map_err(|e| {
                    ClientError::Tls(format!("invalid client identity {:?}: {}", cert_path, e))
                })?;
                builder = builder.identity(identity);
            }
            (None, None) => {}
            _ => {
                return Err(ClientError::Tls(
                    "client_cert and client_key must be set together".to_string(),
                ));
            }
        }

        if tls.insecure_skip_verify {
            warn!("TLS certificate verification disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }
    }

    builder
        .build()
        .map_err(|e| ClientError::Tls(format!("failed to build HTTP client: {}", e)))
}

fn read_pem(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| ClientError::Tls(format!("failed to read {:?}: {}", path, e)))
}

fn mentions_connection_refused(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        if e.to_string().to_lowercase().contains(TLS_HINT_NEEDLE) {
            return true;
        }
        current = e.source();
    }
    false
}
