//! HTTP implementation of the worker addon remote fetch capability.

mod error;

pub use error::{Error, Result};

use std::time::Duration;

use log::{debug, warn};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use watched_addons::{BoxFuture, FetchError, FetchRemote, RemoteRequest, RemoteResponse};

/// Default request timeout for remote fetches.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Environment variable overriding [`DEFAULT_TIMEOUT`], in whole seconds.
pub const TIMEOUT_ENV_VAR: &str = "WATCHED_FETCH_TIMEOUT_SECS";

/// Settings for the HTTP client behind [`ReqwestFetchRemote`].
#[derive(Clone, Debug)]
pub struct FetchRemoteConfig {
    pub timeout: Duration,
    /// Replaces the default `watched-addons/<version> (<platform>; <arch>)`.
    pub user_agent: Option<String>,
    pub default_headers: Vec<(String, String)>,
    pub gzip: bool,
}

impl Default for FetchRemoteConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            default_headers: vec![("Accept".to_string(), "application/json".to_string())],
            gzip: true,
        }
    }
}

impl FetchRemoteConfig {
    /// Defaults, with the timeout taken from [`TIMEOUT_ENV_VAR`] when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(TIMEOUT_ENV_VAR) {
            match parse_timeout_secs(&value) {
                Some(timeout) => config.timeout = timeout,
                None => warn!("Ignoring invalid {TIMEOUT_ENV_VAR}={value:?}"),
            }
        }
        config
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the default user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Add a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }
}

fn parse_timeout_secs(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

/// User agent sent when the config does not set one.
pub fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("watched-addons/{version} ({}; {})", ua_platform(), ua_arch())
}

fn ua_platform() -> &'static str {
    if cfg!(target_os = "windows") {
        "Win"
    } else if cfg!(target_os = "macos") {
        "Mac"
    } else if cfg!(target_os = "linux") {
        "Linux"
    } else {
        "Unknown"
    }
}

fn ua_arch() -> &'static str {
    if cfg!(target_arch = "x86_64") {
        "x86_64"
    } else if cfg!(target_arch = "aarch64") {
        "ARM64"
    } else {
        "Unknown"
    }
}

/// Build a reqwest Client from the fetch config.
pub fn fetch_client(config: &FetchRemoteConfig) -> Result<Client> {
    let mut default_headers = HeaderMap::new();
    for (name, value) in &config.default_headers {
        let invalid = |message: String| Error::InvalidHeader {
            name: name.clone(),
            message,
        };
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        default_headers.insert(header_name, header_value);
    }

    let user_agent = config.user_agent.clone().unwrap_or_else(default_user_agent);
    let client = reqwest::ClientBuilder::new()
        .timeout(config.timeout)
        .default_headers(default_headers)
        .gzip(config.gzip)
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// [`FetchRemote`] backed by a shared reqwest [`Client`].
#[derive(Clone, Debug)]
pub struct ReqwestFetchRemote {
    client: Client,
}

impl ReqwestFetchRemote {
    /// Build a client from `config`.
    pub fn new(config: &FetchRemoteConfig) -> Result<Self> {
        Ok(Self::with_client(fetch_client(config)?))
    }

    /// Wrap an already configured client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl FetchRemote for ReqwestFetchRemote {
    fn fetch(
        &self,
        request: RemoteRequest,
    ) -> BoxFuture<'static, std::result::Result<RemoteResponse, FetchError>> {
        let client = self.client.clone();
        Box::pin(async move {
            let url = request.url.clone();
            debug!("Fetching remote {} {url}", request.method);

            let mut builder = client
                .request(request.method, &request.url)
                .headers(request.headers);
            if let Some(body) = request.body {
                builder = builder.body(body);
            }
            if let Some(timeout) = request.timeout {
                builder = builder.timeout(timeout);
            }

            let resp = builder.send().await.map_err(|e| to_fetch_error(&url, e))?;
            let status = resp.status();
            let headers = resp.headers().clone();
            let body = resp.bytes().await.map_err(|e| to_fetch_error(&url, e))?;

            if !status.is_success() {
                debug!("Remote {url} answered {status}");
            }

            Ok(RemoteResponse {
                status,
                headers,
                body: body.to_vec(),
            })
        })
    }
}

fn to_fetch_error(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(url.to_string())
    } else if err.is_builder() {
        FetchError::InvalidRequest(err.to_string())
    } else {
        FetchError::Request {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one connection with a fixed JSON body and return the request head.
    async fn serve_once(body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&head).to_string()
        });
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn test_parse_timeout_secs() {
        assert_eq!(parse_timeout_secs(" 5 "), Some(Duration::from_secs(5)));
        assert_eq!(parse_timeout_secs("0"), None);
        assert_eq!(parse_timeout_secs("soon"), None);
    }

    // The only test touching the variable, so the steps run in sequence here.
    #[test]
    fn test_timeout_from_env() {
        unsafe { std::env::set_var(TIMEOUT_ENV_VAR, "7") };
        assert_eq!(FetchRemoteConfig::from_env().timeout, Duration::from_secs(7));

        unsafe { std::env::set_var(TIMEOUT_ENV_VAR, "soon") };
        assert_eq!(FetchRemoteConfig::from_env().timeout, DEFAULT_TIMEOUT);

        unsafe { std::env::remove_var(TIMEOUT_ENV_VAR) };
        assert_eq!(FetchRemoteConfig::from_env().timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_default_user_agent() {
        assert!(default_user_agent().starts_with("watched-addons/"));
    }

    #[test]
    fn test_invalid_default_header() {
        let config = FetchRemoteConfig::default().with_header("bad header", "x");
        let err = fetch_client(&config).unwrap_err();
        assert!(matches!(err, Error::InvalidHeader { name, .. } if name == "bad header"));
    }

    #[tokio::test]
    async fn test_fetch_json() {
        let (base_url, server) = serve_once(r#"{"ok":true}"#).await;
        let fetch = ReqwestFetchRemote::new(
            &FetchRemoteConfig::default().with_user_agent("addon-test/1.0"),
        )
        .unwrap();

        let request = RemoteRequest::get(format!("{base_url}/catalog"))
            .header("x-addon", "example")
            .unwrap();
        let response = fetch.fetch(request).await.unwrap();

        assert!(response.is_success());
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["ok"], true);

        let head = server.await.unwrap().to_lowercase();
        assert!(head.starts_with("get /catalog http/1.1"));
        assert!(head.contains("user-agent: addon-test/1.0"));
        assert!(head.contains("x-addon: example"));
        assert!(head.contains("accept: application/json"));
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let fetch = ReqwestFetchRemote::new(&FetchRemoteConfig::default()).unwrap();
        let request =
            RemoteRequest::get(format!("http://{addr}/slow")).timeout(Duration::from_millis(100));
        let err = fetch.fetch(request).await.unwrap_err();

        assert!(matches!(err, FetchError::Timeout(_)));
        server.abort();
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let fetch = ReqwestFetchRemote::new(&FetchRemoteConfig::default()).unwrap();
        let err = fetch
            .fetch(RemoteRequest::get("not a url"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidRequest(_)));
    }
}
