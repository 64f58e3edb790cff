use crate::config::{DownloadConfig, ProxyCredentials};
use crate::error::DownloaderError;
use crate::proxy::ProxyEndpoint;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use log::debug;
use reqwest::header::USER_AGENT;
use reqwest::{Client, Proxy};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("invalid proxy {0}")]
    InvalidProxy(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("body stream failed: {0}")]
    Body(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            TransportError::Body(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HttpRequest<'a> {
    pub url: &'a str,
    pub user_agent: &'a str,
    pub proxy: Option<&'a ProxyEndpoint>,
}

pub struct HttpResponse {
    pub status: u16,
    pub content_length: Option<u64>,
    pub body: BoxStream<'static, Result<Bytes, TransportError>>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues a GET whose body is consumed lazily through `HttpResponse::body`.
    async fn get(&self, request: HttpRequest<'_>) -> Result<HttpResponse, TransportError>;
}

pub struct ReqwestTransport {
    direct: Client,
    timeout: Duration,
    credentials: Option<ProxyCredentials>,
}

impl ReqwestTransport {
    pub fn new(config: &DownloadConfig) -> Result<Self, DownloaderError> {
        let direct = Client::builder().timeout(config.timeout).no_proxy().build()?;
        Ok(Self {
            direct,
            timeout: config.timeout,
            credentials: config.proxy_credentials.clone(),
        })
    }

    fn proxied_client(&self, endpoint: &ProxyEndpoint) -> Result<Client, TransportError> {
        let mut proxy = Proxy::all(endpoint.url())
            .map_err(|e| TransportError::InvalidProxy(format!("{}: {}", endpoint, e)))?;
        if let Some(creds) = &self.credentials {
            proxy = proxy.basic_auth(&creds.username, &creds.password);
        }

        Client::builder()
            .proxy(proxy)
            .timeout(self.timeout)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| TransportError::InvalidProxy(format!("{}: {}", endpoint, e)))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: HttpRequest<'_>) -> Result<HttpResponse, TransportError> {
        let client = match request.proxy {
            Some(endpoint) => {
                debug!("Routing {} through proxy {}", request.url, endpoint);
                self.proxied_client(endpoint)?
            }
            None => self.direct.clone(),
        };

        let resp = client
            .get(request.url)
            .header(USER_AGENT, request.user_agent)
            .send()
            .await?;

        Ok(HttpResponse {
            status: resp.status().as_u16(),
            content_length: resp.content_length(),
            body: resp.bytes_stream().map_err(TransportError::from).boxed(),
        })
    }
}
