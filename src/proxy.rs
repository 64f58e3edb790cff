use crate::error::DownloaderError;
use async_trait::async_trait;
use log::{debug, info};
use rand::seq::SliceRandom;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyEndpoint(String);

impl ProxyEndpoint {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn addr(&self) -> &str {
        &self.0
    }

    /// Forwarding URL; bare `host:port` entries are treated as HTTP proxies.
    pub fn url(&self) -> String {
        if self.0.contains("://") {
            self.0.clone()
        } else {
            format!("http://{}", self.0)
        }
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[async_trait]
pub trait ProxySource: Send + Sync {
    async fn next(&self) -> Option<ProxyEndpoint>;

    /// Removes `endpoint` for good. Evicting an unknown endpoint is a no-op.
    async fn evict(&self, endpoint: &ProxyEndpoint) -> Result<(), DownloaderError>;
}

pub struct ProxyPool {
    endpoints: Mutex<Vec<ProxyEndpoint>>,
    store: Option<PathBuf>,
}

impl ProxyPool {
    pub fn new(endpoints: Vec<ProxyEndpoint>) -> Self {
        Self {
            endpoints: Mutex::new(dedup(endpoints)),
            store: None,
        }
    }

    /// Loads one endpoint per line; evictions are written back to `path`.
    pub async fn load(path: &Path) -> Result<Self, DownloaderError> {
        let contents = tokio::fs::read_to_string(path).await?;
        let endpoints = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ProxyEndpoint::new)
            .collect();

        let endpoints = dedup(endpoints);
        info!("Loaded {} proxies from {}", endpoints.len(), path.display());
        Ok(Self {
            endpoints: Mutex::new(endpoints),
            store: Some(path.to_path_buf()),
        })
    }

    pub async fn len(&self) -> usize {
        self.endpoints.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.endpoints.lock().await.is_empty()
    }

    pub async fn endpoints(&self) -> Vec<ProxyEndpoint> {
        self.endpoints.lock().await.clone()
    }

    async fn persist(&self, endpoints: &[ProxyEndpoint]) -> Result<(), DownloaderError> {
        let Some(path) = &self.store else {
            return Ok(());
        };
        let mut contents = String::new();
        for endpoint in endpoints {
            contents.push_str(endpoint.addr());
            contents.push('\n');
        }
        tokio::fs::write(path, contents).await?;
        Ok(())
    }
}

fn dedup(endpoints: Vec<ProxyEndpoint>) -> Vec<ProxyEndpoint> {
    let mut unique: Vec<ProxyEndpoint> = Vec::with_capacity(endpoints.len());
    for endpoint in endpoints {
        if !unique.contains(&endpoint) {
            unique.push(endpoint);
        }
    }
    unique
}

#[async_trait]
impl ProxySource for ProxyPool {
    async fn next(&self) -> Option<ProxyEndpoint> {
        let endpoints = self.endpoints.lock().await;
        let chosen = endpoints.choose(&mut rand::thread_rng()).cloned();
        chosen
    }

    async fn evict(&self, endpoint: &ProxyEndpoint) -> Result<(), DownloaderError> {
        let mut endpoints = self.endpoints.lock().await;
        let Some(idx) = endpoints.iter().position(|e| e == endpoint) else {
            debug!("Proxy {} already evicted", endpoint);
            return Ok(());
        };
        endpoints.remove(idx);
        info!(
            "Evicted proxy {} ({} remaining)",
            endpoint,
            endpoints.len()
        );
        self.persist(&endpoints).await
    }
}
