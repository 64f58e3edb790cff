use crate::delay::Pause;
use crate::identity::IdentitySource;
use crate::proxy::{ProxyEndpoint, ProxyPool};
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub enum Reply {
    Fail,
    Status(u16),
    Body {
        declared: Option<u64>,
        chunks: Vec<Result<Bytes, TransportError>>,
    },
}

impl Reply {
    pub fn ok(data: &[u8]) -> Self {
        Reply::Body {
            declared: Some(data.len() as u64),
            chunks: vec![Ok(Bytes::copy_from_slice(data))],
        }
    }
}

/// Serves queued replies in order; once the queue is empty every call fails.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<(String, Option<ProxyEndpoint>)>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn user_agents(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(ua, _)| ua.clone()).collect()
    }

    pub fn proxies_used(&self) -> Vec<Option<ProxyEndpoint>> {
        self.calls.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, request: HttpRequest<'_>) -> Result<HttpResponse, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.user_agent.to_string(), request.proxy.cloned()));
        let reply = self.replies.lock().unwrap().pop_front().unwrap_or(Reply::Fail);

        match reply {
            Reply::Fail => Err(TransportError::Connect("connection refused".to_string())),
            Reply::Status(status) => Ok(HttpResponse {
                status,
                content_length: None,
                body: futures::stream::empty().boxed(),
            }),
            Reply::Body { declared, chunks } => Ok(HttpResponse {
                status: 200,
                content_length: declared,
                body: futures::stream::iter(chunks).boxed(),
            }),
        }
    }
}

#[derive(Default)]
pub struct CountingPause {
    count: AtomicUsize,
}

impl CountingPause {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Pause for CountingPause {
    async fn pause(&self, _duration: Duration) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct CountingIdentity {
    count: AtomicUsize,
}

impl CountingIdentity {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl IdentitySource for CountingIdentity {
    fn next(&self) -> String {
        let n = self.count.fetch_add(1, Ordering::SeqCst);
        format!("test-agent/{}", n)
    }
}

pub fn proxy_pool(size: usize) -> Arc<ProxyPool> {
    Arc::new(ProxyPool::new(
        (0..size)
            .map(|i| ProxyEndpoint::new(format!("10.0.0.{}:8080", i + 1)))
            .collect(),
    ))
}
