//! Memcached cache backend.
//!
//! Accepts one or more `host:port` endpoints. Each endpoint gets its own
//! client connection and every key is routed to exactly one endpoint by a
//! stable hash, so reads find what writes stored.

use std::borrow::Cow;
use std::time::Duration;

use async_memcached::{Client, Error as McError, Status};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::error::StoreError;
use super::key::{bucket, digest};
use super::store::CacheStore;

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 11211;

/// Longest key the memcached text protocol accepts.
const MAX_KEY_LEN: usize = 250;

/// A single memcached server address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemcachedEndpoint {
    pub host: String,
    pub port: u16,
}

impl MemcachedEndpoint {
    /// Parse one `host[:port]` entry; missing parts fall back to `localhost:11211`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        let (host, port) = match raw.split_once(':') {
            Some((host, port)) => (host, port),
            None => (raw, ""),
        };

        let host = if host.is_empty() { DEFAULT_HOST.to_string() } else { host.to_string() };
        let port = if port.is_empty() {
            DEFAULT_PORT
        } else {
            port.parse::<u16>().map_err(|_| format!("invalid memcached port in '{raw}'"))?
        };

        Ok(Self { host, port })
    }

    /// Parse a comma-separated endpoint list.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, String> {
        let endpoints = raw
            .split(',')
            .filter(|entry| !entry.trim().is_empty())
            .map(Self::parse)
            .collect::<Result<Vec<_>, _>>()?;

        if endpoints.is_empty() {
            return Err("no memcached endpoints given".into());
        }

        Ok(endpoints)
    }

    /// Connection string understood by the memcached client.
    pub fn dsn(&self) -> String {
        format!("tcp://{}:{}", self.host, self.port)
    }
}

impl std::fmt::Display for MemcachedEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

struct Node {
    endpoint: MemcachedEndpoint,
    client: Mutex<Client>,
}

/// Memcached-backed cache store.
pub struct MemcachedStore {
    nodes: Vec<Node>,
}

impl std::fmt::Debug for MemcachedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let endpoints: Vec<&MemcachedEndpoint> = self.nodes.iter().map(|node| &node.endpoint).collect();
        f.debug_struct("MemcachedStore").field("endpoints", &endpoints).finish()
    }
}

impl MemcachedStore {
    pub const NAME: &'static str = "memcached";

    /// Connect to every endpoint. Unreachable endpoints are skipped; at least one must connect.
    pub async fn connect(endpoints: &[MemcachedEndpoint]) -> Result<Self, StoreError> {
        let mut nodes = Vec::with_capacity(endpoints.len());

        for endpoint in endpoints {
            match Client::new(endpoint.dsn()).await {
                Ok(client) => {
                    debug!(endpoint = %endpoint, "Memcached endpoint connected");
                    nodes.push(Node { endpoint: endpoint.clone(), client: Mutex::new(client) });
                }
                Err(e) => warn!(endpoint = %endpoint, error = %e, "Memcached endpoint unreachable, skipping"),
            }
        }

        if nodes.is_empty() {
            return Err(StoreError::Disconnected("no memcached endpoint reachable".into()));
        }

        Ok(Self { nodes })
    }

    fn node_for(&self, key: &str) -> &Node {
        &self.nodes[bucket(key, self.nodes.len())]
    }
}

#[async_trait]
impl CacheStore for MemcachedStore {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn write(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let key = storage_key(key);
        let node = self.node_for(&key);
        let ttl_seconds = ttl.as_secs().max(1) as i64;

        let mut client = node.client.lock().await;
        client.set(key.as_bytes(), value.as_bytes(), Some(ttl_seconds), None).await.map_err(classify)?;

        debug!(key = %key, ttl_seconds = ttl_seconds, endpoint = %node.endpoint, "Cache SET (memcached)");
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let key = storage_key(key);
        let node = self.node_for(&key);

        let mut client = node.client.lock().await;
        let fetched = client.get(key.as_bytes()).await.map(|value| value.map(|value| value.data));
        decode_get(&key, fetched)
    }
}

/// A missing key or a value that is not UTF-8 reads as a miss.
fn decode_get(key: &str, fetched: Result<Option<Vec<u8>>, McError>) -> Result<Option<String>, StoreError> {
    match fetched {
        Ok(Some(data)) => match String::from_utf8(data) {
            Ok(data) => Ok(Some(data)),
            Err(_) => {
                debug!(key = key, "Ignoring non UTF-8 memcached value");
                Ok(None)
            }
        },
        Ok(None) | Err(McError::Protocol(Status::NotFound)) => Ok(None),
        Err(e) => Err(classify(e)),
    }
}

/// Keys memcached cannot take verbatim are replaced by their digest.
fn storage_key(key: &str) -> Cow<'_, str> {
    let legal = key.len() <= MAX_KEY_LEN && key.bytes().all(|b| b > b' ' && b != 0x7f);
    if legal { Cow::Borrowed(key) } else { Cow::Owned(format!("hubble:{}", digest(key))) }
}

fn classify(err: McError) -> StoreError {
    match err {
        McError::Io(io) => match io.kind() {
            std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::UnexpectedEof => StoreError::Disconnected(io.to_string()),
            _ => StoreError::Transport(io.to_string()),
        },
        other => StoreError::Transport(other.to_string()),
    }
}
