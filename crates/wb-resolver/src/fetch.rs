use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;

use tracing::info;
use wb_core::{BindError, Location};

use crate::settings::TransportSettings;

/// Produces the raw bytes behind a location.
pub trait Fetcher {
    fn fetch(&self, location: &Location) -> Result<Vec<u8>, BindError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Blocking HTTP GET supplied by the embedder. Implementations must honour
/// the dial timeout and TLS flag in `settings`.
pub trait RemoteTransport {
    fn get(&self, url: &str, settings: &TransportSettings) -> Result<RemoteResponse, String>;
}

/// Reads files from disk and hands URLs to an optional transport.
pub struct LocalFetcher {
    transport: Option<Box<dyn RemoteTransport>>,
    settings: TransportSettings,
}

impl LocalFetcher {
    pub fn new(settings: TransportSettings) -> Self {
        Self {
            transport: None,
            settings,
        }
    }

    pub fn with_transport(mut self, transport: Box<dyn RemoteTransport>) -> Self {
        self.transport = Some(transport);
        self
    }
}

impl Fetcher for LocalFetcher {
    fn fetch(&self, location: &Location) -> Result<Vec<u8>, BindError> {
        match location {
            Location::File(path) => {
                info!(file = %location, "reading");
                fs::read(path).map_err(|error| BindError::fetch(location.key(), error.to_string()))
            }
            Location::Url(url) => {
                info!(url = %location, "downloading");
                let Some(transport) = &self.transport else {
                    return Err(BindError::fetch(
                        location.key(),
                        "no remote transport configured",
                    ));
                };
                let response = transport
                    .get(url.as_str(), &self.settings)
                    .map_err(|reason| BindError::fetch(location.key(), reason))?;
                if response.status != 200 {
                    return Err(BindError::fetch(
                        location.key(),
                        format!("received response code {}", response.status),
                    ));
                }
                Ok(response.body)
            }
        }
    }
}

/// Serves documents from memory, keyed by `Location::key()`, and remembers
/// every key it was asked for.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    documents: BTreeMap<String, Vec<u8>>,
    requests: RefCell<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, key: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(key, content);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.documents.insert(key.into(), content.into());
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch(&self, location: &Location) -> Result<Vec<u8>, BindError> {
        let key = location.key();
        self.requests.borrow_mut().push(key.clone());
        self.documents
            .get(&key)
            .cloned()
            .ok_or_else(|| BindError::fetch(key, "document not found"))
    }
}
