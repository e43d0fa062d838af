//! Structure sources and stale-result suppression
//!
//! Fetching happens outside the engine. The host starts a request, gets a
//! [`RequestId`] back and later hands the result in; only the most recent
//! request for the page on screen is accepted.

use std::fs;
use std::path::PathBuf;

use log::debug;

use super::cache::PageKey;
use super::types::{PageStructure, StructureError};

/// Unique identifier for structure requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// External collaborator that knows how to get a page's structure
pub trait StructureSource {
    fn fetch(&self, key: &PageKey) -> Result<PageStructure, StructureError>;
}

/// Reads `<root>/<document>/page-<n>.json`
#[derive(Clone, Debug)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn path_for(&self, key: &PageKey) -> PathBuf {
        self.root
            .join(&key.document)
            .join(format!("page-{}.json", key.page))
    }
}

impl StructureSource for DirectorySource {
    fn fetch(&self, key: &PageKey) -> Result<PageStructure, StructureError> {
        let path = self.path_for(key);
        let payload = fs::read_to_string(&path).map_err(|source| StructureError::Io {
            path: path.clone(),
            source,
        })?;
        PageStructure::from_json(&payload)
    }
}

/// Tracks the one request whose result may still be applied
#[derive(Debug)]
pub struct FetchTracker {
    next_request_id: u64,
    current: Option<(RequestId, PageKey)>,
}

impl Default for FetchTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchTracker {
    pub fn new() -> Self {
        Self {
            next_request_id: 1,
            current: None,
        }
    }

    /// Start a request for `key`, superseding whatever was in flight
    pub fn begin(&mut self, key: PageKey) -> RequestId {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        if let Some((old, old_key)) = self.current.replace((id, key)) {
            debug!("Request {:?} for {old_key} superseded by {:?}", old, id);
        }
        id
    }

    /// Claim the result of `id`. Returns the page it was for, or `None` when stale.
    pub fn complete(&mut self, id: RequestId) -> Option<PageKey> {
        match &self.current {
            Some((current, _)) if *current == id => self.current.take().map(|(_, key)| key),
            _ => {
                debug!("Discarding stale structure result for request {:?}", id);
                None
            }
        }
    }

    /// Forget the in-flight request, e.g. when the view unmounts
    pub fn cancel(&mut self) {
        self.current = None;
    }

    #[must_use]
    pub fn pending(&self) -> Option<RequestId> {
        self.current.as_ref().map(|(id, _)| *id)
    }
}
