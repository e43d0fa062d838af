//! Shareable links that point at a chunk on a page
//!
//! A link carries `chunk=<id>` and optionally `page=<n>` in its query
//! string. Only the first occurrence of each parameter counts; anything else
//! in the query is ignored.

use log::debug;

use super::registry::RegionRegistry;
use crate::structure::ChunkId;

pub const CHUNK_PARAM: &str = "chunk";
pub const PAGE_PARAM: &str = "page";

/// Chunk reference read from the page location
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeepLink {
    pub chunk_id: Option<ChunkId>,
    pub page: Option<u32>,
}

/// Outcome of matching a link against the current page
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The link names no chunk
    NoTarget,
    /// The chunk is not on this page, possibly on another one
    Unmatched(ChunkId),
    Matched(ChunkId),
}

impl DeepLink {
    /// Link without a target
    pub fn none() -> Self {
        Self::default()
    }

    pub fn to_chunk(chunk_id: impl Into<ChunkId>) -> Self {
        Self {
            chunk_id: Some(chunk_id.into()),
            page: None,
        }
    }

    /// Parse a full URL, a `?query` or a bare query string
    pub fn parse(location: &str) -> Self {
        let without_fragment = location.split('#').next().unwrap_or("");
        let query = match without_fragment.split_once('?') {
            Some((_, query)) => query,
            None if without_fragment.contains('=') => without_fragment,
            None => "",
        };

        let mut chunk: Option<Option<ChunkId>> = None;
        let mut page: Option<Option<u32>> = None;

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_component(raw_key);
            match key.as_str() {
                CHUNK_PARAM if chunk.is_none() => {
                    let value = decode_component(raw_value);
                    let trimmed = value.trim();
                    chunk = Some((!trimmed.is_empty()).then(|| ChunkId::new(trimmed)));
                }
                PAGE_PARAM if page.is_none() => {
                    page = Some(decode_component(raw_value).trim().parse().ok());
                }
                _ => {}
            }
        }

        Self {
            chunk_id: chunk.flatten(),
            page: page.flatten(),
        }
    }

    pub fn has_target(&self) -> bool {
        self.chunk_id.is_some()
    }

    /// Match against the regions of the page currently shown
    pub fn resolve(&self, registry: &RegionRegistry) -> Resolution {
        match &self.chunk_id {
            None => Resolution::NoTarget,
            Some(id) if registry.contains(id.as_str()) => Resolution::Matched(id.clone()),
            Some(id) => {
                debug!("Deep link target {id} is not on this page");
                Resolution::Unmatched(id.clone())
            }
        }
    }

    /// Query string for this link, e.g. `?chunk=chunk-0-page-1&page=1`
    pub fn to_query(&self) -> String {
        let mut parts = Vec::new();
        if let Some(id) = &self.chunk_id {
            parts.push(format!("{CHUNK_PARAM}={}", encode_component(id.as_str())));
        }
        if let Some(page) = self.page {
            parts.push(format!("{PAGE_PARAM}={page}"));
        }
        if parts.is_empty() {
            String::new()
        } else {
            format!("?{}", parts.join("&"))
        }
    }
}

/// Decode `+` and `%XX` escapes. Broken escapes are kept literally.
fn decode_component(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let escaped = bytes
                    .get(i + 1)
                    .zip(bytes.get(i + 2))
                    .and_then(|(&hi, &lo)| hex_value(hi).zip(hex_value(lo)));
                if let Some((h, l)) = escaped {
                    out.push((h << 4) | l);
                    i += 3;
                    continue;
                }
                // Only the '%' is literal; what follows is scanned again
                out.push(b'%');
            }
            b => out.push(b),
        }
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn encode_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for b in input.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}
