//! Page structure supplied by the document-analysis service

mod cache;
mod fetch;
mod types;

pub use cache::{PageKey, StructureCache};
pub use fetch::{DirectorySource, FetchTracker, RequestId, StructureSource};
pub use types::*;
