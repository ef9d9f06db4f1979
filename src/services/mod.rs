mod content_fetcher;
mod processor;
mod sync;

#[cfg(test)]
pub(crate) mod stubs;

pub use content_fetcher::{ContentFetcher, PageFetcher};
pub use processor::{Processor, Timeouts};
pub use sync::SyncEngine;
