pub mod aggregate;
pub mod analyzer;
pub mod checker;
pub mod crawler;
pub mod error;
pub mod event;
pub mod fetch;
pub mod frontier;
pub mod markup;
pub mod normalize;
pub mod result;
pub mod state;

pub use crawler::{CancelHandle, CrawlConfig, Crawler};
pub use error::{FetchError, ScanError};
pub use event::{CrawlEvent, EventCallback};
pub use fetch::{FetchResponse, Fetcher, HttpFetcher};
pub use result::{CrawlResult, PageRecord, PageStatus};
pub use normalize::{LinkScope, NormalizedUrl};
